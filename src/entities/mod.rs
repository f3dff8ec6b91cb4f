pub mod department;
pub mod purchase;
pub mod purchase_line_item;
pub mod supplier;
