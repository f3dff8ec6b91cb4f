pub mod create_purchase_command;
pub mod delete_purchase_command;
pub mod update_line_item_command;

pub use create_purchase_command::{CreatePurchaseCommand, NewLineItem};
pub use delete_purchase_command::DeletePurchaseCommand;
pub use update_line_item_command::UpdateLineItemCommand;
