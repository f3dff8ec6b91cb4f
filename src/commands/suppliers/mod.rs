pub mod create_supplier_command;
pub mod update_supplier_command;

pub use create_supplier_command::CreateSupplierCommand;
pub use update_supplier_command::UpdateSupplierCommand;
