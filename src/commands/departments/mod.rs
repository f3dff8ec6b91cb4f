pub mod create_department_command;
pub mod update_department_command;

pub use create_department_command::CreateDepartmentCommand;
pub use update_department_command::UpdateDepartmentCommand;
