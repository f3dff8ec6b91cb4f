pub mod reindex_command;

pub use reindex_command::ReindexCommand;
