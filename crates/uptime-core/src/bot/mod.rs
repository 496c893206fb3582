pub mod command;
pub mod dispatcher;

pub use command::Command;
pub use dispatcher::CommandBot;
