//! Command-based undo/redo history

pub mod command;
pub mod stack;

pub use command::{Command, Edit, EditCommand};
pub use stack::CommandStack;
