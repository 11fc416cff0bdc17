//! Event routing between the host and the settings store.

pub mod command;
mod tab;

pub use command::{
    CommandBinding, CommandOutcome, CommandRouter, TOGGLE_HIDE_VIDEOS_COMMAND,
    TOGGLE_VIEW_THRESHOLD_COMMAND,
};
pub use tab::{MessageOutcome, TabEventRouter};
