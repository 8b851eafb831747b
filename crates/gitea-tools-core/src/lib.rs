//! Gitea Actions tools
//!
//! Each tool takes structured arguments and always yields a textual
//! [`ToolOutput`]: log text, a JSON report, or an `Error...` message.

pub mod logging;
pub mod output;
pub mod tools;

pub use output::ToolOutput;
pub use tools::{
    execute,
    PollTiming,
    ToolCall,
    Toolbox,
};
