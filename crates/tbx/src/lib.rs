//! MicroTBX-rs library: toolbox facade and command-line application logic.

pub mod app;
pub mod config;
pub mod errors;
pub mod toolbox;
pub mod version;

pub use toolbox::{Toolbox, ToolboxConfig};
