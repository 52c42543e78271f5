pub mod capture;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod node;
pub mod tui;

pub use capture::{CapturedNode, CpuProfile, FromCapture, ProfileFormat};
pub use error::{Error, Result};
pub use node::{ProfileNodeView, Value, wrap};
