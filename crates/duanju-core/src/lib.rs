pub mod commands;
pub mod config;
pub mod error;
pub mod plugin;
pub mod tools;

pub use plugin::DuanjuPlugin;
