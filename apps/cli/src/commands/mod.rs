//! 命令定义和实现

pub mod config;
pub mod log;
pub mod probe;
pub mod read;

pub use config::ConfigCommand;
pub use log::LogCommand;
pub use probe::ProbeCommand;
pub use read::ReadCommand;
