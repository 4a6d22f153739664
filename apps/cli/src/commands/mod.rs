//! 命令定义和实现

pub mod config;
pub mod recordings;
pub mod settings;
pub mod simulate;

pub use config::ConfigCommand;
pub use recordings::RecordingsCommand;
pub use settings::SettingsCommand;
pub use simulate::SimulateCommand;
