//! # uArm CLI
//!
//! 配置、硬件设置与示教录制的命令行工具。
//!
//! ```bash
//! # 生成默认配置
//! uarm-cli config init
//!
//! # 查看已保存的校准数据
//! uarm-cli settings show
//!
//! # 录制管理
//! uarm-cli recordings list
//! uarm-cli recordings process wave --filter
//!
//! # 在模拟设备上执行一组移动
//! uarm-cli simulate --to 200,0,50 --to 180,40,60 --sleep
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use uarm_sdk::ArmConfig;
use uarm_sdk::tools::default_settings_directory;

mod commands;

use commands::{ConfigCommand, RecordingsCommand, SettingsCommand, SimulateCommand};

/// uArm CLI - 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "uarm-cli")]
#[command(about = "Command-line interface for uArm Swift Pro arms", long_about = None)]
#[command(version)]
struct Cli {
    /// 机械臂配置文件（默认使用平台配置目录下的 config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 硬件设置与录制文件所在目录
    #[arg(short, long, global = true)]
    settings_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 硬件设置（校准数据）
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// 录制管理
    #[command(subcommand)]
    Recordings(RecordingsCommand),

    /// 在模拟设备上执行移动
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },
}

/// 运行上下文（全局参数）
#[derive(Debug)]
pub struct CliContext {
    config_path: Option<PathBuf>,
    settings_dir: Option<PathBuf>,
}

impl CliContext {
    /// 配置文件路径（显式指定或默认路径）
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config_path.clone().or_else(ArmConfig::default_path)
    }

    /// 加载配置，文件不存在时使用默认值
    pub fn load_config(&self) -> Result<ArmConfig> {
        match self.config_path() {
            Some(path) if path.is_file() => {
                debug!("Loading config from {}", path.display());
                ArmConfig::load_from_file(&path)
            },
            Some(path) if self.config_path.is_some() => {
                anyhow::bail!("配置文件不存在: {}", path.display())
            }
            _ => Ok(ArmConfig::default()),
        }
    }

    /// 设置目录（显式指定或默认目录）
    pub fn settings_dir(&self) -> Result<PathBuf> {
        match &self.settings_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_settings_directory().context("无法确定设置目录"),
        }
    }

    pub fn explicit_settings_dir(&self) -> Option<&Path> {
        self.settings_dir.as_deref()
    }
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("uarm_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        config_path: cli.config,
        settings_dir: cli.settings_dir,
    };

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&ctx),
        Commands::Settings(cmd) => cmd.execute(&ctx),
        Commands::Recordings(cmd) => cmd.execute(&ctx),
        Commands::Simulate { args } => args.execute(&ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["uarm-cli", "-s", "/tmp", "simulate", "--to", "200,0,50"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Simulate { .. }));
        assert!(Cli::try_parse_from(["uarm-cli", "recordings", "process", "wave", "--filter"]).is_ok());

        // 录制需要真实设备，命令行不提供
        assert!(Cli::try_parse_from(["uarm-cli", "record", "--name", "wave"]).is_err());
    }

    #[test]
    fn test_explicit_settings_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CliContext {
            config_path: None,
            settings_dir: Some(dir.path().to_path_buf()),
        };
        assert_eq!(ctx.settings_dir().unwrap(), dir.path());
        assert_eq!(ctx.explicit_settings_dir(), Some(dir.path()));
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let ctx = CliContext {
            config_path: Some(path.clone()),
            settings_dir: None,
        };
        // 显式指定但不存在
        assert!(ctx.load_config().is_err());

        let mut config = ArmConfig::default();
        config.probe.max_travel = 120.0;
        config.save_to_file(&path).unwrap();
        assert_eq!(ctx.load_config().unwrap().probe.max_travel, 120.0);
    }
}
