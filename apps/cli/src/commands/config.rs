//! 配置管理命令
//!
//! 查看、定位和生成机械臂配置文件（TOML）

use crate::CliContext;
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印当前生效的配置
    Show,

    /// 打印配置文件路径
    Path,

    /// 写入默认配置
    Init {
        /// 覆盖已有文件
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => Self::show(ctx),
            ConfigCommand::Path => Self::path(ctx),
            ConfigCommand::Init { force } => Self::init(ctx, force),
        }
    }

    fn show(ctx: &CliContext) -> Result<()> {
        let config = ctx.load_config()?;
        let content = toml::to_string_pretty(&config).context("序列化配置失败")?;
        print!("{}", content);
        Ok(())
    }

    fn path(ctx: &CliContext) -> Result<()> {
        match ctx.config_path() {
            Some(path) => {
                let state = if path.is_file() { "" } else { " (不存在，使用默认值)" };
                println!("{}{}", path.display(), state);
            },
            None => println!("(无法确定配置目录)"),
        }
        Ok(())
    }

    fn init(ctx: &CliContext, force: bool) -> Result<()> {
        let path = ctx
            .config_path()
            .ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
        if path.exists() && !force {
            let overwrite = inquire::Confirm::new(&format!("{} 已存在，是否覆盖?", path.display()))
                .with_default(false)
                .prompt()
                .context("读取用户输入失败")?;
            if !overwrite {
                println!("已取消");
                return Ok(());
            }
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建配置目录失败: {}", parent.display()))?;
        }
        uarm_sdk::ArmConfig::default().save_to_file(&path)?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }
}
