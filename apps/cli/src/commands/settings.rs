//! 硬件设置命令

use crate::CliContext;
use anyhow::Result;
use clap::Subcommand;
use uarm_sdk::tools::HardwareSettingsStore;

/// 硬件设置命令
#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// 列出所有设备的校准数据
    Show {
        /// 只显示指定设备
        id: Option<String>,

        /// 输出 JSON
        #[arg(long)]
        json: bool,
    },
}

impl SettingsCommand {
    pub fn execute(self, ctx: &CliContext) -> Result<()> {
        match self {
            SettingsCommand::Show { id, json } => Self::show(ctx, id.as_deref(), json),
        }
    }

    fn show(ctx: &CliContext, id: Option<&str>, json: bool) -> Result<()> {
        let dir = ctx.settings_dir()?;
        let config = ctx.load_config()?;
        let store = HardwareSettingsStore::in_directory(&dir, config.default_mode)?;
        let entries: Vec<_> = store
            .load_all()
            .values()
            .filter(|s| id.is_none_or(|id| s.id == id))
            .collect();

        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if let Some(path) = store.path() {
            println!("设置文件: {}", path.display());
        }
        if entries.is_empty() {
            println!("(没有匹配的设备)");
            return Ok(());
        }
        for settings in entries {
            println!("{}", settings.id);
            println!("  模式: {}", settings.mode);
            println!("  Z 偏差: {:.3} mm", settings.z_offset);
            println!("  腕部偏差: {:.3}°", settings.wrist_offset);
            if let Some(angles) = &settings.home_angles {
                println!(
                    "  回零角度: base={} shoulder={} elbow={}",
                    angles.base, angles.shoulder, angles.elbow
                );
            }
        }
        Ok(())
    }
}
