//! 模拟移动命令
//!
//! 在模拟设备上依次执行移动，打印每一步后的预期位置。

use crate::CliContext;
use anyhow::Result;
use clap::Args;
use uarm_sdk::prelude::*;

/// 解析 `x,y,z` 坐标
pub fn parse_position(s: &str) -> std::result::Result<Position, String> {
    let parts: Vec<_> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got '{}'", s));
    }
    let mut values = [0.0; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{}': {}", part, e))?;
    }
    Ok(Position::from(values))
}

/// 模拟命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 绝对目标（可重复）
    #[arg(long = "to", value_parser = parse_position)]
    pub targets: Vec<Position>,

    /// 相对移动（可重复，在所有绝对目标之后执行）
    #[arg(long = "by", value_parser = parse_position)]
    pub deltas: Vec<Position>,

    /// 速度（mm/s）
    #[arg(long)]
    pub speed: Option<f64>,

    /// 工具模式（general, laser, 3d_printer, pen_gripper）
    #[arg(long)]
    pub mode: Option<String>,

    /// 先回零
    #[arg(long)]
    pub home: bool,

    /// 结束后进入休眠（回零并关闭电机）
    #[arg(long)]
    pub sleep: bool,
}

impl SimulateCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let mut builder = SwiftBuilder::new().config(ctx.load_config()?);
        if let Some(dir) = ctx.explicit_settings_dir() {
            builder = builder.settings_dir(dir);
        }
        let mut swift = builder.simulate()?;
        println!("🤖 模拟设备: {}", swift.position());

        if let Some(mode) = &self.mode {
            swift.tool_mode_by_name(mode)?;
            println!("  模式: {}", swift.tool_mode_name());
        }
        if let Some(speed) = self.speed {
            swift.speed(speed);
        }
        if self.home {
            swift.home()?;
            println!("  回零 -> {}", swift.position());
        }

        for target in &self.targets {
            swift
                .move_to(Target::from(*target), true)?
                .wait_for_arrival(None, true)?;
            println!("  移动 -> {}", swift.position());
        }
        for delta in &self.deltas {
            swift
                .move_relative(Target::from(*delta), true)?
                .wait_for_arrival(None, true)?;
            println!("  相对 {} -> {}", delta, swift.position());
        }

        if self.sleep {
            swift.sleep()?;
            println!("  休眠 -> {}", swift.position());
        }
        println!("✅ 完成 (速度 {} mm/s)", swift.current_speed());
        Ok(())
    }
}
