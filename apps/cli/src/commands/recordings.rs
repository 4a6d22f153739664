//! 录制管理命令

use crate::CliContext;
use anyhow::{Context, Result};
use clap::Subcommand;
use uarm_sdk::Recorder;
use uarm_sdk::tools::{ProcessedRecording, RecordingStore};

/// 录制管理命令
#[derive(Subcommand, Debug)]
pub enum RecordingsCommand {
    /// 列出所有录制
    List,

    /// 删除录制
    Erase {
        name: String,

        /// 不询问直接删除
        #[arg(short, long)]
        yes: bool,
    },

    /// 处理录制并打印运动段
    Process {
        name: String,

        /// 按方向变化过滤样本
        #[arg(short, long)]
        filter: bool,

        /// 过滤的最大角度（弧度）
        #[arg(long)]
        max_angle: Option<f64>,
    },

    /// 打印原始样本
    Show {
        name: String,

        /// 输出 JSON
        #[arg(long)]
        json: bool,
    },
}

impl RecordingsCommand {
    pub fn execute(self, ctx: &CliContext) -> Result<()> {
        let dir = ctx.settings_dir()?;
        let store = RecordingStore::in_directory(&dir)?;
        let config = ctx.load_config()?;
        let mut recorder = Recorder::new(store, config.recording);

        match self {
            RecordingsCommand::List => Self::list(&recorder),
            RecordingsCommand::Erase { name, yes } => Self::erase(&mut recorder, &name, yes),
            RecordingsCommand::Process {
                name,
                filter,
                max_angle,
            } => {
                let processed = recorder.process(&name, filter, max_angle)?;
                print_segments(&name, processed);
                Ok(())
            },
            RecordingsCommand::Show { name, json } => Self::show(&recorder, &name, json),
        }
    }

    fn list(recorder: &Recorder) -> Result<()> {
        if let Some(path) = recorder.store().path() {
            println!("录制文件: {}", path.display());
        }
        let names = recorder.names();
        if names.is_empty() {
            println!("(没有录制)");
            return Ok(());
        }
        for name in names {
            let Some(recording) = recorder.get(&name) else {
                continue;
            };
            println!(
                "  {:<20} {:>5} 样本 {:>8.3}s  模式 {}",
                name,
                recording.samples.len(),
                recording.time.duration,
                recording.hardware_settings.mode
            );
        }
        Ok(())
    }

    fn erase(recorder: &mut Recorder, name: &str, yes: bool) -> Result<()> {
        if !yes {
            let confirmed = inquire::Confirm::new(&format!("删除录制 '{}'?", name))
                .with_default(false)
                .prompt()
                .context("读取用户输入失败")?;
            if !confirmed {
                println!("已取消");
                return Ok(());
            }
        }
        if recorder.erase(name)? {
            println!("✅ 已删除 '{}'", name);
        } else {
            println!("⚠️  录制 '{}' 不存在", name);
        }
        Ok(())
    }

    fn show(recorder: &Recorder, name: &str, json: bool) -> Result<()> {
        let recording = recorder
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("录制 '{}' 不存在", name))?;
        if json {
            println!("{}", serde_json::to_string_pretty(recording)?);
            return Ok(());
        }
        println!(
            "'{}': {} 样本, {:.3}s, 设备 {}",
            name,
            recording.samples.len(),
            recording.time.duration,
            recording.hardware_settings.id
        );
        for sample in &recording.samples {
            println!("  {:>8.3}s  {}", sample.time, sample.position);
        }
        Ok(())
    }
}

fn print_segments(name: &str, processed: &ProcessedRecording) {
    println!("'{}': {} 运动段", name, processed.segments.len());
    for (i, segment) in processed.segments.iter().enumerate() {
        println!(
            "  #{:<3} {} -> {}  {:.3}mm  {:.3}s  {:.1}mm/s",
            i, segment.start, segment.end, segment.distance, segment.duration, segment.speed
        );
    }
}
