//! 示教录制与回放
//!
//! 录制期间电机断电，用户手动拖动机械臂，[`Recorder`] 按固定间隔采样位置。
//! 录制结束后保存原始样本并生成运动段；回放时按段下发绝对坐标。
//!
//! # 使用示例
//!
//! ```rust
//! use uarm_client::{RecordOptions, Recorder, SwiftBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut swift = SwiftBuilder::new().simulate()?;
//! let mut recorder = Recorder::for_device(&swift)?;
//!
//! // 采集 5 个样本后停止
//! recorder.record(&mut swift, "demo", RecordOptions::default(), |history, _moving| {
//!     history.len() < 5
//! })?;
//! recorder.playback(&mut swift, "demo", true, None, true)?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SwiftError};
use crate::swift::Swift;
use std::collections::BTreeMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use uarm_driver::SwiftDriver;
use uarm_offset::{Position, Target};
use uarm_tools::config::RecordingConfig;
use uarm_tools::{CaptureTime, PositionSample, ProcessedRecording, Recording, RecordingStore};

/// 可以保存的最少样本数
pub const MIN_RECORDING_SAMPLES: usize = 3;

/// 单次录制的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordOptions {
    /// 覆盖同名录制
    pub overwrite: bool,
    /// 位置不可达时停止录制
    pub check: bool,
    /// 静止判定窗口（秒），也是开始后的宽限期
    pub still_seconds: f64,
    /// 窗口内累计移动距离阈值（mm）
    pub still_distance: f64,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            check: true,
            still_seconds: 1.0,
            still_distance: 1.0,
        }
    }
}

impl RecordOptions {
    /// 使用配置中的静止判定参数
    pub fn from_config(config: &RecordingConfig) -> Self {
        Self {
            still_seconds: config.still_seconds,
            still_distance: config.still_distance,
            ..Self::default()
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}

/// 机械臂是否仍在被拖动
///
/// 宽限期内总是返回 `true`；之后对最近 `still_seconds` 内的样本累计相邻距离。
pub fn is_moving(
    samples: &[PositionSample],
    elapsed: f64,
    still_seconds: f64,
    still_distance: f64,
) -> bool {
    if elapsed < still_seconds {
        return true;
    }
    let Some(last) = samples.last() else {
        return true;
    };
    let window_start = last.time - still_seconds;
    let window: Vec<_> = samples.iter().filter(|s| s.time >= window_start).collect();
    let travelled: f64 = window
        .windows(2)
        .map(|pair| pair[0].position.distance_to(&pair[1].position))
        .sum();
    travelled > still_distance
}

/// 录制管理器
///
/// 持有录制存储和处理结果的缓存。与设备分离，录制和回放时借用设备。
#[derive(Debug)]
pub struct Recorder {
    store: RecordingStore,
    processed: BTreeMap<String, ProcessedRecording>,
    config: RecordingConfig,
}

impl Recorder {
    /// 加载已有录制（未过滤处理）
    pub fn new(store: RecordingStore, config: RecordingConfig) -> Self {
        let processed = store
            .iter()
            .map(|(name, recording)| (name.to_string(), recording.process(None)))
            .collect();
        Self {
            store,
            processed,
            config,
        }
    }

    /// 仅内存存储
    pub fn in_memory(config: RecordingConfig) -> Self {
        Self::new(RecordingStore::in_memory(), config)
    }

    /// 使用设备的设置目录（没有设置目录时使用内存存储）
    pub fn for_device<D: SwiftDriver>(device: &Swift<D>) -> Result<Self> {
        let store = match device.settings_dir() {
            Some(dir) => RecordingStore::in_directory(dir)?,
            None => RecordingStore::in_memory(),
        };
        Ok(Self::new(store, device.config().recording.clone()))
    }

    /// 录制一段示教轨迹
    ///
    /// `method(history, is_moving)` 返回 `false` 时停止。每次返回 `true` 追加一个样本，
    /// 所以至少需要返回两次 `true`。
    ///
    /// # Errors
    /// - `SwiftError::DuplicateRecording`: 同名录制已存在且未设置 `overwrite`
    /// - `SwiftError::RecordingTooShort`: 样本少于 3 个（不会保存）
    pub fn record<D, F>(
        &mut self,
        device: &mut Swift<D>,
        name: &str,
        options: RecordOptions,
        mut method: F,
    ) -> Result<&ProcessedRecording>
    where
        D: SwiftDriver,
        F: FnMut(&[PositionSample], bool) -> bool,
    {
        debug!("record: {}", name);
        if self.store.contains(name) && !options.overwrite {
            return Err(SwiftError::DuplicateRecording(name.to_string()));
        }

        device.disable_all_motors()?;
        let started = Instant::now();
        let start_time = unix_now();
        let poll = self.config.poll_interval();

        device.update_position(false)?;
        let mut samples = vec![PositionSample {
            time: 0.0,
            position: device.position(),
        }];

        loop {
            let elapsed = started.elapsed().as_secs_f64();
            let moving = is_moving(
                &samples,
                elapsed,
                options.still_seconds,
                options.still_distance,
            );
            if !method(&samples, moving) {
                break;
            }
            device.update_position(false)?;
            let position = device.position();
            if options.check && !device.can_move_to(position.into())? {
                info!("Position {} is out of bounds, recording stopped", position);
                break;
            }
            samples.push(PositionSample {
                time: round3(started.elapsed().as_secs_f64()),
                position,
            });
            spin_sleep::sleep(poll);
        }

        if samples.len() < MIN_RECORDING_SAMPLES {
            return Err(SwiftError::RecordingTooShort {
                samples: samples.len(),
            });
        }

        let recording = Recording {
            samples,
            time: CaptureTime::new(start_time, unix_now()),
            hardware_settings: device.hardware_settings().clone(),
        };
        info!(
            "Recorded '{}': {} samples over {:.3}s",
            name,
            recording.samples.len(),
            recording.time.duration
        );
        let processed = recording.process(None);
        self.store.insert(name, recording)?;
        self.processed.insert(name.to_string(), processed);
        self.processed
            .get(name)
            .ok_or_else(|| SwiftError::UnknownRecording(name.to_string()))
    }

    /// 录制直到机械臂静止
    pub fn record_until_still<D: SwiftDriver>(
        &mut self,
        device: &mut Swift<D>,
        name: &str,
        options: RecordOptions,
    ) -> Result<&ProcessedRecording> {
        self.record(device, name, options, |_, moving| moving)
    }

    /// 重新处理录制
    ///
    /// `filter` 为 `true` 时按方向变化过滤样本，`max_angle` 默认取配置值。
    pub fn process(
        &mut self,
        name: &str,
        filter: bool,
        max_angle: Option<f64>,
    ) -> Result<&ProcessedRecording> {
        let recording = self
            .store
            .get(name)
            .ok_or_else(|| SwiftError::UnknownRecording(name.to_string()))?;
        let max_angle = max_angle.unwrap_or(self.config.filter_max_angle);
        let processed = recording.process(filter.then_some(max_angle));
        debug!(
            "Processed '{}' (filter={}): {} segments",
            name,
            filter,
            processed.segments.len()
        );
        self.processed.insert(name.to_string(), processed);
        self.processed
            .get(name)
            .ok_or_else(|| SwiftError::UnknownRecording(name.to_string()))
    }

    /// 回放录制
    ///
    /// - `relative`: 整体平移到设备当前位置
    /// - `speed`: 固定速度（mm/s），`None` 时使用每段录制时的速度
    pub fn playback<D: SwiftDriver>(
        &self,
        device: &mut Swift<D>,
        name: &str,
        relative: bool,
        speed: Option<f64>,
        check: bool,
    ) -> Result<()> {
        debug!("playback: {}", name);
        let processed = self
            .processed
            .get(name)
            .ok_or_else(|| SwiftError::UnknownRecording(name.to_string()))?;
        let Some(first) = processed.segments.first() else {
            debug!("Recording '{}' has no segments, nothing to play", name);
            return Ok(());
        };

        let translation = if relative {
            device.update_position(false)?;
            device.position() - first.start
        } else {
            Position::ZERO
        };

        device.push_settings();
        let played = (|| -> Result<()> {
            device
                .move_to(Target::from(first.start + translation), check)?
                .wait_for_arrival(None, check)?;
            if let Some(speed) = speed {
                device.speed(speed);
            }
            for segment in &processed.segments {
                if speed.is_none() {
                    device.speed(segment.speed);
                }
                device.move_to(Target::from(segment.end + translation), check)?;
            }
            device.wait_for_arrival(None, check)?;
            Ok(())
        })();
        // 出错时也恢复速度设置
        device.pop_settings()?;
        played?;
        info!("Played back '{}' ({} segments)", name, processed.segments.len());
        Ok(())
    }

    /// 删除录制，返回是否存在
    pub fn erase(&mut self, name: &str) -> Result<bool> {
        self.processed.remove(name);
        Ok(self.store.remove(name)?)
    }

    /// 所有录制名称
    pub fn names(&self) -> Vec<String> {
        self.store.names().map(str::to_string).collect()
    }

    /// 原始录制
    pub fn get(&self, name: &str) -> Option<&Recording> {
        self.store.get(name)
    }

    /// 最近一次处理结果
    pub fn processed(&self, name: &str) -> Option<&ProcessedRecording> {
        self.processed.get(name)
    }

    pub fn store(&self) -> &RecordingStore {
        &self.store
    }
}
