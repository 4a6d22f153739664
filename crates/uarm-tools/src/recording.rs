//! # 录制格式定义
//!
//! 示教录制的原始样本、采集时间、处理后的分段数据，以及按名称保存的 JSON 存储。
//!
//! 文件结构（`uarm_recordings.json`）：
//!
//! ```text
//! {
//!   "<name>": {
//!     "samples": [{"time": 0.0, "position": {"x": .., "y": .., "z": ..}}, ...],
//!     "time": {"start": .., "end": .., "duration": ..},
//!     "hardware_settings": {...}
//!   }
//! }
//! ```

use crate::filter::filter_samples;
use crate::hardware::HardwareSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uarm_offset::Position;

/// 录制文件名
pub const RECORDINGS_FILE_NAME: &str = "uarm_recordings.json";

/// 计算速度时使用的最小分段时长（秒）
pub const MIN_SEGMENT_DURATION: f64 = 0.001;

/// 带时间戳的位置样本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// 相对录制开始的秒数（3 位小数）
    pub time: f64,
    pub position: Position,
}

/// 采集时间（unix 秒）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CaptureTime {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

impl CaptureTime {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            duration: round3(end - start),
        }
    }
}

/// 原始录制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub samples: Vec<PositionSample>,
    pub time: CaptureTime,
    #[serde(default)]
    pub hardware_settings: HardwareSettings,
}

/// 两个相邻样本之间的运动段
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Position,
    pub end: Position,
    /// 秒
    pub duration: f64,
    /// 毫米
    pub distance: f64,
    /// mm/s
    pub speed: f64,
}

/// 处理后的录制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecording {
    pub segments: Vec<Segment>,
    pub time: CaptureTime,
    pub hardware_settings: HardwareSettings,
}

impl Recording {
    /// 计算分段数据
    ///
    /// `filter` 为 `Some(max_angle)` 时先按方向变化过滤样本。
    pub fn process(&self, filter: Option<f64>) -> ProcessedRecording {
        let segments = match filter {
            Some(max_angle) => segments_from_samples(&filter_samples(&self.samples, max_angle)),
            None => segments_from_samples(&self.samples),
        };
        ProcessedRecording {
            segments,
            time: self.time,
            hardware_settings: self.hardware_settings.clone(),
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// 由样本序列生成运动段，跳过距离为 0 的样本
pub fn segments_from_samples(samples: &[PositionSample]) -> Vec<Segment> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut prev = first;
    for sample in samples {
        let distance = round3(prev.position.distance_to(&sample.position));
        if distance == 0.0 {
            continue;
        }
        let duration = round3(sample.time - prev.time);
        let speed = round3(distance / duration.max(MIN_SEGMENT_DURATION));
        segments.push(Segment {
            start: prev.position,
            end: sample.position,
            duration,
            distance,
            speed,
        });
        prev = sample;
    }
    segments
}

/// 录制存储（按名称）
///
/// 文件损坏时记录警告并视为空存储，下一次保存会覆盖它。
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    path: Option<PathBuf>,
    recordings: BTreeMap<String, Recording>,
}

impl RecordingStore {
    /// 仅内存存储
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// 打开目录下的录制文件（目录必须存在）
    pub fn in_directory<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            anyhow::bail!("不是目录: {}", dir.display());
        }
        Self::open(dir.join(RECORDINGS_FILE_NAME))
    }

    /// 打开录制文件，不存在时创建空文件
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            fs::write(&path, "{}\n")
                .with_context(|| format!("创建录制文件失败: {}", path.display()))?;
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("读取录制文件失败: {}", path.display()))?;
        let recordings = match serde_json::from_str(&content) {
            Ok(recordings) => recordings,
            Err(e) => {
                warn!("Failed to parse recordings file {}, treating as empty: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Ok(Self {
            path: Some(path),
            recordings,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.recordings.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Recording> {
        self.recordings.get(name)
    }

    /// 所有录制名称（有序）
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.recordings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Recording)> {
        self.recordings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    /// 保存录制（覆盖同名录制）并重写文件
    pub fn insert(&mut self, name: impl Into<String>, recording: Recording) -> Result<()> {
        let name = name.into();
        debug!("Saving recording '{}' ({} samples)", name, recording.samples.len());
        self.recordings.insert(name, recording);
        self.flush()
    }

    /// 删除录制，返回是否存在
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        if self.recordings.remove(name).is_none() {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.recordings).context("序列化录制失败")?;
        fs::write(path, json + "\n")
            .with_context(|| format!("写入录制文件失败: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(time: f64, x: f64, y: f64, z: f64) -> PositionSample {
        PositionSample {
            time,
            position: Position::new(x, y, z),
        }
    }

    fn recording(samples: Vec<PositionSample>) -> Recording {
        Recording {
            samples,
            time: CaptureTime::new(1_700_000_000.0, 1_700_000_002.5),
            hardware_settings: HardwareSettings::default(),
        }
    }

    #[test]
    fn test_segments_skip_zero_distance() {
        let samples = vec![
            sample(0.0, 150.0, 0.0, 40.0),
            sample(0.5, 150.0, 0.0, 40.0),
            sample(1.0, 160.0, 0.0, 40.0),
            sample(2.0, 160.0, 0.0, 40.0),
            sample(3.0, 160.0, 0.0, 60.0),
        ];
        let segments = segments_from_samples(&samples);
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].start, Position::new(150.0, 0.0, 40.0));
        assert_eq!(segments[0].end, Position::new(160.0, 0.0, 40.0));
        assert_eq!(segments[0].duration, 1.0);
        assert_eq!(segments[0].distance, 10.0);
        assert_eq!(segments[0].speed, 10.0);

        assert_eq!(segments[1].duration, 2.0);
        assert_eq!(segments[1].speed, 10.0);
    }

    #[test]
    fn test_zero_duration_segment_has_finite_speed() {
        let samples = vec![sample(0.0, 0.0, 0.0, 0.0), sample(0.0, 1.0, 0.0, 0.0)];
        let segments = segments_from_samples(&samples);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].speed.is_finite());
        assert_eq!(segments[0].speed, 1000.0);
    }

    #[test]
    fn test_process_with_filter() {
        let samples: Vec<_> = (0..6)
            .map(|i| sample(i as f64, 100.0 + i as f64 * 10.0, 0.0, 0.0))
            .collect();
        let rec = recording(samples);
        assert_eq!(rec.process(None).segments.len(), 5);

        let filtered = rec.process(Some(crate::filter::DEFAULT_MAX_ANGLE));
        assert_eq!(filtered.segments.len(), 1);
        assert_eq!(filtered.segments[0].distance, 50.0);
        assert_eq!(filtered.segments[0].speed, 10.0);
    }

    #[test]
    fn test_capture_time() {
        let time = CaptureTime::new(10.0, 12.3456);
        assert_eq!(time.duration, 2.346);
    }

    #[test]
    fn test_store_persists_and_erases() {
        let dir = TempDir::new().unwrap();
        let mut store = RecordingStore::in_directory(dir.path()).unwrap();
        assert!(store.is_empty());

        let rec = recording(vec![sample(0.0, 1.0, 2.0, 3.0), sample(1.0, 2.0, 2.0, 3.0)]);
        store.insert("wave", rec.clone()).unwrap();

        let reopened = RecordingStore::in_directory(dir.path()).unwrap();
        assert_eq!(reopened.get("wave"), Some(&rec));
        assert_eq!(reopened.names().collect::<Vec<_>>(), vec!["wave"]);

        let mut store = reopened;
        assert!(store.remove("wave").unwrap());
        assert!(!store.remove("wave").unwrap());
        let reopened = RecordingStore::in_directory(dir.path()).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RECORDINGS_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let store = RecordingStore::open(&path).unwrap();
        assert!(store.is_empty());
    }
}
