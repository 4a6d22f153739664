//! # 机械臂配置
//!
//! 模式表、速度/加速度范围、回零参数、探测与触摸检测参数等不可变配置。
//!
//! 所有字段都有内置默认值，TOML 文件只需覆盖需要修改的部分：
//!
//! ```toml
//! [motion]
//! default_speed = 100.0
//!
//! [home]
//! angles = { base = 90.0, shoulder = 115.0, elbow = 52.0 }
//! ```

use crate::mode::ToolMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uarm_offset::Position;

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// 机械臂配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    pub default_mode: ToolMode,
    pub device: DeviceConfig,
    pub modes: ModeTable,
    pub motion: MotionConfig,
    pub wrist: WristConfig,
    pub tools: ToolTiming,
    pub home: HomeConfig,
    pub probe: ProbeConfig,
    pub touch: TouchConfig,
    pub timeouts: TimeoutConfig,
    pub recording: RecordingConfig,
    pub attachments: AttachmentConfig,
}

impl ArmConfig {
    /// 默认配置文件路径
    ///
    /// - Linux: `~/.config/uarm/config.toml`
    /// - macOS: `~/Library/Application Support/uarm/config.toml`
    /// - Windows: `%APPDATA%\uarm\config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("uarm").join(CONFIG_FILE_NAME))
    }

    /// 从 TOML 文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: ArmConfig = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存为 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, content)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        Ok(())
    }

    /// 检查范围参数的一致性
    pub fn validate(&self) -> Result<()> {
        let m = &self.motion;
        if !(m.min_speed > 0.0 && m.min_speed <= m.default_speed && m.default_speed <= m.max_speed)
        {
            anyhow::bail!(
                "速度范围无效: min={} default={} max={}",
                m.min_speed,
                m.default_speed,
                m.max_speed
            );
        }
        if !(m.min_acceleration > 0.0
            && m.min_acceleration <= m.default_acceleration
            && m.default_acceleration <= m.max_acceleration)
        {
            anyhow::bail!(
                "加速度范围无效: min={} default={} max={}",
                m.min_acceleration,
                m.default_acceleration,
                m.max_acceleration
            );
        }
        let w = &self.wrist;
        if !(w.min <= w.default && w.default <= w.max) {
            anyhow::bail!("腕部角度范围无效: min={} default={} max={}", w.min, w.default, w.max);
        }
        if self.probe.step <= 0.0 || self.probe.max_travel <= 0.0 {
            anyhow::bail!("探测步长和最大行程必须为正数");
        }
        if self.recording.poll_interval_ms == 0 {
            anyhow::bail!("录制采样间隔不能为 0");
        }
        Ok(())
    }
}

/// 期望的设备型号与固件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub device_type: String,
    /// semver 版本要求
    pub firmware: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: "SwiftPro".to_string(),
            firmware: "=4.5.0".to_string(),
        }
    }
}

/// 单个模式的编号与偏移
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeSpec {
    /// 固件模式编号
    pub code: u8,
    /// 相对 `general` 参考点的偏移
    pub offset: Position,
}

/// 模式表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTable {
    pub general: ModeSpec,
    pub laser: ModeSpec,
    #[serde(rename = "3d_printer")]
    pub printer_3d: ModeSpec,
    pub pen_gripper: ModeSpec,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            general: ModeSpec {
                code: 0,
                offset: Position::ZERO,
            },
            laser: ModeSpec {
                code: 1,
                offset: Position::new(7.75, 0.0, 23.51),
            },
            printer_3d: ModeSpec {
                code: 2,
                offset: Position::new(-0.15, 0.0, 0.12),
            },
            pen_gripper: ModeSpec {
                code: 3,
                offset: Position::new(12.85, 0.0, 31.55),
            },
        }
    }
}

impl ModeTable {
    pub fn get(&self, mode: ToolMode) -> &ModeSpec {
        match mode {
            ToolMode::General => &self.general,
            ToolMode::Laser => &self.laser,
            ToolMode::Printer3d => &self.printer_3d,
            ToolMode::PenGripper => &self.pen_gripper,
        }
    }

    /// 根据固件编号查找模式
    pub fn mode_for_code(&self, code: u8) -> Option<ToolMode> {
        ToolMode::ALL.into_iter().find(|mode| self.get(*mode).code == code)
    }
}

/// 速度与加速度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// mm/s
    pub min_speed: f64,
    pub max_speed: f64,
    pub default_speed: f64,
    pub min_acceleration: f64,
    pub max_acceleration: f64,
    pub default_acceleration: f64,
    /// 固件速度系数（使 mm/s 接近真实值）
    pub speed_factor: f64,
    /// 到位后实际位置与预期位置的最大允许偏差（mm），超过视为丢步
    pub skip_threshold: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            min_speed: 1.0,
            max_speed: 600.0,
            default_speed: 150.0,
            min_acceleration: 0.01,
            max_acceleration: 50.0,
            default_acceleration: 5.0,
            speed_factor: 0.007,
            skip_threshold: 1.5,
        }
    }
}

/// 腕部舵机
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WristConfig {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub settle_ms: u64,
}

impl Default for WristConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 180.0,
            default: 90.0,
            settle_ms: 250,
        }
    }
}

impl WristConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// 吸盘与夹爪的动作等待时间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolTiming {
    pub pump_on_ms: u64,
    pub pump_off_ms: u64,
    pub grip_on_ms: u64,
    pub grip_off_ms: u64,
}

impl Default for ToolTiming {
    fn default() -> Self {
        Self {
            pump_on_ms: 200,
            pump_off_ms: 200,
            grip_on_ms: 0,
            grip_off_ms: 2000,
        }
    }
}

impl ToolTiming {
    pub fn pump(&self, enable: bool) -> Duration {
        Duration::from_millis(if enable { self.pump_on_ms } else { self.pump_off_ms })
    }

    pub fn grip(&self, enable: bool) -> Duration {
        Duration::from_millis(if enable { self.grip_on_ms } else { self.grip_off_ms })
    }
}

/// 回零时参与的关节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Joint {
    Base,
    Shoulder,
    Elbow,
}

/// 回零关节角度（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub base: f64,
    pub shoulder: f64,
    pub elbow: f64,
}

impl JointAngles {
    pub fn get(&self, joint: Joint) -> f64 {
        match joint {
            Joint::Base => self.base,
            Joint::Shoulder => self.shoulder,
            Joint::Elbow => self.elbow,
        }
    }
}

impl Default for JointAngles {
    fn default() -> Self {
        Self {
            base: 90.0,
            shoulder: 118.0,
            elbow: 50.0,
        }
    }
}

/// 回零参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    pub speed: f64,
    pub acceleration: f64,
    pub order: Vec<Joint>,
    pub settle_ms: u64,
    /// 先移动到的已知绝对位置
    pub start: Position,
    pub angles: JointAngles,
    /// 模拟模式下的回零位置
    pub simulate_position: Position,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            speed: 200.0,
            acceleration: 1.3,
            order: vec![Joint::Base, Joint::Shoulder, Joint::Elbow],
            settle_ms: 250,
            start: Position::new(200.0, 0.0, 150.0),
            angles: JointAngles::default(),
            simulate_position: Position::new(120.0, 0.0, 30.0),
        }
    }
}

impl HomeConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// 向下探测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// 每步下降距离（mm）
    pub step: f64,
    /// mm/s
    pub speed: f64,
    /// 最大下降距离（mm）
    pub max_travel: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            step: 1.0,
            speed: 10.0,
            max_travel: 200.0,
        }
    }
}

/// 触摸检测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchConfig {
    /// 触发距离（mm，XY 平面）
    pub threshold: f64,
    pub poll_interval_ms: u64,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            poll_interval_ms: 20,
        }
    }
}

impl TouchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// 等待超时
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub ready_ms: u64,
    pub arrival_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            ready_ms: 3000,
            arrival_ms: 10_000,
        }
    }
}

impl TimeoutConfig {
    pub fn ready(&self) -> Duration {
        Duration::from_millis(self.ready_ms)
    }

    pub fn arrival(&self) -> Duration {
        Duration::from_millis(self.arrival_ms)
    }
}

/// 录制参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// 静止判定窗口（秒），同时也是开始录制后的宽限期
    pub still_seconds: f64,
    /// 窗口内累计移动距离低于该值（mm）视为静止
    pub still_distance: f64,
    /// 方向过滤的默认最大角度（弧度）
    pub filter_max_angle: f64,
    pub poll_interval_ms: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            still_seconds: 1.0,
            still_distance: 1.0,
            filter_max_angle: std::f64::consts::PI / 16.0,
            poll_interval_ms: 20,
        }
    }
}

impl RecordingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// 附件在 `general` 模式下测得的偏移
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    /// 吸盘吸嘴
    pub pump: Position,
    /// 标准支架上的摄像头镜头
    pub camera: Position,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            pump: Position::ZERO,
            camera: Position::new(69.35, 14.75, 37.2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_mode_table() {
        let config = ArmConfig::default();
        assert_eq!(config.modes.get(ToolMode::PenGripper).code, 3);
        assert_eq!(
            config.modes.get(ToolMode::Laser).offset,
            Position::new(7.75, 0.0, 23.51)
        );
        assert_eq!(config.modes.mode_for_code(2), Some(ToolMode::Printer3d));
        assert_eq!(config.modes.mode_for_code(9), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
            [motion]
            default_speed = 100.0

            [home]
            angles = { base = 90.0, shoulder = 115.0, elbow = 52.0 }
        "#;
        let config: ArmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.motion.default_speed, 100.0);
        assert_eq!(config.motion.max_speed, 600.0);
        assert_eq!(config.home.angles.shoulder, 115.0);
        assert_eq!(config.home.order.len(), 3);
        assert_eq!(config.device.device_type, "SwiftPro");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = ArmConfig::default();
        config.probe.max_travel = 80.0;
        config.default_mode = ToolMode::PenGripper;
        config.save_to_file(&path).unwrap();

        let loaded = ArmConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_device_section_ignores_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[device]\nfirmware = \">=4.5.0\"\nusb_hwid = \"2341:0042\"\n",
        )
        .unwrap();

        let loaded = ArmConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.device.firmware, ">=4.5.0");
        assert_eq!(loaded.device.device_type, "SwiftPro");

        // 重新保存后只包含已知字段
        loaded.save_to_file(&path).unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("usb_hwid"));
    }

    #[test]
    fn test_invalid_speed_range_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[motion]\ndefault_speed = 900.0\n").unwrap();

        let err = ArmConfig::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("速度范围无效"), "{}", err);
    }

    #[test]
    fn test_tool_timing() {
        let timing = ToolTiming::default();
        assert_eq!(timing.pump(true), Duration::from_millis(200));
        assert_eq!(timing.grip(true), Duration::ZERO);
        assert_eq!(timing.grip(false), Duration::from_secs(2));
    }
}
