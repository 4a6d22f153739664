//! # uArm Tools - 共享数据结构和持久化
//!
//! **依赖原则**: 只依赖 `uarm-offset`，避免依赖 `uarm-client` 和 `uarm-driver`
//!
//! ## 包含模块
//!
//! - `config` - 机械臂配置（TOML，只读结构）
//! - `mode` - 工具模式
//! - `hardware` - 每台设备的校准数据（JSON 存储）
//! - `recording` - 示教录制格式与存储
//! - `filter` - 录制样本的方向过滤（纯函数）
//!
//! 持久化函数返回 `anyhow::Result`，错误信息带有文件路径上下文。

pub mod config;
pub mod filter;
pub mod hardware;
pub mod mode;
pub mod recording;

// 重新导出常用类型
pub use config::{ArmConfig, Joint, JointAngles, ModeSpec, ModeTable};
pub use filter::{DEFAULT_MAX_ANGLE, filter_samples};
pub use hardware::{
    HARDWARE_SETTINGS_FILE_NAME, HardwareSettings, HardwareSettingsStore, SIMULATE_ID,
    default_settings_directory,
};
pub use mode::{ToolMode, UnknownToolMode};
pub use recording::{
    CaptureTime, PositionSample, ProcessedRecording, RECORDINGS_FILE_NAME, Recording,
    RecordingStore, Segment, segments_from_samples,
};
