//! 错误类型体系
//!
//! 区分配置错误、运动错误、工具/状态错误与录制错误。驱动层、几何求解和持久化错误
//! 通过 `#[from]` 透传。
//!
//! # 示例
//!
//! ```rust
//! use uarm_client::SwiftError;
//!
//! fn handle_error(err: SwiftError) {
//!     if err.requires_rehome() {
//!         eprintln!("需要重新回零: {}", err);
//!     } else if err.is_hardware_fault() {
//!         eprintln!("硬件故障: {}", err);
//!     } else {
//!         eprintln!("错误: {}", err);
//!     }
//! }
//! ```

use thiserror::Error;
use uarm_driver::DriverError;
use uarm_offset::{GeometryError, Position};
use uarm_tools::ToolMode;

/// 机械臂操作错误
#[derive(Debug, Error)]
pub enum SwiftError {
    // ==================== Configuration Errors ====================
    /// 对模拟实例执行了只能在真实设备上执行的操作，或配置无效
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 设备型号、固件版本或唯一 ID 不符合要求
    #[error("Incompatible device: {0}")]
    IncompatibleDevice(String),

    /// 未知工具模式（名称或编号）
    #[error("Unknown tool mode: {0}")]
    UnknownMode(String),

    /// 参数无效
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter { param: String, reason: String },

    // ==================== Motion Errors ====================
    /// 目标超出工作空间
    #[error("Target {target} is outside the reachable envelope")]
    UnreachableTarget { target: Position },

    /// 等待到位超时
    #[error("Motion did not complete within {timeout_ms}ms")]
    MotionTimeout { timeout_ms: u64 },

    /// 到位后实际位置偏离预期（丢步）
    #[error("Detected {distance:.1}mm skipped: believed {believed}, actual {actual}")]
    PositionDivergence {
        distance: f64,
        believed: Position,
        actual: Position,
    },

    /// 探测超过最大行程仍未触发限位开关
    #[error("Probe travelled {travelled:.1}mm without pressing the limit switch")]
    ProbeLimit { travelled: f64 },

    /// 等待触摸超时
    #[error("No touch detected within {timeout_ms}ms")]
    TouchTimeout { timeout_ms: u64 },

    // ==================== Tool / State Errors ====================
    /// 工具在错误的模式下使用
    #[error("Tool requires mode '{required}', current mode is '{current}'")]
    ModeMismatch { required: ToolMode, current: ToolMode },

    /// 设置栈为空时执行 pop
    #[error("Cannot pop settings: none have been pushed")]
    StateUnderflow,

    // ==================== Recording Errors ====================
    #[error("Recording '{0}' already exists, use overwrite to replace it")]
    DuplicateRecording(String),

    #[error("Unknown recording '{0}'")]
    UnknownRecording(String),

    #[error("Recording captured {samples} samples, at least 3 are required")]
    RecordingTooShort { samples: usize },

    // ==================== Wrapped Errors ====================
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 设置或录制文件读写失败
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl SwiftError {
    /// 是否为硬件层面的故障
    pub fn is_hardware_fault(&self) -> bool {
        matches!(
            self,
            Self::Driver(_) | Self::MotionTimeout { .. } | Self::PositionDivergence { .. }
        )
    }

    /// 失败后机械臂位置不可信，需要重新回零
    pub fn requires_rehome(&self) -> bool {
        matches!(
            self,
            Self::PositionDivergence { .. } | Self::MotionTimeout { .. } | Self::ProbeLimit { .. }
        )
    }

    /// 是否为配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::IncompatibleDevice(_)
                | Self::UnknownMode(_)
                | Self::InvalidParameter { .. }
        )
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, SwiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let skip = SwiftError::PositionDivergence {
            distance: 2.0,
            believed: Position::ZERO,
            actual: Position::new(2.0, 0.0, 0.0),
        };
        assert!(skip.is_hardware_fault());
        assert!(skip.requires_rehome());

        assert!(!SwiftError::StateUnderflow.is_hardware_fault());
        assert!(SwiftError::ProbeLimit { travelled: 200.0 }.requires_rehome());
        assert!(SwiftError::configuration("simulated").is_config_error());
        assert!(SwiftError::Driver(DriverError::Timeout).is_hardware_fault());
    }

    #[test]
    fn test_display() {
        let err = SwiftError::ModeMismatch {
            required: ToolMode::General,
            current: ToolMode::PenGripper,
        };
        assert_eq!(
            err.to_string(),
            "Tool requires mode 'general', current mode is 'pen_gripper'"
        );

        let storage: SwiftError = anyhow::anyhow!("disk full").into();
        assert_eq!(storage.to_string(), "disk full");
    }
}
