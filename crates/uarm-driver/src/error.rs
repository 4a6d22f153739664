//! 驱动层错误类型定义

use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口 IO 错误
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 等待回复超时
    #[error("Operation timeout")]
    Timeout,

    /// 串口未连接
    #[error("Device not connected")]
    NotConnected,

    /// 回复无法解析（固件返回了意外内容）
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 当前驱动不支持该操作
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl DriverError {
    /// 瞬时错误：重试或忽略本次读数即可
    pub fn is_transient(&self) -> bool {
        matches!(self, DriverError::Timeout | DriverError::Protocol(_))
    }

    pub(crate) fn unsupported(operation: &str) -> Self {
        DriverError::Unsupported(operation.to_string())
    }
}
