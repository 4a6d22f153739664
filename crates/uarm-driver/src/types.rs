//! 驱动层共享类型

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// 舵机编号（固件协议中的 servo id）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Servo {
    /// 底座
    Base = 0,
    /// 大臂（肩部）
    Shoulder = 1,
    /// 小臂（肘部）
    Elbow = 2,
    /// 腕部
    Wrist = 3,
}

impl Servo {
    pub const ALL: [Servo; 4] = [Servo::Base, Servo::Shoulder, Servo::Elbow, Servo::Wrist];
}

impl fmt::Display for Servo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Servo::Base => "base",
            Servo::Shoulder => "shoulder",
            Servo::Elbow => "elbow",
            Servo::Wrist => "wrist",
        };
        f.write_str(name)
    }
}

/// 舵机选择：单个或全部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoSelection {
    One(Servo),
    All,
}

impl From<Servo> for ServoSelection {
    fn from(servo: Servo) -> Self {
        ServoSelection::One(servo)
    }
}

/// 吸盘/夹爪的保持状态
///
/// 固件返回 0/1/2。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum HoldState {
    /// 关闭
    #[default]
    Off = 0,
    /// 开启，但没有吸住/夹住物体
    Empty = 1,
    /// 开启，并且正在保持物体
    Holding = 2,
}

impl HoldState {
    /// 工具处于开启状态（无论是否保持物体）
    pub fn is_active(&self) -> bool {
        !matches!(self, HoldState::Off)
    }
}

impl fmt::Display for HoldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HoldState::Off => "off",
            HoldState::Empty => "empty",
            HoldState::Holding => "holding",
        };
        f.write_str(name)
    }
}

/// 队列刷新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStatus {
    /// 所有命令已执行完毕（且电机已停止，如果请求了 wait_stop）
    Ok,
    /// 超时前未完成
    Timeout,
    /// 固件报告错误
    Error,
}

impl FlushStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, FlushStatus::Ok)
    }
}

/// 设备信息（连接时由固件报告）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// 设备型号，如 `SwiftPro`
    pub device_type: String,
    /// 固件版本，如 `4.5.0`
    pub firmware_version: String,
    pub hardware_version: String,
    /// 设备唯一标识（用作硬件设置的键）
    pub device_unique: Option<String>,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (firmware {}, hardware {}, id {})",
            self.device_type,
            self.firmware_version,
            self.hardware_version,
            self.device_unique.as_deref().unwrap_or("-")
        )
    }
}
