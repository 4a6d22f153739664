//! 工具模式
//!
//! 固件按工具模式切换坐标参考点，每个模式有固定的编号和相对 `general` 的偏移。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 工具模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolMode {
    /// 通用模式（吸盘）
    #[default]
    #[serde(rename = "general")]
    General,
    /// 激光雕刻
    #[serde(rename = "laser")]
    Laser,
    /// 3D 打印
    #[serde(rename = "3d_printer")]
    Printer3d,
    /// 笔/夹爪
    #[serde(rename = "pen_gripper")]
    PenGripper,
}

impl ToolMode {
    pub const ALL: [ToolMode; 4] = [
        ToolMode::General,
        ToolMode::Laser,
        ToolMode::Printer3d,
        ToolMode::PenGripper,
    ];

    /// 持久化与命令行使用的名称
    pub fn name(&self) -> &'static str {
        match self {
            ToolMode::General => "general",
            ToolMode::Laser => "laser",
            ToolMode::Printer3d => "3d_printer",
            ToolMode::PenGripper => "pen_gripper",
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 未知模式名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToolMode(pub String);

impl fmt::Display for UnknownToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tool mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownToolMode {}

impl FromStr for ToolMode {
    type Err = UnknownToolMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| UnknownToolMode(s.to_string()))
    }
}
