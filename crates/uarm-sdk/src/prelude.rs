//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use uarm_sdk::prelude::*;
//! ```

// 客户端层
pub use uarm_client::{OffsetTool, RecordOptions, Recorder, Swift, SwiftBuilder};

// 几何
pub use uarm_offset::{Position, Target};

// 驱动层
pub use uarm_driver::{SimulatedDriver, SwiftDriver};

// 配置
pub use uarm_tools::{ArmConfig, ToolMode};

// 错误类型
pub use uarm_client::SwiftError;
pub use uarm_driver::DriverError;
pub use uarm_offset::GeometryError;
