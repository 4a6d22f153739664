//! uArm SDK - uArm Swift Pro 桌面机械臂主机侧控制
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **几何层** (`offset`): 坐标、极坐标换算、工具偏移正/逆解
//! - **驱动层** (`driver`): `SwiftDriver` trait、模拟驱动、Mock 驱动
//! - **工具层** (`tools`): 配置、工具模式、硬件设置与录制的持久化
//! - **客户端层** (`client`): 设备状态封装、附件、录制器
//!
//! # 快速开始
//!
//! ```rust
//! use uarm_sdk::prelude::*;
//!
//! # fn main() -> Result<(), SwiftError> {
//! let mut swift = SwiftBuilder::new().simulate()?;
//! swift.move_to(Target::new().x(180.0).y(40.0), true)?;
//! assert_eq!(swift.position(), Position::new(180.0, 40.0, 30.0));
//! # Ok(())
//! # }
//! ```

pub use uarm_client as client;
pub use uarm_driver as driver;
pub use uarm_offset as offset;
pub use uarm_tools as tools;

pub mod prelude;

pub use uarm_client::{
    OffsetTool, RecordOptions, Recorder, Swift, SwiftBuilder, SwiftError,
};
pub use uarm_driver::{DriverError, SimulatedDriver, SwiftDriver};
pub use uarm_offset::{GeometryError, Position, Target};
pub use uarm_tools::{ArmConfig, ToolMode};

/// 初始化日志
///
/// `RUST_LOG` 优先，未设置时使用 `default_directive`（如 `"uarm_client=info"`）。
/// 同时把 `log` crate 的记录桥接到 tracing。重复调用返回错误而不是 panic。
pub fn init_logging(default_directive: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;
    tracing_log::LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
