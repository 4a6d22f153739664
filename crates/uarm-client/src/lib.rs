//! # uArm Client - 设备状态封装
//!
//! 在 [`SwiftDriver`](uarm_driver::SwiftDriver) 之上维护主机侧状态：
//!
//! - [`Swift`] - 预期位置、电机使能、腕部角度、工具模式、速度设置栈、校准数据
//! - [`SwiftBuilder`] - 注入配置与设置目录，连接真实设备或创建模拟实例
//! - [`OffsetTool`] - 带偏移的工具附件（吸盘、摄像头）
//! - [`Recorder`] - 示教录制、处理与回放
//!
//! 所有操作都是阻塞的，通过 `&mut self` 串行执行。需要跨线程共享时由调用方加锁。
//!
//! # 示例
//!
//! ```rust
//! use uarm_client::SwiftBuilder;
//! use uarm_offset::Target;
//!
//! # fn main() -> Result<(), uarm_client::SwiftError> {
//! let mut swift = SwiftBuilder::new().simulate()?;
//! swift
//!     .speed(100.0)
//!     .move_to(Target::new().x(200.0).z(50.0), true)?
//!     .wait_for_arrival(None, true)?;
//! swift.sleep()?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod offset_tool;
pub mod recording;
pub mod settings;
pub mod swift;


pub use builder::SwiftBuilder;
pub use error::{Result, SwiftError};
pub use offset_tool::OffsetTool;
pub use recording::{MIN_RECORDING_SAMPLES, RecordOptions, Recorder, is_moving};
pub use settings::{MotionSettings, SettingsStack};
pub use swift::Swift;
