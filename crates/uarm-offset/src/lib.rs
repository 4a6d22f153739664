//! # uArm Offset
//!
//! 末端工具偏移的坐标代数（无 I/O、无状态）。
//!
//! uArm Swift Pro 的固件只知道"机械臂参考点"的位置。安装吸盘、笔夹、摄像头等
//! 附件后，真正关心的点与参考点之间存在一个随底座角度旋转的偏移。本 crate 提供：
//!
//! - [`Position`] / [`Target`]：三维位置与可选轴目标
//! - [`transform`]：极坐标变换、偏移旋转、正向与逆向求解
//!
//! ```rust
//! use uarm_offset::{Position, get_offset_position, get_position_for_offset_target_at};
//!
//! let offset = Position::new(10.0, 10.0, 5.0);
//! let arm = Position::new(150.0, 40.0, 20.0);
//! let tool = get_offset_position(arm, &[offset]);
//! let back = get_position_for_offset_target_at(tool, offset).unwrap();
//! assert!((back.x - arm.x).abs() < 1e-6);
//! ```

pub mod error;
pub mod position;
pub mod transform;

pub use error::GeometryError;
pub use position::{Position, Target};
pub use transform::{
    cartesian_to_polar, get_offset_position, get_position_for_offset_target_at,
    get_rotated_offset_at_angle, offset_in_mode, polar_to_cartesian,
};
