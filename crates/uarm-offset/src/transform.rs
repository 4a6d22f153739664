//! 极坐标 / 笛卡尔坐标变换与末端偏移代数
//!
//! 末端工具（吸盘、摄像头等）安装点相对机械臂参考点存在固定偏移。底座转动时，
//! 偏移的 XY 分量随底座角度一起旋转，因此工具点在 XY 平面上做圆周运动。
//!
//! 本模块提供两个方向的求解：
//!
//! - 正向：已知机械臂坐标，求工具点坐标（[`get_offset_position`]）
//! - 逆向：已知工具点目标，求机械臂坐标（[`get_position_for_offset_target_at`]）
//!
//! 所有角度均使用 `atan2`，在四个象限（包括 x = 0）都有定义。

use crate::error::GeometryError;
use crate::position::Position;
use std::f64::consts::PI;

/// `sin(known_angle)` 低于此值时认为三角形退化
pub const SINGULAR_EPSILON: f64 = 1e-9;

/// 偏移 XY 长度低于此值时认为工具点与参考点重合
pub const ZERO_OFFSET_EPSILON: f64 = 1e-12;

/// 笛卡尔坐标转极坐标
///
/// 返回 `(distance, angle)`，角度范围 `(-π, π]`。
pub fn cartesian_to_polar(x: f64, y: f64) -> (f64, f64) {
    (x.hypot(y), y.atan2(x))
}

/// 极坐标转笛卡尔坐标
pub fn polar_to_cartesian(distance: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (distance * cos, distance * sin)
}

/// 底座转到 `base_angle` 时，工具偏移在底座坐标系下的实际值
///
/// 只旋转 XY 分量，Z 保持不变。
pub fn get_rotated_offset_at_angle(base_angle: f64, offset: Position) -> Position {
    let (distance, angle) = cartesian_to_polar(offset.x, offset.y);
    let (x, y) = polar_to_cartesian(distance, base_angle + angle);
    Position::new(x, y, offset.z)
}

/// 机械臂位于 `position` 时，工具参考点的绝对坐标
///
/// 底座角度由 `position` 自身的极坐标分解得到，每个偏移独立旋转后累加。
///
/// 注意：这只在所有工具模式的 Y 偏移为 0 时成立，否则底座角度需要结合模式偏移推导。
pub fn get_offset_position(position: Position, offsets: &[Position]) -> Position {
    let (_, base_angle) = cartesian_to_polar(position.x, position.y);
    position
        + offsets
            .iter()
            .map(|offset| get_rotated_offset_at_angle(base_angle, *offset))
            .sum::<Position>()
}

/// 求机械臂坐标，使工具偏移点落在 `target`
///
/// 原点、目标点、偏移向量构成三角形，用正弦定理求解：
///
/// ```text
/// known_angle = π - offset_angle
/// sine_law    = target_distance / sin(known_angle)
/// found_angle = asin(offset_distance / sine_law)
/// base_angle  = target_angle - found_angle
/// base_distance = sine_law * sin(π - (found_angle + known_angle))
/// ```
///
/// Z 轴独立处理：`arm_z = target_z - offset_z`。
///
/// # 错误
///
/// - 偏移与径向共线（`sin(known_angle) ≈ 0`）或目标位于原点：[`GeometryError::Singular`]
/// - 偏移长度超出三角形可解范围：[`GeometryError::OutOfReach`]
pub fn get_position_for_offset_target_at(
    target: Position,
    offset: Position,
) -> Result<Position, GeometryError> {
    let (offset_distance, offset_angle) = cartesian_to_polar(offset.x, offset.y);
    let z = target.z - offset.z;

    if offset_distance < ZERO_OFFSET_EPSILON {
        return Ok(Position::new(target.x, target.y, z));
    }

    let (target_distance, target_angle) = cartesian_to_polar(target.x, target.y);
    if target_distance < ZERO_OFFSET_EPSILON {
        return Err(GeometryError::Singular { target, offset });
    }

    let known_angle = PI - offset_angle;
    let known_sin = known_angle.sin();
    if known_sin.abs() < SINGULAR_EPSILON {
        return Err(GeometryError::Singular { target, offset });
    }

    let sine_law = target_distance / known_sin;
    let ratio = offset_distance / sine_law;
    if !(-1.0..=1.0).contains(&ratio) {
        return Err(GeometryError::OutOfReach {
            target,
            offset,
            ratio,
        });
    }
    let found_angle = ratio.asin();

    let base_distance = sine_law * (PI - (found_angle + known_angle)).sin();
    let base_angle = target_angle - found_angle;
    let (x, y) = polar_to_cartesian(base_distance, base_angle);

    Ok(Position::new(x, y, z))
}

/// 把以 `general` 模式测量的工具偏移换算到指定模式
///
/// 固件在不同模式下使用不同的参考点，因此偏移需要减去模式自身的偏移。
pub fn offset_in_mode(general_offset: Position, mode_offset: Position) -> Position {
    general_offset - mode_offset
}
