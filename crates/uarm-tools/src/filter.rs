//! 按方向变化过滤录制样本
//!
//! 只保留运动方向发生明显变化的拐点，首尾样本总是保留。

use crate::recording::PositionSample;
use std::f64::consts::PI;
use uarm_offset::{Position, cartesian_to_polar};

/// 默认最大角度（弧度）
pub const DEFAULT_MAX_ANGLE: f64 = PI / 16.0;

/// 两点之间的球坐标：`(distance, azimuth, polar)`
///
/// 方位角用 `atan2`，极角为与 +Z 的夹角。距离为 0 时两个角度均为 0。
pub fn sphere_coords(from: &Position, to: &Position) -> (f64, f64, f64) {
    let diff = *to - *from;
    let distance = diff.norm();
    if distance == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let (_, azimuth) = cartesian_to_polar(diff.x, diff.y);
    let polar = (diff.z / distance).clamp(-1.0, 1.0).acos();
    (distance, azimuth, polar)
}

/// 两个角度之差的绝对值，绕 2π 取较短的一边
pub fn abs_radian_diff(a: f64, b: f64) -> f64 {
    let diff = (b - a).abs() % (2.0 * PI);
    if diff > PI { 2.0 * PI - diff } else { diff }
}

fn moved_too_much(prev: (f64, f64, f64), new: (f64, f64, f64), max_angle: f64) -> bool {
    if new.0 == 0.0 {
        return false;
    }
    abs_radian_diff(prev.1, new.1) > max_angle || abs_radian_diff(prev.2, new.2) > max_angle
}

/// 过滤样本
///
/// 以最后保留的样本为起点，若到当前样本的方向相对上一段方向偏转超过 `max_angle`，
/// 则保留前一个样本作为拐点。
pub fn filter_samples(samples: &[PositionSample], max_angle: f64) -> Vec<PositionSample> {
    if samples.len() < 3 {
        return samples.to_vec();
    }

    let mut trimmed = vec![samples[0].clone()];
    let mut prev_sphere = sphere_coords(&samples[0].position, &samples[1].position);

    for i in 2..samples.len() {
        let anchor = trimmed[trimmed.len() - 1].position;
        let new_sphere = sphere_coords(&anchor, &samples[i].position);
        if moved_too_much(prev_sphere, new_sphere, max_angle) {
            trimmed.push(samples[i - 1].clone());
            prev_sphere = sphere_coords(&samples[i - 1].position, &samples[i].position);
        }
    }

    trimmed.push(samples[samples.len() - 1].clone());
    trimmed
}
