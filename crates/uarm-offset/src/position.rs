//! 笛卡尔位置类型
//!
//! 机械臂底座坐标系下的三维位置（毫米），以及可选轴的运动目标。

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

/// 三维位置（毫米，相对机械臂底座）
///
/// 坐标总是完整的三元组，不存在"部分坐标"。需要只修改部分轴时使用 [`Target`]。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// X 坐标（毫米）
    pub x: f64,
    /// Y 坐标（毫米）
    pub y: f64,
    /// Z 坐标（毫米）
    pub z: f64,
}

impl Position {
    /// 零向量
    pub const ZERO: Self = Position::new(0.0, 0.0, 0.0);

    /// 创建新的位置
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }

    /// 三维直线距离
    pub fn distance_to(&self, other: &Position) -> f64 {
        (*other - *self).norm()
    }

    /// XY 平面上的距离（忽略 Z）
    pub fn planar_distance_to(&self, other: &Position) -> f64 {
        (*other - *self).planar_norm()
    }

    /// 向量长度
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// XY 分量的长度
    pub fn planar_norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// 各分量取绝对值
    pub fn abs(&self) -> Self {
        Position::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// 按小数位数四舍五入
    ///
    /// 机械臂固件只接受毫米级小数，内部记录的位置统一保留 3 位小数。
    pub fn round(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        let r = |v: f64| (v * factor).round() / factor;
        Position::new(r(self.x), r(self.y), r(self.z))
    }

    /// 所有分量都是有限值
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// 替换 Z 分量
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        *self = *self + rhs;
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Position {
        Position::new(-self.x, -self.y, -self.z)
    }
}

impl Sum for Position {
    fn sum<I: Iterator<Item = Position>>(iter: I) -> Position {
        iter.fold(Position::ZERO, Add::add)
    }
}

impl From<[f64; 3]> for Position {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Position::new(x, y, z)
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Position::new(x, y, z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x={:.3}, y={:.3}, z={:.3})", self.x, self.y, self.z)
    }
}

/// 运动目标（每个轴可选）
///
/// 未指定的轴保持当前值（绝对运动）或不移动（相对运动）。
///
/// ```rust
/// use uarm_offset::{Position, Target};
///
/// let current = Position::new(150.0, 0.0, 40.0);
/// let target = Target::new().z(10.0);
/// assert_eq!(target.resolve(current), Position::new(150.0, 0.0, 10.0));
/// assert_eq!(target.relative_to(current), Position::new(150.0, 0.0, 50.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Target {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Target {
    /// 空目标（所有轴保持不变）
    pub const fn new() -> Self {
        Target {
            x: None,
            y: None,
            z: None,
        }
    }

    pub fn x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    /// 是否没有指定任何轴
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// 作为绝对坐标解析：未指定的轴取 `current` 的值
    pub fn resolve(&self, current: Position) -> Position {
        Position::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.z.unwrap_or(current.z),
        )
    }

    /// 作为相对位移解析：指定的轴叠加到 `current` 上
    pub fn relative_to(&self, current: Position) -> Position {
        Position::new(
            current.x + self.x.unwrap_or(0.0),
            current.y + self.y.unwrap_or(0.0),
            current.z + self.z.unwrap_or(0.0),
        )
    }
}

impl From<Position> for Target {
    fn from(p: Position) -> Self {
        Target {
            x: Some(p.x),
            y: Some(p.y),
            z: Some(p.z),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v));
        write!(f, "(x={}, y={}, z={})", axis(self.x), axis(self.y), axis(self.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_arithmetic() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(0.5, -2.0, 1.0);
        assert_eq!(a + b, Position::new(1.5, 0.0, 4.0));
        assert_eq!(a - b, Position::new(0.5, 4.0, 2.0));
        assert_eq!(-a, Position::new(-1.0, -2.0, -3.0));

        let total: Position = vec![a, b, Position::ZERO].into_iter().sum();
        assert_eq!(total, a + b);
    }

    #[test]
    fn test_distances() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 12.0);
        assert_eq!(a.distance_to(&b), 13.0);
        assert_eq!(a.planar_distance_to(&b), 5.0);
    }

    #[test]
    fn test_round() {
        let p = Position::new(1.23456, -0.0004, 99.9996);
        assert_eq!(p.round(3), Position::new(1.235, -0.0, 100.0));
    }

    #[test]
    fn test_target_resolve_keeps_missing_axes() {
        let current = Position::new(120.0, 0.0, 30.0);
        assert_eq!(Target::new().resolve(current), current);
        assert_eq!(
            Target::new().x(200.0).resolve(current),
            Position::new(200.0, 0.0, 30.0)
        );
        assert!(Target::new().is_empty());
        assert!(!Target::from(current).is_empty());
    }

    #[test]
    fn test_target_relative() {
        let current = Position::new(150.0, 0.0, 40.0);
        let moved = Target::new().x(50.0).y(50.0).z(50.0).relative_to(current);
        assert_eq!(moved, Position::new(200.0, 50.0, 90.0));
    }

    #[test]
    fn test_display() {
        let p = Position::new(1.0, 2.5, -3.0);
        assert_eq!(format!("{}", p), "(x=1.000, y=2.500, z=-3.000)");
        assert_eq!(format!("{}", Target::new().z(1.0)), "(x=-, y=-, z=1.000)");
    }
}
