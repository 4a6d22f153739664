//! 工具附件（带偏移的参考点）
//!
//! 附件以 `general` 模式测得的偏移描述，使用时按当前模式换算。
//! [`OffsetTool::move_to`] 把"附件参考点到达目标"换算成机械臂坐标。

use crate::error::Result;
use crate::swift::Swift;
use tracing::debug;
use uarm_driver::SwiftDriver;
use uarm_offset::{
    Position, Target, get_offset_position, get_position_for_offset_target_at, offset_in_mode,
};

/// 借用设备的附件
///
/// # Example
///
/// ```
/// use uarm_client::{OffsetTool, SwiftBuilder};
/// use uarm_offset::Target;
///
/// let mut swift = SwiftBuilder::new().simulate().unwrap();
/// let mut camera = OffsetTool::camera(&mut swift);
/// camera.move_to(Target::new().x(200.0).y(50.0).z(120.0), true).unwrap();
/// ```
pub struct OffsetTool<'a, D: SwiftDriver> {
    swift: &'a mut Swift<D>,
    general_offset: Position,
}

impl<'a, D: SwiftDriver> OffsetTool<'a, D> {
    pub fn new(swift: &'a mut Swift<D>, general_offset: Position) -> Self {
        Self {
            swift,
            general_offset,
        }
    }

    /// 吸盘吸嘴（偏移取自配置）
    pub fn pump(swift: &'a mut Swift<D>) -> Self {
        let offset = swift.config().attachments.pump;
        Self::new(swift, offset)
    }

    /// 标准支架上的摄像头（偏移取自配置）
    pub fn camera(swift: &'a mut Swift<D>) -> Self {
        let offset = swift.config().attachments.camera;
        Self::new(swift, offset)
    }

    /// 当前模式下的偏移
    pub fn offset(&self) -> Position {
        offset_in_mode(self.general_offset, self.swift.mode_offset())
    }

    /// 附件参考点的当前（预期）坐标
    pub fn position(&self) -> Position {
        get_offset_position(self.swift.position(), &[self.offset()])
    }

    /// 移动附件参考点
    ///
    /// 未指定的轴取附件当前坐标。偏移与径向共线时返回 `Geometry` 错误。
    pub fn move_to(&mut self, target: Target, check: bool) -> Result<&mut Self> {
        debug!("offset move_to: {}", target);
        if target.is_empty() {
            return Ok(self);
        }
        let target = target.resolve(self.position());
        let arm = get_position_for_offset_target_at(target, self.offset())?;
        self.swift.move_to(arm.into(), check)?;
        Ok(self)
    }

    pub fn move_relative(&mut self, delta: Target, check: bool) -> Result<&mut Self> {
        if delta.is_empty() {
            return Ok(self);
        }
        let target = delta.relative_to(self.position());
        self.move_to(target.into(), check)
    }

    pub fn swift(&mut self) -> &mut Swift<D> {
        self.swift
    }
}

impl<D: SwiftDriver> std::fmt::Debug for OffsetTool<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffsetTool")
            .field("general_offset", &self.general_offset)
            .field("swift", &self.swift)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SwiftBuilder, SwiftError};
    use approx::assert_abs_diff_eq;
    use uarm_tools::ToolMode;

    #[test]
    fn test_camera_reaches_target() {
        let mut swift = SwiftBuilder::new().simulate().unwrap();
        let target = Position::new(200.0, 50.0, 120.0);
        let mut camera = OffsetTool::camera(&mut swift);
        camera.move_to(target.into(), true).unwrap();

        // 机械臂坐标取 3 位小数，允许少量误差
        let reached = camera.position();
        assert_abs_diff_eq!(reached.x, target.x, epsilon = 0.01);
        assert_abs_diff_eq!(reached.y, target.y, epsilon = 0.01);
        assert_abs_diff_eq!(reached.z, target.z, epsilon = 0.01);

        let arm = swift.position();
        assert_abs_diff_eq!(arm.z, 120.0 - 37.2, epsilon = 1e-9);
    }

    #[test]
    fn test_pump_in_general_mode_matches_arm() {
        let mut swift = SwiftBuilder::new().simulate().unwrap();
        let mut pump = OffsetTool::pump(&mut swift);
        assert_eq!(pump.offset(), Position::ZERO);
        pump.move_relative(Target::new().z(10.0), true).unwrap();
        assert_eq!(swift.position(), Position::new(120.0, 0.0, 40.0));
    }

    #[test]
    fn test_collinear_offset_is_singular() {
        let mut swift = SwiftBuilder::new().simulate().unwrap();
        swift.tool_mode(ToolMode::PenGripper).unwrap();
        let mut pump = OffsetTool::pump(&mut swift);
        let result = pump.move_to(Target::new().x(180.0), true);
        assert!(matches!(result, Err(SwiftError::Geometry(_))));
    }
}
