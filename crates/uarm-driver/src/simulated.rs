//! 模拟驱动（无硬件）
//!
//! 记住最近一次下发的坐标并在查询时原样返回。所有坐标均可达，限位开关永远未按下。

use crate::{DriverError, FlushStatus, HoldState, Result, Servo, ServoSelection, SwiftDriver};
use std::time::Duration;
use tracing::trace;
use uarm_offset::{Position, cartesian_to_polar};

/// 模拟驱动
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    position: Position,
    wrist: f64,
    mode: u8,
    acceleration: f64,
}

impl SimulatedDriver {
    /// 创建模拟驱动，初始位置为 `home`
    pub fn new(home: Position) -> Self {
        Self {
            position: home,
            wrist: 90.0,
            mode: 0,
            acceleration: 0.0,
        }
    }

    /// 最近一次下发的工具模式编号
    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new(Position::new(120.0, 0.0, 30.0))
    }
}

impl SwiftDriver for SimulatedDriver {
    fn connect(&mut self) -> Result<()> {
        Err(DriverError::unsupported("connect (simulated)"))
    }

    fn flush_cmd(&mut self, _timeout: Duration, _wait_stop: bool) -> Result<FlushStatus> {
        Ok(FlushStatus::Ok)
    }

    fn set_position(&mut self, position: Position, speed_mm_per_min: f64) -> Result<()> {
        trace!("simulated move to {} at {:.1} mm/min", position, speed_mm_per_min);
        self.position = position;
        Ok(())
    }

    fn get_position(&mut self) -> Result<Option<Position>> {
        Ok(Some(self.position))
    }

    fn set_mode(&mut self, code: u8) -> Result<()> {
        self.mode = code;
        Ok(())
    }

    fn set_acceleration(&mut self, acceleration: f64) -> Result<()> {
        self.acceleration = acceleration;
        Ok(())
    }

    fn set_wrist(&mut self, angle: f64) -> Result<()> {
        self.wrist = angle;
        Ok(())
    }

    fn set_servo_angle(&mut self, servo: Servo, angle: f64) -> Result<()> {
        if servo == Servo::Wrist {
            self.wrist = angle;
        }
        Ok(())
    }

    fn get_servo_angle(&mut self, servo: Servo) -> Result<Option<f64>> {
        let angle = match servo {
            // 底座 90° 朝向 +X
            Servo::Base => {
                let (_, angle) = cartesian_to_polar(self.position.x, self.position.y);
                Some(90.0 + angle.to_degrees())
            }
            Servo::Wrist => Some(self.wrist),
            Servo::Shoulder | Servo::Elbow => None,
        };
        Ok(angle)
    }

    fn set_servo_attach(&mut self, _selection: ServoSelection) -> Result<()> {
        Ok(())
    }

    fn set_servo_detach(&mut self, _selection: ServoSelection) -> Result<()> {
        Ok(())
    }

    fn set_pump(&mut self, _on: bool) -> Result<()> {
        Ok(())
    }

    fn set_gripper(&mut self, _on: bool) -> Result<()> {
        Ok(())
    }

    fn pump_status(&mut self) -> Result<HoldState> {
        Ok(HoldState::Off)
    }

    fn gripper_catch(&mut self) -> Result<HoldState> {
        Ok(HoldState::Off)
    }

    fn get_limit_switch(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn check_pos_is_limit(&mut self, _position: Position) -> Result<bool> {
        Ok(false)
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_position_echo() {
        let mut driver = SimulatedDriver::default();
        assert_eq!(driver.get_position().unwrap(), Some(Position::new(120.0, 0.0, 30.0)));

        let target = Position::new(200.0, 10.0, 50.0);
        driver.set_position(target, 9000.0).unwrap();
        assert_eq!(driver.get_position().unwrap(), Some(target));
        assert!(driver.is_simulated());
    }

    #[test]
    fn test_base_angle_follows_position() {
        let mut driver = SimulatedDriver::default();
        driver.set_position(Position::new(0.0, 150.0, 0.0), 100.0).unwrap();
        let angle = driver.get_servo_angle(Servo::Base).unwrap().unwrap();
        assert_abs_diff_eq!(angle, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_connect_is_unsupported() {
        let mut driver = SimulatedDriver::default();
        assert!(matches!(driver.connect(), Err(DriverError::Unsupported(_))));
        assert!(matches!(driver.device_info(), Err(DriverError::Unsupported(_))));
    }
}
