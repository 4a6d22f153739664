//! # uArm Driver Layer
//!
//! 串口驱动边界：上层状态机通过 [`SwiftDriver`] trait 下发基本的运动/查询命令。
//!
//! GCode 编码与串口收发不在本 crate 范围内，由具体驱动实现。本 crate 提供：
//!
//! - [`SimulatedDriver`]：无硬件的模拟驱动（记住下发的位置并原样返回）
//! - `MockDriver`（feature `mock`）：可编程脚本驱动，用于测试
//!
//! 所有调用都是阻塞的。

use std::time::Duration;
use uarm_offset::Position;

pub mod error;
pub mod simulated;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::DriverError;
pub use simulated::SimulatedDriver;
pub use types::{DeviceInfo, FlushStatus, HoldState, Servo, ServoSelection};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCommand, MockDriver, MockHandle};

/// 驱动层结果类型
pub type Result<T> = std::result::Result<T, DriverError>;

/// 机械臂驱动接口
///
/// 必须实现的只有运动与位置查询；工具、舵机读数等可选能力默认返回
/// [`DriverError::Unsupported`]。
pub trait SwiftDriver {
    /// 打开串口
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// 关闭串口
    fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }

    /// 读取设备信息
    fn device_info(&mut self) -> Result<DeviceInfo> {
        Err(DriverError::unsupported("device_info"))
    }

    /// 等待固件就绪，超时返回 [`DriverError::Timeout`]
    fn waiting_ready(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    /// 等待命令队列清空
    fn flush_cmd(&mut self, timeout: Duration, wait_stop: bool) -> Result<FlushStatus>;

    /// 移动到绝对坐标（速度单位 mm/min）
    fn set_position(&mut self, position: Position, speed_mm_per_min: f64) -> Result<()>;

    /// 读取当前坐标
    ///
    /// `Ok(None)` 表示回复为空或格式错误，调用方应忽略本次读数。
    fn get_position(&mut self) -> Result<Option<Position>>;

    /// 切换固件工具模式
    fn set_mode(&mut self, code: u8) -> Result<()>;

    fn set_speed_factor(&mut self, _factor: f64) -> Result<()> {
        Ok(())
    }

    fn set_acceleration(&mut self, acceleration: f64) -> Result<()>;

    /// 腕部舵机角度（度）
    fn set_wrist(&mut self, angle: f64) -> Result<()>;

    /// 单个舵机角度（度）
    fn set_servo_angle(&mut self, servo: Servo, angle: f64) -> Result<()>;

    fn get_servo_angle(&mut self, _servo: Servo) -> Result<Option<f64>> {
        Err(DriverError::unsupported("get_servo_angle"))
    }

    /// 舵机上电
    fn set_servo_attach(&mut self, selection: ServoSelection) -> Result<()>;

    /// 舵机断电
    fn set_servo_detach(&mut self, selection: ServoSelection) -> Result<()>;

    fn set_pump(&mut self, _on: bool) -> Result<()> {
        Err(DriverError::unsupported("set_pump"))
    }

    fn set_gripper(&mut self, _on: bool) -> Result<()> {
        Err(DriverError::unsupported("set_gripper"))
    }

    fn pump_status(&mut self) -> Result<HoldState> {
        Err(DriverError::unsupported("pump_status"))
    }

    fn gripper_catch(&mut self) -> Result<HoldState> {
        Err(DriverError::unsupported("gripper_catch"))
    }

    /// 吸盘限位开关是否被按下
    fn get_limit_switch(&mut self) -> Result<bool>;

    /// 坐标是否超出机械臂工作空间（`true` = 不可达）
    fn check_pos_is_limit(&mut self, position: Position) -> Result<bool>;

    /// 是否为无硬件的模拟驱动
    fn is_simulated(&self) -> bool {
        false
    }
}

impl<D: SwiftDriver + ?Sized> SwiftDriver for Box<D> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }

    fn device_info(&mut self) -> Result<DeviceInfo> {
        (**self).device_info()
    }

    fn waiting_ready(&mut self, timeout: Duration) -> Result<()> {
        (**self).waiting_ready(timeout)
    }

    fn flush_cmd(&mut self, timeout: Duration, wait_stop: bool) -> Result<FlushStatus> {
        (**self).flush_cmd(timeout, wait_stop)
    }

    fn set_position(&mut self, position: Position, speed_mm_per_min: f64) -> Result<()> {
        (**self).set_position(position, speed_mm_per_min)
    }

    fn get_position(&mut self) -> Result<Option<Position>> {
        (**self).get_position()
    }

    fn set_mode(&mut self, code: u8) -> Result<()> {
        (**self).set_mode(code)
    }

    fn set_speed_factor(&mut self, factor: f64) -> Result<()> {
        (**self).set_speed_factor(factor)
    }

    fn set_acceleration(&mut self, acceleration: f64) -> Result<()> {
        (**self).set_acceleration(acceleration)
    }

    fn set_wrist(&mut self, angle: f64) -> Result<()> {
        (**self).set_wrist(angle)
    }

    fn set_servo_angle(&mut self, servo: Servo, angle: f64) -> Result<()> {
        (**self).set_servo_angle(servo, angle)
    }

    fn get_servo_angle(&mut self, servo: Servo) -> Result<Option<f64>> {
        (**self).get_servo_angle(servo)
    }

    fn set_servo_attach(&mut self, selection: ServoSelection) -> Result<()> {
        (**self).set_servo_attach(selection)
    }

    fn set_servo_detach(&mut self, selection: ServoSelection) -> Result<()> {
        (**self).set_servo_detach(selection)
    }

    fn set_pump(&mut self, on: bool) -> Result<()> {
        (**self).set_pump(on)
    }

    fn set_gripper(&mut self, on: bool) -> Result<()> {
        (**self).set_gripper(on)
    }

    fn pump_status(&mut self) -> Result<HoldState> {
        (**self).pump_status()
    }

    fn gripper_catch(&mut self) -> Result<HoldState> {
        (**self).gripper_catch()
    }

    fn get_limit_switch(&mut self) -> Result<bool> {
        (**self).get_limit_switch()
    }

    fn check_pos_is_limit(&mut self, position: Position) -> Result<bool> {
        (**self).check_pos_is_limit(position)
    }

    fn is_simulated(&self) -> bool {
        (**self).is_simulated()
    }
}
