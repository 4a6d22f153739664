//! 脚本化 Mock 驱动
//!
//! 测试通过 [`MockHandle`] 预置位置读数、限位开关状态、刷新结果等，
//! 并在调用结束后检查驱动收到的命令序列。驱动与句柄共享 `Arc<Mutex<_>>` 状态，
//! 驱动可以移交给上层状态机，句柄留在测试中。

use crate::{
    DeviceInfo, DriverError, FlushStatus, HoldState, Result, Servo, ServoSelection, SwiftDriver,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uarm_offset::{Position, cartesian_to_polar};

/// Mock 驱动记录的命令
#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    Connect,
    Disconnect,
    SetPosition { position: Position, speed: f64 },
    SetMode(u8),
    SpeedFactor(f64),
    Acceleration(f64),
    Wrist(f64),
    ServoAngle(Servo, f64),
    Attach(ServoSelection),
    Detach(ServoSelection),
    Pump(bool),
    Gripper(bool),
    Flush { wait_stop: bool },
}

#[derive(Debug)]
struct MockState {
    position: Position,
    position_reads: VecDeque<Option<Position>>,
    read_failures: usize,
    limit_switch: bool,
    limit_switch_reads: VecDeque<bool>,
    unreachable: bool,
    flush_status: FlushStatus,
    ready: bool,
    device_info: DeviceInfo,
    pump: HoldState,
    gripper: HoldState,
    commands: Vec<MockCommand>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            position: Position::new(120.0, 0.0, 30.0),
            position_reads: VecDeque::new(),
            read_failures: 0,
            limit_switch: false,
            limit_switch_reads: VecDeque::new(),
            unreachable: false,
            flush_status: FlushStatus::Ok,
            ready: true,
            device_info: DeviceInfo {
                device_type: "SwiftPro".to_string(),
                firmware_version: "4.5.0".to_string(),
                hardware_version: "3.3.1".to_string(),
                device_unique: Some("MOCK0001".to_string()),
            },
            pump: HoldState::Off,
            gripper: HoldState::Off,
            commands: Vec::new(),
        }
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 脚本化驱动
///
/// 未预置读数时，`get_position` 返回最近一次下发的坐标。
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

/// 测试侧句柄
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取共享状态句柄
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: self.state.clone(),
        }
    }

    fn record(&self, command: MockCommand) {
        lock(&self.state).commands.push(command);
    }
}

impl MockHandle {
    /// 设置"真实"位置（后续未预置的读数返回该值）
    pub fn set_position(&self, position: Position) {
        lock(&self.state).position = position;
    }

    /// 预置一次位置读数（`None` 表示格式错误的回复）
    pub fn push_position_read(&self, read: Option<Position>) {
        lock(&self.state).position_reads.push_back(read);
    }

    /// 接下来 `count` 次位置读取返回协议错误
    pub fn fail_position_reads(&self, count: usize) {
        lock(&self.state).read_failures = count;
    }

    /// 限位开关的默认状态
    pub fn set_limit_switch(&self, pressed: bool) {
        lock(&self.state).limit_switch = pressed;
    }

    /// 预置一次限位开关读数
    pub fn push_limit_switch_read(&self, pressed: bool) {
        lock(&self.state).limit_switch_reads.push_back(pressed);
    }

    /// 所有坐标都报告为不可达
    pub fn set_unreachable(&self, unreachable: bool) {
        lock(&self.state).unreachable = unreachable;
    }

    pub fn set_flush_status(&self, status: FlushStatus) {
        lock(&self.state).flush_status = status;
    }

    /// `false` 时 `waiting_ready` 超时
    pub fn set_ready(&self, ready: bool) {
        lock(&self.state).ready = ready;
    }

    pub fn set_device_info(&self, info: DeviceInfo) {
        lock(&self.state).device_info = info;
    }

    pub fn set_pump_status(&self, status: HoldState) {
        lock(&self.state).pump = status;
    }

    pub fn set_gripper_status(&self, status: HoldState) {
        lock(&self.state).gripper = status;
    }

    /// 已记录的命令（副本）
    pub fn commands(&self) -> Vec<MockCommand> {
        lock(&self.state).commands.clone()
    }

    /// 取出并清空已记录的命令
    pub fn take_commands(&self) -> Vec<MockCommand> {
        std::mem::take(&mut lock(&self.state).commands)
    }

    /// 所有 `set_position` 下发的坐标
    pub fn moves(&self) -> Vec<Position> {
        lock(&self.state)
            .commands
            .iter()
            .filter_map(|c| match c {
                MockCommand::SetPosition { position, .. } => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// 最近一次 `set_position` 的坐标与速度
    pub fn last_move(&self) -> Option<(Position, f64)> {
        lock(&self.state).commands.iter().rev().find_map(|c| match c {
            MockCommand::SetPosition { position, speed } => Some((*position, *speed)),
            _ => None,
        })
    }
}

impl SwiftDriver for MockDriver {
    fn connect(&mut self) -> Result<()> {
        self.record(MockCommand::Connect);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.record(MockCommand::Disconnect);
        Ok(())
    }

    fn device_info(&mut self) -> Result<DeviceInfo> {
        Ok(lock(&self.state).device_info.clone())
    }

    fn waiting_ready(&mut self, _timeout: Duration) -> Result<()> {
        if lock(&self.state).ready {
            Ok(())
        } else {
            Err(DriverError::Timeout)
        }
    }

    fn flush_cmd(&mut self, _timeout: Duration, wait_stop: bool) -> Result<FlushStatus> {
        let mut state = lock(&self.state);
        state.commands.push(MockCommand::Flush { wait_stop });
        Ok(state.flush_status)
    }

    fn set_position(&mut self, position: Position, speed_mm_per_min: f64) -> Result<()> {
        let mut state = lock(&self.state);
        state.position = position;
        state.commands.push(MockCommand::SetPosition {
            position,
            speed: speed_mm_per_min,
        });
        Ok(())
    }

    fn get_position(&mut self) -> Result<Option<Position>> {
        let mut state = lock(&self.state);
        if state.read_failures > 0 {
            state.read_failures -= 1;
            return Err(DriverError::Protocol("garbled position reply".to_string()));
        }
        match state.position_reads.pop_front() {
            Some(read) => Ok(read),
            None => Ok(Some(state.position)),
        }
    }

    fn set_mode(&mut self, code: u8) -> Result<()> {
        self.record(MockCommand::SetMode(code));
        Ok(())
    }

    fn set_speed_factor(&mut self, factor: f64) -> Result<()> {
        self.record(MockCommand::SpeedFactor(factor));
        Ok(())
    }

    fn set_acceleration(&mut self, acceleration: f64) -> Result<()> {
        self.record(MockCommand::Acceleration(acceleration));
        Ok(())
    }

    fn set_wrist(&mut self, angle: f64) -> Result<()> {
        self.record(MockCommand::Wrist(angle));
        Ok(())
    }

    fn set_servo_angle(&mut self, servo: Servo, angle: f64) -> Result<()> {
        self.record(MockCommand::ServoAngle(servo, angle));
        Ok(())
    }

    fn get_servo_angle(&mut self, servo: Servo) -> Result<Option<f64>> {
        let state = lock(&self.state);
        let angle = match servo {
            Servo::Base => {
                let (_, angle) = cartesian_to_polar(state.position.x, state.position.y);
                Some(90.0 + angle.to_degrees())
            }
            _ => None,
        };
        Ok(angle)
    }

    fn set_servo_attach(&mut self, selection: ServoSelection) -> Result<()> {
        self.record(MockCommand::Attach(selection));
        Ok(())
    }

    fn set_servo_detach(&mut self, selection: ServoSelection) -> Result<()> {
        self.record(MockCommand::Detach(selection));
        Ok(())
    }

    fn set_pump(&mut self, on: bool) -> Result<()> {
        let mut state = lock(&self.state);
        state.pump = if on { HoldState::Empty } else { HoldState::Off };
        state.commands.push(MockCommand::Pump(on));
        Ok(())
    }

    fn set_gripper(&mut self, on: bool) -> Result<()> {
        let mut state = lock(&self.state);
        state.gripper = if on { HoldState::Empty } else { HoldState::Off };
        state.commands.push(MockCommand::Gripper(on));
        Ok(())
    }

    fn pump_status(&mut self) -> Result<HoldState> {
        Ok(lock(&self.state).pump)
    }

    fn gripper_catch(&mut self) -> Result<HoldState> {
        Ok(lock(&self.state).gripper)
    }

    fn get_limit_switch(&mut self) -> Result<bool> {
        let mut state = lock(&self.state);
        let default = state.limit_switch;
        Ok(state.limit_switch_reads.pop_front().unwrap_or(default))
    }

    fn check_pos_is_limit(&mut self, _position: Position) -> Result<bool> {
        Ok(lock(&self.state).unreachable)
    }
}
