//! 设备状态封装
//!
//! [`Swift`] 持有驱动，维护主机侧的"预期位置"、电机使能状态、腕部角度、工具模式
//! 以及速度设置栈，并在每次运动前后做校验：
//!
//! - 运动目标四舍五入到 3 位小数，Z 轴扣除校准偏差后再下发
//! - 可选的工作空间检查（由固件判断）
//! - 到位后重新读取位置，偏差超过阈值视为丢步
//!
//! 模拟驱动下所有只能在硬件上完成的操作都直接视为成功。
//!
//! # 状态
//!
//! ```text
//! DISABLED --(move_to | enable_all_motors)--> ENABLED
//! ENABLED  --(disable_all_motors | disable_base)--> DISABLED
//! ```

use crate::error::{Result, SwiftError};
use crate::settings::{MotionSettings, SettingsStack};
use semver::{Version, VersionReq};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uarm_driver::{DeviceInfo, Servo, ServoSelection, SwiftDriver};
use uarm_offset::{Position, Target};
use uarm_tools::{ArmConfig, HardwareSettings, HardwareSettingsStore, Joint, ToolMode};

/// 固件坐标精度（小数位）
const POSITION_DECIMALS: u32 = 3;

fn servo_for(joint: Joint) -> Servo {
    match joint {
        Joint::Base => Servo::Base,
        Joint::Shoulder => Servo::Shoulder,
        Joint::Elbow => Servo::Elbow,
    }
}

fn settle(duration: Duration) {
    if !duration.is_zero() {
        spin_sleep::sleep(duration);
    }
}

/// uArm Swift Pro 设备封装
///
/// 通过 [`SwiftBuilder`](crate::SwiftBuilder) 创建。
pub struct Swift<D: SwiftDriver> {
    driver: D,
    config: ArmConfig,
    store: HardwareSettingsStore,
    settings_dir: Option<PathBuf>,
    hardware: HardwareSettings,
    motion: SettingsStack,
    position: Position,
    wrist_angle: f64,
    enabled: bool,
    simulated: bool,
}

impl<D: SwiftDriver> Swift<D> {
    pub(crate) fn new(
        driver: D,
        config: ArmConfig,
        store: HardwareSettingsStore,
        settings_dir: Option<PathBuf>,
    ) -> Self {
        let simulated = driver.is_simulated();
        let motion = SettingsStack::new(MotionSettings {
            speed: config.motion.default_speed,
            acceleration: config.motion.default_acceleration,
        });
        let hardware = HardwareSettings {
            mode: config.default_mode,
            ..HardwareSettings::default()
        };
        Self {
            position: config.home.simulate_position,
            wrist_angle: config.wrist.default,
            driver,
            store,
            settings_dir,
            hardware,
            motion,
            enabled: false,
            simulated,
            config,
        }
    }

    // ==================== Connection ====================

    fn ensure_hardware(&self, operation: &str) -> Result<()> {
        if self.simulated {
            return Err(SwiftError::configuration(format!(
                "cannot {} while simulating",
                operation
            )));
        }
        Ok(())
    }

    /// 连接设备并完成初始化
    ///
    /// 校验设备型号/固件/唯一 ID，加载该设备的硬件设置，恢复工具模式并让腕部居中。
    pub fn connect(&mut self) -> Result<&mut Self> {
        debug!("connect");
        self.ensure_hardware("connect")?;
        self.driver.connect()?;
        self.driver.waiting_ready(self.config.timeouts.ready())?;
        let info = self.driver.device_info()?;
        let id = self.check_device_info(&info)?;
        info!("Connected to {}", info);
        self.hardware.id = id;
        self.setup()
    }

    /// 断开连接
    pub fn disconnect(&mut self) -> Result<&mut Self> {
        debug!("disconnect");
        self.ensure_hardware("disconnect")?;
        self.driver.disconnect()?;
        info!("Disconnected from {}", self.hardware.id);
        Ok(self)
    }

    /// 检查设备信息，返回设备唯一 ID
    pub fn check_device_info(&self, info: &DeviceInfo) -> Result<String> {
        let expected = &self.config.device;
        if info.device_type != expected.device_type {
            return Err(SwiftError::IncompatibleDevice(format!(
                "device type should be {}, but got {}",
                expected.device_type, info.device_type
            )));
        }

        let requirement = VersionReq::parse(&expected.firmware).map_err(|e| {
            SwiftError::configuration(format!(
                "invalid firmware requirement '{}': {}",
                expected.firmware, e
            ))
        })?;
        let version = Version::parse(info.firmware_version.trim()).map_err(|e| {
            SwiftError::IncompatibleDevice(format!(
                "unreadable firmware version '{}': {}",
                info.firmware_version, e
            ))
        })?;
        if !requirement.matches(&version) {
            return Err(SwiftError::IncompatibleDevice(format!(
                "firmware {} does not satisfy {}",
                version, requirement
            )));
        }

        match info.device_unique.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(SwiftError::IncompatibleDevice(
                "device unique id not accessible".to_string(),
            )),
        }
    }

    /// 连接（或模拟实例创建）后的初始化
    pub(crate) fn setup(&mut self) -> Result<&mut Self> {
        debug!("setup");
        if !self.simulated {
            let status = self
                .driver
                .flush_cmd(self.config.timeouts.arrival(), false)?;
            if !status.is_ok() {
                warn!("Command queue flush during setup returned {:?}", status);
            }
            self.driver.waiting_ready(self.config.timeouts.ready())?;
            self.driver
                .set_speed_factor(self.config.motion.speed_factor)?;
        }
        self.init_settings()?;
        let mode = self.hardware.mode;
        self.tool_mode(mode)?;
        self.rotate_to(self.config.wrist.default)?;
        Ok(self)
    }

    /// 从存储加载（或创建）当前设备的硬件设置
    pub fn init_settings(&mut self) -> Result<&mut Self> {
        let id = self.hardware.id.clone();
        self.hardware = self.store.load(&id)?;
        info!(
            "Hardware settings for {}: mode={}, z_offset={}, wrist_offset={}",
            self.hardware.id, self.hardware.mode, self.hardware.z_offset, self.hardware.wrist_offset
        );
        Ok(self)
    }

    fn save_hardware_settings(&mut self) -> Result<()> {
        self.store.save(&self.hardware)?;
        Ok(())
    }

    // ==================== Motion ====================

    fn ensure_enabled(&mut self) -> Result<()> {
        if !self.enabled {
            self.enable_all_motors()?;
        }
        Ok(())
    }

    fn send_move(&mut self, believed: Position, real: Position, check: bool) -> Result<&mut Self> {
        if check && !self.simulated && self.driver.check_pos_is_limit(real)? {
            return Err(SwiftError::UnreachableTarget { target: believed });
        }
        let speed_mm_per_min = self.motion.current().speed * 60.0;
        self.driver.set_position(real, speed_mm_per_min)?;
        self.position = believed;
        Ok(self)
    }

    /// 移动到绝对坐标
    ///
    /// 未指定的轴保持当前值；空目标不产生任何命令。
    pub fn move_to(&mut self, target: Target, check: bool) -> Result<&mut Self> {
        debug!("move_to: {}", target);
        if target.is_empty() {
            return Ok(self);
        }
        self.ensure_enabled()?;
        let believed = target.resolve(self.position).round(POSITION_DECIMALS);
        let real = believed.with_z(believed.z - self.hardware.z_offset);
        self.send_move(believed, real, check)
    }

    /// 移动到固件坐标（不扣除 Z 校准偏差）
    pub fn move_to_raw(&mut self, position: Position, check: bool) -> Result<&mut Self> {
        debug!("move_to_raw: {}", position);
        self.ensure_enabled()?;
        let position = position.round(POSITION_DECIMALS);
        self.send_move(position, position, check)
    }

    /// 相对当前预期位置移动
    ///
    /// 固件的相对运动会忽略加速度，因此换算成绝对运动。
    pub fn move_relative(&mut self, delta: Target, check: bool) -> Result<&mut Self> {
        debug!("move_relative: {}", delta);
        if delta.is_empty() {
            return Ok(self);
        }
        let target = delta.relative_to(self.position).round(POSITION_DECIMALS);
        self.move_to(target.into(), check)
    }

    /// 目标是否可达（模拟时总是可达）
    pub fn can_move_to(&mut self, target: Target) -> Result<bool> {
        debug!("can_move_to: {}", target);
        if self.simulated {
            return Ok(true);
        }
        let believed = target.resolve(self.position).round(POSITION_DECIMALS);
        let real = believed.with_z(believed.z - self.hardware.z_offset);
        Ok(!self.driver.check_pos_is_limit(real)?)
    }

    pub fn can_move_relative(&mut self, delta: Target) -> Result<bool> {
        let target = delta.relative_to(self.position).round(POSITION_DECIMALS);
        self.can_move_to(target.into())
    }

    /// 等待所有命令执行完毕并重新同步位置
    ///
    /// `timeout` 为 `None` 时使用配置的默认值。`check` 为 `true` 时检测丢步。
    pub fn wait_for_arrival(&mut self, timeout: Option<Duration>, check: bool) -> Result<&mut Self> {
        debug!("wait_for_arrival");
        if self.simulated {
            return Ok(self);
        }
        let timeout = timeout.unwrap_or_else(|| self.config.timeouts.arrival());
        let status = self.driver.flush_cmd(timeout, true)?;
        if !status.is_ok() {
            return Err(SwiftError::MotionTimeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        self.update_position(check)
    }

    /// 从设备读取位置
    ///
    /// 空回复、格式错误或瞬时驱动错误只记录日志，不更新位置。
    /// `check` 为 `true` 且电机已使能时，偏差超过阈值返回 [`SwiftError::PositionDivergence`]，
    /// 此时预期位置已经同步为读数。
    pub fn update_position(&mut self, check: bool) -> Result<&mut Self> {
        if self.simulated {
            return Ok(self);
        }
        let read = match self.driver.get_position() {
            Ok(Some(p)) if p.is_finite() => p,
            Ok(_) => {
                debug!("Not able to read position, ignoring");
                return Ok(self);
            }
            Err(e) if e.is_transient() => {
                debug!("Position read failed, ignoring: {}", e);
                return Ok(self);
            }
            Err(e) => return Err(e.into()),
        };

        let actual = read
            .with_z(read.z + self.hardware.z_offset)
            .round(POSITION_DECIMALS);
        let believed = self.position;
        self.position = actual;

        if check && self.enabled {
            let distance = believed.distance_to(&actual);
            if distance > self.config.motion.skip_threshold {
                return Err(SwiftError::PositionDivergence {
                    distance,
                    believed,
                    actual,
                });
            }
        }
        debug!("New position: {}", self.position);
        Ok(self)
    }

    // ==================== Settings ====================

    /// 设置速度（mm/s），超出范围时截断
    pub fn speed(&mut self, speed: f64) -> &mut Self {
        debug!("speed: {}", speed);
        let limits = &self.config.motion;
        let clamped = speed.clamp(limits.min_speed, limits.max_speed);
        if clamped != speed {
            debug!("speed changed to: {}", clamped);
        }
        self.motion.set_speed(clamped);
        self
    }

    /// 设置加速度，超出范围时截断
    pub fn acceleration(&mut self, acceleration: f64) -> Result<&mut Self> {
        debug!("acceleration: {}", acceleration);
        let limits = &self.config.motion;
        let clamped = acceleration.clamp(limits.min_acceleration, limits.max_acceleration);
        if clamped != acceleration {
            debug!("acceleration changed to: {}", clamped);
        }
        self.motion.set_acceleration(clamped);
        if !self.simulated {
            self.driver.set_acceleration(clamped)?;
        }
        Ok(self)
    }

    /// 保存当前速度与加速度
    pub fn push_settings(&mut self) -> &mut Self {
        self.motion.push();
        self
    }

    /// 恢复最近保存的速度与加速度
    pub fn pop_settings(&mut self) -> Result<&mut Self> {
        let saved = self.motion.pop().ok_or(SwiftError::StateUnderflow)?;
        self.speed(saved.speed);
        self.acceleration(saved.acceleration)
    }

    /// 切换工具模式并持久化
    pub fn tool_mode(&mut self, mode: ToolMode) -> Result<&mut Self> {
        debug!("mode: {}", mode);
        self.hardware.mode = mode;
        self.save_hardware_settings()?;
        if !self.simulated {
            let code = self.config.modes.get(mode).code;
            self.driver.set_mode(code)?;
        }
        self.update_position(false)
    }

    /// 按名称切换工具模式
    pub fn tool_mode_by_name(&mut self, name: &str) -> Result<&mut Self> {
        let mode = name
            .parse::<ToolMode>()
            .map_err(|e| SwiftError::UnknownMode(e.0))?;
        self.tool_mode(mode)
    }

    /// 按固件编号切换工具模式
    pub fn tool_mode_by_code(&mut self, code: u8) -> Result<&mut Self> {
        let mode = self
            .config
            .modes
            .mode_for_code(code)
            .ok_or_else(|| SwiftError::UnknownMode(code.to_string()))?;
        self.tool_mode(mode)
    }

    // ==================== Tools ====================

    fn require_mode(&self, required: ToolMode) -> Result<()> {
        if self.hardware.mode != required {
            return Err(SwiftError::ModeMismatch {
                required,
                current: self.hardware.mode,
            });
        }
        Ok(())
    }

    /// 吸盘开关（需要 `general` 模式）
    ///
    /// `sleep` 为 `None` 时使用配置的等待时间。
    pub fn pump(&mut self, enable: bool, sleep: Option<Duration>) -> Result<&mut Self> {
        debug!("pump: {}", enable);
        self.require_mode(ToolMode::General)?;
        if self.simulated {
            return Ok(self);
        }
        self.driver.set_pump(enable)?;
        settle(sleep.unwrap_or_else(|| self.config.tools.pump(enable)));
        Ok(self)
    }

    /// 夹爪开关（需要 `pen_gripper` 模式）
    pub fn grip(&mut self, enable: bool, sleep: Option<Duration>) -> Result<&mut Self> {
        debug!("grip: {}", enable);
        self.require_mode(ToolMode::PenGripper)?;
        if self.simulated {
            return Ok(self);
        }
        self.driver.set_gripper(enable)?;
        settle(sleep.unwrap_or_else(|| self.config.tools.grip(enable)));
        Ok(self)
    }

    pub fn is_pumping(&mut self) -> Result<bool> {
        if self.simulated {
            return Ok(false);
        }
        Ok(self.driver.pump_status()?.is_active())
    }

    pub fn is_gripping(&mut self) -> Result<bool> {
        if self.simulated {
            return Ok(false);
        }
        Ok(self.driver.gripper_catch()?.is_active())
    }

    /// 吸盘限位开关是否被按下（需要 `general` 模式，模拟时不可用）
    pub fn is_pressing(&mut self) -> Result<bool> {
        debug!("is_pressing");
        self.require_mode(ToolMode::General)?;
        self.ensure_hardware("read the limit switch")?;
        Ok(self.driver.get_limit_switch()?)
    }

    // ==================== Compound Commands ====================

    /// 回到安全位置
    ///
    /// 先移动到已知的绝对坐标，再按顺序设置底座、大臂、小臂角度（与工具模式无关）。
    pub fn home(&mut self) -> Result<&mut Self> {
        debug!("home");
        let home = self.config.home.clone();
        self.push_settings();
        self.speed(home.speed);
        self.acceleration(home.acceleration)?;
        self.move_to_raw(home.start, false)?;
        self.wait_for_arrival(None, false)?;
        if self.simulated {
            self.move_to_raw(home.simulate_position, false)?;
        } else {
            let angles = self.hardware.home_angles.unwrap_or(home.angles);
            for joint in &home.order {
                self.driver
                    .set_servo_angle(servo_for(*joint), angles.get(*joint))?;
            }
        }
        self.wait_for_arrival(None, false)?;
        self.pop_settings()?;
        // 通过舵机角度移动后，主机侧坐标已不可信
        if !self.simulated {
            settle(home.settle());
        }
        self.update_position(false)?;
        self.rotate_to(self.config.wrist.default)
    }

    /// 向下探测直到吸盘限位开关被按下
    ///
    /// 超过配置的最大行程返回 [`SwiftError::ProbeLimit`]（设置栈已恢复）。
    pub fn probe(&mut self, step: Option<f64>, speed: Option<f64>) -> Result<&mut Self> {
        debug!("probe");
        let step = step.unwrap_or(self.config.probe.step);
        if !(step > 0.0 && step.is_finite()) {
            return Err(SwiftError::invalid_parameter("step", "must be a positive number"));
        }
        let speed = speed.unwrap_or(self.config.probe.speed);
        let max_travel = self.config.probe.max_travel;

        self.push_settings();
        self.speed(speed);
        if !self.simulated {
            let mut travelled = 0.0;
            while !self.is_pressing()? {
                if travelled + step > max_travel {
                    self.pop_settings()?;
                    return Err(SwiftError::ProbeLimit { travelled });
                }
                self.move_relative(Target::new().z(-step), false)?;
                self.wait_for_arrival(None, true)?;
                travelled += step;
            }
            debug!("probe pressed after {}mm", travelled);
        }
        self.pop_settings()
    }

    /// 等待有人推动机械臂
    ///
    /// XY 平面上偏离起始位置超过 `distance`（默认取配置值）即返回。
    /// `timeout` 为 `None` 时一直等待。
    pub fn wait_for_touch(
        &mut self,
        distance: Option<f64>,
        timeout: Option<Duration>,
    ) -> Result<&mut Self> {
        debug!("wait_for_touch");
        if self.simulated {
            return Ok(self);
        }
        self.wait_for_arrival(None, false)?;
        let started = Instant::now();
        self.update_position(false)?;
        let threshold = distance.unwrap_or(self.config.touch.threshold);
        let poll = self.config.touch.poll_interval();
        let start = self.position;
        loop {
            if let Some(timeout) = timeout.filter(|t| started.elapsed() > *t) {
                return Err(SwiftError::TouchTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            self.update_position(false)?;
            if start.planar_distance_to(&self.position) > threshold {
                info!("Touch detected at {}", self.position);
                return Ok(self);
            }
            settle(poll);
        }
    }

    /// 释放工具、回零并关闭所有电机
    pub fn sleep(&mut self) -> Result<&mut Self> {
        debug!("sleep");
        match self.hardware.mode {
            ToolMode::General => {
                self.pump(false, Some(Duration::ZERO))?;
            }
            ToolMode::PenGripper => {
                self.grip(false, Some(Duration::ZERO))?;
            }
            ToolMode::Laser | ToolMode::Printer3d => {}
        }
        self.rotate_to(self.config.wrist.default)?;
        self.home()?;
        self.disable_all_motors()
    }

    // ==================== Motors ====================

    pub fn enable_all_motors(&mut self) -> Result<&mut Self> {
        debug!("enable_all_motors");
        if !self.simulated {
            self.driver.set_servo_attach(ServoSelection::All)?;
        }
        self.enabled = true;
        // 电机断电期间可能被移动过
        self.update_position(false)
    }

    pub fn disable_all_motors(&mut self) -> Result<&mut Self> {
        debug!("disable_all_motors");
        if !self.simulated {
            self.driver.set_servo_detach(ServoSelection::All)?;
        }
        self.enabled = false;
        Ok(self)
    }

    pub fn disable_base(&mut self) -> Result<&mut Self> {
        debug!("disable_base");
        if !self.simulated {
            self.driver
                .set_servo_detach(ServoSelection::One(Servo::Base))?;
        }
        self.enabled = false;
        Ok(self)
    }

    // ==================== Wrist ====================

    /// 腕部转到指定角度（度，90 为居中）
    pub fn rotate_to(&mut self, angle: f64) -> Result<&mut Self> {
        debug!("rotate_to: {}", angle);
        let wrist = self.config.wrist.clone();
        let clamped = angle.clamp(wrist.min, wrist.max);
        if clamped != angle {
            debug!("angle changed to: {}", clamped);
        }
        // 上一条运动命令可能尚未到位
        self.wait_for_arrival(None, false)?;
        if !self.simulated {
            self.driver
                .set_wrist(clamped + self.hardware.wrist_offset)?;
            settle(wrist.settle());
        }
        self.wrist_angle = clamped;
        Ok(self)
    }

    pub fn rotate_relative(&mut self, delta: f64) -> Result<&mut Self> {
        self.rotate_to(self.wrist_angle + delta)
    }

    fn set_wrist_offset(&mut self, wrist_offset: f64) -> Result<&mut Self> {
        let real_angle = self.wrist_angle + self.hardware.wrist_offset;
        self.hardware.wrist_offset = wrist_offset;
        self.save_hardware_settings()?;
        self.wrist_angle = real_angle - wrist_offset;
        Ok(self)
    }

    /// 当前腕部物理位置即为居中位置
    pub fn wrist_is_centered(&mut self) -> Result<&mut Self> {
        let real_angle = self.wrist_angle + self.hardware.wrist_offset;
        self.set_wrist_offset(real_angle - self.config.wrist.default)
    }

    pub fn wrist_offset_reset(&mut self) -> Result<&mut Self> {
        self.set_wrist_offset(0.0)
    }

    // ==================== Z Calibration ====================

    fn set_z_offset(&mut self, z_offset: f64) -> Result<&mut Self> {
        let raw_z = self.position.z - self.hardware.z_offset;
        self.hardware.z_offset = z_offset;
        self.save_hardware_settings()?;
        self.position.z = raw_z + z_offset;
        Ok(self)
    }

    /// 当前高度即为 z = 0
    pub fn z_is_level(&mut self) -> Result<&mut Self> {
        self.update_position(false)?;
        let raw_z = self.position.z - self.hardware.z_offset;
        self.set_z_offset(-raw_z)
    }

    pub fn z_offset_reset(&mut self) -> Result<&mut Self> {
        self.set_z_offset(0.0)
    }

    /// 底座角度（弧度，0 为正前方，+Y 方向为正）
    ///
    /// 从舵机读取而不是由坐标计算，因为模式偏移会影响笛卡尔坐标。
    pub fn base_angle(&mut self) -> Result<Option<f64>> {
        let Some(degrees) = self.driver.get_servo_angle(Servo::Base)? else {
            return Ok(None);
        };
        let radians = (degrees - 90.0).to_radians();
        Ok(Some((radians * 1000.0).round() / 1000.0))
    }

    // ==================== Accessors ====================

    /// 预期位置
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn wrist_angle(&self) -> f64 {
        self.wrist_angle
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_simulating(&self) -> bool {
        self.simulated
    }

    pub fn hardware_settings(&self) -> &HardwareSettings {
        &self.hardware
    }

    pub fn current_mode(&self) -> ToolMode {
        self.hardware.mode
    }

    pub fn tool_mode_name(&self) -> &'static str {
        self.hardware.mode.name()
    }

    /// 当前模式相对 `general` 的偏移
    pub fn mode_offset(&self) -> Position {
        self.config.modes.get(self.hardware.mode).offset
    }

    pub fn current_speed(&self) -> f64 {
        self.motion.current().speed
    }

    pub fn current_acceleration(&self) -> f64 {
        self.motion.current().acceleration
    }

    pub fn settings_depth(&self) -> usize {
        self.motion.depth()
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    /// 设置目录（内存存储时为 `None`）
    pub fn settings_dir(&self) -> Option<&Path> {
        self.settings_dir.as_deref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }
}

impl<D: SwiftDriver> std::fmt::Debug for Swift<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Swift")
            .field("id", &self.hardware.id)
            .field("mode", &self.hardware.mode)
            .field("position", &self.position)
            .field("wrist_angle", &self.wrist_angle)
            .field("enabled", &self.enabled)
            .field("simulated", &self.simulated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SwiftBuilder;
    use approx::assert_abs_diff_eq;
    use uarm_driver::{FlushStatus, MockCommand, MockDriver, MockHandle};

    fn fast_config() -> ArmConfig {
        let mut config = ArmConfig::default();
        config.wrist.settle_ms = 0;
        config.home.settle_ms = 0;
        config.tools.pump_on_ms = 0;
        config.tools.pump_off_ms = 0;
        config.tools.grip_off_ms = 0;
        config.touch.poll_interval_ms = 1;
        config
    }

    fn mock_swift() -> (Swift<MockDriver>, MockHandle, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let driver = MockDriver::new();
        let handle = driver.handle();
        let swift = SwiftBuilder::new()
            .config(fast_config())
            .settings_dir(dir.path())
            .build(driver)
            .unwrap();
        (swift, handle, dir)
    }

    #[test]
    fn test_connect_loads_settings_and_centers_wrist() {
        let (swift, handle, _dir) = mock_swift();
        assert_eq!(swift.hardware_settings().id, "MOCK0001");
        assert_eq!(swift.wrist_angle(), 90.0);
        assert!(!swift.is_enabled());

        let commands = handle.commands();
        assert_eq!(commands[0], MockCommand::Connect);
        assert!(commands.contains(&MockCommand::SpeedFactor(0.007)));
        assert!(commands.contains(&MockCommand::SetMode(0)));
        assert!(commands.contains(&MockCommand::Wrist(90.0)));
    }

    #[test]
    fn test_incompatible_firmware() {
        let driver = MockDriver::new();
        driver.handle().set_device_info(DeviceInfo {
            device_type: "SwiftPro".into(),
            firmware_version: "4.6.1".into(),
            hardware_version: "3.3".into(),
            device_unique: Some("X".into()),
        });
        let dir = tempfile::TempDir::new().unwrap();
        let err = SwiftBuilder::new()
            .settings_dir(dir.path())
            .build(driver)
            .unwrap_err();
        assert!(matches!(err, SwiftError::IncompatibleDevice(_)), "{err}");
    }

    #[test]
    fn test_missing_unique_id() {
        let driver = MockDriver::new();
        driver.handle().set_device_info(DeviceInfo {
            device_type: "SwiftPro".into(),
            firmware_version: "4.5.0".into(),
            hardware_version: "3.3".into(),
            device_unique: None,
        });
        let dir = tempfile::TempDir::new().unwrap();
        let err = SwiftBuilder::new()
            .settings_dir(dir.path())
            .build(driver)
            .unwrap_err();
        assert!(matches!(err, SwiftError::IncompatibleDevice(_)));
    }

    #[test]
    fn test_move_to_enables_and_applies_z_offset() {
        let (mut swift, handle, _dir) = mock_swift();
        swift.hardware.z_offset = 2.0;
        handle.take_commands();

        swift
            .speed(100.0)
            .move_to(Target::new().x(200.0).z(50.0), false)
            .unwrap();

        assert!(swift.is_enabled());
        assert_eq!(swift.position(), Position::new(200.0, 0.0, 50.0));
        let commands = handle.commands();
        assert_eq!(commands[0], MockCommand::Attach(ServoSelection::All));
        assert_eq!(handle.last_move(), Some((Position::new(200.0, 0.0, 48.0), 6000.0)));
    }

    #[test]
    fn test_empty_move_is_noop() {
        let (mut swift, handle, _dir) = mock_swift();
        handle.take_commands();
        let before = swift.position();
        swift.move_to(Target::new(), true).unwrap();
        assert_eq!(swift.position(), before);
        assert!(handle.commands().is_empty());
    }

    #[test]
    fn test_unreachable_target() {
        let (mut swift, handle, _dir) = mock_swift();
        handle.set_unreachable(true);
        let err = swift.move_to(Target::new().x(400.0), true).unwrap_err();
        assert!(matches!(err, SwiftError::UnreachableTarget { .. }));
        assert!(handle.moves().is_empty());
        assert!(!swift.can_move_relative(Target::new().z(10.0)).unwrap());
    }

    #[test]
    fn test_speed_and_acceleration_clamp() {
        let (mut swift, handle, _dir) = mock_swift();
        swift.speed(0.0);
        assert_eq!(swift.current_speed(), 1.0);
        swift.speed(1000.0);
        assert_eq!(swift.current_speed(), 600.0);
        swift.acceleration(100.0).unwrap();
        assert_eq!(swift.current_acceleration(), 50.0);
        assert!(handle.commands().contains(&MockCommand::Acceleration(50.0)));
    }

    #[test]
    fn test_push_pop_settings() {
        let (mut swift, _handle, _dir) = mock_swift();
        swift.speed(120.0);
        swift.push_settings().speed(10.0);
        swift.acceleration(1.0).unwrap();
        swift.pop_settings().unwrap();
        assert_eq!(swift.current_speed(), 120.0);
        assert_eq!(swift.current_acceleration(), 5.0);

        let err = swift.pop_settings().unwrap_err();
        assert!(matches!(err, SwiftError::StateUnderflow));
    }

    #[test]
    fn test_malformed_reads_are_ignored() {
        let (mut swift, handle, _dir) = mock_swift();
        let before = swift.position();
        handle.push_position_read(None);
        handle.push_position_read(Some(Position::new(f64::NAN, 0.0, 0.0)));
        handle.fail_position_reads(1);
        swift.update_position(true).unwrap();
        swift.update_position(true).unwrap();
        swift.update_position(true).unwrap();
        assert_eq!(swift.position(), before);
    }

    #[test]
    fn test_skip_detection_resyncs_before_error() {
        let (mut swift, handle, _dir) = mock_swift();
        swift
            .move_to(Target::from(Position::new(150.0, 0.0, 40.0)), false)
            .unwrap();
        handle.push_position_read(Some(Position::new(152.0, 0.0, 40.0)));

        let err = swift.wait_for_arrival(None, true).unwrap_err();
        match err {
            SwiftError::PositionDivergence { distance, .. } => {
                assert_abs_diff_eq!(distance, 2.0, epsilon = 1e-9)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(swift.position(), Position::new(152.0, 0.0, 40.0));
    }

    #[test]
    fn test_small_drift_is_tolerated() {
        let (mut swift, handle, _dir) = mock_swift();
        swift
            .move_to(Target::from(Position::new(150.0, 0.0, 40.0)), false)
            .unwrap();
        handle.push_position_read(Some(Position::new(151.0, 0.0, 40.5)));
        swift.wait_for_arrival(None, true).unwrap();
        assert_eq!(swift.position(), Position::new(151.0, 0.0, 40.5));
    }

    #[test]
    fn test_motion_timeout() {
        let (mut swift, handle, _dir) = mock_swift();
        handle.set_flush_status(FlushStatus::Timeout);
        let err = swift
            .wait_for_arrival(Some(Duration::from_millis(250)), true)
            .unwrap_err();
        assert!(matches!(err, SwiftError::MotionTimeout { timeout_ms: 250 }));
    }

    #[test]
    fn test_tool_mode_persists() {
        let (mut swift, handle, dir) = mock_swift();
        swift.tool_mode_by_name("pen_gripper").unwrap();
        assert_eq!(swift.current_mode(), ToolMode::PenGripper);
        assert!(handle.commands().contains(&MockCommand::SetMode(3)));

        let mut store = HardwareSettingsStore::in_directory(dir.path(), ToolMode::General).unwrap();
        assert_eq!(store.load("MOCK0001").unwrap().mode, ToolMode::PenGripper);

        assert!(matches!(
            swift.tool_mode_by_name("drill").unwrap_err(),
            SwiftError::UnknownMode(_)
        ));
        assert!(matches!(
            swift.tool_mode_by_code(7).unwrap_err(),
            SwiftError::UnknownMode(_)
        ));
        swift.tool_mode_by_code(1).unwrap();
        assert_eq!(swift.current_mode(), ToolMode::Laser);
    }

    #[test]
    fn test_tools_require_mode() {
        let (mut swift, handle, _dir) = mock_swift();
        swift.pump(true, None).unwrap();
        assert!(swift.is_pumping().unwrap());
        assert!(matches!(
            swift.grip(true, None).unwrap_err(),
            SwiftError::ModeMismatch {
                required: ToolMode::PenGripper,
                current: ToolMode::General
            }
        ));

        swift.tool_mode(ToolMode::PenGripper).unwrap();
        swift.grip(true, None).unwrap();
        assert!(swift.is_gripping().unwrap());
        assert!(matches!(
            swift.is_pressing().unwrap_err(),
            SwiftError::ModeMismatch { .. }
        ));
        assert!(handle.commands().contains(&MockCommand::Gripper(true)));
    }

    #[test]
    fn test_home_uses_servo_angles_in_order() {
        let (mut swift, handle, _dir) = mock_swift();
        handle.take_commands();
        swift.speed(42.0);
        swift.home().unwrap();

        let angles: Vec<_> = handle
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                MockCommand::ServoAngle(servo, angle) => Some((servo, angle)),
                _ => None,
            })
            .collect();
        assert_eq!(
            angles,
            vec![(Servo::Base, 90.0), (Servo::Shoulder, 118.0), (Servo::Elbow, 50.0)]
        );
        assert_eq!(handle.moves()[0], Position::new(200.0, 0.0, 150.0));
        assert_eq!(swift.current_speed(), 42.0);
        assert_eq!(swift.settings_depth(), 0);
    }

    #[test]
    fn test_home_angles_override_per_unit() {
        let (mut swift, handle, _dir) = mock_swift();
        swift.hardware.home_angles = Some(uarm_tools::JointAngles {
            base: 91.0,
            shoulder: 117.0,
            elbow: 49.0,
        });
        handle.take_commands();
        swift.home().unwrap();
        assert!(
            handle
                .commands()
                .contains(&MockCommand::ServoAngle(Servo::Shoulder, 117.0))
        );
    }

    #[test]
    fn test_probe_stops_on_limit_switch() {
        let (mut swift, handle, _dir) = mock_swift();
        swift
            .move_to(Target::from(Position::new(150.0, 0.0, 40.0)), false)
            .unwrap();
        handle.take_commands();
        handle.push_limit_switch_read(false);
        handle.push_limit_switch_read(false);
        handle.set_limit_switch(true);

        swift.probe(Some(1.0), None).unwrap();
        assert_eq!(handle.moves().len(), 2);
        assert_eq!(swift.position().z, 38.0);
        assert_eq!(swift.settings_depth(), 0);
    }

    #[test]
    fn test_probe_is_bounded() {
        let (mut swift, _handle, _dir) = mock_swift();
        swift.config.probe.max_travel = 5.0;
        let err = swift.probe(Some(1.0), None).unwrap_err();
        match err {
            SwiftError::ProbeLimit { travelled } => assert_eq!(travelled, 5.0),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(swift.settings_depth(), 0);
        assert!(matches!(
            swift.probe(Some(0.0), None).unwrap_err(),
            SwiftError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn test_wrist_calibration() {
        let (mut swift, handle, _dir) = mock_swift();
        swift.rotate_to(100.0).unwrap();
        swift.wrist_is_centered().unwrap();
        assert_eq!(swift.wrist_angle(), 90.0);
        assert_eq!(swift.hardware_settings().wrist_offset, 10.0);

        handle.take_commands();
        swift.rotate_relative(-20.0).unwrap();
        assert!(handle.commands().contains(&MockCommand::Wrist(80.0)));

        swift.rotate_to(500.0).unwrap();
        assert_eq!(swift.wrist_angle(), 180.0);

        swift.wrist_offset_reset().unwrap();
        assert_eq!(swift.hardware_settings().wrist_offset, 0.0);
        assert_eq!(swift.wrist_angle(), 190.0);
    }

    #[test]
    fn test_z_calibration() {
        let (mut swift, handle, _dir) = mock_swift();
        handle.set_position(Position::new(150.0, 0.0, 12.5));
        swift.z_is_level().unwrap();
        assert_eq!(swift.hardware_settings().z_offset, -12.5);
        assert_eq!(swift.position().z, 0.0);

        // 固件读数不变，加上偏差后仍为 0
        swift.update_position(false).unwrap();
        assert_eq!(swift.position().z, 0.0);

        swift.z_offset_reset().unwrap();
        assert_eq!(swift.hardware_settings().z_offset, 0.0);
        assert_eq!(swift.position().z, 12.5);
    }

    #[test]
    fn test_disable_base_detaches_only_base() {
        let (mut swift, handle, _dir) = mock_swift();
        swift.enable_all_motors().unwrap();
        assert!(swift.is_enabled());
        handle.take_commands();

        swift.disable_base().unwrap();
        assert!(!swift.is_enabled());
        assert_eq!(
            handle.take_commands(),
            vec![MockCommand::Detach(ServoSelection::One(Servo::Base))]
        );

        // 下一次移动重新给所有电机上电
        swift.move_to(Target::new().x(180.0), false).unwrap();
        assert!(swift.is_enabled());
        assert_eq!(handle.commands()[0], MockCommand::Attach(ServoSelection::All));
    }

    #[test]
    fn test_enable_resyncs_after_manual_repositioning() {
        let (mut swift, handle, _dir) = mock_swift();
        swift
            .move_to(Target::from(Position::new(200.0, 0.0, 50.0)), false)
            .unwrap();
        swift.disable_all_motors().unwrap();
        assert!(handle.commands().contains(&MockCommand::Detach(ServoSelection::All)));

        // 断电期间被手动拖到新位置
        handle.push_position_read(Some(Position::new(160.0, 40.0, 80.0)));
        swift.enable_all_motors().unwrap();
        assert!(swift.is_enabled());
        assert_eq!(swift.position(), Position::new(160.0, 40.0, 80.0));
    }

    #[test]
    fn test_move_after_manual_repositioning_keeps_new_axes() {
        let (mut swift, handle, _dir) = mock_swift();
        swift
            .move_to(Target::from(Position::new(200.0, 0.0, 50.0)), false)
            .unwrap();
        swift.disable_all_motors().unwrap();
        handle.set_position(Position::new(160.0, 40.0, 80.0));

        // 未指定的轴取重新同步后的位置
        swift.move_to(Target::new().z(100.0), true).unwrap();
        assert_eq!(swift.position(), Position::new(160.0, 40.0, 100.0));
        assert_eq!(handle.last_move().map(|(p, _)| p), Some(Position::new(160.0, 40.0, 100.0)));
    }

    #[test]
    fn test_sleep_disengages_tool_and_disables() {
        let (mut swift, handle, _dir) = mock_swift();
        swift.enable_all_motors().unwrap();
        handle.take_commands();
        swift.sleep().unwrap();
        let commands = handle.commands();
        assert_eq!(commands[0], MockCommand::Pump(false));
        assert_eq!(
            commands.last(),
            Some(&MockCommand::Detach(ServoSelection::All))
        );
        assert!(!swift.is_enabled());
    }

    #[test]
    fn test_base_angle() {
        let (mut swift, _handle, _dir) = mock_swift();
        swift
            .move_to(Target::from(Position::new(0.0, 150.0, 40.0)), false)
            .unwrap();
        let angle = swift.base_angle().unwrap().unwrap();
        assert_abs_diff_eq!(angle, std::f64::consts::FRAC_PI_2, epsilon = 1e-3);
    }
}
