//! Builder 模式实现
//!
//! 提供链式构造 [`Swift`] 实例的便捷方式。

use crate::error::{Result, SwiftError};
use crate::swift::Swift;
use std::path::PathBuf;
use tracing::debug;
use uarm_driver::{SimulatedDriver, SwiftDriver};
use uarm_tools::{ArmConfig, HardwareSettingsStore, default_settings_directory};

/// Swift Builder（链式构造）
///
/// # Example
///
/// ```
/// use uarm_client::SwiftBuilder;
///
/// // 模拟实例：不需要硬件，设置只保存在内存中
/// let mut swift = SwiftBuilder::new().simulate().unwrap();
/// assert!(swift.is_simulating());
/// swift.home().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SwiftBuilder {
    /// 机械臂配置（默认 [`ArmConfig::default`]）
    config: Option<ArmConfig>,
    /// 硬件设置与录制文件所在目录
    settings_dir: Option<PathBuf>,
    /// 构建时是否立即连接真实设备
    connect: bool,
}

impl Default for SwiftBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SwiftBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            settings_dir: None,
            connect: true,
        }
    }

    /// 设置配置（可选）
    pub fn config(mut self, config: ArmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 设置目录（可选）
    ///
    /// 未指定时：模拟实例使用内存存储，真实设备使用 [`default_settings_directory`]。
    pub fn settings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings_dir = Some(dir.into());
        self
    }

    /// 构建时是否连接（默认 `true`，仅对真实设备有效）
    pub fn connect(mut self, connect: bool) -> Self {
        self.connect = connect;
        self
    }

    /// 使用给定驱动构建实例
    ///
    /// 模拟驱动直接完成初始化；真实设备在 `connect` 为 `true` 时执行 [`Swift::connect`]。
    ///
    /// # Errors
    /// - `SwiftError::Configuration`: 配置校验失败
    /// - `SwiftError::Storage`: 设置目录不可用
    /// - 连接过程中的所有错误
    pub fn build<D: SwiftDriver>(self, driver: D) -> Result<Swift<D>> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| SwiftError::configuration(format!("{e:#}")))?;

        let simulated = driver.is_simulated();
        let mode = config.default_mode;
        let (store, settings_dir) = match self.settings_dir {
            Some(dir) => (HardwareSettingsStore::in_directory(&dir, mode)?, Some(dir)),
            None if simulated => (HardwareSettingsStore::in_memory(mode), None),
            None => {
                let dir = default_settings_directory()?;
                (HardwareSettingsStore::in_directory(&dir, mode)?, Some(dir))
            }
        };
        debug!(
            "Building {} instance, settings: {:?}",
            if simulated { "simulated" } else { "hardware" },
            settings_dir
        );

        let mut swift = Swift::new(driver, config, store, settings_dir);
        if simulated {
            swift.setup()?;
        } else if self.connect {
            swift.connect()?;
        }
        Ok(swift)
    }

    /// 构建模拟实例
    pub fn simulate(self) -> Result<Swift<SimulatedDriver>> {
        let home = self
            .config
            .as_ref()
            .map(|c| c.home.simulate_position)
            .unwrap_or_else(|| ArmConfig::default().home.simulate_position);
        self.build(SimulatedDriver::new(home))
    }
}
