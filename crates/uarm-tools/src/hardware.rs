//! # 硬件设置持久化
//!
//! 每台机械臂（按设备唯一 ID）保存一份校准数据：工具模式、Z 轴偏差、腕部偏差，
//! 以及可选的回零角度覆盖值。文件为 JSON 对象，键为设备 ID，每次修改都整体重写。

use crate::config::JointAngles;
use crate::mode::ToolMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 硬件设置文件名
pub const HARDWARE_SETTINGS_FILE_NAME: &str = "uarm_hardware_settings.json";

/// 模拟设备的 ID
pub const SIMULATE_ID: &str = "simulate";

/// 单台设备的硬件设置
///
/// 缺失字段在反序列化时使用默认值补全，旧文件可以直接加载。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareSettings {
    pub id: String,
    pub mode: ToolMode,
    /// 实际高度 = 固件高度 + z_offset
    pub z_offset: f64,
    /// 加到腕部目标角度上的校准偏差
    pub wrist_offset: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_angles: Option<JointAngles>,
}

impl Default for HardwareSettings {
    fn default() -> Self {
        Self {
            id: SIMULATE_ID.to_string(),
            mode: ToolMode::General,
            z_offset: 0.0,
            wrist_offset: 0.0,
            home_angles: None,
        }
    }
}

impl HardwareSettings {
    /// 指定 ID 的默认设置
    pub fn for_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// 指定 ID 和初始工具模式的默认设置
    pub fn with_mode(id: impl Into<String>, mode: ToolMode) -> Self {
        Self {
            mode,
            ..Self::for_id(id)
        }
    }
}

/// 硬件设置存储
///
/// `path` 为 `None` 时只保存在内存中（模拟设备未指定目录时使用）。
/// 未保存过的设备（包括首次创建的 `simulate` 条目）使用 `default_mode`。
#[derive(Debug, Clone)]
pub struct HardwareSettingsStore {
    path: Option<PathBuf>,
    default_mode: ToolMode,
    entries: BTreeMap<String, HardwareSettings>,
}

impl HardwareSettingsStore {
    /// 仅内存存储
    pub fn in_memory(default_mode: ToolMode) -> Self {
        let mut store = Self {
            path: None,
            default_mode,
            entries: BTreeMap::new(),
        };
        store.entries = store.initial_entries();
        store
    }

    /// 打开目录下的设置文件（目录必须存在，文件不存在时创建）
    pub fn in_directory<P: AsRef<Path>>(dir: P, default_mode: ToolMode) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            anyhow::bail!("不是目录: {}", dir.display());
        }
        Self::open(dir.join(HARDWARE_SETTINGS_FILE_NAME), default_mode)
    }

    /// 打开设置文件
    pub fn open<P: Into<PathBuf>>(path: P, default_mode: ToolMode) -> Result<Self> {
        let path = path.into();
        let mut store = Self {
            path: Some(path),
            default_mode,
            entries: BTreeMap::new(),
        };
        store.init_file()?;
        store.reload()?;
        Ok(store)
    }

    /// 新设备使用的工具模式
    pub fn default_mode(&self) -> ToolMode {
        self.default_mode
    }

    fn initial_entries(&self) -> BTreeMap<String, HardwareSettings> {
        let mut entries = BTreeMap::new();
        entries.insert(
            SIMULATE_ID.to_string(),
            HardwareSettings::with_mode(SIMULATE_ID, self.default_mode),
        );
        entries
    }

    /// 文件路径（内存存储返回 `None`）
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 文件不存在时写入仅包含 `simulate` 条目的初始文件
    fn init_file(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if path.is_file() {
            return Ok(());
        }
        info!("Creating hardware settings file: {}", path.display());
        write_json(path, &self.initial_entries())
    }

    /// 重新读取文件
    ///
    /// 文件内容无法解析时记录警告并使用默认设置，下次保存时覆盖该文件。
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取硬件设置失败: {}", path.display()))?;
        let mut entries: BTreeMap<String, HardwareSettings> = match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Failed to parse hardware settings {}, using defaults: {}",
                    path.display(),
                    e
                );
                self.initial_entries()
            },
        };
        // 键才是权威 ID
        for (id, settings) in entries.iter_mut() {
            settings.id = id.clone();
        }
        self.entries = entries;
        Ok(())
    }

    /// 所有已保存的设置
    pub fn load_all(&self) -> &BTreeMap<String, HardwareSettings> {
        &self.entries
    }

    /// 读取设备设置（与默认值合并）
    ///
    /// 新设备会立即以默认值写入存储。
    pub fn load(&mut self, id: &str) -> Result<HardwareSettings> {
        if let Some(settings) = self.entries.get(id) {
            debug!("Loaded hardware settings for {}", id);
            return Ok(settings.clone());
        }
        info!("New device {}, using default hardware settings ({})", id, self.default_mode);
        let settings = HardwareSettings::with_mode(id, self.default_mode);
        self.save(&settings)?;
        Ok(settings)
    }

    /// 保存设备设置并重写文件
    pub fn save(&mut self, settings: &HardwareSettings) -> Result<()> {
        self.entries.insert(settings.id.clone(), settings.clone());
        if let Some(path) = &self.path {
            write_json(path, &self.entries)?;
            debug!("Saved hardware settings for {} to {}", settings.id, path.display());
        }
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("序列化 JSON 失败")?;
    fs::write(path, json + "\n").with_context(|| format!("写入文件失败: {}", path.display()))
}

/// 默认设置目录
///
/// 当前目录下已有设置文件时使用当前目录，否则使用平台配置目录下的 `uarm/`（不存在时创建）。
pub fn default_settings_directory() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("获取当前目录失败")?;
    if cwd.join(HARDWARE_SETTINGS_FILE_NAME).is_file() {
        return Ok(cwd);
    }
    let dir = dirs::config_dir()
        .context("无法确定平台配置目录")?
        .join("uarm");
    fs::create_dir_all(&dir).with_context(|| format!("创建目录失败: {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_has_simulate_entry() {
        let mut store = HardwareSettingsStore::in_memory(ToolMode::General);
        assert!(store.path().is_none());
        let settings = store.load(SIMULATE_ID).unwrap();
        assert_eq!(settings, HardwareSettings::default());
    }

    #[test]
    fn test_new_device_is_created_and_persisted() {
        let dir = TempDir::new().unwrap();
        let mut store = HardwareSettingsStore::in_directory(dir.path(), ToolMode::General).unwrap();

        let settings = store.load("ABC123").unwrap();
        assert_eq!(settings.id, "ABC123");
        assert_eq!(settings.mode, ToolMode::General);

        let reopened = HardwareSettingsStore::in_directory(dir.path(), ToolMode::General).unwrap();
        assert!(reopened.load_all().contains_key("ABC123"));
        assert!(reopened.load_all().contains_key(SIMULATE_ID));
    }

    #[test]
    fn test_partial_entry_is_merged_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HARDWARE_SETTINGS_FILE_NAME);
        fs::write(&path, r#"{"unit-7": {"z_offset": 2.5, "mode": "pen_gripper"}}"#).unwrap();

        let mut store = HardwareSettingsStore::open(&path, ToolMode::General).unwrap();
        let settings = store.load("unit-7").unwrap();
        assert_eq!(settings.id, "unit-7");
        assert_eq!(settings.z_offset, 2.5);
        assert_eq!(settings.wrist_offset, 0.0);
        assert_eq!(settings.mode, ToolMode::PenGripper);
        assert!(settings.home_angles.is_none());
    }

    #[test]
    fn test_save_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let mut store = HardwareSettingsStore::in_directory(dir.path(), ToolMode::General).unwrap();

        let mut settings = store.load("unit-1").unwrap();
        settings.wrist_offset = -3.0;
        settings.home_angles = Some(JointAngles {
            base: 90.0,
            shoulder: 120.0,
            elbow: 48.0,
        });
        store.save(&settings).unwrap();

        let mut reopened = HardwareSettingsStore::in_directory(dir.path(), ToolMode::General).unwrap();
        assert_eq!(reopened.load("unit-1").unwrap(), settings);
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(HardwareSettingsStore::in_directory(&missing, ToolMode::General).is_err());
    }

    #[test]
    fn test_new_device_uses_configured_mode() {
        let dir = TempDir::new().unwrap();
        let mut store = HardwareSettingsStore::in_directory(dir.path(), ToolMode::PenGripper).unwrap();
        assert_eq!(store.default_mode(), ToolMode::PenGripper);

        assert_eq!(store.load(SIMULATE_ID).unwrap().mode, ToolMode::PenGripper);
        assert_eq!(store.load("unit-9").unwrap().mode, ToolMode::PenGripper);

        // 已保存的设备不受默认模式影响
        let mut reopened = HardwareSettingsStore::in_directory(dir.path(), ToolMode::Laser).unwrap();
        assert_eq!(reopened.load("unit-9").unwrap().mode, ToolMode::PenGripper);
        assert_eq!(reopened.load("unit-10").unwrap().mode, ToolMode::Laser);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HARDWARE_SETTINGS_FILE_NAME);
        fs::write(&path, "{ \"unit-1\": ").unwrap();

        let mut store = HardwareSettingsStore::open(&path, ToolMode::Laser).unwrap();
        assert_eq!(store.load_all().len(), 1);
        assert_eq!(store.load(SIMULATE_ID).unwrap().mode, ToolMode::Laser);

        // 保存后文件重新可读
        store.load("unit-1").unwrap();
        let reopened = HardwareSettingsStore::open(&path, ToolMode::General).unwrap();
        assert!(reopened.load_all().contains_key("unit-1"));
    }
}
