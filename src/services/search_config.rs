//! 搜索配置服务
//! 以 JSON 文件保存服务地址、结果数量与摄像头参数

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult, ResultExt};
use crate::services::{FacingMode, StreamConstraints};
use crate::utils::{validate_jpeg_quality, validate_result_count};

const CONFIG_FILE_NAME: &str = "search_config.json";
pub const DEFAULT_RESULT_COUNT: u32 = 20;
pub const MAX_RESULT_COUNT: u32 = 100;

/// 相似度服务配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// 服务基础地址，同时用于解析返回的相对路径
    pub base_url: String,
    pub search_path: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            search_path: "/search/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn apply_defaults(&mut self) {
        let defaults = ServiceConfig::default();
        if self.base_url.trim().is_empty() {
            self.base_url = defaults.base_url;
        }
        if self.search_path.trim().is_empty() {
            self.search_path = defaults.search_path;
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = defaults.timeout_secs;
        }
    }
}

/// 摄像头配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub facing: FacingMode,
    pub width: u32,
    pub height: u32,
    /// JPEG 质量（1-100）
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let constraints = StreamConstraints::default();
        Self {
            facing: constraints.facing,
            width: constraints.width,
            height: constraints.height,
            jpeg_quality: 90,
        }
    }
}

impl CameraConfig {
    pub fn constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing: self.facing,
            width: self.width,
            height: self.height,
        }
    }

    fn apply_defaults(&mut self) {
        let defaults = CameraConfig::default();
        if self.width == 0 || self.height == 0 {
            self.width = defaults.width;
            self.height = defaults.height;
        }
        self.jpeg_quality = validate_jpeg_quality(self.jpeg_quality);
    }
}

/// 配置数据结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub version: u32,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default = "default_result_count")]
    pub result_count: u32,
    #[serde(default)]
    pub camera: CameraConfig,
}

fn default_result_count() -> u32 {
    DEFAULT_RESULT_COUNT
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            version: 1,
            service: ServiceConfig::default(),
            result_count: DEFAULT_RESULT_COUNT,
            camera: CameraConfig::default(),
        }
    }
}

impl SearchConfig {
    fn apply_defaults(&mut self) {
        self.service.apply_defaults();
        self.camera.apply_defaults();
        self.result_count =
            validate_result_count(Some(self.result_count), DEFAULT_RESULT_COUNT, MAX_RESULT_COUNT);
    }
}

/// 配置服务
pub struct SearchConfigService {
    config_path: PathBuf,
}

impl SearchConfigService {
    /// 使用指定目录创建配置服务实例
    pub fn new(config_dir: &Path) -> Self {
        Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
        }
    }

    /// 使用系统标准配置目录
    /// Linux: ~/.config/visual-search/search_config.json
    pub fn from_default_dir() -> AppResult<Self> {
        let proj_dirs = ProjectDirs::from("com", "visualsearch", "visual-search")
            .ok_or_else(|| AppError::Config("无法确定配置目录".to_string()))?;
        Ok(Self::new(proj_dirs.config_dir()))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 加载配置（如果文件不存在则返回默认配置）
    pub fn load(&self) -> AppResult<SearchConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "Config file missing, using defaults");
            return Ok(SearchConfig::default());
        }

        let raw = fs::read(&self.config_path)?;
        let mut config: SearchConfig =
            serde_json::from_slice(&raw).config_err("解析配置文件失败")?;
        config.apply_defaults();
        Ok(config)
    }

    /// 保存配置
    pub fn save(&self, config: &SearchConfig) -> AppResult<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(config).config_err("序列化配置失败")?;
        fs::write(&self.config_path, json)?;
        Ok(())
    }

    /// 设置服务地址
    pub fn set_base_url(&self, base_url: &str) -> AppResult<()> {
        let mut config = self.load()?;
        config.service.base_url = base_url.trim().to_string();
        self.save(&config)
    }

    /// 设置结果数量
    pub fn set_result_count(&self, count: u32) -> AppResult<()> {
        let mut config = self.load()?;
        config.result_count = validate_result_count(Some(count), DEFAULT_RESULT_COUNT, MAX_RESULT_COUNT);
        self.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let service = SearchConfigService::new(dir.path());
        let config = service.load().unwrap();

        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.result_count, 20);
        assert_eq!(config.service.endpoint(), "http://localhost:8000/search/");
        assert_eq!(config.camera.facing, FacingMode::Environment);
        assert_eq!(config.camera.jpeg_quality, 90);
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let service = SearchConfigService::new(&dir.path().join("nested"));

        service.set_base_url("http://search.local:9000/").unwrap();
        service.set_result_count(12).unwrap();

        let config = service.load().unwrap();
        assert_eq!(config.service.base_url, "http://search.local:9000/");
        assert_eq!(config.service.endpoint(), "http://search.local:9000/search/");
        assert_eq!(config.result_count, 12);
    }

    #[test]
    fn partial_file_is_normalized() {
        let dir = tempdir().unwrap();
        let service = SearchConfigService::new(dir.path());
        fs::write(
            service.config_path(),
            r#"{"version":1,"result_count":0,"camera":{"facing":"user","width":0,"height":0,"jpeg_quality":0}}"#,
        )
        .unwrap();

        let config = service.load().unwrap();
        assert_eq!(config.result_count, 1);
        assert_eq!(config.service, ServiceConfig::default());
        assert_eq!(config.camera.facing, FacingMode::User);
        assert_eq!((config.camera.width, config.camera.height), (1280, 720));
        assert_eq!(config.camera.jpeg_quality, 1);
    }

    #[test]
    fn invalid_json_is_config_error() {
        let dir = tempdir().unwrap();
        let service = SearchConfigService::new(dir.path());
        fs::write(service.config_path(), "not json").unwrap();

        assert!(matches!(service.load(), Err(AppError::Config(_))));
    }
}
