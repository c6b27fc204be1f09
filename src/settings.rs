//! 宿主设置文件
//!
//! 可选的 JSON 设置文件，字段全部可缺省；命令行参数与环境变量优先于文件。
//! 生成选项（档位 / 分辨率 / 水印）固定，不在可编辑范围内。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::tryon::TryOnConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub backend_url: Option<String>,
    pub tenant_id: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub max_file_size: Option<u64>,
}

impl AppSettings {
    /// 把已设置的字段覆盖到配置上。
    pub fn apply_to(&self, config: &mut TryOnConfig) {
        if let Some(url) = self.backend_url.as_ref().filter(|url| !url.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(tenant) = self.tenant_id.as_ref().filter(|tenant| !tenant.trim().is_empty()) {
            config.tenant_id = tenant.trim().to_string();
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = secs;
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = secs;
        }
        if let Some(limit) = self.max_file_size {
            config.max_file_size = limit;
        }
    }
}

/// 读取设置文件；文件不存在时返回 `Ok(None)`。
pub fn load_settings(path: &Path) -> Result<Option<AppSettings>, AppError> {
    if !path.exists() {
        log::debug!("⚙️ 设置文件不存在，使用默认配置 - {}", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let parsed = serde_json::from_str::<AppSettings>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件 '{}' 失败: {}", path.display(), e)))?;

    log::info!("⚙️ 已加载设置文件 - {}", path.display());
    Ok(Some(parsed))
}
