//! # 配置模块
//!
//! ## 设计思路
//!
//! 将后端地址、租户标识、生成参数与传输超时集中到 `TryOnConfig`，
//! 在构造控制器时一次性注入，替代“启动时读取的全局常量”。
//! 生成档位（quality / balanced / speed）作为高层语义，以稳定字符串与服务端交互。
//!
//! ## 实现思路
//!
//! - `Default` 提供与演示前端一致的默认值（`demo_tenant`、`speed`、`1024`、无水印）。
//! - `GenerationProfile` 负责档位字符串解析与反向输出。
//! - `validate` 在构造时做范围校验，尽早失败。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TryOnError;

/// 演示租户标识，随每次提交发送。
pub const DEFAULT_TENANT_ID: &str = "demo_tenant";
/// 默认后端地址（宿主通常会用环境变量覆盖）。
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8001";

/// 生成档位（面向产品语义）。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与速度平衡
/// - `Speed`：优先出图速度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProfile {
    Quality,
    Balanced,
    Speed,
}

impl GenerationProfile {
    /// 将档位输出为稳定字符串，与服务端约定一致。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl FromStr for GenerationProfile {
    type Err = TryOnError;

    fn from_str(profile: &str) -> Result<Self, Self::Err> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(TryOnError::Config(format!(
                "未知生成档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }
}

impl fmt::Display for GenerationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 每次提交附带的生成参数。
///
/// 固定默认值，不对最终用户开放编辑。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub profile: GenerationProfile,
    #[serde(rename = "maxRes")]
    pub max_res: u32,
    pub watermark: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            profile: GenerationProfile::Speed,
            max_res: 1024,
            watermark: false,
        }
    }
}

/// 试穿客户端配置。
#[derive(Debug, Clone)]
pub struct TryOnConfig {
    /// 后端根地址，不含 `/api` 前缀。
    pub base_url: String,
    /// 租户标识。
    pub tenant_id: String,
    /// 生成参数。
    pub options: GenerationOptions,
    /// 单张图片允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
    /// 单次请求总超时（秒）。生成耗时较长，默认放宽。
    pub request_timeout: u64,
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            options: GenerationOptions::default(),
            max_file_size: 50 * 1024 * 1024,
            connect_timeout: 8,
            request_timeout: 180,
        }
    }
}

impl TryOnConfig {
    /// 使用指定后端地址，其余保持默认。
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// 拼接 `/api` 下的完整地址。`path` 需以 `/` 开头。
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
    }

    /// 校验配置取值范围。
    pub fn validate(&self) -> Result<(), TryOnError> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(TryOnError::Config(format!(
                "后端地址必须以 http:// 或 https:// 开头：{}",
                self.base_url
            )));
        }
        if self.tenant_id.trim().is_empty() {
            return Err(TryOnError::Config("tenant_id 不能为空".to_string()));
        }
        if self.options.max_res == 0 {
            return Err(TryOnError::Config("maxRes 必须大于 0".to_string()));
        }
        if self.max_file_size == 0 {
            return Err(TryOnError::Config("max_file_size 必须大于 0".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(TryOnError::Config("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        if !(1..=3_600).contains(&self.request_timeout) {
            return Err(TryOnError::Config("request_timeout 必须在 1~3600 秒之间".to_string()));
        }
        Ok(())
    }
}
