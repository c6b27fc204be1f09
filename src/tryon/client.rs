//! # 任务提交客户端
//!
//! ## 设计思路
//!
//! 控制器只依赖 `JobSubmitter` 这一个提交能力，真实实现是基于 `reqwest` 的
//! `HttpJobClient`，测试中可以替换为任意桩实现。
//!
//! ## 实现思路
//!
//! - HTTP 客户端在构造时建好（连接 / 请求超时），多次提交复用连接池。
//! - 请求体与响应体都用 `serde_json` 手动序列化，错误响应需要拿到原始文本。
//! - 非 2xx：尽力从 `detail` 字段提取提示，取不到则回退通用提示。
//! - 网络层失败：记录真实原因，对外只给通用提示。

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{GenerationOptions, TryOnConfig, TryOnError};

/// 提交失败且拿不到服务端说明时的通用提示。
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate try-on. Please try again.";

/// `POST /api/tryon/jobs` 请求体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TryOnRequest {
    pub tenant_id: String,
    pub person_image: String,
    pub clothing_image: String,
    pub options: GenerationOptions,
}

/// 任务响应（提交与查询共用）。
///
/// 所有字段都可缺省，结构是否“成功”由控制器判定。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TryOnJobResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result_base64: Option<String>,
    #[serde(default)]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
}

impl TryOnJobResponse {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }

    /// 成功且带非空结果时返回裸 base64。
    pub fn completed_payload(&self) -> Option<&str> {
        if !self.is_completed() {
            return None;
        }
        self.result_base64.as_deref().filter(|payload| !payload.is_empty())
    }
}

/// `GET /api/` 服务横幅。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
}

/// 提交能力。
///
/// 返回 `Err` 时携带的一定是 `TryOnError::Submission`。
pub trait JobSubmitter: Send + Sync {
    fn submit(
        &self,
        request: &TryOnRequest,
    ) -> impl Future<Output = Result<TryOnJobResponse, TryOnError>> + Send;
}

/// 基于 `reqwest` 的任务客户端。
pub struct HttpJobClient {
    client: reqwest::Client,
    config: TryOnConfig,
}

impl HttpJobClient {
    /// 根据配置构建客户端。
    pub fn new(config: &TryOnConfig) -> Result<Self, TryOnError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.request_timeout));

        // 本机后端不走系统代理
        if Self::is_loopback(&config.base_url) {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| TryOnError::Config(format!("HTTP 客户端初始化失败：{}", e)))?;

        Ok(Self::with_client(client, config.clone()))
    }

    /// 复用外部已构建的 [`reqwest::Client`]。
    pub fn with_client(client: reqwest::Client, config: TryOnConfig) -> Self {
        Self { client, config }
    }

    /// 查询任务记录。
    pub async fn fetch_job(&self, job_id: &str) -> Result<TryOnJobResponse, TryOnError> {
        let url = self.config.api_url(&format!("/tryon/jobs/{}", job_id.trim()));
        log::debug!("🔎 查询任务 - {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, &url))?;

        Self::read_json(response).await
    }

    /// 连通性探测。
    pub async fn service_info(&self) -> Result<ServiceInfo, TryOnError> {
        let url = self.config.api_url("/");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, &url))?;

        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TryOnError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            log::warn!("⚠️ 读取响应体失败：{}", e);
            TryOnError::Submission(GENERIC_FAILURE_MESSAGE.to_string())
        })?;

        if !status.is_success() {
            let message = Self::extract_detail(&body).unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
            log::warn!("⚠️ 服务端返回 HTTP {}：{}", status.as_u16(), message);
            return Err(TryOnError::Submission(message));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::warn!("⚠️ 响应体不是预期 JSON：{}", e);
            TryOnError::Submission(GENERIC_FAILURE_MESSAGE.to_string())
        })
    }

    fn is_loopback(base_url: &str) -> bool {
        reqwest::Url::parse(base_url)
            .ok()
            .and_then(|url| url.host_str().map(|host| host.to_lowercase()))
            .is_some_and(|host| matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]"))
    }

    fn map_transport_error(error: reqwest::Error, url: &str) -> TryOnError {
        if error.is_timeout() {
            log::error!("⏱️ 请求超时 - {}：{}", url, error);
        } else if error.is_connect() {
            log::error!("🔌 无法连接服务端 - {}：{}", url, error);
        } else {
            log::error!("❌ 网络请求失败 - {}：{}", url, error);
        }
        TryOnError::Submission(GENERIC_FAILURE_MESSAGE.to_string())
    }

    /// 从错误响应体中提取 `detail`。
    ///
    /// 兼容字符串与校验错误列表（`[{ "msg": ... }]`）两种形态。
    pub(crate) fn extract_detail(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let detail = value.get("detail")?;

        let message = match detail {
            serde_json::Value::String(text) => text.trim().to_string(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect::<Vec<_>>()
                .join("; "),
            _ => String::new(),
        };

        (!message.is_empty()).then_some(message)
    }
}

impl JobSubmitter for HttpJobClient {
    async fn submit(&self, request: &TryOnRequest) -> Result<TryOnJobResponse, TryOnError> {
        let url = self.config.api_url("/tryon/jobs");
        let body = serde_json::to_vec(request).map_err(|e| {
            log::error!("❌ 序列化请求失败：{}", e);
            TryOnError::Submission(GENERIC_FAILURE_MESSAGE.to_string())
        })?;

        log::info!(
            "📤 提交试穿任务 - tenant={} body={}KB",
            request.tenant_id,
            body.len() / 1024
        );

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, &url))?;

        Self::read_json(response).await
    }
}
