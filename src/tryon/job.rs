//! # 任务模型
//!
//! 一次提交对应一个 `TryOnJob`。任务持有提交时两张图片的副本，
//! 之后槽位再怎么变化都不会影响已提交或已完成的任务记录。

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{DataUri, TryOnJobResponse};

/// 任务状态。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    NotStarted,
    Submitting,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `Completed` 或 `Failed`。
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// 单次试穿任务记录。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TryOnJob {
    id: Option<String>,
    status: JobStatus,
    person_image: DataUri,
    clothing_image: DataUri,
    result_image: Option<DataUri>,
    error_message: Option<String>,
    submitted_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    latency_ms: Option<u64>,
    metrics: Option<serde_json::Value>,
}

impl TryOnJob {
    pub(crate) fn new(person_image: DataUri, clothing_image: DataUri) -> Self {
        Self {
            id: None,
            status: JobStatus::NotStarted,
            person_image,
            clothing_image,
            result_image: None,
            error_message: None,
            submitted_at: Utc::now(),
            finished_at: None,
            latency_ms: None,
            metrics: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn person_image(&self) -> &DataUri {
        &self.person_image
    }

    pub fn clothing_image(&self) -> &DataUri {
        &self.clothing_image
    }

    pub fn result_image(&self) -> Option<&DataUri> {
        self.result_image.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// 服务端上报的生成耗时。
    pub fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    pub fn metrics(&self) -> Option<&serde_json::Value> {
        self.metrics.as_ref()
    }

    pub(crate) fn begin(&mut self) {
        self.status = JobStatus::Submitting;
        self.submitted_at = Utc::now();
    }

    pub(crate) fn complete(&mut self, response: &TryOnJobResponse, result_image: DataUri) {
        self.absorb(response);
        self.status = JobStatus::Completed;
        self.result_image = Some(result_image);
        self.error_message = None;
        self.finished_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, response: Option<&TryOnJobResponse>, message: String) {
        if let Some(response) = response {
            self.absorb(response);
        }
        self.status = JobStatus::Failed;
        self.result_image = None;
        self.error_message = Some(message);
        self.finished_at = Some(Utc::now());
    }

    fn absorb(&mut self, response: &TryOnJobResponse) {
        if let Some(id) = response.job_id.as_ref().filter(|id| !id.is_empty()) {
            self.id = Some(id.clone());
        }
        self.latency_ms = response.latency_ms;
        self.metrics = response.metrics.clone();
    }
}
