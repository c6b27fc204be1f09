//! # 控制器事件
//!
//! 控制器每次状态变化都会广播一条事件，宿主据此刷新界面或打印进度。
//! 事件在状态锁内发送，顺序与状态变化顺序一致。

use serde::Serialize;

use super::{ImageRole, JobStatus};

/// 广播通道容量。慢消费者落后超过该值会收到 `Lagged`。
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 生成进度阶段，按声明顺序依次出现。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Initializing,
    Preprocessing,
    Generating,
}

impl ProgressStage {
    pub const SEQUENCE: [ProgressStage; 3] = [
        ProgressStage::Initializing,
        ProgressStage::Preprocessing,
        ProgressStage::Generating,
    ];

    /// 展示给用户的进度文案。
    pub fn narration(self) -> &'static str {
        match self {
            Self::Initializing => "Initializing try-on process...",
            Self::Preprocessing => "Preprocessing images...",
            Self::Generating => "Generating try-on result...",
        }
    }
}

/// 控制器事件。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// 槽位已提交新的编码结果。
    SlotUpdated { role: ImageRole, mime_type: String },
    /// 槽位编码失败，槽位已清空。
    SlotFailed { role: ImageRole, message: String },
    /// 生成前置校验未通过。
    ValidationFailed { message: String },
    /// 进度文案变化。
    Progress { stage: ProgressStage, narration: String },
    /// 任务进入终态。
    JobFinished {
        status: JobStatus,
        job_id: Option<String>,
        error_message: Option<String>,
    },
    /// 整体重置。
    Reset,
}
