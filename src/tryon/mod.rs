//! # 虚拟试穿模块
//!
//! ## 设计思路
//!
//! 采用“采集层 + 编码器 + 控制器 + 提交客户端 + 展示层”分层：
//! - `capture`：从宿主交付的文件中挑出第一张可接受的图片
//! - `encoder`：把原始文件读成 Data URI
//! - `controller`：持有槽位与任务状态，负责阶段流转与在途唯一
//! - `client`：通过 `JobSubmitter` 提交任务，HTTP 实现基于 `reqwest`
//! - `presenter`：只读取已完成任务，负责三联展示与下载
//!
//! ## 实现思路
//!
//! - 配置集中在 `TryOnConfig`，控制器构造时注入（后端地址、租户、生成选项、限制）。
//! - 所有错误统一为 `TryOnError`，附带稳定的 `code()` / `stage()`。
//! - 状态变化通过 `broadcast` 事件推送给宿主。

mod capture;
mod client;
mod config;
mod controller;
mod data_uri;
mod encoder;
mod error;
mod events;
mod job;
mod presenter;
mod source;

pub use capture::ImageSlotCapture;
pub use client::{GENERIC_FAILURE_MESSAGE, HttpJobClient, JobSubmitter, ServiceInfo, TryOnJobResponse, TryOnRequest};
pub use config::{DEFAULT_BASE_URL, DEFAULT_TENANT_ID, GenerationOptions, GenerationProfile, TryOnConfig};
pub use controller::{
    ControllerPhase, ControllerSnapshot, GenerateOutcome, MISSING_IMAGES_MESSAGE, SlotUpdate, TryOnController,
};
pub use data_uri::DataUri;
pub use encoder::{ImageEncoder, mime_for_extension};
pub use error::TryOnError;
pub use events::{ControllerEvent, EVENT_CHANNEL_CAPACITY, ProgressStage};
pub use job::{JobStatus, TryOnJob};
pub use presenter::{PanelKind, RESULT_FILE_NAME, ResultPresenter, ResultView};
pub use source::{ImageRole, ImageSlot, RawFile};
