//! # 核心编排模块（试穿任务控制器）
//!
//! ## 设计思路
//!
//! `TryOnController` 是唯一持有槽位、任务、进度文案与错误提示的地方。
//! 阶段划分：
//! 1. `Idle`：缺少至少一张图片
//! 2. `Ready`：两张图片都已编码
//! 3. `Submitting`：有且仅有一个任务在途
//! 4. `Completed` / `Failed`：终态，需 `reset` 或再次 `generate` 离开
//!
//! ## 实现思路
//!
//! - 所有方法都是 `&self`，状态放在 `std::sync::Mutex` 中，任何 `.await` 期间都不持锁。
//! - “在途唯一”由 `generate` 内部在同一个锁区间里检查并置位，不依赖界面禁用按钮。
//! - 任务持有图片副本；上传在任何阶段都允许，不会改写在途任务。
//! - 槽位上传与整体重置各自带递增序号，过期的编码结果 / 在途响应会被丢弃。
//! - 记录 `prepare/request/total` 阶段耗时，便于性能诊断。

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;

use super::{
    ControllerEvent, DataUri, EVENT_CHANNEL_CAPACITY, HttpJobClient, ImageEncoder, ImageRole, ImageSlot, JobStatus,
    JobSubmitter, ProgressStage, RawFile, TryOnConfig, TryOnError, TryOnJob, TryOnRequest,
    GENERIC_FAILURE_MESSAGE,
};

/// 缺图时的提示。
pub const MISSING_IMAGES_MESSAGE: &str = "Please upload both person and clothing images";

/// 控制器对外阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPhase {
    Idle,
    Ready,
    Submitting,
    Completed,
    Failed,
}

/// `generate` 的非错误结果。
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// 任务完成，附带任务副本。
    Completed(TryOnJob),
    /// 已有任务在途，本次调用什么都没做。
    AlreadySubmitting,
    /// 在途期间发生了重置，响应被丢弃。
    Discarded,
}

/// `set_image` 的非错误结果。
#[derive(Debug, Clone, PartialEq)]
pub enum SlotUpdate {
    /// 编码结果已写入槽位。
    Committed(DataUri),
    /// 编码期间同一槽位有更新的上传（或发生重置），本次结果未写入。
    Superseded,
}

/// 某一时刻的完整状态副本。
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub phase: ControllerPhase,
    pub person: ImageSlot,
    pub clothing: ImageSlot,
    pub job: Option<TryOnJob>,
    pub narration: String,
    pub error: Option<String>,
}

struct SlotEntry {
    slot: ImageSlot,
    upload_seq: u64,
}

impl SlotEntry {
    fn new(role: ImageRole) -> Self {
        Self {
            slot: ImageSlot::empty(role),
            upload_seq: 0,
        }
    }
}

struct ControllerState {
    person: SlotEntry,
    clothing: SlotEntry,
    job: Option<TryOnJob>,
    narration: String,
    error: Option<String>,
    /// 每次 `reset` 递增；在途任务据此判断自己是否已过期。
    epoch: u64,
    /// 请求是否在途。与 `job` 分开记录，`reset` 不会清除它。
    in_flight: bool,
}

/// 在途标记守卫：`generate` 结束（包括提前返回或 future 被丢弃）时清除标记。
struct InFlightGuard<'a> {
    state: &'a Mutex<ControllerState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("控制器状态锁中毒，继续清除在途标记");
                poisoned.into_inner()
            }
        };
        state.in_flight = false;
    }
}

impl ControllerState {
    fn new() -> Self {
        Self {
            person: SlotEntry::new(ImageRole::Person),
            clothing: SlotEntry::new(ImageRole::Clothing),
            job: None,
            narration: String::new(),
            error: None,
            epoch: 0,
            in_flight: false,
        }
    }

    fn entry_mut(&mut self, role: ImageRole) -> &mut SlotEntry {
        match role {
            ImageRole::Person => &mut self.person,
            ImageRole::Clothing => &mut self.clothing,
        }
    }

    fn phase(&self) -> ControllerPhase {
        match self.job.as_ref().map(TryOnJob::status) {
            Some(JobStatus::Submitting) => ControllerPhase::Submitting,
            Some(JobStatus::Completed) => ControllerPhase::Completed,
            Some(JobStatus::Failed) => ControllerPhase::Failed,
            Some(JobStatus::NotStarted) | None => {
                if self.person.slot.is_ready() && self.clothing.slot.is_ready() {
                    ControllerPhase::Ready
                } else {
                    ControllerPhase::Idle
                }
            }
        }
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            phase: self.phase(),
            person: self.person.slot.clone(),
            clothing: self.clothing.slot.clone(),
            job: self.job.clone(),
            narration: self.narration.clone(),
            error: self.error.clone(),
        }
    }
}

/// 试穿任务控制器。
///
/// 默认使用 [`HttpJobClient`] 提交；测试或其它宿主可通过
/// [`TryOnController::with_submitter`] 注入任意 [`JobSubmitter`]。
pub struct TryOnController<S: JobSubmitter = HttpJobClient> {
    config: TryOnConfig,
    encoder: ImageEncoder,
    submitter: S,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl TryOnController<HttpJobClient> {
    /// 使用配置中的后端地址创建控制器。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use tryon_fit::tryon::{TryOnConfig, TryOnController};
    ///
    /// let controller = TryOnController::new(TryOnConfig::with_base_url("https://tryon.example.com"))?;
    /// # Ok::<(), tryon_fit::tryon::TryOnError>(())
    /// ```
    pub fn new(config: TryOnConfig) -> Result<Self, TryOnError> {
        config.validate()?;
        let client = HttpJobClient::new(&config)?;
        Self::with_submitter(config, client)
    }
}

impl<S: JobSubmitter> TryOnController<S> {
    /// 注入自定义提交实现。
    pub fn with_submitter(config: TryOnConfig, submitter: S) -> Result<Self, TryOnError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            encoder: ImageEncoder::from_config(&config),
            config,
            submitter,
            state: Mutex::new(ControllerState::new()),
            events,
        })
    }

    pub fn config(&self) -> &TryOnConfig {
        &self.config
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// 订阅后续事件（不会回放历史事件）。
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ControllerState>, TryOnError> {
        self.state
            .lock()
            .map_err(|_| TryOnError::State("控制器状态锁已中毒".to_string()))
    }

    fn emit(&self, event: ControllerEvent) {
        // 没有订阅者时发送失败，忽略即可
        let _ = self.events.send(event);
    }

    pub fn snapshot(&self) -> Result<ControllerSnapshot, TryOnError> {
        Ok(self.lock_state()?.snapshot())
    }

    pub fn phase(&self) -> Result<ControllerPhase, TryOnError> {
        Ok(self.lock_state()?.phase())
    }

    pub fn slot(&self, role: ImageRole) -> Result<ImageSlot, TryOnError> {
        Ok(self.lock_state()?.entry_mut(role).slot.clone())
    }

    pub fn job(&self) -> Result<Option<TryOnJob>, TryOnError> {
        Ok(self.lock_state()?.job.clone())
    }

    /// 当前进度文案，空串表示没有进度。
    pub fn narration(&self) -> Result<String, TryOnError> {
        Ok(self.lock_state()?.narration.clone())
    }

    /// 当前面向用户的错误提示。
    pub fn error(&self) -> Result<Option<String>, TryOnError> {
        Ok(self.lock_state()?.error.clone())
    }

    /// 设置某一角色的图片。
    ///
    /// 任何阶段都可调用（包括 `Submitting`），编码完成后原子写入槽位。
    /// 编码失败时槽位被清空并记录槽位级错误。
    pub async fn set_image(&self, role: ImageRole, file: RawFile) -> Result<SlotUpdate, TryOnError> {
        let seq = {
            let mut state = self.lock_state()?;
            let entry = state.entry_mut(role);
            entry.upload_seq += 1;
            entry.upload_seq
        };

        log::info!("🖼️ 开始处理 {} 图片 - {}", role, file.name());
        let encoded = self.encoder.encode(&file).await;

        let mut state = self.lock_state()?;
        let entry = state.entry_mut(role);
        if entry.upload_seq != seq {
            log::debug!("♻️ {} 槽位已有更新的上传，丢弃本次编码结果 - {}", role, file.name());
            return Ok(SlotUpdate::Superseded);
        }

        match encoded {
            Ok(uri) => {
                let mime_type = uri.mime_type().to_string();
                entry.slot.commit(file, uri.clone());
                self.emit(ControllerEvent::SlotUpdated { role, mime_type });
                Ok(SlotUpdate::Committed(uri))
            }
            Err(err) => {
                log::warn!("⚠️ {} 图片编码失败：{}", role, err);
                let message = err.message().to_string();
                entry.slot.fail(message.clone());
                self.emit(ControllerEvent::SlotFailed { role, message });
                Err(err)
            }
        }
    }

    /// 提交一次试穿任务。
    ///
    /// - 已有请求在途（即使期间发生过 `reset`）：返回 `AlreadySubmitting`，不发请求。
    /// - 缺图：返回 `TryOnError::Validation`，不发请求。
    /// - 失败：任务进入 `Failed`，返回 `TryOnError::Submission`。
    pub async fn generate(&self) -> Result<GenerateOutcome, TryOnError> {
        let total_start = Instant::now();

        let (epoch, person, clothing) = {
            let mut state = self.lock_state()?;

            if state.in_flight {
                log::warn!("⏳ 已有试穿任务在途，忽略重复提交");
                return Ok(GenerateOutcome::AlreadySubmitting);
            }

            let images = (
                state.person.slot.encoded().cloned(),
                state.clothing.slot.encoded().cloned(),
            );
            let (Some(person), Some(clothing)) = images else {
                state.error = Some(MISSING_IMAGES_MESSAGE.to_string());
                self.emit(ControllerEvent::ValidationFailed {
                    message: MISSING_IMAGES_MESSAGE.to_string(),
                });
                return Err(TryOnError::Validation(MISSING_IMAGES_MESSAGE.to_string()));
            };

            let mut job = TryOnJob::new(person.clone(), clothing.clone());
            job.begin();
            state.job = Some(job);
            state.in_flight = true;
            state.error = None;
            self.set_narration(&mut state, ProgressStage::Initializing);

            (state.epoch, person, clothing)
        };
        let _in_flight = InFlightGuard { state: &self.state };

        let prepare_start = Instant::now();
        let request = {
            let mut state = self.lock_state()?;
            if state.epoch != epoch {
                return Ok(GenerateOutcome::Discarded);
            }
            self.set_narration(&mut state, ProgressStage::Preprocessing);

            TryOnRequest {
                tenant_id: self.config.tenant_id.clone(),
                person_image: person.into_string(),
                clothing_image: clothing.into_string(),
                options: self.config.options.clone(),
            }
        };
        let prepare_elapsed = prepare_start.elapsed();

        {
            let mut state = self.lock_state()?;
            if state.epoch != epoch {
                return Ok(GenerateOutcome::Discarded);
            }
            self.set_narration(&mut state, ProgressStage::Generating);
        }

        let request_start = Instant::now();
        let response = self.submitter.submit(&request).await;
        let request_elapsed = request_start.elapsed();

        let mut state = self.lock_state()?;
        if state.epoch != epoch {
            log::info!("🗑️ 在途期间已重置，丢弃本次响应");
            return Ok(GenerateOutcome::Discarded);
        }
        state.narration.clear();

        let Some(job) = state.job.as_mut() else {
            return Ok(GenerateOutcome::Discarded);
        };

        let outcome = match response {
            Ok(response) => match response.completed_payload() {
                Some(payload) => {
                    job.complete(&response, DataUri::from_png_base64(payload));
                    Ok(job.clone())
                }
                None => {
                    log::warn!(
                        "⚠️ 响应结构不符合预期 - status={:?} has_result={}",
                        response.status,
                        response.result_base64.as_deref().is_some_and(|r| !r.is_empty())
                    );
                    job.fail(Some(&response), GENERIC_FAILURE_MESSAGE.to_string());
                    Err(GENERIC_FAILURE_MESSAGE.to_string())
                }
            },
            Err(err) => {
                let message = match err.message().trim() {
                    "" => GENERIC_FAILURE_MESSAGE.to_string(),
                    text => text.to_string(),
                };
                job.fail(None, message.clone());
                Err(message)
            }
        };

        let job_id = job.id().map(str::to_string);
        match outcome {
            Ok(job) => {
                state.error = None;
                self.emit(ControllerEvent::JobFinished {
                    status: JobStatus::Completed,
                    job_id,
                    error_message: None,
                });
                log::info!(
                    "✅ 试穿任务完成 - job={} prepare={}ms request={}ms total={}ms",
                    job.id().unwrap_or("-"),
                    prepare_elapsed.as_millis(),
                    request_elapsed.as_millis(),
                    total_start.elapsed().as_millis()
                );
                Ok(GenerateOutcome::Completed(job))
            }
            Err(message) => {
                state.error = Some(message.clone());
                self.emit(ControllerEvent::JobFinished {
                    status: JobStatus::Failed,
                    job_id,
                    error_message: Some(message.clone()),
                });
                log::error!(
                    "❌ 试穿任务失败：{} - request={}ms total={}ms",
                    message,
                    request_elapsed.as_millis(),
                    total_start.elapsed().as_millis()
                );
                Err(TryOnError::Submission(message))
            }
        }
    }

    /// 回到 `Idle`：清空槽位、任务、进度与错误。可重复调用。
    ///
    /// 在途请求不会被取消，它返回前新的 `generate` 仍是 `AlreadySubmitting`。
    pub fn reset(&self) -> Result<(), TryOnError> {
        let mut state = self.lock_state()?;

        state.epoch += 1;
        for role in ImageRole::ALL {
            let entry = state.entry_mut(role);
            entry.upload_seq += 1;
            entry.slot.clear();
        }
        state.job = None;
        state.narration.clear();
        state.error = None;

        self.emit(ControllerEvent::Reset);
        log::info!("🔄 试穿状态已重置");
        Ok(())
    }

    fn set_narration(&self, state: &mut ControllerState, stage: ProgressStage) {
        state.narration = stage.narration().to_string();
        log::debug!("📣 {}", stage.narration());
        self.emit(ControllerEvent::Progress {
            stage,
            narration: stage.narration().to_string(),
        });
    }
}
