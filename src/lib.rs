//! # TryOn.fit 虚拟试穿客户端 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 宿主 (命令行 / 任意界面)                   │
//! │                                                          │
//! │  ImageSlotCapture ×2 ── ResultPresenter ── 事件订阅       │
//! │        │                       ↑              ↑          │
//! └────────┼───────────────────────┼──────────────┼──────────┘
//!          ↓                       │              │
//! ┌────────┼───────────────────────┼──────────────┼──────────┐
//! │        ↓              tryon 模块               │          │
//! │                                                          │
//! │  TryOnController ── 槽位 / 任务 / 进度 / 错误 ── broadcast │
//! │   ├─ ImageEncoder      原始文件 → Data URI                │
//! │   └─ JobSubmitter      HttpJobClient (reqwest)            │
//! │                             │                            │
//! └─────────────────────────────┼────────────────────────────┘
//!                               ↓ POST /api/tryon/jobs
//!                        生成服务（外部）
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 宿主层统一错误类型 `AppError` |
//! | [`tryon`] | 采集、编码、任务控制、提交客户端、结果展示 |
//! | [`settings`] | 可选 JSON 设置文件的读取与覆盖 |
//! | [`storage`] | 下载目录的解析与自动创建 |

pub mod error;
pub mod settings;
pub mod storage;
pub mod tryon;
