//! 统一错误类型模块
//!
//! # 设计思路
//!
//! `tryon` 模块内部使用细分的 `TryOnError`，宿主层（命令行、设置、下载目录）
//! 再统一包一层 `AppError`，入口函数只需要处理一种错误类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `TryOnError` / `std::io::Error` 提供 `From` 转换，`?` 即可向上传递。
//! - 实现 `Serialize` 将错误序列化为字符串，便于 `--json` 输出。

use serde::Serialize;

use crate::tryon::TryOnError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 试穿流程错误（校验 / 编码 / 提交 / 展示）
    #[error("{0}")]
    TryOn(#[from] TryOnError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置文件不可用
    #[error("设置文件错误: {0}")]
    Settings(String),

    /// 下载目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),
}

impl AppError {
    /// 稳定错误码，非试穿错误统一归为 `E_HOST`。
    pub fn code(&self) -> &'static str {
        match self {
            Self::TryOn(err) => err.code(),
            Self::Io(_) | Self::Settings(_) | Self::Storage(_) => "E_HOST",
        }
    }

    /// 出错阶段，非试穿错误统一归为 `host`。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::TryOn(err) => err.stage(),
            Self::Io(_) | Self::Settings(_) | Self::Storage(_) => "host",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
