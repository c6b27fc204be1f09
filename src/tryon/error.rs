//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载试穿链路中的所有错误来源（校验 / 编码 / 提交 / 展示），
//! 避免字符串拼接式错误处理。通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 每个分支内部携带的字符串即“面向用户的提示”，`message()` 原样返回，
//! 控制器会把它写入 `error_message`，不带任何前缀。

/// 试穿流程统一错误类型。
///
/// 该类型会在宿主层被上转为 `AppError`。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TryOnError {
    /// 生成前置条件不满足（缺少图片）。不会发起网络请求。
    #[error("校验错误：{0}")]
    Validation(String),

    /// 提交任务失败：网络、服务端错误或响应结构不符合预期。
    #[error("提交错误：{0}")]
    Submission(String),

    /// 读取原始文件或转为 Data URI 失败。
    #[error("编码错误：{0}")]
    Encoding(String),

    /// 配置非法（地址、档位、超时等）。
    #[error("配置错误：{0}")]
    Config(String),

    /// 结果展示 / 下载失败。
    #[error("展示错误：{0}")]
    Presentation(String),

    /// 控制器内部状态锁异常。
    #[error("状态错误：{0}")]
    State(String),
}

impl TryOnError {
    /// 稳定错误码，供宿主做分支处理。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Submission(_) => "E_SUBMISSION",
            Self::Encoding(_) => "E_ENCODING",
            Self::Config(_) => "E_CONFIG",
            Self::Presentation(_) => "E_PRESENTATION",
            Self::State(_) => "E_STATE",
        }
    }

    /// 出错阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validate",
            Self::Submission(_) => "submit",
            Self::Encoding(_) => "encode",
            Self::Config(_) => "config",
            Self::Presentation(_) => "present",
            Self::State(_) => "state",
        }
    }

    /// 不带前缀的用户提示文本。
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::Submission(msg)
            | Self::Encoding(msg)
            | Self::Config(msg)
            | Self::Presentation(msg)
            | Self::State(msg) => msg,
        }
    }
}

impl From<TryOnError> for String {
    fn from(error: TryOnError) -> Self {
        error.to_string()
    }
}
