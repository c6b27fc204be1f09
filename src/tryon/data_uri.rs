//! # Data URI 值类型
//!
//! 预览渲染与提交服务端使用同一份 `data:<mime>;base64,<payload>` 字符串。
//! 这里只做拼接与拆分，不校验 payload 是否为合法图片。

use std::fmt;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use super::TryOnError;

const BASE64_MARKER: &str = ";base64,";

/// 自描述的内联图片表示。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataUri(String);

impl DataUri {
    /// 服务端结果统一按 PNG 包装。
    pub const PNG_PREFIX: &'static str = "data:image/png;base64,";

    /// 由原始字节与 MIME 类型构造。
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!(
            "data:{}{}{}",
            mime_type,
            BASE64_MARKER,
            general_purpose::STANDARD.encode(bytes)
        ))
    }

    /// 包装服务端返回的裸 base64（不做二次编码）。
    pub fn from_png_base64(payload: &str) -> Self {
        Self(format!("{}{}", Self::PNG_PREFIX, payload))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// `data:` 与 `;base64,` 之间的 MIME 类型。
    pub fn mime_type(&self) -> &str {
        let rest = self.0.strip_prefix("data:").unwrap_or(&self.0);
        rest.find(BASE64_MARKER).map(|idx| &rest[..idx]).unwrap_or("")
    }

    /// `;base64,` 之后的裸 base64 内容。
    pub fn payload(&self) -> &str {
        self.0
            .find(BASE64_MARKER)
            .map(|idx| &self.0[idx + BASE64_MARKER.len()..])
            .unwrap_or("")
    }

    /// 解码为原始字节。
    pub fn decode(&self) -> Result<Vec<u8>, TryOnError> {
        general_purpose::STANDARD
            .decode(self.payload())
            .map_err(|e| TryOnError::Presentation(format!("Base64 解码失败：{}", e)))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DataUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
