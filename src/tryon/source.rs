//! # 图片槽与原始文件模型
//!
//! ## 设计思路
//!
//! 将“外部输入”和“槽位状态”解耦：
//! - `RawFile` 表示采集到、尚未读取的原始文件句柄
//! - `ImageSlot` 表示某一角色（人物 / 服装）当前持有的文件与编码结果
//!
//! 槽位的 `raw_file` 与 `encoded` 只能通过 `commit` / `fail` / `clear` 成组修改，
//! 保证外部观察不到“新文件 + 旧预览”的中间态。

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::DataUri;

/// 图片角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    Person,
    Clothing,
}

impl ImageRole {
    pub const ALL: [ImageRole; 2] = [ImageRole::Person, ImageRole::Clothing];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Clothing => "clothing",
        }
    }
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 采集能力交付的原始文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFile {
    /// 本地文件路径（拖放 / 文件选择）。
    FilePath(PathBuf),
    /// 已在内存中的文件内容（例如宿主直接读取的拖放数据）。
    Memory { name: String, bytes: Bytes },
}

impl RawFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::FilePath(path.into())
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// 文件名（用于日志）。
    pub fn name(&self) -> String {
        match self {
            Self::FilePath(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string()),
            Self::Memory { name, .. } => name.clone(),
        }
    }

    /// 小写扩展名，没有则为 `None`。
    pub fn extension(&self) -> Option<String> {
        let ext = match self {
            Self::FilePath(path) => path.extension(),
            Self::Memory { name, .. } => Path::new(name).extension(),
        };
        ext.map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

/// 单个角色的图片槽。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    role: ImageRole,
    raw_file: Option<RawFile>,
    encoded: Option<DataUri>,
    error: Option<String>,
}

impl ImageSlot {
    pub fn empty(role: ImageRole) -> Self {
        Self {
            role,
            raw_file: None,
            encoded: None,
            error: None,
        }
    }

    pub fn role(&self) -> ImageRole {
        self.role
    }

    pub fn raw_file(&self) -> Option<&RawFile> {
        self.raw_file.as_ref()
    }

    pub fn encoded(&self) -> Option<&DataUri> {
        self.encoded.as_ref()
    }

    /// 最近一次编码失败的提示。
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.encoded.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_file.is_none() && self.encoded.is_none() && self.error.is_none()
    }

    pub(crate) fn commit(&mut self, raw_file: RawFile, encoded: DataUri) {
        self.raw_file = Some(raw_file);
        self.encoded = Some(encoded);
        self.error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.raw_file = None;
        self.encoded = None;
        self.error = Some(message);
    }

    pub(crate) fn clear(&mut self) {
        self.raw_file = None;
        self.encoded = None;
        self.error = None;
    }
}
