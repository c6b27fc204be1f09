//! # 编码模块
//!
//! ## 设计思路
//!
//! 把任意来源的原始文件完整读入内存，再输出自描述的 Data URI，
//! 同一份结果既用于预览，也直接作为提交参数。
//!
//! ## 实现思路
//!
//! - 本地文件：先查 metadata 做体积限制，再通过 `tokio::fs` 异步读取。
//! - 内存文件：直接做体积限制。
//! - MIME：优先按文件签名（`infer`）识别，其次按扩展名，最后回退 `application/octet-stream`。
//! - 不拒绝非图片内容：采集层已按扩展名过滤，签名不符只记日志。

use std::time::Instant;

use bytes::Bytes;

use super::{DataUri, RawFile, TryOnConfig, TryOnError};

const FALLBACK_MIME: &str = "application/octet-stream";

/// 扩展名 → MIME 映射，同时作为采集层的可接受图片类型表。
const IMAGE_EXTENSION_MIME: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jfif", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("avif", "image/avif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
];

/// 按扩展名查找图片 MIME。
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.trim_start_matches('.').to_lowercase();
    IMAGE_EXTENSION_MIME
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// 原始文件 → Data URI 编码器。
#[derive(Debug, Clone)]
pub struct ImageEncoder {
    max_file_size: u64,
}

impl ImageEncoder {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn from_config(config: &TryOnConfig) -> Self {
        Self::new(config.max_file_size)
    }

    /// 完整读取文件并编码。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use tryon_fit::tryon::{ImageEncoder, RawFile};
    ///
    /// # async fn demo() -> Result<(), tryon_fit::tryon::TryOnError> {
    /// let encoder = ImageEncoder::new(50 * 1024 * 1024);
    /// let uri = encoder.encode(&RawFile::from_path("person.jpg")).await?;
    /// assert!(uri.as_str().starts_with("data:"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn encode(&self, file: &RawFile) -> Result<DataUri, TryOnError> {
        let start = Instant::now();
        let bytes = self.read_bytes(file).await?;
        let mime = Self::detect_mime(&bytes, file);

        if !mime.starts_with("image/") {
            log::warn!("⚠️ 文件内容不像图片，仍按 {} 编码 - {}", mime, file.name());
        }

        let uri = DataUri::from_bytes(mime, &bytes);
        log::debug!(
            "🧬 编码完成 - file={} mime={} bytes={} elapsed={}ms",
            file.name(),
            mime,
            bytes.len(),
            start.elapsed().as_millis()
        );
        Ok(uri)
    }

    async fn read_bytes(&self, file: &RawFile) -> Result<Bytes, TryOnError> {
        let bytes = match file {
            RawFile::FilePath(path) => {
                let metadata = tokio::fs::metadata(path).await.map_err(|e| {
                    TryOnError::Encoding(format!("无法读取文件信息：{}（{}）", path.display(), e))
                })?;
                if !metadata.is_file() {
                    return Err(TryOnError::Encoding(format!("不是文件：{}", path.display())));
                }
                self.check_size(metadata.len())?;

                let content = tokio::fs::read(path).await.map_err(|e| {
                    TryOnError::Encoding(format!("无法读取图片文件：{}（{}）", path.display(), e))
                })?;
                Bytes::from(content)
            }
            RawFile::Memory { bytes, .. } => {
                self.check_size(bytes.len() as u64)?;
                bytes.clone()
            }
        };

        if bytes.is_empty() {
            return Err(TryOnError::Encoding(format!("图片内容为空：{}", file.name())));
        }
        Ok(bytes)
    }

    fn check_size(&self, len: u64) -> Result<(), TryOnError> {
        if len > self.max_file_size {
            return Err(TryOnError::Encoding(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                len as f64 / 1024.0 / 1024.0,
                self.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Ok(())
    }

    fn detect_mime(bytes: &[u8], file: &RawFile) -> &'static str {
        if let Some(kind) = infer::get(bytes) {
            return kind.mime_type();
        }
        file.extension()
            .and_then(|ext| mime_for_extension(&ext))
            .unwrap_or(FALLBACK_MIME)
    }
}
