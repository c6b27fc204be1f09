//! # 结果展示
//!
//! ## 设计思路
//!
//! 只在任务 `Completed` 时产出视图：人物原图、生成结果、服装原图三联展示，
//! 三张图都取自任务记录本身，之后槽位再上传新图片也不会影响已完成的结果。
//!
//! ## 实现思路
//!
//! - 结果尺寸只读取图片头（`image::ImageReader::into_dimensions`），不做完整解码。
//! - 下载把结果 payload 解码后原样写盘，文件名固定为 `tryon-result.png`。
//! - `reset` 直接委托给控制器。

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageReader;

use super::{DataUri, JobStatus, JobSubmitter, TryOnController, TryOnError, TryOnJob};

/// 下载结果的文件名。
pub const RESULT_FILE_NAME: &str = "tryon-result.png";

/// 三联展示中的一格。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Person,
    Result,
    Clothing,
}

impl PanelKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "Original",
            Self::Result => "Try-On Result",
            Self::Clothing => "Clothing",
        }
    }
}

/// 已完成任务的展示视图。
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    job_id: Option<String>,
    person: DataUri,
    result: DataUri,
    clothing: DataUri,
    latency_ms: Option<u64>,
}

impl ResultView {
    /// 任务未完成（或没有结果）时返回 `None`。
    pub fn from_job(job: &TryOnJob) -> Option<Self> {
        if job.status() != JobStatus::Completed {
            return None;
        }
        Some(Self {
            job_id: job.id().map(str::to_string),
            person: job.person_image().clone(),
            result: job.result_image()?.clone(),
            clothing: job.clothing_image().clone(),
            latency_ms: job.latency_ms(),
        })
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    pub fn result(&self) -> &DataUri {
        &self.result
    }

    /// 按展示顺序返回三格：人物、结果、服装。
    pub fn panels(&self) -> [(PanelKind, &DataUri); 3] {
        [
            (PanelKind::Person, &self.person),
            (PanelKind::Result, &self.result),
            (PanelKind::Clothing, &self.clothing),
        ]
    }

    /// 读取结果图宽高。
    pub fn result_dimensions(&self) -> Result<(u32, u32), TryOnError> {
        let bytes = self.result.decode()?;
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| TryOnError::Presentation(format!("无法识别结果图格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| TryOnError::Presentation(format!("无法读取结果图尺寸：{}", e)))
    }

    /// 把结果写到 `dir/tryon-result.png`，返回完整路径。
    pub async fn download_result(&self, dir: &Path) -> Result<PathBuf, TryOnError> {
        let bytes = self.result.decode()?;
        let path = dir.join(RESULT_FILE_NAME);

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| TryOnError::Presentation(format!("保存结果失败：{}（{}）", path.display(), e)))?;

        log::info!("💾 结果已保存 - {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// 绑定到控制器的展示入口。
pub struct ResultPresenter<'a, S: JobSubmitter> {
    controller: &'a TryOnController<S>,
}

impl<'a, S: JobSubmitter> ResultPresenter<'a, S> {
    pub fn new(controller: &'a TryOnController<S>) -> Self {
        Self { controller }
    }

    /// 当前可展示的结果。
    pub fn view(&self) -> Result<Option<ResultView>, TryOnError> {
        Ok(self.controller.job()?.as_ref().and_then(ResultView::from_job))
    }

    /// 下载当前结果；没有已完成任务时报错。
    pub async fn download_result(&self, dir: &Path) -> Result<PathBuf, TryOnError> {
        let view = self
            .view()?
            .ok_or_else(|| TryOnError::Presentation("没有可下载的试穿结果".to_string()))?;
        view.download_result(dir).await
    }

    /// “再试一次”：整体重置。
    pub fn reset(&self) -> Result<(), TryOnError> {
        self.controller.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tryon::TryOnJobResponse;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([10u8, 20, 30, 255]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn completed_job(result: &[u8]) -> TryOnJob {
        let mut job = TryOnJob::new(
            DataUri::from_bytes("image/jpeg", b"person"),
            DataUri::from_bytes("image/png", b"shirt"),
        );
        job.begin();
        let response = TryOnJobResponse {
            job_id: Some("j1".to_string()),
            status: Some("completed".to_string()),
            ..Default::default()
        };
        job.complete(&response, DataUri::from_bytes("image/png", result));
        job
    }

    #[test]
    fn view_only_for_completed_jobs() {
        let mut job = TryOnJob::new(DataUri::from_png_base64("UA=="), DataUri::from_png_base64("Qw=="));
        assert!(ResultView::from_job(&job).is_none());

        job.begin();
        job.fail(None, "boom".to_string());
        assert!(ResultView::from_job(&job).is_none());
    }

    #[test]
    fn panels_follow_person_result_clothing_order() {
        let job = completed_job(&png_bytes(3, 2));
        let view = ResultView::from_job(&job).expect("view should exist");

        let kinds: Vec<_> = view.panels().iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, vec![PanelKind::Person, PanelKind::Result, PanelKind::Clothing]);
        let labels: Vec<_> = kinds.iter().map(|kind| kind.label()).collect();
        assert_eq!(labels, vec!["Original", "Try-On Result", "Clothing"]);
        assert_eq!(view.panels()[0].1, job.person_image());
        assert_eq!(view.panels()[2].1, job.clothing_image());
        assert_eq!(view.job_id(), Some("j1"));
    }

    #[test]
    fn result_dimensions_reads_header() {
        let view = ResultView::from_job(&completed_job(&png_bytes(7, 5))).expect("view should exist");

        assert_eq!(view.result_dimensions().expect("dimensions failed"), (7, 5));
    }

    #[tokio::test]
    async fn download_writes_decoded_result() {
        let png = png_bytes(2, 2);
        let view = ResultView::from_job(&completed_job(&png)).expect("view should exist");
        let dir = std::env::temp_dir().join(format!("tryon-presenter-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir failed");

        let path = view.download_result(&dir).await.expect("download failed");
        let written = std::fs::read(&path).expect("read back failed");
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(RESULT_FILE_NAME));
        assert_eq!(written, png);
    }
}
