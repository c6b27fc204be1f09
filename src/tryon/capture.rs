//! # 图片采集
//!
//! 每个角色一个采集入口。宿主（拖放、文件选择、命令行参数）交付的可能是多个文件，
//! 这里只接收第一个扩展名属于图片类型的文件，其余忽略。
//! 采集层不做编码，也不持有状态，选中的文件直接交给控制器。

use super::{ImageRole, JobSubmitter, RawFile, SlotUpdate, TryOnController, TryOnError, mime_for_extension};

/// 单一角色的采集入口。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSlotCapture {
    role: ImageRole,
}

impl ImageSlotCapture {
    pub fn new(role: ImageRole) -> Self {
        Self { role }
    }

    pub fn role(&self) -> ImageRole {
        self.role
    }

    /// 是否为可接受的图片文件（按扩展名判断）。
    pub fn accepts(file: &RawFile) -> bool {
        file.extension().and_then(|ext| mime_for_extension(&ext)).is_some()
    }

    /// 选出第一个可接受的文件。
    pub fn select(&self, files: impl IntoIterator<Item = RawFile>) -> Option<RawFile> {
        let mut skipped = 0usize;
        let selected = files.into_iter().find(|file| {
            let ok = Self::accepts(file);
            if !ok {
                skipped += 1;
                log::debug!("🚫 忽略非图片文件 - role={} file={}", self.role, file.name());
            }
            ok
        });

        if selected.is_none() && skipped > 0 {
            log::warn!("⚠️ {} 槽位没有收到可用图片（忽略 {} 个文件）", self.role, skipped);
        }
        selected
    }

    /// 选出文件并交给控制器；没有可接受的文件时返回 `Ok(None)`，槽位不变。
    pub async fn deliver<S: JobSubmitter>(
        &self,
        controller: &TryOnController<S>,
        files: impl IntoIterator<Item = RawFile>,
    ) -> Result<Option<SlotUpdate>, TryOnError> {
        match self.select(files) {
            Some(file) => controller.set_image(self.role, file).await.map(Some),
            None => Ok(None),
        }
    }
}
