//! 下载目录管理模块
//!
//! # 设计思路
//!
//! 统一解析试穿结果的保存目录，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用命令行 / 设置中配置的自定义目录。
//! - 未设置时回退到当前工作目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 获取结果下载目录
///
/// # 参数
/// * `custom_dir` - 用户自定义目录（可选，空路径视为未设置）
///
/// # 返回
/// - `Ok(PathBuf)` — 可用的下载目录
/// - `Err(AppError::Storage)` — 无法获取或创建目录
pub fn resolve_download_dir(custom_dir: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(dir) = custom_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        if dir.exists() && !dir.is_dir() {
            return Err(AppError::Storage(format!("'{}' 不是目录", dir.display())));
        }
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                AppError::Storage(format!("创建下载目录 '{}' 失败: {}", dir.display(), e))
            })?;
            log::info!("📁 已创建下载目录 - {}", dir.display());
        }
        return Ok(dir.to_path_buf());
    }

    std::env::current_dir().map_err(|e| AppError::Storage(format!("获取当前目录失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_dir_is_created_when_missing() {
        let base = std::env::temp_dir().join(format!("tryon-storage-{}", std::process::id()));
        let nested = base.join("results").join("today");
        let _ = fs::remove_dir_all(&base);

        let resolved = resolve_download_dir(Some(&nested)).expect("resolve should succeed");
        let created = nested.is_dir();
        let _ = fs::remove_dir_all(&base);

        assert_eq!(resolved, nested);
        assert!(created);
    }

    #[test]
    fn empty_or_missing_dir_falls_back_to_cwd() {
        let cwd = std::env::current_dir().expect("read cwd failed");

        assert_eq!(resolve_download_dir(None).expect("resolve failed"), cwd);
        assert_eq!(resolve_download_dir(Some(Path::new(""))).expect("resolve failed"), cwd);
    }

    #[test]
    fn regular_file_is_rejected() {
        let file = std::env::temp_dir().join(format!("tryon-storage-file-{}", std::process::id()));
        fs::write(&file, b"x").expect("write temp file failed");

        let result = resolve_download_dir(Some(&file));
        let _ = fs::remove_file(&file);

        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
