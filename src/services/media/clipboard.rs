use clipboard_rs::{common::RustImage, Clipboard, ClipboardContext, ContentFormat};
use uuid::Uuid;

use crate::error::{AppResult, ResultExt};
use crate::utils::read_source_file;

use super::{ClipboardItem, SourceFile};

/// 读取系统剪贴板，按顺序返回剪贴板项
///
/// 顺序：文件 > 图片 > 文本
/// 注意：文件优先于图片，因为复制文件时 macOS 会同时放置预览图片
pub fn read_clipboard_items() -> AppResult<Vec<ClipboardItem>> {
    let ctx = ClipboardContext::new().clipboard_err("无法访问剪贴板")?;
    let mut items = Vec::new();

    // 1. 文件列表
    if ctx.has(ContentFormat::Files) {
        if let Ok(files) = ctx.get_files() {
            for raw in files {
                let path = normalize_clipboard_path(&raw);
                match read_source_file(path) {
                    Ok(file) => items.push(ClipboardItem::file(file)),
                    Err(err) => {
                        tracing::warn!(path = %raw, error = %err, "Clipboard file unreadable");
                    }
                }
            }
        }
    }

    // 2. 图片（截图或复制的图片），统一转为 PNG
    if ctx.has(ContentFormat::Image) {
        if let Ok(img) = ctx.get_image() {
            let png = img.to_png().clipboard_err("转换剪贴板图片失败")?;
            let file_name = format!("{}.png", Uuid::new_v4());
            items.push(ClipboardItem::file(SourceFile::new(
                file_name,
                "image/png",
                png.get_bytes().to_vec(),
            )));
        }
    }

    // 3. 纯文本
    if ctx.has(ContentFormat::Text) {
        if let Ok(text) = ctx.get_text() {
            if !text.trim().is_empty() {
                items.push(ClipboardItem::text());
            }
        }
    }

    tracing::debug!(count = items.len(), "Clipboard items read");
    Ok(items)
}

/// Linux 下文件列表是 `file://` URI
fn normalize_clipboard_path(raw: &str) -> &str {
    raw.strip_prefix("file://").unwrap_or(raw)
}
