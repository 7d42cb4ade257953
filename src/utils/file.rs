use std::{fs, path::Path};

use image::ImageFormat;

use crate::error::AppResult;
use crate::services::SourceFile;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

pub fn get_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

/// 根据扩展名推断媒体类型
///
/// 图片格式交给 `image` 判断，其余只覆盖常见的几种非图片类型，
/// 让它们在获取阶段以 `NotAnImage` 被拒绝，而不是被当成未知二进制。
pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    if let Some(format) = ImageFormat::from_extension(ext) {
        return Some(format.to_mime_type());
    }
    match ext.to_lowercase().as_str() {
        "txt" | "md" => Some("text/plain"),
        "html" | "htm" => Some("text/html"),
        "json" => Some("application/json"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// 通过文件头嗅探图片格式
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

/// 推断媒体类型：扩展名优先，其次内容嗅探
pub fn detect_media_type(path: &str, bytes: &[u8]) -> String {
    get_extension(path)
        .as_deref()
        .and_then(media_type_for_extension)
        .or_else(|| sniff_media_type(bytes))
        .unwrap_or(FALLBACK_MEDIA_TYPE)
        .to_string()
}

/// 读取本地文件，构造与浏览器 `File` 等价的 `SourceFile`
pub fn read_source_file(path: impl AsRef<Path>) -> AppResult<SourceFile> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    let path_str = path.to_string_lossy();
    let media_type = detect_media_type(&path_str, &bytes);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    Ok(SourceFile::new(name, media_type, bytes))
}
