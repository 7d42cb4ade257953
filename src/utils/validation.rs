//! 通用验证函数
//!
//! 图片负载与请求参数的集中校验，避免在各获取路径中重复

use crate::error::AcquireError;

pub const IMAGE_MEDIA_PREFIX: &str = "image/";

/// 规范化并校验媒体类型
///
/// 返回去空白、小写后的媒体类型；必须以 `image/` 开头并带有子类型
pub fn validate_image_media_type(raw: &str) -> Result<String, AcquireError> {
    let normalized = raw.trim().to_lowercase();
    let subtype = normalized.strip_prefix(IMAGE_MEDIA_PREFIX).unwrap_or("");
    if subtype.is_empty() || subtype.contains(char::is_whitespace) {
        return Err(AcquireError::NotAnImage {
            media_type: raw.to_string(),
        });
    }
    Ok(normalized)
}

/// 声明的类型是否为图片（不报错版本，用于剪贴板扫描）
pub fn is_image_media_type(raw: &str) -> bool {
    validate_image_media_type(raw).is_ok()
}

/// 校验图片内容非空
pub fn validate_not_empty(bytes: &[u8]) -> Result<(), AcquireError> {
    if bytes.is_empty() {
        return Err(AcquireError::Empty);
    }
    Ok(())
}

/// 验证结果数量范围
pub fn validate_result_count(count: Option<u32>, default: u32, max: u32) -> u32 {
    count.unwrap_or(default).max(1).min(max)
}

/// 验证 JPEG 质量（1-100）
pub fn validate_jpeg_quality(quality: u8) -> u8 {
    quality.clamp(1, 100)
}
