use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AcquireError;
use crate::utils::{compute_sha256, validate_image_media_type, validate_not_empty};

/// 图片来源（获取路径）
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaOrigin {
    Dropped,
    Browsed,
    Pasted,
    Captured,
}

/// 一个待获取的文件：名称、声明的媒体类型、内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

/// 剪贴板中的一项；`file` 为空表示该项无法取出文件内容（如纯文本）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub media_type: String,
    pub file: Option<SourceFile>,
}

impl ClipboardItem {
    pub fn file(file: SourceFile) -> Self {
        Self {
            media_type: file.media_type.clone(),
            file: Some(file),
        }
    }

    pub fn text() -> Self {
        Self {
            media_type: "text/plain".to_string(),
            file: None,
        }
    }
}

/// 摄像头拍摄并编码完成的图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// 四种获取事件
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// 拖放：只使用列表中的第一个文件
    Dropped(Vec<SourceFile>),
    /// 文件选择对话框选中的文件
    Browsed(SourceFile),
    /// 粘贴：按顺序排列的剪贴板项
    Pasted(Vec<ClipboardItem>),
    /// 摄像头拍摄
    Captured(CapturedImage),
}

impl MediaEvent {
    pub fn origin(&self) -> MediaOrigin {
        match self {
            MediaEvent::Dropped(_) => MediaOrigin::Dropped,
            MediaEvent::Browsed(_) => MediaOrigin::Browsed,
            MediaEvent::Pasted(_) => MediaOrigin::Pasted,
            MediaEvent::Captured(_) => MediaOrigin::Captured,
        }
    }
}

/// 规范化后的图片负载
///
/// 只能通过 [`ImagePayload::new`] 构造，因此内容一定非空、
/// 媒体类型一定是 `image/*`。
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    media_type: String,
    origin: MediaOrigin,
    file_name: String,
    acquired_at: DateTime<Utc>,
    fingerprint: String,
}

impl ImagePayload {
    pub fn new(
        bytes: Vec<u8>,
        media_type: &str,
        origin: MediaOrigin,
        file_name: impl Into<String>,
    ) -> Result<Self, AcquireError> {
        let media_type = validate_image_media_type(media_type)?;
        validate_not_empty(&bytes)?;

        let fingerprint = compute_sha256(&bytes);
        Ok(Self {
            bytes,
            media_type,
            origin,
            file_name: file_name.into(),
            acquired_at: Utc::now(),
            fingerprint,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn origin(&self) -> MediaOrigin {
        self.origin
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 拆出内容（提交时使用，负载随之被消耗）
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
