//! Media source adapter
//!
//! Normalizes the four acquisition paths into one [`ImagePayload`]:
//! - Dropped: first file of the drop only
//! - Browsed: the picked file
//! - Pasted: first clipboard item declaring an image type
//! - Captured: a frame already encoded by the camera manager

mod clipboard;
mod types;

pub use clipboard::read_clipboard_items;
pub use types::*;

use uuid::Uuid;

use crate::error::AcquireError;
use crate::utils::is_image_media_type;

const CAPTURE_FILE_PREFIX: &str = "camera-capture";

/// Normalize an acquisition event into a payload.
///
/// `Ok(None)` means the event carried nothing to search (empty drop, paste without an
/// image item). Callers must leave any displayed state untouched in that case.
pub fn acquire(event: MediaEvent) -> Result<Option<ImagePayload>, AcquireError> {
    let origin = event.origin();
    let file = match event {
        MediaEvent::Dropped(files) => {
            if files.len() > 1 {
                tracing::debug!(ignored = files.len() - 1, "Extra dropped files ignored");
            }
            match files.into_iter().next() {
                Some(file) => file,
                None => return Ok(None),
            }
        }
        MediaEvent::Browsed(file) => file,
        MediaEvent::Pasted(items) => match first_image_item(items) {
            Some(file) => file,
            None => {
                tracing::debug!("Paste carried no image item");
                return Ok(None);
            }
        },
        MediaEvent::Captured(image) => SourceFile::new(
            format!("{}-{}.jpg", CAPTURE_FILE_PREFIX, Uuid::new_v4()),
            image.media_type,
            image.bytes,
        ),
    };

    let payload = ImagePayload::new(file.bytes, &file.media_type, origin, file.name)?;
    tracing::debug!(
        origin = ?payload.origin(),
        media_type = payload.media_type(),
        bytes = payload.len(),
        fingerprint = payload.fingerprint(),
        "Image acquired"
    );
    Ok(Some(payload))
}

// 只看第一个图片项；它取不出文件时也不再继续往后找
fn first_image_item(items: Vec<ClipboardItem>) -> Option<SourceFile> {
    items
        .into_iter()
        .find(|item| is_image_media_type(&item.media_type))
        .and_then(|item| item.file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(name: &str) -> SourceFile {
        SourceFile::new(name, "image/jpeg", vec![0xFF; 16])
    }

    #[test]
    fn dropped_uses_first_file_only() {
        let event = MediaEvent::Dropped(vec![
            jpeg("first.jpg"),
            SourceFile::new("second.txt", "text/plain", b"hi".to_vec()),
        ]);
        let payload = acquire(event).unwrap().unwrap();
        assert_eq!(payload.file_name(), "first.jpg");
        assert_eq!(payload.origin(), MediaOrigin::Dropped);
    }

    #[test]
    fn dropped_rejects_non_image_first_entry() {
        let event = MediaEvent::Dropped(vec![
            SourceFile::new("notes.txt", "text/plain", b"hi".to_vec()),
            jpeg("second.jpg"),
        ]);
        assert!(matches!(
            acquire(event),
            Err(AcquireError::NotAnImage { .. })
        ));
    }

    #[test]
    fn empty_drop_is_a_no_op() {
        assert!(acquire(MediaEvent::Dropped(Vec::new())).unwrap().is_none());
    }

    #[test]
    fn browsed_file_is_tagged() {
        let payload = acquire(MediaEvent::Browsed(jpeg("pick.jpg"))).unwrap().unwrap();
        assert_eq!(payload.origin(), MediaOrigin::Browsed);
        assert_eq!(payload.media_type(), "image/jpeg");
    }

    #[test]
    fn browsed_empty_file_is_rejected() {
        let file = SourceFile::new("empty.png", "image/png", Vec::new());
        assert_eq!(acquire(MediaEvent::Browsed(file)).unwrap_err(), AcquireError::Empty);
    }

    #[test]
    fn pasted_picks_first_image_item() {
        let png = SourceFile::new("image.png", "image/png", vec![1, 2, 3]);
        let items = vec![
            ClipboardItem::text(),
            ClipboardItem::file(png),
            ClipboardItem::file(jpeg("later.jpg")),
        ];
        let payload = acquire(MediaEvent::Pasted(items)).unwrap().unwrap();
        assert_eq!(payload.origin(), MediaOrigin::Pasted);
        assert_eq!(payload.file_name(), "image.png");
        assert_eq!(payload.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn paste_without_image_is_a_no_op() {
        let items = vec![ClipboardItem::text(), ClipboardItem::text()];
        assert!(acquire(MediaEvent::Pasted(items)).unwrap().is_none());
        assert!(acquire(MediaEvent::Pasted(Vec::new())).unwrap().is_none());
    }

    #[test]
    fn paste_image_item_without_file_is_a_no_op() {
        let items = vec![
            ClipboardItem {
                media_type: "image/png".to_string(),
                file: None,
            },
            ClipboardItem::file(jpeg("later.jpg")),
        ];
        assert!(acquire(MediaEvent::Pasted(items)).unwrap().is_none());
    }

    #[test]
    fn captured_gets_generated_name() {
        let image = CapturedImage {
            media_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8],
            width: 2,
            height: 2,
        };
        let payload = acquire(MediaEvent::Captured(image)).unwrap().unwrap();
        assert_eq!(payload.origin(), MediaOrigin::Captured);
        assert!(payload.file_name().starts_with("camera-capture-"));
        assert!(payload.file_name().ends_with(".jpg"));
    }
}
