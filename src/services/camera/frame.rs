use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::CameraError;
use crate::services::CapturedImage;
use crate::utils::validate_jpeg_quality;

pub const CAPTURE_MEDIA_TYPE: &str = "image/jpeg";

/// One raw video frame, RGB8, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Draw the frame onto an off-screen canvas of the same size and encode it as JPEG.
pub fn encode_frame(frame: VideoFrame, quality: u8) -> Result<CapturedImage, CameraError> {
    let (width, height) = (frame.width, frame.height);
    if width == 0 || height == 0 {
        return Err(CameraError::Encode("empty frame".to_string()));
    }

    let canvas = RgbImage::from_raw(width, height, frame.rgb).ok_or_else(|| {
        CameraError::Encode(format!("frame buffer does not match {}x{}", width, height))
    })?;

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, validate_jpeg_quality(quality));
    encoder
        .encode_image(&canvas)
        .map_err(|e| CameraError::Encode(e.to_string()))?;

    Ok(CapturedImage {
        media_type: CAPTURE_MEDIA_TYPE.to_string(),
        bytes,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame {
            width,
            height,
            rgb: vec![200; (width * height * 3) as usize],
        }
    }

    #[test]
    fn encodes_jpeg_with_frame_dimensions() {
        let image = encode_frame(solid_frame(8, 6), 90).unwrap();
        assert_eq!(image.media_type, "image/jpeg");
        assert_eq!((image.width, image.height), (8, 6));
        assert_eq!(&image.bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&image.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn rejects_short_buffer() {
        let frame = VideoFrame {
            width: 4,
            height: 4,
            rgb: vec![0; 10],
        };
        assert!(matches!(encode_frame(frame, 90), Err(CameraError::Encode(_))));
    }

    #[test]
    fn rejects_empty_frame() {
        assert!(matches!(
            encode_frame(solid_frame(0, 0), 90),
            Err(CameraError::Encode(_))
        ));
    }
}
