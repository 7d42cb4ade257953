//! Platform seams for the capture device

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;

use super::VideoFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// 后置摄像头
    Environment,
    /// 前置摄像头
    User,
}

/// 取流参数：朝向 + 期望分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConstraints {
    pub facing: FacingMode,
    pub width: u32,
    pub height: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            width: 1280,
            height: 720,
        }
    }
}

/// The platform's media-device entry point (the permission prompt lives behind it).
#[async_trait]
pub trait CameraDevice: Send + Sync {
    type Stream: MediaStream;

    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Self::Stream, CameraError>;
}

/// A granted video stream.
pub trait MediaStream: Send {
    fn label(&self) -> &str;

    /// Number of tracks still running.
    fn live_tracks(&self) -> usize;

    /// Stop every track. Must be safe to call more than once.
    fn stop_all(&mut self);

    /// Current frame as tightly packed RGB8.
    fn read_frame(&mut self) -> Result<VideoFrame, CameraError>;
}

/// Where the live stream is shown while streaming (the video element).
pub trait PreviewSurface: Send {
    fn bind(&mut self, stream_label: &str);
    fn unbind(&mut self);
}

/// Preview surface for headless use.
#[derive(Debug, Default)]
pub struct DetachedPreview;

impl PreviewSurface for DetachedPreview {
    fn bind(&mut self, _stream_label: &str) {}
    fn unbind(&mut self) {}
}

/// Device for builds without a capture backend; every request reports the device missing.
#[derive(Debug, Default)]
pub struct NoCamera;

/// Uninhabited: [`NoCamera`] never grants a stream.
#[derive(Debug)]
pub enum NoStream {}

#[async_trait]
impl CameraDevice for NoCamera {
    type Stream = NoStream;

    async fn request_stream(
        &self,
        _constraints: &StreamConstraints,
    ) -> Result<Self::Stream, CameraError> {
        Err(CameraError::DeviceUnavailable(
            "no capture backend in this build".to_string(),
        ))
    }
}

impl MediaStream for NoStream {
    fn label(&self) -> &str {
        match *self {}
    }

    fn live_tracks(&self) -> usize {
        match *self {}
    }

    fn stop_all(&mut self) {
        match *self {}
    }

    fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        match *self {}
    }
}
