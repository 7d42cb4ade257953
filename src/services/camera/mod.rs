//! Camera session manager
//!
//! State machine: `Idle → Requesting → Streaming → (Capturing) → Idle`.
//! Every exit path stops the stream tracks and unbinds the preview surface.

mod device;
mod frame;

pub use device::*;
pub use frame::*;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::CameraError;
use crate::services::{CameraConfig, CapturedImage};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraState {
    Idle,
    Requesting,
    Streaming,
    Capturing,
}

/// 一次活动的摄像头连接
///
/// Drop 时若仍处于活动状态会停止所有轨道，保证不会遗留运行中的设备。
pub struct CameraSession<S: MediaStream> {
    id: Uuid,
    stream: S,
    started_at: DateTime<Utc>,
    active: bool,
}

impl<S: MediaStream> CameraSession<S> {
    fn new(stream: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            stream,
            started_at: Utc::now(),
            active: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        if self.active {
            self.stream.stop_all();
            self.active = false;
        }
    }
}

impl<S: MediaStream> Drop for CameraSession<S> {
    fn drop(&mut self) {
        if self.active {
            tracing::warn!(session_id = %self.id, "Camera session dropped while active, stopping tracks");
            self.stop();
        }
    }
}

/// 一次尚未得到答复的取流请求
///
/// 持有设备的共享引用，可以在不占用管理器的情况下等待权限提示。
pub struct PendingOpen<D: CameraDevice> {
    device: Arc<D>,
    constraints: StreamConstraints,
    generation: u64,
}

impl<D: CameraDevice> PendingOpen<D> {
    pub async fn request(&self) -> Result<D::Stream, CameraError> {
        self.device.request_stream(&self.constraints).await
    }
}

pub struct CameraSessionManager<D: CameraDevice> {
    device: Arc<D>,
    constraints: StreamConstraints,
    jpeg_quality: u8,
    surface: Box<dyn PreviewSurface>,
    state: CameraState,
    session: Option<CameraSession<D::Stream>>,
    // close / 重新 open 时递增，使未完成的请求失效
    generation: u64,
}

impl<D: CameraDevice> CameraSessionManager<D> {
    pub fn new(device: D, config: &CameraConfig) -> Self {
        Self {
            device: Arc::new(device),
            constraints: config.constraints(),
            jpeg_quality: config.jpeg_quality,
            surface: Box::new(DetachedPreview),
            state: CameraState::Idle,
            session: None,
            generation: 0,
        }
    }

    pub fn with_surface(mut self, surface: Box<dyn PreviewSurface>) -> Self {
        self.surface = surface;
        self
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_active())
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id())
    }

    /// Tracks still running in the current session (0 when idle).
    pub fn live_tracks(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.stream.live_tracks())
            .unwrap_or(0)
    }

    /// Ask the platform for a stream and bind it to the preview surface.
    ///
    /// Holds `&mut self` for the whole permission prompt; callers sharing the manager
    /// should use [`begin_open`](Self::begin_open) / [`complete_open`](Self::complete_open)
    /// so a close can run while the prompt is pending.
    pub async fn open(&mut self) -> Result<(), CameraError> {
        let pending = self.begin_open();
        let result = pending.request().await;
        self.complete_open(pending, result)
    }

    /// Enter `Requesting`. An already active session is released first, and any earlier
    /// pending request is invalidated.
    pub fn begin_open(&mut self) -> PendingOpen<D> {
        if self.session.is_some() {
            tracing::debug!("Releasing previous camera session before reopening");
            self.release();
        }

        self.generation += 1;
        self.state = CameraState::Requesting;
        tracing::debug!(
            facing = ?self.constraints.facing,
            width = self.constraints.width,
            height = self.constraints.height,
            "Requesting camera stream"
        );

        PendingOpen {
            device: self.device.clone(),
            constraints: self.constraints,
            generation: self.generation,
        }
    }

    /// Apply the platform's answer. If a close, clear or newer open happened while the
    /// prompt was pending, a granted stream is stopped at once and `Cancelled` returned.
    pub fn complete_open(
        &mut self,
        pending: PendingOpen<D>,
        result: Result<D::Stream, CameraError>,
    ) -> Result<(), CameraError> {
        if pending.generation != self.generation {
            if let Ok(mut stream) = result {
                stream.stop_all();
            }
            tracing::info!("Camera request cancelled while permission prompt was pending");
            return Err(CameraError::Cancelled);
        }

        match result {
            Ok(stream) => {
                let session = CameraSession::new(stream);
                self.surface.bind(session.stream.label());
                tracing::info!(session_id = %session.id(), "Camera streaming");
                self.session = Some(session);
                self.state = CameraState::Streaming;
                Ok(())
            }
            Err(err) => {
                self.state = CameraState::Idle;
                tracing::warn!(error = %err, "Camera request failed");
                Err(err)
            }
        }
    }

    /// Grab the current frame as JPEG. The session ends here whatever the outcome.
    pub fn capture(&mut self) -> Result<CapturedImage, CameraError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => return Err(CameraError::NotStreaming),
        };
        self.state = CameraState::Capturing;

        let quality = self.jpeg_quality;
        let result = session
            .stream
            .read_frame()
            .and_then(|frame| encode_frame(frame, quality));

        let session_id = session.id();
        self.finish(session);

        match &result {
            Ok(image) => tracing::info!(
                %session_id,
                width = image.width,
                height = image.height,
                bytes = image.bytes.len(),
                "Camera frame captured"
            ),
            Err(err) => tracing::warn!(%session_id, error = %err, "Camera capture failed"),
        }
        result
    }

    /// Platform reported the stream failed mid-flight.
    pub fn on_stream_error(&mut self, reason: &str) -> CameraError {
        tracing::warn!(reason, "Camera stream error");
        self.release();
        CameraError::DeviceUnavailable(reason.to_string())
    }

    /// Stop the stream and clear the session, or cancel a pending request. Closing an
    /// idle manager does nothing.
    ///
    /// Returns whether a session or a pending request was released.
    pub fn close(&mut self) -> bool {
        let released = self.release();
        if released {
            tracing::info!("Camera closed");
        }
        released
    }

    fn release(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                self.finish(session);
                true
            }
            None => {
                let requesting = self.state == CameraState::Requesting;
                if requesting {
                    self.generation += 1;
                }
                self.state = CameraState::Idle;
                requesting
            }
        }
    }

    fn finish(&mut self, mut session: CameraSession<D::Stream>) {
        session.stop();
        self.surface.unbind();
        self.state = CameraState::Idle;
        tracing::debug!(session_id = %session.id(), "Camera session released");
    }
}
