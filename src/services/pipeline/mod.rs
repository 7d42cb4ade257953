//! Search pipeline
//!
//! Acquisition and submission are joined here: any acquired image is searched right
//! away. Every submission takes a token; a response whose token is no longer the latest
//! (a newer acquisition or a clear happened meanwhile) is dropped before it reaches the
//! presentation surface.


use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::app_state::{AppState, PreviewInfo, ResultsView};
use crate::error::{AppError, AppResult, CameraError};
use crate::services::{
    acquire, CameraDevice, CameraSessionManager, CameraState, ImagePayload, MediaEvent,
    Submitter, ThirdsTriage, TriagePolicy,
};

/// The UI side. Receives read-only data only.
pub trait PresentationSurface: Send + Sync {
    fn show_preview(&self, _payload: &ImagePayload) {}

    fn show_results(&self, view: &ResultsView);

    fn show_error(&self, _error: &AppError) {}

    fn clear(&self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Nothing to search (empty drop, paste without image).
    Ignored,
    Delivered(ResultsView),
    /// A newer submission or a clear made this response stale.
    Superseded,
}

pub struct SearchPipeline<S: Submitter, D: CameraDevice> {
    submitter: S,
    triage: Box<dyn TriagePolicy>,
    surface: Arc<dyn PresentationSurface>,
    camera: Mutex<CameraSessionManager<D>>,
    state: Mutex<AppState>,
    tokens: AtomicU64,
    result_count: u32,
}

impl<S: Submitter, D: CameraDevice> SearchPipeline<S, D> {
    pub fn new(
        submitter: S,
        camera: CameraSessionManager<D>,
        surface: Arc<dyn PresentationSurface>,
        result_count: u32,
    ) -> Self {
        Self {
            submitter,
            triage: Box::new(ThirdsTriage),
            surface,
            camera: Mutex::new(camera),
            state: Mutex::new(AppState::default()),
            tokens: AtomicU64::new(0),
            result_count,
        }
    }

    pub fn with_triage(mut self, triage: Box<dyn TriagePolicy>) -> Self {
        self.triage = triage;
        self
    }

    /// Normalize the event and, if it produced an image, search it.
    pub async fn acquire(&self, event: MediaEvent) -> AppResult<SearchOutcome> {
        match acquire(event) {
            Ok(Some(payload)) => self.submit(payload).await,
            Ok(None) => Ok(SearchOutcome::Ignored),
            Err(err) => {
                tracing::warn!(error = %err, "Acquisition rejected");
                Err(self.report(err.into()))
            }
        }
    }

    /// Send one payload and hand the triaged results to the surface.
    pub async fn submit(&self, payload: ImagePayload) -> AppResult<SearchOutcome> {
        let token = self.tokens.fetch_add(1, Ordering::SeqCst) + 1;

        self.state.lock().await.preview = Some(PreviewInfo::from(&payload));
        self.surface.show_preview(&payload);
        tracing::debug!(token, origin = ?payload.origin(), "Submission started");

        let result = self.submitter.submit(payload, self.result_count).await;

        if !self.is_latest(token) {
            tracing::debug!(token, "Stale search response discarded");
            return Ok(SearchOutcome::Superseded);
        }

        match result {
            Ok(results) => {
                let view = ResultsView::from_buckets(self.triage.triage(results));
                {
                    let mut state = self.state.lock().await;
                    if !self.is_latest(token) {
                        return Ok(SearchOutcome::Superseded);
                    }
                    state.results = Some(view.clone());
                }
                tracing::info!(token, count = view.urls().len(), "Search results delivered");
                self.surface.show_results(&view);
                Ok(SearchOutcome::Delivered(view))
            }
            Err(err) => {
                tracing::warn!(token, error = %err, "Submission failed");
                Err(self.report(err.into()))
            }
        }
    }

    /// Request the camera. The lock is not held while the permission prompt is pending,
    /// so `close_camera` and `clear` can cancel it.
    pub async fn open_camera(&self) -> AppResult<()> {
        let pending = self.camera.lock().await.begin_open();
        let result = pending.request().await;
        match self.camera.lock().await.complete_open(pending, result) {
            Ok(()) => Ok(()),
            // 用户主动取消，不算错误展示
            Err(CameraError::Cancelled) => Err(CameraError::Cancelled.into()),
            Err(err) => Err(self.report(err.into())),
        }
    }

    /// Capture a frame and search it. The camera session ends either way.
    pub async fn capture(&self) -> AppResult<SearchOutcome> {
        let captured = self.camera.lock().await.capture();
        match captured {
            Ok(image) => self.acquire(MediaEvent::Captured(image)).await,
            Err(err) => Err(self.report(err.into())),
        }
    }

    /// Platform callback for a stream that died while streaming.
    pub async fn camera_stream_failed(&self, reason: &str) -> AppError {
        let err = self.camera.lock().await.on_stream_error(reason);
        self.report(err.into())
    }

    pub async fn close_camera(&self) -> bool {
        self.camera.lock().await.close()
    }

    /// Reset to idle: camera released, preview and results dropped, in-flight responses
    /// invalidated.
    pub async fn clear(&self) {
        self.tokens.fetch_add(1, Ordering::SeqCst);
        self.camera.lock().await.close();
        *self.state.lock().await = AppState::default();
        self.surface.clear();
        tracing::debug!("Pipeline cleared");
    }

    pub async fn camera_state(&self) -> CameraState {
        self.camera.lock().await.state()
    }

    pub async fn camera_live_tracks(&self) -> usize {
        self.camera.lock().await.live_tracks()
    }

    pub async fn results(&self) -> Option<ResultsView> {
        self.state.lock().await.results.clone()
    }

    pub async fn preview(&self) -> Option<PreviewInfo> {
        self.state.lock().await.preview.clone()
    }

    fn is_latest(&self, token: u64) -> bool {
        self.tokens.load(Ordering::SeqCst) == token
    }

    fn report(&self, err: AppError) -> AppError {
        self.surface.show_error(&err);
        err
    }
}
