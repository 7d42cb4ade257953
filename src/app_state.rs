use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::services::{ImagePayload, MediaOrigin, TriageBuckets};

/// 交给展示层的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    /// 服务返回了空列表，不是错误
    NoResults,
    Matches {
        /// 解析后的有序图片地址
        urls: Vec<String>,
        buckets: Arc<TriageBuckets>,
    },
}

impl ResultsView {
    pub fn from_buckets(buckets: TriageBuckets) -> Self {
        if buckets.is_empty() {
            return ResultsView::NoResults;
        }
        let urls = buckets.iter().map(|r| r.url.clone()).collect();
        ResultsView::Matches {
            urls,
            buckets: Arc::new(buckets),
        }
    }

    pub fn buckets(&self) -> Option<&TriageBuckets> {
        match self {
            ResultsView::NoResults => None,
            ResultsView::Matches { buckets, .. } => Some(buckets.as_ref()),
        }
    }

    pub fn urls(&self) -> &[String] {
        match self {
            ResultsView::NoResults => &[],
            ResultsView::Matches { urls, .. } => urls,
        }
    }
}

/// 当前预览图片的元数据（不保留图片内容）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewInfo {
    pub origin: MediaOrigin,
    pub file_name: String,
    pub fingerprint: String,
    pub acquired_at: DateTime<Utc>,
}

impl From<&ImagePayload> for PreviewInfo {
    fn from(payload: &ImagePayload) -> Self {
        Self {
            origin: payload.origin(),
            file_name: payload.file_name().to_string(),
            fingerprint: payload.fingerprint().to_string(),
            acquired_at: payload.acquired_at(),
        }
    }
}

/// 单个用户会话的展示状态
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub preview: Option<PreviewInfo>,
    pub results: Option<ResultsView>,
}
