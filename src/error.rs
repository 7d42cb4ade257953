//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义各组件的错误枚举，
//! 并汇总为 `AppError` 与 `AppResult` 类型别名。

use serde::Serialize;
use thiserror::Error;

/// 图片获取阶段的错误（发生在提交之前）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// 声明的媒体类型不是图片
    #[error("not an image: {media_type:?}")]
    NotAnImage { media_type: String },

    /// 图片内容为空
    #[error("image payload is empty")]
    Empty,
}

/// 摄像头会话错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// 用户或系统拒绝了摄像头权限
    #[error("camera access denied")]
    AccessDenied,

    /// 设备不存在、被占用或在取流过程中出错
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// 当前没有活动的视频流
    #[error("no active camera stream")]
    NotStreaming,

    /// 权限请求期间被关闭或重置
    #[error("camera request cancelled")]
    Cancelled,

    /// 帧编码失败
    #[error("frame encoding failed: {0}")]
    Encode(String),
}

/// 相似度服务提交错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// 传输失败或服务返回非 2xx
    #[error("search request failed: {0}")]
    Network(String),

    /// 响应无法解析为预期结构
    #[error("search response malformed: {0}")]
    Malformed(String),

    /// 服务以 `{"error": ...}` 报告了内部错误
    #[error("search service error: {0}")]
    Service(String),
}

/// 应用级统一错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// 文件操作错误
    #[error("文件操作错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 剪贴板访问错误
    #[error("剪贴板错误: {0}")]
    Clipboard(String),
}

// ========== Serialize 实现：展示层只需要 type + message ==========

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("AppError", 2)?;

        let error_type = match self {
            AppError::Acquire(AcquireError::NotAnImage { .. }) => "not_an_image",
            AppError::Acquire(AcquireError::Empty) => "empty_image",
            AppError::Camera(CameraError::AccessDenied) => "camera_access_denied",
            AppError::Camera(CameraError::DeviceUnavailable(_)) => "camera_unavailable",
            AppError::Camera(CameraError::NotStreaming) => "camera_not_streaming",
            AppError::Camera(CameraError::Cancelled) => "camera_cancelled",
            AppError::Camera(CameraError::Encode(_)) => "camera_encode",
            AppError::Submission(SubmissionError::Network(_)) => "network",
            AppError::Submission(SubmissionError::Malformed(_)) => "malformed_response",
            AppError::Submission(SubmissionError::Service(_)) => "service",
            AppError::Io(_) => "io",
            AppError::Config(_) => "config",
            AppError::Clipboard(_) => "clipboard",
        };
        state.serialize_field("type", error_type)?;
        state.serialize_field("message", &self.to_string())?;

        state.end()
    }
}

/// 应用级 Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

// ========== 扩展 trait：为 Result 添加上下文方法 ==========

/// 为 Result 类型添加错误上下文转换方法
pub trait ResultExt<T> {
    /// 将错误转换为配置错误
    fn config_err(self, msg: &str) -> AppResult<T>;

    /// 将错误转换为剪贴板错误
    fn clipboard_err(self, msg: &str) -> AppResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn config_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Config(format!("{}: {}", msg, e)))
    }

    fn clipboard_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Clipboard(format!("{}: {}", msg, e)))
    }
}
