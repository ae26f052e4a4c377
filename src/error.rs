//! # 统一错误处理模块
//!
//! 定义 espec 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 标定错误：加载时即致命，不重试
//! - 配置错误：必须在处理任何图像之前报告
//! - 单帧错误：调用方跳过该帧，可用下一帧重试
//! - 单次调用错误：积分/特征提取参数错误，调用方修正参数后可恢复
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// espec 统一错误类型
#[derive(Error, Debug)]
pub enum EspecError {
    // ─────────────────────────────────────────────────────────────
    // 标定错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed calibration: {reason}")]
    MalformedCalibration { reason: String },

    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("Unknown referencing mode '{0}' (expected 'zero' or 'refpoint')")]
    UnknownReferencingMode(String),

    #[error("Reference energy {energy_mev} MeV is outside the calibrated range")]
    ReferenceOutOfRange { energy_mev: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ─────────────────────────────────────────────────────────────
    // 单帧错误
    // ─────────────────────────────────────────────────────────────
    #[error("Uncalibrated frame: {reason}")]
    UncalibratedFrame { reason: String },

    #[error("Frame shape mismatch: axis mapping expects {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    FrameShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 单次调用错误
    // ─────────────────────────────────────────────────────────────
    #[error("{which} cursors {start}-{end} out of range for frame with {rows} rows")]
    CursorOutOfRange {
        which: &'static str,
        start: usize,
        end: usize,
        rows: usize,
    },

    #[error("Degenerate weighting: spectrum has no positive weight in the selected window")]
    DegenerateWeighting,

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {path} (line {line}): {reason}")]
    ParseError {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    // ─────────────────────────────────────────────────────────────
    // 导出错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Plot rendering failed: {0}")]
    PlotError(String),

    // ─────────────────────────────────────────────────────────────
    // 快照服务错误
    // ─────────────────────────────────────────────────────────────
    #[error("Snapshot server error on {address}: {source}")]
    ServerError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

impl EspecError {
    /// 是否为单帧错误（批处理时跳过该帧继续）
    pub fn is_per_frame(&self) -> bool {
        matches!(
            self,
            EspecError::UncalibratedFrame { .. }
                | EspecError::FrameShapeMismatch { .. }
                | EspecError::DegenerateWeighting
                | EspecError::ImageError(_)
        )
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, EspecError>;
