//! # 会话参数
//!
//! `deconvolve`、`calib`、`serve` 共用的标定、几何与分析窗口参数。
//!
//! ## 依赖关系
//! - 被 `cli/` 各子命令 flatten 使用
//! - 由 `commands/session.rs` 转换为 SessionConfig

use clap::Args;

// ─────────────────────────────────────────────────────────────
// 几何与参考模式
// ─────────────────────────────────────────────────────────────

/// 几何标定参数
#[derive(Args, Debug, Clone)]
pub struct GeometryArgs {
    /// Energy axis spacing in MeV
    #[arg(long, default_value_t = 0.5)]
    pub spacing: f64,

    /// Spatial calibration of the screen (pixel/mm)
    #[arg(long, default_value_t = 20.408)]
    pub pixel_per_mm: f64,

    /// Angular calibration (mrad/pixel)
    #[arg(long, default_value_t = 0.1)]
    pub mrad_per_pix: f64,

    /// Charge calibration (pC/count)
    #[arg(long, default_value_t = 4.33e-6)]
    pub pc_per_count: f64,

    /// Referencing mode: zero or refpoint
    #[arg(long, default_value = "zero")]
    pub ref_mode: String,

    /// Reference point "a,b": (pixel_x, pixel_y) in zero mode, (position_mm, energy_MeV) in refpoint mode
    #[arg(long, default_value = "1953,635")]
    pub ref_point: String,
}

// ─────────────────────────────────────────────────────────────
// 分析窗口与帧方向
// ─────────────────────────────────────────────────────────────

/// 单帧分析参数
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Signal rows "start-end" (end exclusive)
    #[arg(long, default_value = "600-670")]
    pub data_rows: String,

    /// Background rows "start-end" (end exclusive)
    #[arg(long, default_value = "750-850")]
    pub background_rows: String,

    /// Energy window for beam features "low-high" in MeV (e.g., "15-100")
    #[arg(long, conflicts_with = "no_bounds")]
    pub energy_bounds: Option<String>,

    /// Use the whole energy axis for beam features
    #[arg(long, default_value_t = false)]
    pub no_bounds: bool,

    /// Do not mirror frame columns (left-to-right deflection)
    #[arg(long, default_value_t = false)]
    pub no_flip: bool,

    /// Transpose frames delivered as width x height
    #[arg(long, default_value_t = false)]
    pub transpose: bool,
}
