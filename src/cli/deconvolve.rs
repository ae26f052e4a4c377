//! # deconvolve 子命令 CLI 定义
//!
//! 单帧或目录批量去卷积。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/deconvolve.rs`

use crate::cli::session::{GeometryArgs, WindowArgs};

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 输出产物类型
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// dN/dE spectrum as CSV
    SpectrumCsv,
    /// Calibrated energy x angle image as CSV
    ImageCsv,
    /// Beam features as JSON
    FeaturesJson,
    /// dN/dE spectrum plot (PNG, or SVG with --svg)
    SpectrumPlot,
    /// Calibrated image heat map (PNG)
    ImagePlot,
}

impl OutputKind {
    /// 输出文件后缀
    pub fn suffix(&self, use_svg: bool) -> &'static str {
        match self {
            OutputKind::SpectrumCsv => "spectrum.csv",
            OutputKind::ImageCsv => "image.csv",
            OutputKind::FeaturesJson => "features.json",
            OutputKind::SpectrumPlot if use_svg => "spectrum.svg",
            OutputKind::SpectrumPlot => "spectrum.png",
            OutputKind::ImagePlot => "image.png",
        }
    }
}

/// deconvolve 子命令参数
#[derive(Args, Debug)]
pub struct DeconvolveArgs {
    /// Input: frame image (PNG/TIFF) or directory of frames
    pub input: PathBuf,

    /// Calibration table (energy, dispersion, position columns)
    #[arg(short, long)]
    pub calibration: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "espec_output")]
    pub output: PathBuf,

    /// Outputs to write for each frame
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values = ["spectrum-csv", "features-json", "spectrum-plot"]
    )]
    pub outputs: Vec<OutputKind>,

    /// Write vector (SVG) spectrum plots instead of PNG
    #[arg(long, default_value_t = false)]
    pub svg: bool,

    /// Figure width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    #[command(flatten)]
    pub geometry: GeometryArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for frame files (batch mode)
    #[arg(long, default_value = "*.tif,*.tiff,*.png")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto, batch mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories (batch mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Number of shots to show in the feature table
    #[arg(long, default_value_t = 20)]
    pub top_n: usize,
}
