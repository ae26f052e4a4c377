//! # serve 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/serve.rs`

use crate::cli::session::{GeometryArgs, WindowArgs};

use clap::Args;
use std::path::PathBuf;

/// serve 子命令参数
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Input: frame image or directory of frames, processed in file name order
    pub input: PathBuf,

    /// Calibration table (energy, dispersion, position columns)
    #[arg(short, long)]
    pub calibration: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:5555")]
    pub address: String,

    /// Delay between frames in milliseconds (simulates the acquisition rate)
    #[arg(long, default_value_t = 0)]
    pub interval_ms: u64,

    /// Glob pattern for frame files
    #[arg(long, default_value = "*.tif,*.tiff,*.png")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Stop after the last frame instead of waiting for a stop request
    #[arg(long, default_value_t = false)]
    pub exit_after_frames: bool,

    #[command(flatten)]
    pub geometry: GeometryArgs,

    #[command(flatten)]
    pub window: WindowArgs,
}
