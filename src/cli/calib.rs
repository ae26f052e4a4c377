//! # calib 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/calib.rs`

use crate::cli::session::GeometryArgs;

use clap::Args;
use std::path::PathBuf;

/// calib 子命令参数
#[derive(Args, Debug)]
pub struct CalibArgs {
    /// Calibration table (energy, dispersion, position columns)
    pub path: PathBuf,

    /// Number of calibration rows to print (0 = all)
    #[arg(long, default_value_t = 15)]
    pub rows: usize,

    /// Frame width in pixels; prints the column to energy mapping for this geometry
    #[arg(long)]
    pub frame_width: Option<usize>,

    #[command(flatten)]
    pub geometry: GeometryArgs,
}
