//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `deconvolve`: 单帧或批量去卷积，导出能谱与特征
//! - `calib`: 查看标定表及其像素映射
//! - `serve`: 逐帧处理并通过快照服务发布最新特征
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: session, deconvolve, calib, serve

pub mod calib;
pub mod deconvolve;
pub mod serve;
pub mod session;

use clap::{Parser, Subcommand};

/// espec - 电子谱仪图像去卷积工具
#[derive(Parser)]
#[command(name = "espec")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Electron spectrometer calibration, deconvolution and beam features", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase diagnostic logging (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Deconvolve detector frames into energy spectra and beam features
    Deconvolve(deconvolve::DeconvolveArgs),

    /// Inspect a calibration table and its pixel mapping
    Calib(calib::CalibArgs),

    /// Process frames and serve the latest features over TCP
    Serve(serve::ServeArgs),
}
