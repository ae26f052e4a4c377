//! # espec - 电子谱仪图像去卷积工具
//!
//! 将磁谱仪荧光屏（Lanex）图像转换为物理标定的能量 - 角度谱，
//! 并提取束流平均能量与能散。
//!
//! ## 子命令
//! - `deconvolve` - 单帧或批量去卷积，导出能谱、图像和特征
//! - `calib`      - 查看标定表及其像素映射
//! - `serve`      - 逐帧处理并通过 TCP 快照服务发布最新特征
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (标定表、图像、发次解析)
//!   │     ├── spectro/   (坐标映射、重采样、积分、特征)
//!   │     ├── snapshot/  (快照存储与服务)
//!   │     ├── batch/     (批量并行处理)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (终端输出与进度条)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod snapshot;
mod spectro;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
