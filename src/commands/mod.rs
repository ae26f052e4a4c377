//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `spectro/`, `snapshot/`, `batch/`, `utils/`
//! - 子模块: session, deconvolve, calib, serve

pub mod calib;
pub mod deconvolve;
pub mod serve;
pub mod session;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Deconvolve(args) => deconvolve::execute(args),
        Commands::Calib(args) => calib::execute(args),
        Commands::Serve(args) => serve::execute(args),
    }
}
