//! # serve 子命令实现
//!
//! 按文件名顺序逐帧处理，每帧的特征发布到快照存储，客户端可随时用
//! `__GET__` 读取最新一发。处理完成后继续服务，直到收到 `__STOP__`。
//!
//! ## 错误处理
//! - 单帧错误（未标定、尺寸不符、权重退化、图像解码）：警告并跳过该帧
//! - 其他错误：停止服务并返回
//!
//! ## 依赖关系
//! - 使用 `cli/serve.rs` 定义的 ServeArgs
//! - 使用 `commands/session.rs`, `snapshot/`, `batch/collector.rs`

use crate::batch::FileCollector;
use crate::cli::serve::ServeArgs;
use crate::commands::session::SessionConfig;
use crate::error::{EspecError, Result};
use crate::snapshot::{SnapshotServer, SnapshotStore, STOP_TOKEN};
use crate::utils::{output, progress};

use log::warn;
use std::thread;
use std::time::Duration;

/// 执行快照服务
pub fn execute(args: ServeArgs) -> Result<()> {
    output::print_header("Beam Feature Snapshot Server");

    if !args.input.exists() {
        return Err(EspecError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let session = SessionConfig::build(&args.calibration, &args.geometry, &args.window)?;
    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        return Err(EspecError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    let store = SnapshotStore::new();
    let handle = SnapshotServer::bind(&args.address, store.clone(), "espec")?.spawn();
    output::print_info(&format!(
        "Serving snapshots on {} ({} frames queued)",
        handle.local_addr(),
        files.len()
    ));

    let interval = Duration::from_millis(args.interval_ms);
    let mut published = 0usize;

    for (index, file) in files.iter().enumerate() {
        if !handle.is_running() {
            output::print_warning("Stop requested, remaining frames not processed");
            break;
        }

        match session.process_path(file, index as u64) {
            Ok(processed) => {
                let features = processed.features;
                store.publish(features);
                published += 1;
                output::print_features(
                    &format!("shot {}", features.shot_number),
                    features.mean_energy,
                    features.std_energy,
                );
            }
            Err(e) if e.is_per_frame() => {
                warn!("skipping frame {}: {}", file.display(), e);
                output::print_warning(&format!("Skipped '{}': {}", file.display(), e));
            }
            Err(e) => return Err(handle.stop_with(e)),
        }

        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    output::print_success(&format!("Published {} of {} frames", published, files.len()));
    if let Some(mapping) = session.cache.current() {
        let (e_min, e_max) = mapping.energy_range();
        output::print_info(&format!(
            "Energy axis: {} bins from {:.2} to {:.2} MeV ({}x{} frames)",
            mapping.energy.len(),
            e_min,
            e_max,
            mapping.width,
            mapping.height
        ));
    }

    if args.exit_after_frames {
        handle.stop()?;
    } else if handle.is_running() {
        let spinner = progress::create_spinner(&format!(
            "Waiting for '{}' on {}",
            STOP_TOKEN,
            handle.local_addr()
        ));
        let waited = handle.wait();
        spinner.finish_and_clear();
        waited?;
    } else {
        handle.wait()?;
    }

    output::print_done("Snapshot server stopped");
    Ok(())
}
