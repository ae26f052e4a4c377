//! # deconvolve 子命令实现
//!
//! 将探测器原始图像去卷积为 dN/dE 能谱，并提取束流平均能量与能散。
//!
//! ## 功能
//! - 支持单帧和批量目录处理
//! - 并行计算（rayon），所有帧共享一个 AxisCache
//! - 可选输出：能谱 CSV、标定图像 CSV、特征 JSON、能谱图、热图
//! - 批量模式写出特征汇总 CSV
//!
//! ## 依赖关系
//! - 使用 `cli/deconvolve.rs` 定义的 DeconvolveArgs
//! - 使用 `commands/session.rs` 组装会话
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `spectro/` 的导出与绘图

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::deconvolve::{DeconvolveArgs, OutputKind};
use crate::commands::session::SessionConfig;
use crate::error::{EspecError, Result};
use crate::models::FeatureRecord;
use crate::spectro::plot::SpectrumPlot;
use crate::spectro::{export, plot, EnergyBounds, ProcessedFrame};
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 特征汇总文件名
const SUMMARY_FILE: &str = "features_summary.csv";

/// 输出配置
struct OutputConfig {
    output_dir: PathBuf,
    outputs: Vec<OutputKind>,
    energy_bounds: Option<EnergyBounds>,
    svg: bool,
    width: u32,
    height: u32,
    overwrite: bool,
}

impl OutputConfig {
    fn from_args(args: &DeconvolveArgs, energy_bounds: Option<EnergyBounds>) -> Self {
        let mut outputs: Vec<OutputKind> = Vec::with_capacity(args.outputs.len());
        for &kind in &args.outputs {
            if !outputs.contains(&kind) {
                outputs.push(kind);
            }
        }
        Self {
            output_dir: args.output.clone(),
            outputs,
            energy_bounds,
            svg: args.svg,
            width: args.width,
            height: args.height,
            overwrite: args.overwrite,
        }
    }

    fn path_for(&self, stem: &str, kind: OutputKind) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}", stem, kind.suffix(self.svg)))
    }

    /// 所选输出是否都已存在
    fn all_exist(&self, stem: &str) -> bool {
        !self.outputs.is_empty()
            && self
                .outputs
                .iter()
                .all(|&kind| self.path_for(stem, kind).exists())
    }
}

/// 执行去卷积
pub fn execute(args: DeconvolveArgs) -> Result<()> {
    output::print_header("Electron Spectrometer Deconvolution");

    if !args.input.exists() {
        return Err(EspecError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let session = SessionConfig::build(&args.calibration, &args.geometry, &args.window)?;
    print_session(&session);

    fs::create_dir_all(&args.output).map_err(|e| EspecError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    let config = OutputConfig::from_args(&args, session.window.energy_bounds);

    if args.input.is_file() {
        execute_single_file(&args, &session, &config)
    } else {
        execute_batch(&args, &session, &config)
    }
}

/// 打印会话摘要
fn print_session(session: &SessionConfig) {
    let curve = session.calibration();
    let (e_min, e_max) = curve.energy_range();
    output::print_info(&format!(
        "Calibration: {} rows, {:.2}-{:.2} MeV, {}",
        curve.len(),
        e_min,
        e_max,
        curve.orientation()
    ));
    output::print_info(&format!("Referencing: {}", session.cache.mode()));
    output::print_info(&format!(
        "Rows: data {}, background {}",
        session.window.data_rows, session.window.background_rows
    ));
    match session.window.energy_bounds {
        Some((low, high)) => {
            output::print_info(&format!("Feature window: {low}-{high} MeV"))
        }
        None => output::print_info("Feature window: full energy axis"),
    }
}

/// 单帧模式
fn execute_single_file(args: &DeconvolveArgs, session: &SessionConfig, config: &OutputConfig) -> Result<()> {
    output::print_info(&format!("Single file mode: '{}'", args.input.display()));

    let processed = session.process_path(&args.input, 0)?;
    let stem = file_stem(&args.input);
    let written = write_outputs(&processed, &stem, config)?;

    let mapping = &processed.mapping;
    let (e_min, e_max) = mapping.energy_range();
    output::print_success(&format!(
        "Frame {}x{}: {} valid columns, {} energy bins ({:.2}-{:.2} MeV)",
        mapping.width,
        mapping.height,
        mapping.valid_count(),
        mapping.energy.len(),
        e_min,
        e_max
    ));
    report_quality(&stem, &processed);

    let features = processed.features;
    output::print_features(&stem, features.mean_energy, features.std_energy);
    print_feature_table(&[(stem, features)], args.top_n);

    for path in written {
        output::print_success(&format!("Saved '{}'", path.display()));
    }
    Ok(())
}

/// 批量处理模式
fn execute_batch(args: &DeconvolveArgs, session: &SessionConfig, config: &OutputConfig) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} frames, using {} workers",
        files.len(),
        runner.jobs()
    ));

    let result = runner.run(files, |index, file| process_batch_file(index, file, session, config))?;

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} frames, {} success, {} skipped, {} failed",
        result.total(),
        result.success(),
        result.skipped,
        result.failed()
    ));

    if !result.failures.is_empty() {
        output::print_warning("Failed frames:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    if result.outputs.is_empty() {
        return Ok(());
    }

    print_feature_table(&result.outputs, args.top_n);

    let summary = config.output_dir.join(SUMMARY_FILE);
    export::features_summary_csv(&result.outputs, &summary)?;
    output::print_success(&format!(
        "Feature summary ({} shots) saved to '{}'",
        result.success(),
        summary.display()
    ));
    Ok(())
}

/// 处理批量模式中的单帧
fn process_batch_file(
    index: usize,
    input: &Path,
    session: &SessionConfig,
    config: &OutputConfig,
) -> ProcessResult<(String, FeatureRecord)> {
    let stem = file_stem(input);

    if !config.overwrite && config.all_exist(&stem) {
        return ProcessResult::Skipped(format!("Outputs exist, skipping: {}", input.display()));
    }

    let processed = match session.process_path(input, index as u64) {
        Ok(p) => p,
        Err(e) => return ProcessResult::Failed(input.display().to_string(), e.to_string()),
    };

    match write_outputs(&processed, &stem, config) {
        Ok(_) => ProcessResult::Success((stem, processed.features)),
        Err(e) => ProcessResult::Failed(input.display().to_string(), e.to_string()),
    }
}

/// 写出所选输出，返回写出的文件
fn write_outputs(processed: &ProcessedFrame, stem: &str, config: &OutputConfig) -> Result<Vec<PathBuf>> {
    let mapping = &processed.mapping;
    let title = format!("Shot {} ({})", processed.features.shot_number, stem);
    let mut written = Vec::with_capacity(config.outputs.len());

    for &kind in &config.outputs {
        let path = config.path_for(stem, kind);
        match kind {
            OutputKind::SpectrumCsv => export::spectrum_to_csv(&mapping.energy, &processed.spectrum, &path)?,
            OutputKind::ImageCsv => export::image_to_csv(mapping, &processed.image, &path)?,
            OutputKind::FeaturesJson => export::features_to_json(&processed.features, &path)?,
            OutputKind::SpectrumPlot => {
                let spectrum_plot = SpectrumPlot {
                    energy: &mapping.energy,
                    values: &processed.spectrum.values,
                    features: Some(&processed.features),
                    bounds: config.energy_bounds,
                    title: &title,
                };
                plot::generate_spectrum_plot(&spectrum_plot, &path, config.width, config.height, config.svg)?
            }
            OutputKind::ImagePlot => {
                plot::generate_image_plot(mapping, &processed.image, &path, &title, config.width, config.height)?
            }
        }
        written.push(path);
    }

    Ok(written)
}

/// 提示色散未定义的能量箱
fn report_quality(stem: &str, processed: &ProcessedFrame) {
    if processed.spectrum.has_quality_issue() {
        output::print_warning(&format!(
            "{}: {} energy bins outside the calibrated dispersion were zeroed",
            stem,
            processed.spectrum.undefined_dispersion_bins.len()
        ));
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame")
        .to_string()
}

/// 打印特征表格（按发次排序）
fn print_feature_table(records: &[(String, FeatureRecord)], count: usize) {
    #[derive(Tabled)]
    struct FeatureRow {
        #[tabled(rename = "Shot")]
        shot: u64,
        #[tabled(rename = "Frame")]
        frame: String,
        #[tabled(rename = "Mean energy (MeV)")]
        mean: String,
        #[tabled(rename = "Std energy (MeV)")]
        std: String,
    }

    let mut sorted: Vec<&(String, FeatureRecord)> = records.iter().collect();
    sorted.sort_by_key(|(_, r)| r.shot_number);

    let rows: Vec<FeatureRow> = sorted
        .iter()
        .take(count.max(1))
        .map(|(frame, r)| FeatureRow {
            shot: r.shot_number,
            frame: frame.clone(),
            mean: format!("{:.3}", r.mean_energy),
            std: format!("{:.3}", r.std_energy),
        })
        .collect();

    output::print_header(&format!(
        "Beam Features ({} of {} shots)",
        rows.len(),
        records.len()
    ));
    println!("{}", Table::new(&rows));
}
