//! # calib 子命令实现
//!
//! 加载标定表，打印能量范围、方向和数据行；给定帧宽时打印该几何下
//! 的像素列到能量映射。
//!
//! ## 依赖关系
//! - 使用 `cli/calib.rs` 定义的 CalibArgs
//! - 使用 `parsers/calibration.rs`, `spectro/axis.rs`

use crate::cli::calib::CalibArgs;
use crate::commands::session::parse_geometry;
use crate::error::Result;
use crate::models::CalibrationCurve;
use crate::parsers;
use crate::spectro::AxisMapping;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 映射表最多打印的列数
const MAPPING_SAMPLES: usize = 11;

/// 执行标定检查
pub fn execute(args: CalibArgs) -> Result<()> {
    output::print_header("Calibration Table");

    let curve = parsers::parse_calibration_file(&args.path)?;
    let (e_min, e_max) = curve.energy_range();
    let (p_min, p_max) = curve.position_range();

    output::print_success(&format!(
        "Loaded '{}': {} rows",
        args.path.display(),
        curve.len()
    ));
    output::print_info(&format!("Energy range: {:.3} - {:.3} MeV", e_min, e_max));
    output::print_info(&format!("Position range: {:.3} - {:.3} mm", p_min, p_max));
    output::print_info(&format!("Position vs energy: {}", curve.orientation()));

    print_rows(&curve, args.rows);

    if let Some(width) = args.frame_width {
        let (mode, geometry) = parse_geometry(&args.geometry)?;
        let mapping = AxisMapping::build(width, 1, &curve, &mode, &geometry)?;
        print_mapping(&mapping);
    }

    Ok(())
}

/// 打印标定数据行
fn print_rows(curve: &CalibrationCurve, count: usize) {
    #[derive(Tabled)]
    struct CalibRow {
        #[tabled(rename = "Energy (MeV)")]
        energy: String,
        #[tabled(rename = "ds/dE (mm/MeV)")]
        dispersion: String,
        #[tabled(rename = "Position (mm)")]
        position: String,
    }

    let count = if count == 0 { curve.len() } else { count.min(curve.len()) };
    let rows: Vec<CalibRow> = curve
        .energy()
        .iter()
        .zip(curve.dispersion())
        .zip(curve.position())
        .take(count)
        .map(|((e, d), p)| CalibRow {
            energy: format!("{:.3}", e),
            dispersion: format!("{:.5}", d),
            position: format!("{:.3}", p),
        })
        .collect();

    output::print_header(&format!("First {} of {} rows", rows.len(), curve.len()));
    println!("{}", Table::new(&rows));
}

/// 打印像素列到能量的映射
fn print_mapping(mapping: &AxisMapping) {
    #[derive(Tabled)]
    struct MappingRow {
        #[tabled(rename = "Column")]
        column: usize,
        #[tabled(rename = "Lateral (mm)")]
        lateral: String,
        #[tabled(rename = "Energy (MeV)")]
        energy: String,
    }

    let step = (mapping.width / (MAPPING_SAMPLES - 1)).max(1);
    let mut columns: Vec<usize> = (0..mapping.width).step_by(step).collect();
    if let Some(last) = mapping.width.checked_sub(1) {
        if columns.last() != Some(&last) {
            columns.push(last);
        }
    }

    let rows: Vec<MappingRow> = columns
        .into_iter()
        .map(|c| MappingRow {
            column: c,
            lateral: format!("{:.3}", mapping.lateral_mm[c]),
            energy: match mapping.raw_energy[c] {
                Some(e) => format!("{:.3}", e),
                None => "-".to_string(),
            },
        })
        .collect();

    output::print_header(&format!("Column Mapping ({} columns)", mapping.width));
    println!("{}", Table::new(&rows));

    let (e_min, e_max) = mapping.energy_range();
    output::print_info(&format!(
        "{} of {} columns calibrated; {} energy bins from {:.3} to {:.3} MeV",
        mapping.valid_count(),
        mapping.width,
        mapping.energy.len(),
        e_min,
        e_max
    ));
}
