//! # 能谱数据导出
//!
//! 导出能谱、标定图像和特征到 CSV / JSON。
//!
//! ## 支持格式
//! - 能谱 CSV: `energy_mev, dn_de_pc_per_mev`
//! - 图像 CSV: 首行为能量轴，首列为角度轴
//! - 特征 JSON: 单发 FeatureRecord
//! - 特征汇总 CSV: 批处理每发一行
//!
//! ## 依赖关系
//! - 被 `commands/deconvolve.rs` 调用
//! - 使用 `csv`, `serde_json`

use crate::error::{EspecError, Result};
use crate::models::FeatureRecord;
use crate::spectro::axis::AxisMapping;
use crate::spectro::integrate::IntegratedSpectrum;
use crate::spectro::resample::CalibratedFrame;

use ndarray::Axis;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 导出一维能谱为 CSV 格式
pub fn spectrum_to_csv(energy: &[f64], spectrum: &IntegratedSpectrum, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["energy_mev", "dn_de_pc_per_mev"])?;
    for (e, v) in energy.iter().zip(&spectrum.values) {
        wtr.write_record(&[format!("{:.6}", e), format!("{:.6e}", v)])?;
    }

    wtr.flush().map_err(|e| write_error(output_path, e))?;
    Ok(())
}

/// 导出标定图像为 CSV 格式
pub fn image_to_csv(mapping: &AxisMapping, image: &CalibratedFrame, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    let mut header = vec!["angle_mrad\\energy_mev".to_string()];
    header.extend(mapping.energy.iter().map(|e| format!("{:.6}", e)));
    wtr.write_record(&header)?;

    for (angle, row) in mapping.angle.iter().zip(image.axis_iter(Axis(0))) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(format!("{:.4}", angle));
        record.extend(row.iter().map(|v| format!("{:.4}", v)));
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|e| write_error(output_path, e))?;
    Ok(())
}

/// 导出单发特征为 JSON
pub fn features_to_json(record: &FeatureRecord, output_path: &Path) -> Result<()> {
    let file = File::create(output_path).map_err(|e| write_error(output_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)?;
    writeln!(writer).map_err(|e| write_error(output_path, e))?;
    writer.flush().map_err(|e| write_error(output_path, e))?;
    Ok(())
}

/// 特征汇总行
#[derive(Debug, Serialize)]
struct FeatureRow<'a> {
    frame: &'a str,
    shot_number: u64,
    mean_energy_mev: f64,
    std_energy_mev: f64,
}

/// 导出批处理特征汇总为 CSV
pub fn features_summary_csv(records: &[(String, FeatureRecord)], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    let mut sorted: Vec<&(String, FeatureRecord)> = records.iter().collect();
    sorted.sort_by_key(|(_, r)| r.shot_number);

    for (frame, record) in sorted {
        wtr.serialize(FeatureRow {
            frame,
            shot_number: record.shot_number,
            mean_energy_mev: record.mean_energy,
            std_energy_mev: record.std_energy,
        })?;
    }

    wtr.flush().map_err(|e| write_error(output_path, e))?;
    Ok(())
}

fn write_error(path: &Path, source: std::io::Error) -> EspecError {
    EspecError::FileWriteError {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowRange;
    use std::fs;

    fn spectrum(values: Vec<f64>) -> IntegratedSpectrum {
        IntegratedSpectrum {
            values,
            data_rows: RowRange::new(0, 1),
            background_rows: RowRange::new(1, 2),
            background_level: 0.0,
            undefined_dispersion_bins: Vec::new(),
        }
    }

    #[test]
    fn test_spectrum_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.csv");
        spectrum_to_csv(&[1.0, 1.5], &spectrum(vec![2.0, 0.25]), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "energy_mev,dn_de_pc_per_mev");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1.000000,2.0"));
    }

    #[test]
    fn test_features_json_uses_snapshot_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.json");
        let record = FeatureRecord {
            mean_energy: 42.5,
            std_energy: 3.0,
            shot_number: 12,
        };
        features_to_json(&record, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["Mean energy"], 42.5);
        assert_eq!(value["Shot number"], 12);
    }

    #[test]
    fn test_summary_sorted_by_shot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let make = |shot| FeatureRecord {
            mean_energy: 10.0,
            std_energy: 1.0,
            shot_number: shot,
        };
        features_summary_csv(
            &[("b.tiff".to_string(), make(2)), ("a.tiff".to_string(), make(1))],
            &path,
        )
        .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "frame,shot_number,mean_energy_mev,std_energy_mev");
        assert!(lines[1].starts_with("a.tiff,1,"));
        assert!(lines[2].starts_with("b.tiff,2,"));
    }
}
