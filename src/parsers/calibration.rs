//! # 标定表解析器
//!
//! 解析空白分隔的三列标定表。
//!
//! ## 格式说明
//! ```text
//! # energy(MeV)  ds/dE(mm/MeV)  s(mm)
//! 10.0           4.12           47.86
//! 12.5           3.20           56.90
//! ...
//! ```
//! - 空行和 `#` 开头的注释行被忽略
//! - 每行至少三个数值，多余的列被忽略
//! - 行的顺序任意
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 构造 `models/calibration.rs` 的 CalibrationCurve

use crate::error::{EspecError, Result};
use crate::models::CalibrationCurve;
use std::fs;
use std::path::Path;

/// 解析标定文件
pub fn parse_calibration_file(path: &Path) -> Result<CalibrationCurve> {
    if !path.is_file() {
        return Err(EspecError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| EspecError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_calibration_content(&content, &path.display().to_string())
}

/// 从字符串内容解析标定表
pub fn parse_calibration_content(content: &str, source_name: &str) -> Result<CalibrationCurve> {
    let mut energy = Vec::new();
    let mut dispersion = Vec::new();
    let mut position = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let values: Vec<f64> = line
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|s| !s.is_empty())
            .take(3)
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| EspecError::ParseError {
                path: source_name.to_string(),
                line: index + 1,
                reason: e.to_string(),
            })?;

        if values.len() < 3 {
            return Err(EspecError::ParseError {
                path: source_name.to_string(),
                line: index + 1,
                reason: format!("expected 3 columns, found {}", values.len()),
            });
        }

        energy.push(values[0]);
        dispersion.push(values[1]);
        position.push(values[2]);
    }

    CalibrationCurve::load(energy, dispersion, position)
}
