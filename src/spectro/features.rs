//! # 能谱特征提取
//!
//! 在可选的能量窗口内计算以 dN/dE 为权重的平均能量和能量标准差。
//! 负权重截断为 0。
//!
//! ## 依赖关系
//! - 被 `spectro/pipeline.rs` 调用
//! - 使用 `spectro/interp.rs` 的最近值查找
//! - 产出 `models/features.rs` 的 FeatureRecord

use crate::error::{EspecError, Result};
use crate::models::FeatureRecord;
use crate::spectro::interp::nearest_index;

/// 能量窗口 (low, high)，单位 MeV
pub type EnergyBounds = (f64, f64);

/// 由能量窗口求闭区间索引 `[low_index, high_index]`
///
/// 无窗口时返回全范围。
pub fn window_indices(energy: &[f64], bounds: Option<EnergyBounds>) -> Option<(usize, usize)> {
    if energy.is_empty() {
        return None;
    }
    match bounds {
        None => Some((0, energy.len() - 1)),
        Some((low, high)) => {
            let a = nearest_index(energy, low)?;
            let b = nearest_index(energy, high)?;
            Some((a.min(b), a.max(b)))
        }
    }
}

/// 加权平均值与标准差
pub fn weighted_mean_std(values: &[f64], weights: &[f64]) -> Result<(f64, f64)> {
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(EspecError::DegenerateWeighting);
    }
    let clamped: Vec<f64> = weights.iter().map(|&w| w.max(0.0)).collect();
    let total: f64 = clamped.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(EspecError::DegenerateWeighting);
    }

    let mean = values.iter().zip(&clamped).map(|(v, w)| v * w).sum::<f64>() / total;
    let variance = values
        .iter()
        .zip(&clamped)
        .map(|(v, w)| w * (v - mean).powi(2))
        .sum::<f64>()
        / total;

    Ok((mean, variance.sqrt()))
}

/// 从能谱提取特征记录
pub fn extract_features(
    energy: &[f64],
    spectrum: &[f64],
    shot_number: u64,
    bounds: Option<EnergyBounds>,
) -> Result<FeatureRecord> {
    if energy.len() != spectrum.len() {
        return Err(EspecError::Other(format!(
            "energy axis ({}) and spectrum ({}) lengths differ",
            energy.len(),
            spectrum.len()
        )));
    }
    let (lo, hi) = window_indices(energy, bounds).ok_or(EspecError::DegenerateWeighting)?;

    let (mean_energy, std_energy) = weighted_mean_std(&energy[lo..=hi], &spectrum[lo..=hi])?;

    Ok(FeatureRecord {
        mean_energy,
        std_energy,
        shot_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bin_spectrum() {
        let energy = [1.0, 2.0, 3.0, 4.0];
        let spectrum = [0.0, 0.0, 1.0, 0.0];
        let record = extract_features(&energy, &spectrum, 7, None).unwrap();
        assert_eq!(record.mean_energy, 3.0);
        assert_eq!(record.std_energy, 0.0);
        assert_eq!(record.shot_number, 7);
    }

    #[test]
    fn test_energy_bounds_window() {
        let energy = [0.0, 5.0, 10.0, 15.0, 20.0];
        let spectrum = [0.0, 1.0, 2.0, 1.0, 0.0];

        assert_eq!(window_indices(&energy, Some((5.0, 15.0))), Some((1, 3)));

        let record = extract_features(&energy, &spectrum, 1, Some((5.0, 15.0))).unwrap();
        assert!((record.mean_energy - 10.0).abs() < 1e-12);
        // (25 + 0 + 25) / 4
        assert!((record.std_energy - 12.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_window_index_ordering() {
        let energy = [0.0, 5.0, 10.0, 15.0, 20.0];
        // 反向窗口与全范围
        assert_eq!(window_indices(&energy, Some((100.0, 4.0))), Some((1, 4)));
        assert_eq!(window_indices(&energy, None), Some((0, 4)));
        assert_eq!(window_indices(&[], None), None);
    }

    #[test]
    fn test_negative_weights_are_clamped() {
        let energy = [1.0, 2.0, 3.0];
        let spectrum = [-5.0, 2.0, 2.0];
        let record = extract_features(&energy, &spectrum, 0, None).unwrap();
        assert!((record.mean_energy - 2.5).abs() < 1e-12);
        assert!((record.std_energy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_weight_is_rejected() {
        let energy = [1.0, 2.0, 3.0];
        assert!(matches!(
            extract_features(&energy, &[f64::NAN, 1.0, 0.0], 0, None),
            Err(EspecError::DegenerateWeighting)
        ));
        assert!(matches!(
            extract_features(&energy, &[1.0, f64::INFINITY, 0.0], 0, None),
            Err(EspecError::DegenerateWeighting)
        ));
        // 窗口外的非有限值不影响结果
        let record = extract_features(&energy, &[f64::NAN, 1.0, 1.0], 0, Some((2.0, 3.0))).unwrap();
        assert!((record.mean_energy - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_weighting() {
        let energy = [1.0, 2.0, 3.0];
        let spectrum = [-1.0, 0.0, -3.0];
        assert!(matches!(
            extract_features(&energy, &spectrum, 0, None),
            Err(EspecError::DegenerateWeighting)
        ));
    }
}
