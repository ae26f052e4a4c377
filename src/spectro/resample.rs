//! # 图像重采样
//!
//! 将原始计数从非均匀的逐列能量重采样到均匀能量轴上。
//!
//! ## 算法
//! - 只保留有效列，按原始能量升序排列
//! - 每行独立做线性插值
//! - 超出该行采样范围的能量点取端点值（所有行相同的边界行为，不外推）
//!
//! 结果只依赖 (frame, mapping)，相同输入总是得到逐位相同的输出。
//!
//! ## 依赖关系
//! - 被 `spectro/pipeline.rs` 调用
//! - 使用 `spectro/axis.rs` 的 AxisMapping
//! - 使用 `spectro/interp.rs`

use crate::error::{EspecError, Result};
use crate::spectro::axis::AxisMapping;
use crate::spectro::interp::interp_clamped;

use ndarray::{Array2, ArrayView2, Axis};

/// 标定后的图像：行 = 角度索引，列 = 均匀能量索引
pub type CalibratedFrame = Array2<f64>;

/// 将 `[H, W]` 原始帧重采样为 `[H, len(energy)]`
pub fn resample(frame: ArrayView2<'_, f64>, mapping: &AxisMapping) -> Result<CalibratedFrame> {
    let (rows, cols) = frame.dim();
    if rows != mapping.height || cols != mapping.width {
        return Err(EspecError::FrameShapeMismatch {
            expected_rows: mapping.height,
            expected_cols: mapping.width,
            rows,
            cols,
        });
    }

    let sample_energy: Vec<f64> = mapping
        .sample_order
        .iter()
        .map(|&c| mapping.raw_energy[c])
        .collect::<Option<Vec<f64>>>()
        .filter(|energies| !energies.is_empty())
        .ok_or_else(|| EspecError::UncalibratedFrame {
            reason: "axis mapping has no valid sample columns".to_string(),
        })?;

    let mut output = Array2::<f64>::zeros((rows, mapping.energy.len()));
    let mut counts = vec![0.0; sample_energy.len()];

    for (row, mut out_row) in frame.axis_iter(Axis(0)).zip(output.axis_iter_mut(Axis(0))) {
        for (slot, &c) in counts.iter_mut().zip(&mapping.sample_order) {
            *slot = row[c];
        }
        for (value, &e) in out_row.iter_mut().zip(&mapping.energy) {
            if let Some(v) = interp_clamped(&sample_energy, &counts, e) {
                *value = v;
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalibrationCurve, FrameGeometry, ReferencingMode};

    fn mapping(width: usize, height: usize) -> AxisMapping {
        let curve = CalibrationCurve::load(
            vec![1.0, 10.0, 20.0],
            vec![5.0, 5.0, 5.0],
            vec![100.0, 50.0, 0.0],
        )
        .unwrap();
        AxisMapping::build(
            width,
            height,
            &curve,
            &ReferencingMode::Zero {
                pixel_x: 100.0,
                pixel_y: 0.0,
            },
            &FrameGeometry {
                pixel_per_mm: 1.0,
                mrad_per_pix: 0.1,
                spacing: 0.5,
                pc_per_count: 1.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_output_shape_and_constant_rows() {
        let mapping = mapping(100, 4);
        let frame = Array2::from_shape_fn((4, 100), |(r, _)| r as f64 * 10.0);
        let out = resample(frame.view(), &mapping).unwrap();

        assert_eq!(out.dim(), (4, mapping.energy.len()));
        for (r, row) in out.axis_iter(Axis(0)).enumerate() {
            assert!(row.iter().all(|&v| (v - r as f64 * 10.0).abs() < 1e-12));
        }
    }

    #[test]
    fn test_linear_in_energy_is_preserved() {
        let mapping = mapping(100, 2);
        // 计数等于该列能量，重采样后应等于均匀轴能量
        let frame = Array2::from_shape_fn((2, 100), |(_, c)| {
            mapping.raw_energy[c].unwrap()
        });
        let out = resample(frame.view(), &mapping).unwrap();
        for (j, &e) in mapping.energy.iter().enumerate() {
            assert!((out[[0, j]] - e).abs() < 1e-9);
            assert!((out[[1, j]] - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_resample_is_deterministic() {
        let mapping = mapping(100, 6);
        let frame = Array2::from_shape_fn((6, 100), |(r, c)| ((r * 31 + c * 17) % 23) as f64);
        let a = resample(frame.view(), &mapping).unwrap();
        let b = resample(frame.view(), &mapping).unwrap();
        assert!(a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_shape_mismatch() {
        let mapping = mapping(100, 4);
        let frame = Array2::<f64>::zeros((4, 90));
        assert!(matches!(
            resample(frame.view(), &mapping),
            Err(EspecError::FrameShapeMismatch { .. })
        ));
    }
}
