//! # 单帧处理流水线
//!
//! 新帧到达时由调用方推入：重采样 → 积分 → 特征提取。
//! 不包含任何事件循环，所有步骤同步执行。
//!
//! ## 依赖关系
//! - 被 `commands/deconvolve.rs`, `commands/serve.rs` 调用
//! - 使用 `spectro/cache.rs`, `spectro/resample.rs`,
//!   `spectro/integrate.rs`, `spectro/features.rs`

use crate::error::Result;
use crate::models::{FeatureRecord, RowRange};
use crate::spectro::axis::AxisMapping;
use crate::spectro::cache::AxisCache;
use crate::spectro::features::{extract_features, EnergyBounds};
use crate::spectro::integrate::{integrate, IntegratedSpectrum};
use crate::spectro::resample::{resample, CalibratedFrame};

use ndarray::ArrayView2;
use std::sync::Arc;

/// 单帧分析参数
#[derive(Debug, Clone, Copy)]
pub struct AnalysisWindow {
    pub data_rows: RowRange,
    pub background_rows: RowRange,
    pub energy_bounds: Option<EnergyBounds>,
}

/// 单帧处理结果
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    pub mapping: Arc<AxisMapping>,
    pub image: CalibratedFrame,
    pub spectrum: IntegratedSpectrum,
    pub features: FeatureRecord,
}

/// 处理一帧原始图像
pub fn process_frame(
    cache: &AxisCache,
    frame: ArrayView2<'_, f64>,
    window: &AnalysisWindow,
    shot_number: u64,
) -> Result<ProcessedFrame> {
    let (rows, cols) = frame.dim();
    let mapping = cache.get_or_build(cols, rows)?;

    let image = resample(frame, &mapping)?;
    let spectrum = integrate(
        image.view(),
        &mapping.dispersion,
        cache.geometry(),
        window.data_rows,
        window.background_rows,
    )?;
    let features = extract_features(
        &mapping.energy,
        &spectrum.values,
        shot_number,
        window.energy_bounds,
    )?;

    Ok(ProcessedFrame {
        mapping,
        image,
        spectrum,
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EspecError;
    use crate::models::{CalibrationCurve, FrameGeometry, ReferencingMode};
    use ndarray::Array2;

    fn cache() -> AxisCache {
        let curve = CalibrationCurve::load(
            vec![1.0, 10.0, 20.0],
            vec![5.0, 5.0, 5.0],
            vec![100.0, 50.0, 0.0],
        )
        .unwrap();
        AxisCache::new(
            Arc::new(curve),
            ReferencingMode::Zero {
                pixel_x: 100.0,
                pixel_y: 10.0,
            },
            FrameGeometry {
                pixel_per_mm: 1.0,
                mrad_per_pix: 0.1,
                spacing: 0.5,
                pc_per_count: 1.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_bright_band_gives_localized_features() {
        // 第 45-55 列（s ≈ 45-56 mm）在信号行上有一条亮带
        let frame = Array2::from_shape_fn((20, 100), |(r, c)| {
            if r < 10 && (45..=55).contains(&c) {
                100.0
            } else {
                1.0
            }
        });
        let window = AnalysisWindow {
            data_rows: RowRange::new(0, 10),
            background_rows: RowRange::new(10, 20),
            energy_bounds: None,
        };

        let processed = process_frame(&cache(), frame.view(), &window, 42).unwrap();
        assert_eq!(processed.image.dim(), (20, processed.mapping.energy.len()));
        assert_eq!(processed.features.shot_number, 42);

        let peak_energy = processed.mapping.raw_energy[50].unwrap();
        assert!((processed.features.mean_energy - peak_energy).abs() < 0.5);
        assert!(processed.features.std_energy > 0.0);
        assert!(processed.features.std_energy < 1.5);
    }

    #[test]
    fn test_flat_frame_is_degenerate() {
        let frame = Array2::from_elem((20, 100), 3.0);
        let window = AnalysisWindow {
            data_rows: RowRange::new(0, 20),
            background_rows: RowRange::new(0, 20),
            energy_bounds: Some((5.0, 15.0)),
        };
        assert!(matches!(
            process_frame(&cache(), frame.view(), &window, 0),
            Err(EspecError::DegenerateWeighting)
        ));
    }
}
