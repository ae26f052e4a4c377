//! # 能量轴与角度轴构建
//!
//! 由帧的像素尺寸、标定曲线、参考模式和几何参数导出 [`AxisMapping`]。
//! 结果只依赖这些输入而与帧内容无关，可在尺寸不变的帧之间复用。
//!
//! ## 算法概述
//! 1. 每列像素换算为屏上横向位置 (mm)
//! 2. 位置超出标定范围的列标记为无效
//! 3. 有效列按位置反查原始（非均匀）能量，无法反查的列同样无效
//! 4. 在有效能量极值之间生成均匀能量轴
//! 5. 将色散采样到均匀能量轴上
//! 6. 生成以 0 为中心的角度轴
//!
//! ## 依赖关系
//! - 被 `spectro/cache.rs` 调用
//! - 使用 `models/calibration.rs`, `models/geometry.rs`

use crate::error::{EspecError, Result};
use crate::models::{CalibrationCurve, FrameGeometry, ReferencingMode};
use crate::spectro::interp::linspace;

use log::debug;

/// 均匀能量轴的最大点数
pub const MAX_ENERGY_BINS: usize = 1_000_000;

/// 像素列到能量的映射与输出坐标轴
#[derive(Debug, Clone, PartialEq)]
pub struct AxisMapping {
    /// 帧宽（列数）
    pub width: usize,
    /// 帧高（行数）
    pub height: usize,
    /// 每列的屏上横向位置 (mm)
    pub lateral_mm: Vec<f64>,
    /// 每列的原始能量 (MeV)，无效列为 `None`
    pub raw_energy: Vec<Option<f64>>,
    /// 每列是否有效
    pub valid: Vec<bool>,
    /// 有效列索引，按原始能量升序
    pub sample_order: Vec<usize>,
    /// 均匀能量轴 (MeV)，严格递增
    pub energy: Vec<f64>,
    /// 角度轴 (mrad)，每行一个值
    pub angle: Vec<f64>,
    /// 均匀能量轴上的色散 ds/dE (mm/MeV)
    pub dispersion: Vec<Option<f64>>,
}

impl AxisMapping {
    /// 构建 `width` × `height` 帧的坐标映射
    pub fn build(
        width: usize,
        height: usize,
        calibration: &CalibrationCurve,
        mode: &ReferencingMode,
        geometry: &FrameGeometry,
    ) -> Result<Self> {
        geometry.validate()?;
        if width == 0 || height == 0 {
            return Err(EspecError::UncalibratedFrame {
                reason: format!("empty frame ({height}x{width})"),
            });
        }

        let lateral_mm = lateral_positions(width, calibration, mode, geometry)?;

        // 位置掩膜 + 能量反查
        let (s_min, s_max) = calibration.position_range();
        let raw_energy: Vec<Option<f64>> = lateral_mm
            .iter()
            .map(|&s| {
                if s < s_min || s > s_max {
                    None
                } else {
                    calibration.interpolate_energy_at_position(s)
                }
            })
            .collect();
        let valid: Vec<bool> = raw_energy.iter().map(Option::is_some).collect();

        let mut sample_order: Vec<usize> = (0..width).filter(|&c| valid[c]).collect();
        if sample_order.is_empty() {
            return Err(EspecError::UncalibratedFrame {
                reason: format!(
                    "no pixel column maps inside the calibrated range {s_min}..{s_max} mm"
                ),
            });
        }
        let energy_of = |c: usize| raw_energy[c].unwrap_or(f64::NAN);
        sample_order.sort_by(|&a, &b| energy_of(a).total_cmp(&energy_of(b)));

        let e_min = energy_of(sample_order[0]);
        let e_max = energy_of(sample_order[sample_order.len() - 1]);
        if e_max <= e_min {
            return Err(EspecError::UncalibratedFrame {
                reason: format!("valid columns span a single energy ({e_min} MeV)"),
            });
        }

        let bins = ((e_max - e_min) / geometry.spacing).round();
        if !bins.is_finite() || bins > MAX_ENERGY_BINS as f64 {
            return Err(EspecError::InvalidConfig(format!(
                "energy spacing {} MeV gives {} bins over {e_min:.3}..{e_max:.3} MeV (limit {MAX_ENERGY_BINS})",
                geometry.spacing, bins
            )));
        }
        let n_points = (bins as usize).max(2);
        let energy = linspace(e_min, e_max, n_points);

        let dispersion: Vec<Option<f64>> = energy
            .iter()
            .map(|&e| calibration.interpolate_dispersion_at_energy(e))
            .collect();

        let angle = angle_axis(height, geometry.mrad_per_pix);

        debug!(
            "axis mapping {}x{}: {} of {} columns valid, energy {:.3}..{:.3} MeV in {} bins",
            height,
            width,
            sample_order.len(),
            width,
            e_min,
            e_max,
            n_points
        );

        Ok(Self {
            width,
            height,
            lateral_mm,
            raw_energy,
            valid,
            sample_order,
            energy,
            angle,
            dispersion,
        })
    }

    /// 有效列数
    pub fn valid_count(&self) -> usize {
        self.sample_order.len()
    }

    /// 均匀能量轴范围 (min, max)
    pub fn energy_range(&self) -> (f64, f64) {
        (self.energy[0], self.energy[self.energy.len() - 1])
    }
}

/// 计算每列像素的横向位置 (mm)
fn lateral_positions(
    width: usize,
    calibration: &CalibrationCurve,
    mode: &ReferencingMode,
    geometry: &FrameGeometry,
) -> Result<Vec<f64>> {
    let (x_min, x_max) = match *mode {
        ReferencingMode::Zero { pixel_x, .. } => (pixel_x - width as f64, pixel_x),
        ReferencingMode::RefPoint {
            position_mm,
            energy_mev,
        } => {
            let s_ref = calibration
                .interpolate_position_at_energy(energy_mev)
                .ok_or(EspecError::ReferenceOutOfRange { energy_mev })?;
            let x0 = (s_ref - position_mm) * geometry.pixel_per_mm;
            (x0, x0 + width as f64)
        }
    };

    Ok(linspace(x_min, x_max, width)
        .into_iter()
        .map(|x| x / geometry.pixel_per_mm)
        .collect())
}

/// 以帧竖直中线为 0 的角度轴 (mrad)
fn angle_axis(height: usize, mrad_per_pix: f64) -> Vec<f64> {
    if height == 1 {
        return vec![0.0];
    }
    let half = height as f64 / 2.0;
    linspace(-half, half, height)
        .into_iter()
        .map(|a| a * mrad_per_pix)
        .collect()
}
