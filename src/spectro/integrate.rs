//! # 能谱积分
//!
//! 将标定后的二维图像沿角度方向积分为一维电荷能谱 dN/dE (pC/MeV)。
//!
//! ## 算法
//! 1. 背景 = 背景游标区域的平均值（行和列上整体平均，单个标量）
//! 2. 信号 = 数据游标区域 - 背景
//! 3. 沿行求和得到每个能量箱的原始轮廓
//! 4. `dN/dE[i] = pC_per_count * pixel_per_mm * profile[i] * |ds/dE[i]|`
//!
//! 色散未定义的能量箱贡献记为 0，并作为数据质量问题记录在结果中。
//!
//! ## 依赖关系
//! - 被 `spectro/pipeline.rs` 调用
//! - 使用 `models/geometry.rs` 的 FrameGeometry, RowRange

use crate::error::{EspecError, Result};
use crate::models::{FrameGeometry, RowRange};

use log::warn;
use ndarray::{s, ArrayView2, Axis};
use serde::Serialize;

/// 一维积分能谱，与均匀能量轴对齐
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegratedSpectrum {
    /// dN/dE (pC/MeV)
    pub values: Vec<f64>,
    /// 数据游标
    pub data_rows: RowRange,
    /// 背景游标
    pub background_rows: RowRange,
    /// 扣除的背景水平 (counts)
    pub background_level: f64,
    /// 色散未定义而置零的能量箱
    pub undefined_dispersion_bins: Vec<usize>,
}

impl IntegratedSpectrum {
    /// 是否存在数据质量问题
    pub fn has_quality_issue(&self) -> bool {
        !self.undefined_dispersion_bins.is_empty()
    }
}

/// 对标定图像做背景扣除和色散加权积分
pub fn integrate(
    frame: ArrayView2<'_, f64>,
    dispersion: &[Option<f64>],
    geometry: &FrameGeometry,
    data_rows: RowRange,
    background_rows: RowRange,
) -> Result<IntegratedSpectrum> {
    let (rows, cols) = frame.dim();
    data_rows.check(rows, "data")?;
    background_rows.check(rows, "background")?;
    if dispersion.len() != cols {
        return Err(EspecError::FrameShapeMismatch {
            expected_rows: rows,
            expected_cols: dispersion.len(),
            rows,
            cols,
        });
    }

    let background_level = frame
        .slice(s![background_rows.start..background_rows.end, ..])
        .mean()
        .ok_or(EspecError::CursorOutOfRange {
            which: "background",
            start: background_rows.start,
            end: background_rows.end,
            rows,
        })?;

    let signal = &frame.slice(s![data_rows.start..data_rows.end, ..]) - background_level;
    let profile = signal.sum_axis(Axis(0));

    let scale = geometry.pc_per_count * geometry.pixel_per_mm;
    let mut undefined_dispersion_bins = Vec::new();
    let values: Vec<f64> = profile
        .iter()
        .zip(dispersion)
        .enumerate()
        .map(|(i, (&p, d))| match d {
            Some(d) => scale * p * d.abs(),
            None => {
                undefined_dispersion_bins.push(i);
                0.0
            }
        })
        .collect();

    if !undefined_dispersion_bins.is_empty() {
        warn!(
            "{} energy bins have no dispersion value and were zeroed (first at bin {})",
            undefined_dispersion_bins.len(),
            undefined_dispersion_bins[0]
        );
    }

    Ok(IntegratedSpectrum {
        values,
        data_rows,
        background_rows,
        background_level,
        undefined_dispersion_bins,
    })
}
