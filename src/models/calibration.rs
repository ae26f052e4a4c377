//! # 谱仪标定曲线
//!
//! 磁谱仪实测的能量 - 色散 - 屏上位置对应关系。加载一次后不可变，
//! 所有帧共享同一份引用。
//!
//! ## 数据列
//! - `energy`: 能量 (MeV)
//! - `dispersion`: 色散 ds/dE (mm/MeV)
//! - `position`: 屏上纵向坐标 s (mm)，相对于无偏转束流位置
//!
//! ## 方向处理
//! 加载时按能量升序整理各行，并检测 `position` 相对能量是升序还是降序。
//! 按位置反查能量时，两列都以位置升序提供给插值原语。
//!
//! ## 依赖关系
//! - 被 `parsers/calibration.rs` 构造
//! - 被 `spectro/axis.rs` 使用
//! - 使用 `spectro/interp.rs` 的插值原语

use crate::error::{EspecError, Result};
use crate::spectro::interp::interp;

use serde::Serialize;
use std::fmt;

/// `position` 相对 `energy` 的单调方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    /// 能量升高，位置增大
    Ascending,
    /// 能量升高，位置减小
    Descending,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Ascending => write!(f, "ascending"),
            Orientation::Descending => write!(f, "descending"),
        }
    }
}

/// 标定曲线（按能量升序存储）
#[derive(Debug, Clone)]
pub struct CalibrationCurve {
    energy: Vec<f64>,
    dispersion: Vec<f64>,
    position: Vec<f64>,
    orientation: Orientation,
    /// 位置升序排列的 (position, energy)，供反查使用
    position_ascending: Vec<f64>,
    energy_by_position: Vec<f64>,
}

impl CalibrationCurve {
    /// 从三列数据加载标定曲线
    ///
    /// 三列长度必须一致且至少两个点；行的顺序任意。
    pub fn load(energy: Vec<f64>, dispersion: Vec<f64>, position: Vec<f64>) -> Result<Self> {
        if energy.len() != dispersion.len() || energy.len() != position.len() {
            return Err(malformed(format!(
                "column lengths differ (energy {}, dispersion {}, position {})",
                energy.len(),
                dispersion.len(),
                position.len()
            )));
        }
        if energy.len() < 2 {
            return Err(malformed(format!(
                "at least 2 calibration points required, got {}",
                energy.len()
            )));
        }
        if let Some(row) = (0..energy.len())
            .find(|&i| !(energy[i].is_finite() && dispersion[i].is_finite() && position[i].is_finite()))
        {
            return Err(malformed(format!("non-finite value in row {}", row + 1)));
        }

        // 按能量升序整理
        let mut order: Vec<usize> = (0..energy.len()).collect();
        order.sort_by(|&a, &b| energy[a].total_cmp(&energy[b]));
        let energy: Vec<f64> = order.iter().map(|&i| energy[i]).collect();
        let dispersion: Vec<f64> = order.iter().map(|&i| dispersion[i]).collect();
        let position: Vec<f64> = order.iter().map(|&i| position[i]).collect();

        if let Some(w) = energy.windows(2).find(|w| w[1] <= w[0]) {
            return Err(malformed(format!("duplicate energy {} MeV", w[0])));
        }

        let orientation = if position.windows(2).all(|w| w[1] > w[0]) {
            Orientation::Ascending
        } else if position.windows(2).all(|w| w[1] < w[0]) {
            Orientation::Descending
        } else {
            return Err(malformed(
                "position is not strictly monotonic in energy".to_string(),
            ));
        };

        let (position_ascending, energy_by_position) = match orientation {
            Orientation::Ascending => (position.clone(), energy.clone()),
            Orientation::Descending => (
                position.iter().rev().copied().collect(),
                energy.iter().rev().copied().collect(),
            ),
        };

        Ok(Self {
            energy,
            dispersion,
            position,
            orientation,
            position_ascending,
            energy_by_position,
        })
    }

    /// 给定能量处的屏上位置 s (mm)，超出标定范围返回 `None`
    pub fn interpolate_position_at_energy(&self, energy_mev: f64) -> Option<f64> {
        interp(&self.energy, &self.position, energy_mev)
    }

    /// 给定屏上位置处的能量 (MeV)，超出标定范围返回 `None`
    pub fn interpolate_energy_at_position(&self, position_mm: f64) -> Option<f64> {
        interp(&self.position_ascending, &self.energy_by_position, position_mm)
    }

    /// 给定能量处的色散 ds/dE (mm/MeV)，超出标定范围返回 `None`
    pub fn interpolate_dispersion_at_energy(&self, energy_mev: f64) -> Option<f64> {
        interp(&self.energy, &self.dispersion, energy_mev)
    }

    /// 标定点数
    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    pub fn dispersion(&self) -> &[f64] {
        &self.dispersion
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// 能量范围 (min, max)
    pub fn energy_range(&self) -> (f64, f64) {
        (self.energy[0], self.energy[self.energy.len() - 1])
    }

    /// 位置范围 (min, max)
    pub fn position_range(&self) -> (f64, f64) {
        (
            self.position_ascending[0],
            self.position_ascending[self.position_ascending.len() - 1],
        )
    }
}

fn malformed(reason: String) -> EspecError {
    EspecError::MalformedCalibration { reason }
}
