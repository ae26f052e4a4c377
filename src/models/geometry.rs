//! # 探测器几何与参考模式
//!
//! 每个会话内不变的像素 - 物理量换算参数。
//!
//! ## 依赖关系
//! - 被 `spectro/axis.rs`, `spectro/integrate.rs` 使用
//! - 被 `commands/` 从命令行参数构造

use crate::error::{EspecError, Result};

use serde::Serialize;
use std::fmt;

/// 像素坐标到屏上位置的锚定方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ReferencingMode {
    /// 第 `pixel_x` 列为无偏转（零偏转）束流位置
    Zero { pixel_x: f64, pixel_y: f64 },
    /// 已知能量 `energy_mev` 落在屏上 `position_mm` 处
    RefPoint { position_mm: f64, energy_mev: f64 },
}

impl ReferencingMode {
    /// 由模式名和参考点构造（`zero` 或 `refpoint`，不区分大小写）
    pub fn from_name(name: &str, point: (f64, f64)) -> Result<Self> {
        let mode = match name.trim().to_lowercase().as_str() {
            "zero" => ReferencingMode::Zero {
                pixel_x: point.0,
                pixel_y: point.1,
            },
            "refpoint" | "ref-point" => ReferencingMode::RefPoint {
                position_mm: point.0,
                energy_mev: point.1,
            },
            _ => return Err(EspecError::UnknownReferencingMode(name.to_string())),
        };
        if !(point.0.is_finite() && point.1.is_finite()) {
            return Err(EspecError::InvalidConfig(format!(
                "reference point must be finite, got ({}, {})",
                point.0, point.1
            )));
        }
        Ok(mode)
    }
}

impl fmt::Display for ReferencingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferencingMode::Zero { pixel_x, pixel_y } => {
                write!(f, "zero at pixel ({pixel_x}, {pixel_y})")
            }
            ReferencingMode::RefPoint {
                position_mm,
                energy_mev,
            } => write!(f, "{energy_mev} MeV at {position_mm} mm"),
        }
    }
}

/// 帧几何与标定因子
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameGeometry {
    /// 空间标定 (pixel/mm)
    pub pixel_per_mm: f64,
    /// 角度标定 (mrad/pixel)
    pub mrad_per_pix: f64,
    /// 输出能量轴间隔 (MeV)
    pub spacing: f64,
    /// 电荷标定 (pC/count)
    pub pc_per_count: f64,
}

impl FrameGeometry {
    /// 检查各标定因子，必须在处理任何帧之前调用
    pub fn validate(&self) -> Result<()> {
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(EspecError::InvalidConfig(format!(
                "energy spacing must be positive, got {}",
                self.spacing
            )));
        }
        if !(self.pixel_per_mm.is_finite() && self.pixel_per_mm > 0.0) {
            return Err(EspecError::InvalidConfig(format!(
                "pixel_per_mm must be positive, got {}",
                self.pixel_per_mm
            )));
        }
        if !self.mrad_per_pix.is_finite() {
            return Err(EspecError::InvalidConfig(format!(
                "mrad_per_pix must be finite, got {}",
                self.mrad_per_pix
            )));
        }
        if !self.pc_per_count.is_finite() {
            return Err(EspecError::InvalidConfig(format!(
                "pc_per_count must be finite, got {}",
                self.pc_per_count
            )));
        }
        Ok(())
    }
}

/// 行索引区间 `[start, end)`（数据/背景游标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 解析 "600-670" 形式的区间
    pub fn parse(text: &str) -> Result<Self> {
        let (a, b) = text
            .split_once('-')
            .ok_or_else(|| EspecError::InvalidRange(text.to_string()))?;
        let start = a
            .trim()
            .parse()
            .map_err(|_| EspecError::InvalidRange(text.to_string()))?;
        let end = b
            .trim()
            .parse()
            .map_err(|_| EspecError::InvalidRange(text.to_string()))?;
        Ok(Self::new(start, end))
    }

    /// 检查区间是否落在 `rows` 行的帧内且非空
    pub fn check(&self, rows: usize, which: &'static str) -> Result<()> {
        if self.is_empty() || self.end > rows {
            return Err(EspecError::CursorOutOfRange {
                which,
                start: self.start,
                end: self.end,
                rows,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_name() {
        let zero = ReferencingMode::from_name("Zero", (1953.0, 635.0)).unwrap();
        assert_eq!(
            zero,
            ReferencingMode::Zero {
                pixel_x: 1953.0,
                pixel_y: 635.0
            }
        );

        let refpoint = ReferencingMode::from_name("refpoint", (47.855, 10.0)).unwrap();
        assert!(matches!(refpoint, ReferencingMode::RefPoint { .. }));

        let unknown = ReferencingMode::from_name("center", (0.0, 0.0));
        assert!(matches!(
            unknown,
            Err(EspecError::UnknownReferencingMode(_))
        ));
    }

    #[test]
    fn test_geometry_validation() {
        let mut geometry = FrameGeometry {
            pixel_per_mm: 20.408,
            mrad_per_pix: 0.1,
            spacing: 0.5,
            pc_per_count: 4.33e-6,
        };
        assert!(geometry.validate().is_ok());

        geometry.spacing = 0.0;
        assert!(matches!(
            geometry.validate(),
            Err(EspecError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_row_range_parse_and_check() {
        let range = RowRange::parse("600-670").unwrap();
        assert_eq!(range, RowRange::new(600, 670));
        assert_eq!(range.len(), 70);
        assert!(range.check(1000, "data").is_ok());
        assert!(range.check(650, "data").is_err());

        // 整帧区间合法
        assert!(RowRange::new(0, 10).check(10, "background").is_ok());
        assert!(RowRange::new(5, 5).check(10, "background").is_err());
        assert!(RowRange::parse("abc").is_err());
    }
}
