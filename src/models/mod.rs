//! # 数据模型模块
//!
//! 定义标定曲线、探测器几何和特征记录。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `spectro/` 和 `commands/` 使用
//! - 子模块: calibration, geometry, features

pub mod calibration;
pub mod features;
pub mod geometry;

pub use calibration::{CalibrationCurve, Orientation};
pub use features::FeatureRecord;
pub use geometry::{FrameGeometry, ReferencingMode, RowRange};
