//! # 谱仪标定与去卷积模块
//!
//! 从探测器原始图像得到物理标定的能量 - 角度谱和束流特征。
//!
//! ## 子模块
//! - `interp`: 一维线性插值原语
//! - `axis`: 像素列到能量的映射，能量轴与角度轴
//! - `cache`: 按帧尺寸缓存坐标映射
//! - `resample`: 图像重采样到均匀能量轴
//! - `integrate`: 背景扣除与色散加权积分
//! - `features`: 加权平均能量与标准差
//! - `pipeline`: 单帧处理流水线
//! - `plot`: 图表生成
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/` 的标定曲线与几何参数

pub mod axis;
pub mod cache;
pub mod export;
pub mod features;
pub mod integrate;
pub mod interp;
pub mod pipeline;
pub mod plot;
pub mod resample;

pub use axis::AxisMapping;
pub use cache::AxisCache;
pub use features::EnergyBounds;
pub use pipeline::{process_frame, AnalysisWindow, ProcessedFrame};
