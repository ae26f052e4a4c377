//! # 解析器模块
//!
//! 提供标定表、探测器图像和文件名元数据的解析。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: calibration, frame, shot

pub mod calibration;
pub mod frame;
pub mod shot;

pub use calibration::parse_calibration_file;
pub use frame::{load_frame, FrameOrientation};
pub use shot::shot_number_from_path;
