//! # 束流特征记录
//!
//! 每帧能谱提炼出的标量描述量，字段固定（不使用无序键值集合）。
//!
//! ## 依赖关系
//! - 被 `spectro/features.rs` 构造
//! - 被 `snapshot/` 序列化后对外提供

use serde::{Deserialize, Serialize};

/// 单发特征
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// 加权平均能量 (MeV)
    #[serde(rename = "Mean energy")]
    pub mean_energy: f64,
    /// 加权能量标准差 (MeV)
    #[serde(rename = "Std energy")]
    pub std_energy: f64,
    /// 发次编号（由调用方提供，仅用于关联）
    #[serde(rename = "Shot number")]
    pub shot_number: u64,
}
