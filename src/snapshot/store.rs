//! # 特征快照存储
//!
//! 保存最近一发的 FeatureRecord。更新时整体替换 `Arc`，读者总是看到
//! 完整的记录。
//!
//! ## 依赖关系
//! - 被 `snapshot/server.rs` 和 `commands/serve.rs` 使用
//! - 使用 `serde_json` 序列化

use crate::error::Result;
use crate::models::FeatureRecord;

use std::sync::{Arc, RwLock};

/// 最近特征记录的共享存储
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    latest: Arc<RwLock<Option<Arc<FeatureRecord>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发布新记录，替换旧记录
    pub fn publish(&self, record: FeatureRecord) {
        let record = Arc::new(record);
        match self.latest.write() {
            Ok(mut slot) => *slot = Some(record),
            Err(poisoned) => *poisoned.into_inner() = Some(record),
        }
    }

    /// 最近一条记录
    pub fn latest(&self) -> Option<FeatureRecord> {
        let slot = match self.latest.read() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.as_deref().copied()
    }

    /// 序列化为 JSON 对象，尚无记录时为 `{}`
    pub fn to_json(&self) -> Result<String> {
        match self.latest() {
            Some(record) => Ok(serde_json::to_string(&record)?),
            None => Ok("{}".to_string()),
        }
    }
}
