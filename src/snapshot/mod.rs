//! # 特征快照服务模块
//!
//! 在线处理时保存最近一发的特征，并通过请求/应答协议对外提供。
//!
//! ## 依赖关系
//! - 被 `commands/serve.rs` 使用
//! - 子模块: store, server

pub mod server;
pub mod store;

pub use server::{SnapshotServer, STOP_TOKEN};
pub use store::SnapshotStore;
