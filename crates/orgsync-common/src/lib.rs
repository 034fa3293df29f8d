//! OrgSync Common - 跨模块共享数据模型与错误处理
//!
//! 该模块提供 OrgSync 项目中所有组件共享的数据结构和错误处理机制。
//! 包括两类实体的状态记录、多态远程节点以及统一的错误分类。

pub mod error;
pub mod models;

/// 重新导出常用类型，方便使用
pub use error::{Error, Phase, ReconcileError, ResourceKind, Result};
pub use models::membership::*;
pub use models::node::*;
pub use models::token::*;
pub use models::ReadOutcome;
