//! 数据模型模块
//!
//! 该模块定义了 OrgSync 项目中使用的核心数据模型，包括两类实体的
//! 期望状态/观测状态记录、远程实体形态以及读取操作的结果类型。

pub mod membership;
pub mod node;
pub mod token;

/// 读取操作的结果
///
/// 远程实体缺失是一种独立的结果而不是错误：宿主必须据此将资源从
/// 跟踪状态中移除，绝不能把缺失当作"无变化的成功"处理。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<T> {
    /// 已与远程同步的最新观测状态
    Synced(T),
    /// 远程实体已不存在
    Missing,
}

impl<T> ReadOutcome<T> {
    /// 判断远程实体是否缺失
    pub fn is_missing(&self) -> bool {
        matches!(self, ReadOutcome::Missing)
    }

    /// 取出同步后的观测状态
    pub fn into_synced(self) -> Option<T> {
        match self {
            ReadOutcome::Synced(observed) => Some(observed),
            ReadOutcome::Missing => None,
        }
    }
}
