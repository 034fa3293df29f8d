//! 错误处理模块
//!
//! 该模块提供 OrgSync 项目的统一错误处理机制，包括远程错误的
//! 可重试/终止分类、生命周期阶段标记以及面向宿主的错误类型。

use std::fmt;
use std::io;
use thiserror::Error;

/// OrgSync 统一错误类型
///
/// 网关返回的每个错误都已按可重试/终止预先分类：
/// `Transient` 表示瞬时故障（网络、超时、限流），重试后可能成功；
/// 其余变体均为终止错误，重试没有意义。
#[derive(Error, Debug)]
pub enum Error {
    /// 瞬时远程错误（网络/超时/限流类）
    #[error("瞬时远程错误: {0}")]
    Transient(String),

    /// 终止远程错误（校验/权限/请求格式类）
    #[error("终止远程错误: {0}")]
    Terminal(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// JSON 错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 判断错误是否可重试
    ///
    /// 分类只取决于错误本身，与调用现场无关，因此所有生命周期阶段
    /// 和所有实体种类共用同一个判定。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_))
    }

    /// 将瞬时错误升级为终止错误，保留原始错误信息
    ///
    /// 重试预算耗尽后调用，确保宿主不会再次重试同一个错误。
    pub fn into_terminal(self) -> Error {
        match self {
            Error::Transient(msg) => Error::Terminal(msg),
            other => other,
        }
    }
}

/// OrgSync 结果类型别名
pub type Result<T> = std::result::Result<T, Error>;

/// 资源生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// 创建
    Create,
    /// 读取
    Read,
    /// 更新
    Update,
    /// 删除
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Create => write!(f, "创建"),
            Phase::Read => write!(f, "读取"),
            Phase::Update => write!(f, "更新"),
            Phase::Delete => write!(f, "删除"),
        }
    }
}

/// 被协调的实体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// 集群代理令牌
    ClusterAgentToken,
    /// 团队成员
    TeamMember,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::ClusterAgentToken => write!(f, "集群代理令牌"),
            ResourceKind::TeamMember => write!(f, "团队成员"),
        }
    }
}

/// 面向宿主的协调错误
///
/// 携带发生错误的阶段、实体种类以及原始错误信息，宿主据此逐字上报。
#[derive(Error, Debug)]
#[error("{resource}{phase}失败: {source}")]
pub struct ReconcileError {
    /// 发生错误的生命周期阶段
    pub phase: Phase,
    /// 实体种类
    pub resource: ResourceKind,
    /// 底层错误
    #[source]
    pub source: Error,
}

impl ReconcileError {
    /// 创建新的协调错误
    pub fn new(phase: Phase, resource: ResourceKind, source: Error) -> Self {
        Self {
            phase,
            resource,
            source,
        }
    }
}
