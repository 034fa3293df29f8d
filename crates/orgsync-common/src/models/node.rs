//! 多态节点模型
//!
//! 远程 API 提供一个按 ID 解析任意实体的通用查询，返回带类型标签的
//! 联合体。该模块把它建模为已知种类上的封闭枚举，并提供显式的、
//! 可失败的窄化方法——绝不允许未经检查的强制转换。

use serde::{Deserialize, Serialize};

use crate::models::membership::MembershipEntity;

/// 按 ID 解析出的远程节点
///
/// `__typename` 标签决定变体；窄化到预期种类失败时由调用方决定
/// 如何处理（缺失结果），这里只负责如实呈现。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum RemoteNode {
    /// 团队成员资格节点
    TeamMember(MembershipEntity),
    /// 集群节点
    Cluster {
        /// 集群的全局 ID
        id: String,
        /// 集群的 UUID
        uuid: String,
    },
    /// 集群代理令牌节点
    ClusterToken {
        /// 令牌的全局 ID
        id: String,
        /// 令牌用途描述
        description: String,
    },
}

impl RemoteNode {
    /// 节点变体名称，用于日志与诊断
    pub fn variant_name(&self) -> &'static str {
        match self {
            RemoteNode::TeamMember(_) => "TeamMember",
            RemoteNode::Cluster { .. } => "Cluster",
            RemoteNode::ClusterToken { .. } => "ClusterToken",
        }
    }

    /// 显式窄化为团队成员实体
    ///
    /// 变体不符时返回 `None`，由调用方作为缺失结果处理。
    pub fn into_team_member(self) -> Option<MembershipEntity> {
        match self {
            RemoteNode::TeamMember(entity) => Some(entity),
            _ => None,
        }
    }
}
