//! 集群代理令牌模型
//!
//! 该模块定义集群代理令牌的期望状态、观测状态以及网关返回的远程
//! 实体形态。令牌的秘密值只在创建时由远程 API 返回一次，之后的
//! 读取/更新永远不会再收到它，观测状态必须原样携带。

use serde::{Deserialize, Serialize};

/// 集群代理令牌的期望状态
///
/// 由宿主从用户输入构造，在创建/更新时传入控制器。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDesiredState {
    /// 令牌用途描述（可变属性）
    pub description: String,
    /// 所属集群的全局 ID（创建后不可变）
    pub cluster_id: String,
}

/// 集群代理令牌的观测状态
///
/// 创建时填充全部字段；读取只刷新 `description`；身份字段与秘密值
/// 一经赋值便不再改变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenObservedState {
    /// 全局 ID（服务端分配，创建后不可变）
    pub id: String,
    /// UUID（服务端分配，创建后不可变）
    pub uuid: String,
    /// 令牌用途描述
    pub description: String,
    /// 秘密令牌值（仅创建时返回，导入的令牌为空）
    pub token: String,
    /// 所属集群的全局 ID
    pub cluster_id: String,
    /// 所属集群的 UUID（列表查询使用）
    pub cluster_uuid: String,
}

/// 所属集群的身份引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRef {
    /// 集群的全局 ID
    pub id: String,
    /// 集群的 UUID
    pub uuid: String,
}

/// 网关返回的令牌实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntity {
    /// 令牌的全局 ID
    pub id: String,
    /// 令牌的 UUID
    pub uuid: String,
    /// 令牌用途描述
    pub description: String,
    /// 所属集群
    pub cluster: ClusterRef,
}

/// 创建令牌的完整响应
///
/// 秘密值只出现在这里，任何后续读取都无法重新获得。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreated {
    /// 创建出的令牌实体
    pub entity: TokenEntity,
    /// 一次性返回的秘密令牌值
    pub token_value: String,
}

/// 令牌列表中的一条摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSummary {
    /// 令牌的全局 ID
    pub id: String,
    /// 令牌用途描述
    pub description: String,
}

/// 令牌列表的一页
///
/// 网关按游标分页返回，控制器惰性地逐页扫描直到命中或穷尽。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPage {
    /// 本页包含的令牌摘要
    pub edges: Vec<TokenSummary>,
    /// 下一页游标
    pub end_cursor: Option<String>,
    /// 是否还有下一页
    pub has_next_page: bool,
}
