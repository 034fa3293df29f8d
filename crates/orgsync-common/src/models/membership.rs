//! 团队成员模型
//!
//! 该模块定义团队成员资格的期望状态、观测状态、角色枚举以及网关
//! 返回的远程实体形态。角色未指定时由服务端默认为 MEMBER。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// 团队成员角色
///
/// 取值固定为 MEMBER 或 MAINTAINER，与远程 API 的枚举一一对应。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 普通成员
    Member,
    /// 维护者
    Maintainer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Member => write!(f, "MEMBER"),
            Role::Maintainer => write!(f, "MAINTAINER"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEMBER" => Ok(Role::Member),
            "MAINTAINER" => Ok(Role::Maintainer),
            _ => Err(Error::Terminal(format!("无效的团队成员角色: {}", s))),
        }
    }
}

/// 团队成员资格的期望状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipDesiredState {
    /// 所属团队的全局 ID（创建后不可变）
    pub team_id: String,
    /// 用户的全局 ID（创建后不可变）
    pub user_id: String,
    /// 角色；未指定时由服务端默认为 MEMBER
    pub role: Option<Role>,
}

/// 团队成员资格的观测状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipObservedState {
    /// 全局 ID（服务端分配，创建后不可变）
    pub id: String,
    /// UUID（服务端分配，创建后不可变）
    pub uuid: String,
    /// 当前角色
    pub role: Role,
    /// 所属团队的全局 ID
    pub team_id: String,
    /// 用户的全局 ID
    pub user_id: String,
}

/// 所属团队的身份引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    /// 团队的全局 ID
    pub id: String,
    /// 团队的 UUID
    pub uuid: String,
}

/// 用户的身份引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// 用户的全局 ID
    pub id: String,
}

/// 网关返回的团队成员实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntity {
    /// 成员资格的全局 ID
    pub id: String,
    /// 成员资格的 UUID
    pub uuid: String,
    /// 当前角色
    pub role: Role,
    /// 所属团队
    pub team: TeamRef,
    /// 对应用户
    pub user: UserRef,
}
