//! 配置管理模块
//!
//! 该模块定义协调器的进程级配置：远程端点、凭据、组织上下文以及
//! 各生命周期阶段独立的重试超时。配置在构造后不可变，以共享引用
//! 的方式传入每个控制器，绝不使用全局可变状态。

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use orgsync_common::{Error, Phase, Result};

/// 各生命周期阶段的重试超时（秒）
///
/// 四个阶段相互独立，宿主可以分别配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTimeouts {
    /// 创建阶段超时（秒）
    pub create: u64,
    /// 读取阶段超时（秒）
    pub read: u64,
    /// 更新阶段超时（秒）
    pub update: u64,
    /// 删除阶段超时（秒）
    pub delete: u64,
}

impl Default for PhaseTimeouts {
    fn default() -> Self {
        Self {
            create: 300,
            read: 300,
            update: 300,
            delete: 300,
        }
    }
}

impl PhaseTimeouts {
    /// 查询指定阶段的超时
    pub fn for_phase(&self, phase: Phase) -> Duration {
        let secs = match phase {
            Phase::Create => self.create,
            Phase::Read => self.read,
            Phase::Update => self.update,
            Phase::Delete => self.delete,
        };
        Duration::from_secs(secs)
    }
}

/// 协调器配置
///
/// 组织上下文与凭据对控制器不透明，仅供网关实现构造时使用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// 远程 API 端点
    pub endpoint: String,
    /// API 访问令牌
    pub api_token: String,
    /// 组织的全局 ID（变更操作使用）
    pub organization_id: String,
    /// 组织标识串（列表查询使用）
    pub organization_slug: String,
    /// 各阶段重试超时
    pub timeouts: PhaseTimeouts,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://graphql.example.com/v1".to_string(),
            api_token: String::new(),
            organization_id: String::new(),
            organization_slug: String::new(),
            timeouts: PhaseTimeouts::default(),
        }
    }
}

impl ReconcilerConfig {
    /// 从 JSON 配置文件加载并校验
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// 校验配置完整性
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::Config("远程 API 端点不能为空".to_string()));
        }

        Ok(())
    }
}
