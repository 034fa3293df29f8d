//! 远程 API 网关契约
//!
//! 该模块定义控制器消费的远程操作集合。传输层、查询编码与组织
//! 上下文都封装在网关实现内部，对控制器不透明；每个操作返回的
//! 错误都已按可重试/终止预先分类。

use async_trait::async_trait;

use orgsync_common::{
    MembershipEntity, RemoteNode, Result, Role, TokenCreated, TokenEntity, TokenPage,
};

/// 远程 API 网关
///
/// 实现方持有传输句柄、凭据与组织上下文，可被多个资源实例并发
/// 共享；控制器不会在其之上附加任何同步机制。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// 在指定集群下创建代理令牌，秘密值仅在此响应中出现一次
    async fn create_token(&self, cluster_id: &str, description: &str) -> Result<TokenCreated>;

    /// 按集群 UUID 分页列出代理令牌
    async fn list_tokens(&self, cluster_uuid: &str, cursor: Option<String>) -> Result<TokenPage>;

    /// 按全局 ID 更新令牌描述
    async fn update_token(&self, id: &str, description: &str) -> Result<TokenEntity>;

    /// 按全局 ID 吊销令牌
    async fn revoke_token(&self, id: &str) -> Result<()>;

    /// 创建团队成员资格；角色未指定时由服务端默认为 MEMBER
    async fn create_membership(
        &self,
        team_id: &str,
        user_id: &str,
        role: Option<Role>,
    ) -> Result<MembershipEntity>;

    /// 按全局 ID 解析任意节点，返回带类型标签的联合体
    async fn resolve_node(&self, id: &str) -> Result<Option<RemoteNode>>;

    /// 按全局 ID 更新成员角色
    async fn update_membership(&self, id: &str, role: Role) -> Result<MembershipEntity>;

    /// 按全局 ID 删除成员资格
    async fn delete_membership(&self, id: &str) -> Result<()>;
}
