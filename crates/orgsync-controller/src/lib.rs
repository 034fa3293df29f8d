//! OrgSync 控制平面
//!
//! 该模块实现声明式资源协调引擎：把本地持久化的期望状态翻译成
//! 远程创建/读取/更新/删除操作，关联本地与远程的实体身份，在有界
//! 重试内吸收瞬时故障，并把远程缺失如实反映给宿主。

pub mod config;
pub mod gateway;
pub mod membership;
pub mod retry;
pub mod token;

use std::sync::Arc;
use tracing::info;

pub use config::{PhaseTimeouts, ReconcilerConfig};
pub use gateway::RemoteGateway;
pub use membership::TeamMembershipController;
pub use token::ClusterAgentTokenController;

/// 两类实体的控制器集合
///
/// 宿主按资源实例逐个调用各控制器的生命周期操作；网关与配置在
/// 所有控制器之间共享且只读。
pub struct Reconciler<G> {
    /// 集群代理令牌控制器
    pub tokens: ClusterAgentTokenController<G>,
    /// 团队成员控制器
    pub memberships: TeamMembershipController<G>,
}

/// 控制器初始化函数
pub fn init<G: RemoteGateway>(gateway: Arc<G>, config: ReconcilerConfig) -> Reconciler<G> {
    info!("初始化 OrgSync 控制平面，端点: {}", config.endpoint);

    let config = Arc::new(config);
    let reconciler = Reconciler {
        tokens: ClusterAgentTokenController::new(gateway.clone(), config.clone()),
        memberships: TeamMembershipController::new(gateway, config),
    };

    info!("OrgSync 控制平面初始化完成");
    reconciler
}
