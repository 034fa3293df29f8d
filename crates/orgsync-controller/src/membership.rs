//! 团队成员控制器
//!
//! 该模块实现团队成员资格的协调逻辑。读取走通用的按 ID 节点解析，
//! 返回带类型标签的联合体，必须显式窄化到成员变体；节点缺失或
//! 变体不符都作为缺失结果上报，绝不静默强转。

use std::sync::Arc;
use tracing::{info, warn};

use orgsync_common::{
    Error, MembershipDesiredState, MembershipEntity, MembershipObservedState, Phase, ReadOutcome,
    ReconcileError, ResourceKind, Role,
};

use crate::config::ReconcilerConfig;
use crate::gateway::RemoteGateway;
use crate::retry::retry_with_timeout;

/// 团队成员控制器
pub struct TeamMembershipController<G> {
    /// 远程 API 网关
    gateway: Arc<G>,
    /// 协调器配置
    config: Arc<ReconcilerConfig>,
}

impl<G: RemoteGateway> TeamMembershipController<G> {
    /// 创建新的成员控制器
    pub fn new(gateway: Arc<G>, config: Arc<ReconcilerConfig>) -> Self {
        Self { gateway, config }
    }

    /// 创建成员资格并返回完整的观测状态
    ///
    /// 角色未指定时由服务端默认为 MEMBER，以响应中的确认值为准。
    pub async fn create(
        &self,
        desired: &MembershipDesiredState,
    ) -> Result<MembershipObservedState, ReconcileError> {
        if desired.team_id.is_empty() {
            return Err(self.error(
                Phase::Create,
                Error::Terminal("所属团队 ID 不能为空".to_string()),
            ));
        }
        if desired.user_id.is_empty() {
            return Err(self.error(
                Phase::Create,
                Error::Terminal("用户 ID 不能为空".to_string()),
            ));
        }

        info!(
            "正在将用户 {} 加入团队 {}",
            desired.user_id, desired.team_id
        );

        let timeout = self.config.timeouts.for_phase(Phase::Create);
        let entity = retry_with_timeout(timeout, || {
            self.gateway
                .create_membership(&desired.team_id, &desired.user_id, desired.role)
        })
        .await
        .map_err(|err| self.error(Phase::Create, err))?;

        info!("成员资格 {} 创建成功，角色为 {}", entity.id, entity.role);
        Ok(Self::observed_from(entity))
    }

    /// 从远程刷新观测状态
    ///
    /// 节点不存在或解析出的变体不是团队成员时返回缺失结果，宿主
    /// 据此将资源从跟踪状态中移除。
    pub async fn read(
        &self,
        observed: &MembershipObservedState,
    ) -> Result<ReadOutcome<MembershipObservedState>, ReconcileError> {
        if observed.id.is_empty() {
            return Err(self.error(
                Phase::Read,
                Error::Terminal("观测状态缺少成员资格 ID".to_string()),
            ));
        }

        info!("正在读取成员资格 {}", observed.id);

        let timeout = self.config.timeouts.for_phase(Phase::Read);
        let node = retry_with_timeout(timeout, || self.gateway.resolve_node(&observed.id))
            .await
            .map_err(|err| self.error(Phase::Read, err))?;

        let node = match node {
            Some(node) => node,
            None => {
                warn!("成员资格 {} 已不存在，标记为缺失", observed.id);
                return Ok(ReadOutcome::Missing);
            }
        };

        let variant = node.variant_name();
        match node.into_team_member() {
            Some(entity) => {
                let mut refreshed = Self::observed_from(entity);
                // 查询键即身份，保持不变
                refreshed.id = observed.id.clone();
                Ok(ReadOutcome::Synced(refreshed))
            }
            None => {
                warn!(
                    "节点 {} 解析为 {} 变体，与预期的团队成员不符，标记为缺失",
                    observed.id, variant
                );
                Ok(ReadOutcome::Missing)
            }
        }
    }

    /// 更新成员角色并合并服务端确认的值
    ///
    /// 团队与用户引用创建后不可变；更新必须显式给出角色。
    pub async fn update(
        &self,
        observed: &MembershipObservedState,
        desired: &MembershipDesiredState,
    ) -> Result<MembershipObservedState, ReconcileError> {
        if desired.team_id != observed.team_id {
            return Err(self.error(
                Phase::Update,
                Error::Terminal(format!(
                    "所属团队引用创建后不可变: {} -> {}",
                    observed.team_id, desired.team_id
                )),
            ));
        }
        if desired.user_id != observed.user_id {
            return Err(self.error(
                Phase::Update,
                Error::Terminal(format!(
                    "用户引用创建后不可变: {} -> {}",
                    observed.user_id, desired.user_id
                )),
            ));
        }
        let role = desired.role.ok_or_else(|| {
            self.error(
                Phase::Update,
                Error::Terminal("更新成员资格时必须指定角色".to_string()),
            )
        })?;

        info!("正在将成员资格 {} 的角色更新为 {}", observed.id, role);

        let timeout = self.config.timeouts.for_phase(Phase::Update);
        let entity = retry_with_timeout(timeout, || {
            self.gateway.update_membership(&observed.id, role)
        })
        .await
        .map_err(|err| self.error(Phase::Update, err))?;

        // 只合并更新契约内的字段
        let mut next = observed.clone();
        next.role = entity.role;
        Ok(next)
    }

    /// 删除成员资格
    pub async fn delete(&self, observed: &MembershipObservedState) -> Result<(), ReconcileError> {
        info!("正在删除成员资格 {}", observed.id);

        let timeout = self.config.timeouts.for_phase(Phase::Delete);
        retry_with_timeout(timeout, || self.gateway.delete_membership(&observed.id))
            .await
            .map_err(|err| self.error(Phase::Delete, err))?;

        info!("成员资格 {} 已删除", observed.id);
        Ok(())
    }

    /// 按裸标识导入成员资格
    ///
    /// 以 ID 播种观测状态并立即读取，其余字段由节点解析填充。
    pub async fn import(
        &self,
        id: &str,
    ) -> Result<ReadOutcome<MembershipObservedState>, ReconcileError> {
        if id.is_empty() {
            return Err(self.error(
                Phase::Read,
                Error::Terminal("导入的成员资格 ID 不能为空".to_string()),
            ));
        }

        info!("正在导入成员资格 {}", id);

        let seed = MembershipObservedState {
            id: id.to_string(),
            uuid: String::new(),
            role: Role::Member,
            team_id: String::new(),
            user_id: String::new(),
        };
        self.read(&seed).await
    }

    fn observed_from(entity: MembershipEntity) -> MembershipObservedState {
        MembershipObservedState {
            id: entity.id,
            uuid: entity.uuid,
            role: entity.role,
            team_id: entity.team.id,
            user_id: entity.user.id,
        }
    }

    fn error(&self, phase: Phase, source: Error) -> ReconcileError {
        ReconcileError::new(phase, ResourceKind::TeamMember, source)
    }
}
