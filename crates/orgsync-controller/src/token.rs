//! 集群代理令牌控制器
//!
//! 该模块实现令牌实体的协调逻辑。远程 API 没有按 ID 直接查询令牌
//! 的操作，读取只能在所属集群的分页令牌列表上线性扫描；秘密令牌值
//! 仅在创建响应中出现一次，之后的任何阶段都不会再触碰它。

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use orgsync_common::{
    Error, Phase, ReadOutcome, ReconcileError, ResourceKind, TokenDesiredState,
    TokenObservedState,
};

use crate::config::ReconcilerConfig;
use crate::gateway::RemoteGateway;
use crate::retry::retry_with_timeout;

/// 集群代理令牌控制器
///
/// 网关句柄与配置均为共享只读引用，多个资源实例可以并发协调。
pub struct ClusterAgentTokenController<G> {
    /// 远程 API 网关
    gateway: Arc<G>,
    /// 协调器配置
    config: Arc<ReconcilerConfig>,
}

impl<G: RemoteGateway> ClusterAgentTokenController<G> {
    /// 创建新的令牌控制器
    pub fn new(gateway: Arc<G>, config: Arc<ReconcilerConfig>) -> Self {
        Self { gateway, config }
    }

    /// 创建远程令牌并返回完整的观测状态
    ///
    /// 引用字段只校验非空，是否真实存在交由网关判定。响应到达之前
    /// 不产生任何局部状态，失败时绝不返回残缺的观测状态。
    pub async fn create(
        &self,
        desired: &TokenDesiredState,
    ) -> Result<TokenObservedState, ReconcileError> {
        if desired.cluster_id.is_empty() {
            return Err(self.error(
                Phase::Create,
                Error::Terminal("所属集群 ID 不能为空".to_string()),
            ));
        }

        info!(
            "正在为集群 {} 创建描述为 {} 的代理令牌",
            desired.cluster_id, desired.description
        );

        let timeout = self.config.timeouts.for_phase(Phase::Create);
        let created = retry_with_timeout(timeout, || {
            self.gateway
                .create_token(&desired.cluster_id, &desired.description)
        })
        .await
        .map_err(|err| self.error(Phase::Create, err))?;

        info!("令牌 {} 创建成功", created.entity.id);

        Ok(TokenObservedState {
            id: created.entity.id,
            uuid: created.entity.uuid,
            description: created.entity.description,
            token: created.token_value,
            cluster_id: created.entity.cluster.id,
            cluster_uuid: created.entity.cluster.uuid,
        })
    }

    /// 从远程刷新观测状态
    ///
    /// 在所属集群的令牌列表上逐页扫描，命中时只刷新描述字段；
    /// 扫描穷尽仍未命中说明远程实体已不存在，返回缺失结果。
    /// 整个扫描共享一份读取阶段预算，页数再多也不会超出。
    pub async fn read(
        &self,
        observed: &TokenObservedState,
    ) -> Result<ReadOutcome<TokenObservedState>, ReconcileError> {
        if observed.id.is_empty() {
            return Err(self.error(
                Phase::Read,
                Error::Terminal("观测状态缺少令牌 ID".to_string()),
            ));
        }

        info!("正在读取集群 {} 的代理令牌列表", observed.cluster_uuid);

        let budget = self.config.timeouts.for_phase(Phase::Read);
        let start = Instant::now();
        let mut cursor: Option<String> = None;

        loop {
            let remaining = budget.saturating_sub(start.elapsed());
            let page = retry_with_timeout(remaining, || {
                self.gateway
                    .list_tokens(&observed.cluster_uuid, cursor.clone())
            })
            .await
            .map_err(|err| self.error(Phase::Read, err))?;

            if let Some(edge) = page.edges.iter().find(|edge| edge.id == observed.id) {
                debug!("在集群 {} 中找到令牌 {}", observed.cluster_uuid, observed.id);

                // 身份字段与秘密值保持不变，只刷新可变属性
                let mut refreshed = observed.clone();
                refreshed.description = edge.description.clone();
                return Ok(ReadOutcome::Synced(refreshed));
            }

            if !page.has_next_page || page.end_cursor.is_none() {
                break;
            }
            cursor = page.end_cursor;
        }

        warn!(
            "令牌 {} 已不存在于集群 {}，标记为缺失",
            observed.id, observed.cluster_uuid
        );
        Ok(ReadOutcome::Missing)
    }

    /// 更新令牌描述并合并服务端确认的值
    ///
    /// 所属集群引用创建后不可变，发现重新指向立即以终止错误拒绝。
    pub async fn update(
        &self,
        observed: &TokenObservedState,
        desired: &TokenDesiredState,
    ) -> Result<TokenObservedState, ReconcileError> {
        if desired.cluster_id != observed.cluster_id {
            return Err(self.error(
                Phase::Update,
                Error::Terminal(format!(
                    "所属集群引用创建后不可变: {} -> {}",
                    observed.cluster_id, desired.cluster_id
                )),
            ));
        }

        info!("正在更新令牌 {}", observed.id);

        let timeout = self.config.timeouts.for_phase(Phase::Update);
        let entity = retry_with_timeout(timeout, || {
            self.gateway.update_token(&observed.id, &desired.description)
        })
        .await
        .map_err(|err| self.error(Phase::Update, err))?;

        // 只合并更新契约内的字段，身份与秘密值不动
        let mut next = observed.clone();
        next.description = entity.description;
        Ok(next)
    }

    /// 吊销远程令牌
    ///
    /// 成功即表示远程实体已消失，不做验证性读取；"已经不存在"由
    /// 网关按终止错误上报，这里不降级为成功。
    pub async fn delete(&self, observed: &TokenObservedState) -> Result<(), ReconcileError> {
        info!("正在吊销令牌 {}", observed.id);

        let timeout = self.config.timeouts.for_phase(Phase::Delete);
        retry_with_timeout(timeout, || self.gateway.revoke_token(&observed.id))
            .await
            .map_err(|err| self.error(Phase::Delete, err))?;

        info!("令牌 {} 已吊销", observed.id);
        Ok(())
    }

    /// 按裸标识导入令牌
    ///
    /// 列表扫描需要所属集群的 UUID，因此导入标识由集群 UUID 与
    /// 令牌 ID 两部分组成。秘密值无法重新获得，导入的令牌为空。
    pub async fn import(
        &self,
        cluster_uuid: &str,
        id: &str,
    ) -> Result<ReadOutcome<TokenObservedState>, ReconcileError> {
        if id.is_empty() {
            return Err(self.error(
                Phase::Read,
                Error::Terminal("导入的令牌 ID 不能为空".to_string()),
            ));
        }
        Uuid::parse_str(cluster_uuid).map_err(|err| {
            self.error(
                Phase::Read,
                Error::Terminal(format!("无效的集群 UUID {}: {}", cluster_uuid, err)),
            )
        })?;

        info!("正在从集群 {} 导入令牌 {}", cluster_uuid, id);

        let seed = TokenObservedState {
            id: id.to_string(),
            uuid: String::new(),
            description: String::new(),
            token: String::new(),
            cluster_id: String::new(),
            cluster_uuid: cluster_uuid.to_string(),
        };
        self.read(&seed).await
    }

    fn error(&self, phase: Phase, source: Error) -> ReconcileError {
        ReconcileError::new(phase, ResourceKind::ClusterAgentToken, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhaseTimeouts;
    use crate::gateway::MockRemoteGateway;
    use orgsync_common::{ClusterRef, TokenCreated, TokenEntity, TokenPage, TokenSummary};

    const CLUSTER_UUID: &str = "0190e784-0000-7a4b-90c3-1b62ce3b4ae8";

    fn test_config() -> Arc<ReconcilerConfig> {
        Arc::new(ReconcilerConfig {
            timeouts: PhaseTimeouts {
                create: 3,
                read: 3,
                update: 3,
                delete: 3,
            },
            ..ReconcilerConfig::default()
        })
    }

    fn controller(mock: MockRemoteGateway) -> ClusterAgentTokenController<MockRemoteGateway> {
        ClusterAgentTokenController::new(Arc::new(mock), test_config())
    }

    fn sample_desired() -> TokenDesiredState {
        TokenDesiredState {
            description: "ci-runner".to_string(),
            cluster_id: "Q2x1c3Rlci0x".to_string(),
        }
    }

    fn sample_created() -> TokenCreated {
        TokenCreated {
            entity: TokenEntity {
                id: "VG9rZW4tMQ==".to_string(),
                uuid: "0190e784-eec1-7a4b-90c3-1b62ce3b4ae8".to_string(),
                description: "ci-runner".to_string(),
                cluster: ClusterRef {
                    id: "Q2x1c3Rlci0x".to_string(),
                    uuid: CLUSTER_UUID.to_string(),
                },
            },
            token_value: "bkt_secret".to_string(),
        }
    }

    fn sample_observed() -> TokenObservedState {
        TokenObservedState {
            id: "VG9rZW4tMQ==".to_string(),
            uuid: "0190e784-eec1-7a4b-90c3-1b62ce3b4ae8".to_string(),
            description: "ci-runner".to_string(),
            token: "bkt_secret".to_string(),
            cluster_id: "Q2x1c3Rlci0x".to_string(),
            cluster_uuid: CLUSTER_UUID.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_populates_identity_and_secret() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_create_token()
            .withf(|cluster_id, description| {
                cluster_id == "Q2x1c3Rlci0x" && description == "ci-runner"
            })
            .times(1)
            .returning(|_, _| Ok(sample_created()));

        let observed = controller(mock).create(&sample_desired()).await.unwrap();
        assert_eq!(observed.id, "VG9rZW4tMQ==");
        assert_eq!(observed.description, "ci-runner");
        assert_eq!(observed.token, "bkt_secret");
        assert_eq!(observed.cluster_id, "Q2x1c3Rlci0x");
        assert_eq!(observed.cluster_uuid, CLUSTER_UUID);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_cluster_ref() {
        // 引用为空时不应发出任何网关调用
        let mut mock = MockRemoteGateway::new();
        mock.expect_create_token().times(0);

        let desired = TokenDesiredState {
            description: "ci-runner".to_string(),
            cluster_id: String::new(),
        };
        let err = controller(mock).create(&desired).await.unwrap_err();
        assert_eq!(err.phase, Phase::Create);
        assert!(matches!(err.source, Error::Terminal(_)));
    }

    #[tokio::test]
    async fn test_create_terminal_error_not_retried() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_create_token()
            .times(1)
            .returning(|_, _| Err(Error::Terminal("集群不存在".to_string())));

        let err = controller(mock).create(&sample_desired()).await.unwrap_err();
        assert_eq!(err.phase, Phase::Create);
        assert_eq!(err.resource, ResourceKind::ClusterAgentToken);
        assert!(err.to_string().contains("集群不存在"));
    }

    #[tokio::test]
    async fn test_read_refreshes_description_only() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_list_tokens()
            .withf(|cluster_uuid, cursor| cluster_uuid == CLUSTER_UUID && cursor.is_none())
            .times(1)
            .returning(|_, _| {
                Ok(TokenPage {
                    edges: vec![TokenSummary {
                        id: "VG9rZW4tMQ==".to_string(),
                        description: "ci-runner-renamed".to_string(),
                    }],
                    end_cursor: None,
                    has_next_page: false,
                })
            });

        let observed = sample_observed();
        let outcome = controller(mock).read(&observed).await.unwrap();
        let refreshed = outcome.into_synced().unwrap();
        assert_eq!(refreshed.description, "ci-runner-renamed");
        // 身份字段与秘密值保持不变
        assert_eq!(refreshed.id, observed.id);
        assert_eq!(refreshed.uuid, observed.uuid);
        assert_eq!(refreshed.token, observed.token);
    }

    #[tokio::test]
    async fn test_read_scans_across_pages() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_list_tokens()
            .withf(|_, cursor| cursor.is_none())
            .times(1)
            .returning(|_, _| {
                Ok(TokenPage {
                    edges: vec![TokenSummary {
                        id: "VG9rZW4tOTk=".to_string(),
                        description: "other".to_string(),
                    }],
                    end_cursor: Some("Y3Vyc29yLTE=".to_string()),
                    has_next_page: true,
                })
            });
        mock.expect_list_tokens()
            .withf(|_, cursor| cursor.as_deref() == Some("Y3Vyc29yLTE="))
            .times(1)
            .returning(|_, _| {
                Ok(TokenPage {
                    edges: vec![TokenSummary {
                        id: "VG9rZW4tMQ==".to_string(),
                        description: "ci-runner".to_string(),
                    }],
                    end_cursor: None,
                    has_next_page: false,
                })
            });

        let outcome = controller(mock).read(&sample_observed()).await.unwrap();
        assert!(!outcome.is_missing());
    }

    #[tokio::test]
    async fn test_read_missing_when_absent_from_list() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_list_tokens().times(1).returning(|_, _| {
            Ok(TokenPage {
                edges: vec![],
                end_cursor: None,
                has_next_page: false,
            })
        });

        let outcome = controller(mock).read(&sample_observed()).await.unwrap();
        assert!(outcome.is_missing());
    }

    #[tokio::test]
    async fn test_update_merges_confirmed_description() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_update_token()
            .withf(|id, description| id == "VG9rZW4tMQ==" && description == "ci-runner-2")
            .times(1)
            .returning(|_, _| {
                let mut created = sample_created();
                created.entity.description = "ci-runner-2".to_string();
                Ok(created.entity)
            });

        let observed = sample_observed();
        let desired = TokenDesiredState {
            description: "ci-runner-2".to_string(),
            cluster_id: observed.cluster_id.clone(),
        };
        let next = controller(mock).update(&observed, &desired).await.unwrap();
        assert_eq!(next.description, "ci-runner-2");
        assert_eq!(next.id, observed.id);
        assert_eq!(next.uuid, observed.uuid);
        assert_eq!(next.token, observed.token);
    }

    #[tokio::test]
    async fn test_update_rejects_repointed_cluster() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_update_token().times(0);

        let observed = sample_observed();
        let desired = TokenDesiredState {
            description: "ci-runner".to_string(),
            cluster_id: "Q2x1c3Rlci0y".to_string(),
        };
        let err = controller(mock).update(&observed, &desired).await.unwrap_err();
        assert_eq!(err.phase, Phase::Update);
        assert!(matches!(err.source, Error::Terminal(_)));
    }

    #[tokio::test]
    async fn test_delete_revokes_by_id() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_revoke_token()
            .withf(|id| id == "VG9rZW4tMQ==")
            .times(1)
            .returning(|_| Ok(()));

        controller(mock).delete(&sample_observed()).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_already_gone_stays_error() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_revoke_token()
            .times(1)
            .returning(|_| Err(Error::Terminal("令牌不存在".to_string())));

        let err = controller(mock).delete(&sample_observed()).await.unwrap_err();
        assert_eq!(err.phase, Phase::Delete);
        assert!(err.to_string().contains("令牌不存在"));
    }

    #[tokio::test]
    async fn test_import_seeds_and_reads() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_list_tokens()
            .withf(|cluster_uuid, _| cluster_uuid == CLUSTER_UUID)
            .times(1)
            .returning(|_, _| {
                Ok(TokenPage {
                    edges: vec![TokenSummary {
                        id: "VG9rZW4tMQ==".to_string(),
                        description: "ci-runner".to_string(),
                    }],
                    end_cursor: None,
                    has_next_page: false,
                })
            });

        let outcome = controller(mock)
            .import(CLUSTER_UUID, "VG9rZW4tMQ==")
            .await
            .unwrap();
        let observed = outcome.into_synced().unwrap();
        assert_eq!(observed.description, "ci-runner");
        // 秘密值无法重新获得
        assert!(observed.token.is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_uuid() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_list_tokens().times(0);

        let err = controller(mock)
            .import("not-a-uuid", "VG9rZW4tMQ==")
            .await
            .unwrap_err();
        assert!(matches!(err.source, Error::Terminal(_)));
    }

    /// 逐页扫描时卡死的网关：第一页先瞬时失败一次再成功，第二页永不返回
    struct StallingGateway {
        list_calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RemoteGateway for StallingGateway {
        async fn create_token(
            &self,
            _cluster_id: &str,
            _description: &str,
        ) -> orgsync_common::Result<TokenCreated> {
            unreachable!()
        }

        async fn list_tokens(
            &self,
            _cluster_uuid: &str,
            cursor: Option<String>,
        ) -> orgsync_common::Result<TokenPage> {
            use std::sync::atomic::Ordering;

            if cursor.is_some() {
                return std::future::pending().await;
            }
            let n = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                return Err(Error::Transient("连接超时".to_string()));
            }
            Ok(TokenPage {
                edges: vec![],
                end_cursor: Some("Y3Vyc29yLTE=".to_string()),
                has_next_page: true,
            })
        }

        async fn update_token(
            &self,
            _id: &str,
            _description: &str,
        ) -> orgsync_common::Result<TokenEntity> {
            unreachable!()
        }

        async fn revoke_token(&self, _id: &str) -> orgsync_common::Result<()> {
            unreachable!()
        }

        async fn create_membership(
            &self,
            _team_id: &str,
            _user_id: &str,
            _role: Option<orgsync_common::Role>,
        ) -> orgsync_common::Result<orgsync_common::MembershipEntity> {
            unreachable!()
        }

        async fn resolve_node(
            &self,
            _id: &str,
        ) -> orgsync_common::Result<Option<orgsync_common::RemoteNode>> {
            unreachable!()
        }

        async fn update_membership(
            &self,
            _id: &str,
            _role: orgsync_common::Role,
        ) -> orgsync_common::Result<orgsync_common::MembershipEntity> {
            unreachable!()
        }

        async fn delete_membership(&self, _id: &str) -> orgsync_common::Result<()> {
            unreachable!()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_budget_shared_across_pages() {
        use std::time::Duration;

        let gateway = Arc::new(StallingGateway {
            list_calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let controller = ClusterAgentTokenController::new(gateway, test_config());

        let started = Instant::now();
        let err = controller.read(&sample_observed()).await.unwrap_err();
        assert_eq!(err.phase, Phase::Read);
        assert!(matches!(err.source, Error::Terminal(_)));
        // 第一页的重试已消耗部分预算，整个扫描仍在单一读取预算（3 秒）内结束
        assert!(
            started.elapsed() <= Duration::from_millis(3100),
            "扫描耗时 {:?}，超出读取阶段预算",
            started.elapsed()
        );
    }

    /// 场景：创建 -> 更新描述 -> 吊销，秘密值全程不变
    #[tokio::test]
    async fn test_token_lifecycle_scenario() {
        let mut mock = MockRemoteGateway::new();
        mock.expect_create_token()
            .times(1)
            .returning(|_, _| Ok(sample_created()));
        mock.expect_update_token().times(1).returning(|_, _| {
            let mut created = sample_created();
            created.entity.description = "ci-runner-2".to_string();
            Ok(created.entity)
        });
        mock.expect_revoke_token().times(1).returning(|_| Ok(()));

        let controller = controller(mock);
        let observed = controller.create(&sample_desired()).await.unwrap();
        assert_eq!(observed.description, "ci-runner");
        assert_eq!(observed.cluster_id, "Q2x1c3Rlci0x");
        assert!(!observed.token.is_empty());

        let desired = TokenDesiredState {
            description: "ci-runner-2".to_string(),
            cluster_id: observed.cluster_id.clone(),
        };
        let updated = controller.update(&observed, &desired).await.unwrap();
        assert_eq!(updated.description, "ci-runner-2");
        assert_eq!(updated.token, observed.token);
        assert_eq!(updated.id, observed.id);
        assert_eq!(updated.uuid, observed.uuid);

        controller.delete(&updated).await.unwrap();
    }
}
