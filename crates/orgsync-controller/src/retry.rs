//! 重试包装模块
//!
//! 该模块提供按墙钟时间限定的重试包装器，供两类控制器的所有
//! 生命周期阶段复用。终止错误在第一次出现时立即中止；瞬时错误
//! 按指数退避重试。每次调用都被裁剪到剩余预算内，预算耗尽时
//! 放弃在途调用，并把最后一次观测到的错误升级为终止返回。

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use orgsync_common::{Error, Result};

/// 首次退避间隔
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// 退避间隔上限
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// 在阶段预算内重试执行远程调用
///
/// 重试是顺序的，任一时刻最多只有一次调用在途。每次调用至多等待
/// 剩余预算，超过即放弃在途调用；预算耗尽后返回最后一次观测到的
/// 错误，并升级为终止错误以阻止宿主继续重试。
pub async fn retry_with_timeout<T, F, Fut>(budget: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt: u32 = 1;
    let mut last_err: Option<Error> = None;

    loop {
        let remaining = budget.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            let err = last_err
                .unwrap_or_else(|| Error::Transient(format!("重试预算 {:?} 已耗尽", budget)));
            return Err(err.into_terminal());
        }

        match timeout(remaining, op()).await {
            Err(_) => {
                // 阶段超时，放弃在途调用
                warn!("阶段预算耗尽，放弃第 {} 次在途调用", attempt);
                let err = last_err.unwrap_or_else(|| {
                    Error::Transient(format!("远程调用在阶段预算 {:?} 内未完成", budget))
                });
                return Err(err.into_terminal());
            }
            Ok(Ok(value)) => {
                if attempt > 1 {
                    debug!("第 {} 次尝试成功", attempt);
                }
                return Ok(value);
            }
            Ok(Err(err)) if !err.is_retryable() => {
                // 终止错误不重试，原样上抛
                return Err(err);
            }
            Ok(Err(err)) => {
                if start.elapsed() + backoff >= budget {
                    warn!("重试预算耗尽（{} 次尝试），放弃: {}", attempt, err);
                    return Err(err.into_terminal());
                }

                warn!("第 {} 次尝试失败: {}，{:?} 后重试", attempt, err, backoff);
                last_err = Some(err);
                sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
                attempt += 1;
            }
        }
    }
}
