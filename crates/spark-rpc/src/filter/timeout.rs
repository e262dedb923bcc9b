use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::warn;

use crate::{
    error::RpcError,
    invocation::Invocation,
    invoker::Invoker,
    keys::{DEFAULT_TIMEOUT_MS, TIMEOUT_KEY},
    result::RpcResult,
};

use super::Filter;

/// 慢调用告警。
///
/// # 教案式说明
/// - **意图 (Why)**：提供方无法中断已经开始执行的业务逻辑，但需要把超出约定阈值的调用暴露给运维；
/// - **契约 (What)**：阈值取自 URL 参数 `timeout`（毫秒，缺省 1000）；结果原样返回，不改写；
/// - **风险 (Trade-offs)**：只测量 `next.invoke` 的墙钟时间，包含内层 Filter 的开销。
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutFilter;

#[async_trait]
impl Filter for TimeoutFilter {
    async fn invoke(&self, next: &dyn Invoker, invocation: Invocation) -> Result<RpcResult, RpcError> {
        let threshold = Duration::from_millis(next.url().u64_parameter(TIMEOUT_KEY, DEFAULT_TIMEOUT_MS));
        let method = invocation.method_name().to_owned();
        let started = Instant::now();
        let outcome = next.invoke(invocation).await;
        let elapsed = started.elapsed();
        if elapsed > threshold {
            warn!(
                service = next.service_type().name(),
                method = %method,
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_ms = threshold.as_millis() as u64,
                "invocation exceeded its timeout threshold"
            );
        }
        outcome
    }
}
