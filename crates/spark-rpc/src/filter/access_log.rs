use async_trait::async_trait;
use tracing::info;

use crate::{error::RpcError, invocation::Invocation, invoker::Invoker, result::RpcResult};

use super::Filter;

/// 访问日志：每次调用输出一条 `info!` 记录。
///
/// 仅当 URL 携带 `accesslog` 参数时自动激活。
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessLogFilter;

#[async_trait]
impl Filter for AccessLogFilter {
    async fn invoke(&self, next: &dyn Invoker, invocation: Invocation) -> Result<RpcResult, RpcError> {
        info!(
            service = next.service_type().name(),
            method = invocation.method_name(),
            arguments = invocation.arguments().len(),
            remote = ?invocation.remote_address(),
            "rpc access"
        );
        next.invoke(invocation).await
    }
}
