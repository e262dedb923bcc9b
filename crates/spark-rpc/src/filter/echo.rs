use async_trait::async_trait;

use crate::{
    error::RpcError, invocation::Invocation, invoker::Invoker, keys::ECHO_METHOD,
    result::RpcResult,
};

use super::Filter;

/// 回声探活：`$echo(x)` 直接返回 `x`，不触达服务实现。
///
/// 只拦截恰好携带一个参数的调用，其余请求原样下传。
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoFilter;

impl EchoFilter {
    /// 提供方侧，位于链的最外层附近。
    pub const ORDER: i32 = -110_000;
}

#[async_trait]
impl Filter for EchoFilter {
    async fn invoke(&self, next: &dyn Invoker, invocation: Invocation) -> Result<RpcResult, RpcError> {
        if invocation.method_name() == ECHO_METHOD && invocation.arguments().len() == 1 {
            let mut arguments = invocation.into_arguments();
            return Ok(RpcResult::from_value(arguments.remove(0)));
        }
        next.invoke(invocation).await
    }
}
