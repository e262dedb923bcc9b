use std::{fmt, sync::Arc};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::RpcError,
    invocation::Invocation,
    invoker::{Invoker, InvokerState},
    result::RpcResult,
    service::ServiceType,
    url::Url,
};

use super::ServiceDispatch;

/// 包装服务实现的本地 Invoker，作为 `Protocol::export` 的输入。
///
/// # 教案式说明
/// - **意图 (Why)**：服务端把“调用进程内对象”也表达为 Invoker，从而复用 Filter 链与协议导出；
/// - **契约 (What)**：
///   - 构造时校验服务类型非空、URL 协议非空，且实现声明的服务类型与之一致；
///   - 业务失败（[`RpcError::Service`]）被捕获为 `Ok(RpcResult::from_failure(..))`，框架错误原样返回；
///   - 销毁后调用返回 `RemoteCall(Destroyed)`。
pub struct ProxyInvoker {
    service: Arc<dyn ServiceDispatch>,
    service_type: ServiceType,
    url: Url,
    state: InvokerState,
}

impl ProxyInvoker {
    pub fn new(
        service: Arc<dyn ServiceDispatch>,
        service_type: ServiceType,
        url: Url,
    ) -> Result<Self, RpcError> {
        if service_type.name().is_empty() {
            return Err(RpcError::construction("service type must not be empty"));
        }
        if url.protocol().is_empty() {
            return Err(RpcError::construction("endpoint descriptor must name a protocol"));
        }
        let declared = service.service_type();
        if declared != service_type {
            return Err(RpcError::construction(format!(
                "implementation of `{}` can not be exposed as `{}`",
                declared.name(),
                service_type.name()
            )));
        }
        Ok(Self {
            service,
            service_type,
            url,
            state: InvokerState::new(),
        })
    }
}

#[async_trait]
impl Invoker for ProxyInvoker {
    fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn is_available(&self) -> bool {
        self.state.is_available()
    }

    async fn invoke(&self, invocation: Invocation) -> Result<RpcResult, RpcError> {
        self.state.ensure_alive(&self.service_type, &self.url)?;
        let method = invocation.method_name().to_owned();
        match self.service.dispatch(&method, invocation.into_arguments()).await {
            Ok(value) => Ok(RpcResult::from_value(value)),
            Err(err) if err.is_service() => Ok(RpcResult::from_failure(err)),
            Err(err) => Err(err),
        }
    }

    fn destroy(&self) {
        if self.state.mark_destroyed() {
            debug!(service = self.service_type.name(), url = %self.url, "local invoker destroyed");
        }
    }
}

impl fmt::Debug for ProxyInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInvoker")
            .field("service", &self.service_type.name())
            .field("url", &self.url.to_string())
            .field("destroyed", &self.state.is_destroyed())
            .finish()
    }
}
