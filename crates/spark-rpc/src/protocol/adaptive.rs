use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::RpcError, exporter::Exporter, extension::ExtensionLoader, invoker::Invoker,
    service::ServiceType, url::Url,
};

use super::{Protocol, with_default_port};

/// 按端点描述符的协议名逐次选择具体协议。
///
/// - `export` 以 Invoker 自身 URL 的协议名选择，`refer` 以传入 URL 的协议名选择；
/// - 协议名为空时回落到扩展点缺省实现；名称未注册返回 [`RpcError::NoSuchExtension`]；
/// - `refer` 的 URL 端口为 `0` 时以所选协议的 `default_port` 补齐后再委托；导出侧 Invoker 的 URL
///   不可改写，由具体协议在绑定端点时调用 [`with_default_port`]；
/// - `destroy` 销毁所有已注册协议，`default_port` 报告缺省协议的端口（无缺省时为 `0`）。
#[derive(Clone)]
pub struct AdaptiveProtocol {
    protocols: ExtensionLoader<dyn Protocol>,
}

impl AdaptiveProtocol {
    pub fn new(protocols: ExtensionLoader<dyn Protocol>) -> Self {
        Self { protocols }
    }

    fn select(&self, url: &Url) -> Result<Arc<dyn Protocol>, RpcError> {
        self.protocols.get(url.protocol())
    }
}

#[async_trait]
impl Protocol for AdaptiveProtocol {
    fn default_port(&self) -> u16 {
        self.protocols
            .default_extension()
            .map(|protocol| protocol.default_port())
            .unwrap_or(0)
    }

    async fn export(&self, invoker: Arc<dyn Invoker>) -> Result<Arc<dyn Exporter>, RpcError> {
        let protocol = self.select(invoker.url())?;
        protocol.export(invoker).await
    }

    async fn refer(&self, service_type: ServiceType, url: Url) -> Result<Arc<dyn Invoker>, RpcError> {
        let protocol = self.select(&url)?;
        let url = with_default_port(url, protocol.as_ref());
        protocol.refer(service_type, url).await
    }

    fn destroy(&self) {
        for (_, protocol) in self.protocols.iter() {
            protocol.destroy();
        }
    }
}

impl fmt::Debug for AdaptiveProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveProtocol")
            .field("protocols", &self.protocols)
            .finish()
    }
}
