use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::RpcError,
    exporter::Exporter,
    filter::{FilterCatalog, FilterChain, FilterSide},
    invoker::Invoker,
    keys::{REFERENCE_FILTER_KEY, SERVICE_FILTER_KEY},
    service::ServiceType,
    url::Url,
};

use super::Protocol;

/// 在导出与引用路径上装配 Filter 链的协议包装。
///
/// # 契约说明（What）
/// - `export`：以 `service.filter` 选择提供方 Filter，包裹 Invoker 后交给内层协议；
/// - `refer`：内层协议返回 Invoker 后，以 `reference.filter` 选择消费方 Filter 包裹；
/// - 选择失败（未注册的显式名称）在调用内层协议之前或之后立即以错误返回，链不会被部分装配。
pub struct ProtocolFilterWrapper {
    inner: Arc<dyn Protocol>,
    filters: Arc<FilterCatalog>,
}

impl ProtocolFilterWrapper {
    pub fn new(inner: Arc<dyn Protocol>, filters: Arc<FilterCatalog>) -> Self {
        Self { inner, filters }
    }
}

#[async_trait]
impl Protocol for ProtocolFilterWrapper {
    fn default_port(&self) -> u16 {
        self.inner.default_port()
    }

    async fn export(&self, invoker: Arc<dyn Invoker>) -> Result<Arc<dyn Exporter>, RpcError> {
        let filters = self
            .filters
            .activate(invoker.url(), SERVICE_FILTER_KEY, FilterSide::Provider)?;
        self.inner.export(FilterChain::build(invoker, &filters)).await
    }

    async fn refer(&self, service_type: ServiceType, url: Url) -> Result<Arc<dyn Invoker>, RpcError> {
        let filters = self
            .filters
            .activate(&url, REFERENCE_FILTER_KEY, FilterSide::Consumer)?;
        let invoker = self.inner.refer(service_type, url).await?;
        Ok(FilterChain::build(invoker, &filters))
    }

    fn destroy(&self) {
        self.inner.destroy();
    }
}

impl fmt::Debug for ProtocolFilterWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolFilterWrapper")
            .field("filters", &self.filters)
            .finish()
    }
}
