use std::{
    fmt,
    sync::{Arc, Weak},
};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::{
    error::RpcError,
    exporter::Exporter,
    invoker::Invoker,
    listener::{InvokerListener, ListenerInvoker},
    service::ServiceType,
    url::Url,
};

use super::Protocol;

/// 在协议操作前后通知 [`InvokerListener`] 的包装。
///
/// # 教案式说明
/// - **意图 (Why)**：监听器不属于 Invoker，由协议层统一在引用成功与销毁时发出通知；
/// - **契约 (What)**：
///   - `refer` 成功后把 Invoker 包装为 [`ListenerInvoker`] 并逐个通知 `referred`，单个监听器失败只记日志；
///   - `export` 同样包装 Invoker，下线销毁时通知 `destroyed`；
///   - `destroy` 先销毁本包装交出的引用方 Invoker（触发 `destroyed`），再销毁内层协议；
/// - **执行 (How)**：交出的 Invoker 以弱引用登记，调用方释放后不会被本包装延长生命周期；
/// - **风险 (Trade-offs)**：未注册任何监听器时直接透传，不增加包装层。
pub struct ProtocolListenerWrapper {
    inner: Arc<dyn Protocol>,
    listeners: Vec<Arc<dyn InvokerListener>>,
    referred: DashMap<usize, Weak<ListenerInvoker>>,
}

impl ProtocolListenerWrapper {
    pub fn new(inner: Arc<dyn Protocol>, listeners: Vec<Arc<dyn InvokerListener>>) -> Self {
        Self {
            inner,
            listeners,
            referred: DashMap::new(),
        }
    }

    /// 仍存活的已引用 Invoker 个数。
    pub fn referred_count(&self) -> usize {
        self.referred
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    fn wrap(&self, invoker: Arc<dyn Invoker>) -> Arc<ListenerInvoker> {
        Arc::new(ListenerInvoker::new(invoker, self.listeners.clone()))
    }
}

#[async_trait]
impl Protocol for ProtocolListenerWrapper {
    fn default_port(&self) -> u16 {
        self.inner.default_port()
    }

    async fn export(&self, invoker: Arc<dyn Invoker>) -> Result<Arc<dyn Exporter>, RpcError> {
        if self.listeners.is_empty() {
            return self.inner.export(invoker).await;
        }
        let wrapped: Arc<dyn Invoker> = self.wrap(invoker);
        self.inner.export(wrapped).await
    }

    async fn refer(&self, service_type: ServiceType, url: Url) -> Result<Arc<dyn Invoker>, RpcError> {
        let invoker = self.inner.refer(service_type, url).await?;
        if self.listeners.is_empty() {
            return Ok(invoker);
        }
        let wrapped = self.wrap(invoker);
        wrapped.notify_referred();
        self.referred.retain(|_, weak| weak.strong_count() > 0);
        self.referred
            .insert(Arc::as_ptr(&wrapped) as usize, Arc::downgrade(&wrapped));
        Ok(wrapped)
    }

    fn destroy(&self) {
        let keys: Vec<usize> = self.referred.iter().map(|entry| *entry.key()).collect();
        for key in keys {
            if let Some(invoker) = self
                .referred
                .remove(&key)
                .and_then(|(_, weak)| weak.upgrade())
            {
                debug!(service = invoker.service_type().name(), "destroying referred invoker");
                invoker.destroy();
            }
        }
        self.inner.destroy();
    }
}

impl fmt::Debug for ProtocolListenerWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolListenerWrapper")
            .field("listeners", &self.listeners.len())
            .field("referred", &self.referred_count())
            .finish()
    }
}
