//! InvokerListener：引用与销毁事件的旁路观察者。
//!
//! # 设计背景（Why）
//! - 监控、注册中心上报等组件需要感知“某个 Invoker 被引用了 / 被销毁了”，但 Invoker 本身不应认识它们；
//! - 因此通知由 Protocol 层（[`crate::protocol::ProtocolListenerWrapper`]）发出，监听器独立注册。
//!
//! # 契约说明（What）
//! - `referred` 在一次成功的 `refer` 之后调用一次，`destroyed` 在该 Invoker 销毁时调用一次；
//! - 单个监听器失败不会中止 `refer` / `destroy`，也不会阻止后续监听器收到通知：失败以 `warn!` 记录后继续。

use std::{fmt, sync::Arc};

#[cfg(not(loom))]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(loom)]
use loom::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::warn;

use crate::{
    error::RpcError, invocation::Invocation, invoker::Invoker, result::RpcResult, sealed::Sealed,
    service::ServiceType, url::Url,
};

/// Invoker 生命周期监听器。
pub trait InvokerListener: Send + Sync + 'static + Sealed {
    /// 引用成功后回调。返回错误只会被记录。
    fn referred(&self, invoker: &dyn Invoker) -> Result<(), RpcError>;

    /// Invoker 销毁时回调。
    fn destroyed(&self, invoker: &dyn Invoker);
}

/// 携带监听器的 Invoker 包装。
///
/// # 教案式说明
/// - **意图 (Why)**：让“销毁时通知”与 Invoker 的销毁路径绑定，而不依赖调用方记得发通知；
/// - **契约 (What)**：
///   - `destroy` 由一次性守卫保护：首次调用销毁内层 Invoker，然后依次通知每个监听器的 `destroyed`；
///   - [`ListenerInvoker::notify_referred`] 逐个通知 `referred`，失败隔离；
///   - 元数据与 `invoke` 全部透传给内层。
pub struct ListenerInvoker {
    inner: Arc<dyn Invoker>,
    listeners: Vec<Arc<dyn InvokerListener>>,
    destroyed: AtomicBool,
}

impl ListenerInvoker {
    pub fn new(inner: Arc<dyn Invoker>, listeners: Vec<Arc<dyn InvokerListener>>) -> Self {
        Self {
            inner,
            listeners,
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Invoker> {
        &self.inner
    }

    /// 通知全部监听器 `referred`，返回失败的监听器个数。
    pub fn notify_referred(&self) -> usize {
        let mut failures = 0;
        for (index, listener) in self.listeners.iter().enumerate() {
            if let Err(err) = listener.referred(self.inner.as_ref()) {
                failures += 1;
                warn!(
                    listener = index,
                    service = self.inner.service_type().name(),
                    url = %self.inner.url(),
                    error = %err,
                    "invoker listener failed on referred; continuing with remaining listeners"
                );
            }
        }
        failures
    }
}

#[async_trait]
impl Invoker for ListenerInvoker {
    fn service_type(&self) -> &ServiceType {
        self.inner.service_type()
    }

    fn url(&self) -> &Url {
        self.inner.url()
    }

    fn is_available(&self) -> bool {
        !self.destroyed.load(Ordering::Acquire) && self.inner.is_available()
    }

    async fn invoke(&self, invocation: Invocation) -> Result<RpcResult, RpcError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(RpcError::destroyed(
                self.inner.service_type().name(),
                self.inner.url(),
            ));
        }
        self.inner.invoke(invocation).await
    }

    fn destroy(&self) {
        if self
            .destroyed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.inner.destroy();
        for listener in &self.listeners {
            listener.destroyed(self.inner.as_ref());
        }
    }
}

impl fmt::Debug for ListenerInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerInvoker")
            .field("inner", &self.inner)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
