//! Invoker：调用内核中唯一的“可调用单元”。
//!
//! # 设计背景（Why）
//! - 本地实现、远程连接与集群组合都被抽象成同一个能力：给定 [`Invocation`]，返回 [`RpcResult`]；
//! - Filter、Exporter、Listener 与 Proxy 只依赖此 Trait，从而与具体传输彻底解耦。
//!
//! # 契约说明（What）
//! - 普通业务失败编码在 `Ok(RpcResult)` 内；`Err` 只留给框架级故障（连接、序列化、超时、已销毁）；
//! - `destroy` 本身不保证幂等，由调用方（Exporter、ListenerInvoker）负责防重入；
//!   本模块提供 [`InvokerState`] 作为实现者可复用的一次性销毁守卫。

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

#[cfg(not(loom))]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(loom)]
use loom::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::{
    error::RpcError, invocation::Invocation, result::RpcResult, sealed::Sealed,
    service::ServiceType, url::Url,
};

/// 可调用单元。
///
/// # 教案式说明
/// - **意图 (Why)**：统一本地、远程、组合三类调用目标的对外形态；
/// - **契约 (What)**：
///   - `service_type` 与 `url` 在构造后保持不变；
///   - `invoke` 对业务失败返回 `Ok(RpcResult::from_failure(..))`，对框架故障返回 `Err(RpcError::RemoteCall{..})`；
///   - `destroy` 之后的 `invoke` 必须可预期地失败，而不是静默成功；
/// - **并发 (Concurrency)**：实现必须允许任意线程并发调用 `invoke`，每次调用的状态只存在于
///   `Invocation` / `RpcResult` 中；
/// - **风险 (Trade-offs)**：`invoke` 以 `async_trait` 装箱 Future，每次调用一次堆分配，换取对象安全。
#[async_trait]
pub trait Invoker: Send + Sync + 'static + Sealed {
    /// 服务接口身份。
    fn service_type(&self) -> &ServiceType;

    /// 关联的端点描述符。
    fn url(&self) -> &Url;

    /// 当前是否可接收调用。
    fn is_available(&self) -> bool;

    /// 执行一次调用。
    async fn invoke(&self, invocation: Invocation) -> Result<RpcResult, RpcError>;

    /// 释放资源，调用方负责保证只执行一次。
    fn destroy(&self);
}

impl fmt::Debug for dyn Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("service", &self.service_type().name())
            .field("url", &self.url().to_string())
            .field("available", &self.is_available())
            .finish()
    }
}

/// 形如 `demo.Greeter -> injvm://127.0.0.1/demo.Greeter` 的描述文本，供日志与 `Display` 使用。
pub fn describe(invoker: &dyn Invoker) -> String {
    format!("{} -> {}", invoker.service_type().name(), invoker.url())
}

/// Invoker 的对象身份：共享分配的地址。
///
/// 同一 `Arc` 的所有克隆返回相同值，不同实例必不相同（在两者都存活期间）。
pub fn invoker_addr(invoker: &Arc<dyn Invoker>) -> usize {
    Arc::as_ptr(invoker) as *const () as usize
}

/// 以对象身份计算哈希，与 [`invoker_addr`] 判等保持一致。
pub fn identity_hash<H: Hasher>(invoker: &Arc<dyn Invoker>, state: &mut H) {
    invoker_addr(invoker).hash(state);
}

/// 可复用的 Invoker 生命周期状态。
///
/// # 教案式说明
/// - **意图 (Why)**：每个具体 Invoker 都需要“可用标记 + 一次性销毁标记”，集中实现避免各自手写竞态；
/// - **契约 (What)**：
///   - [`InvokerState::mark_destroyed`] 使用单次 CAS，只有第一个调用者返回 `true`；
///   - 销毁后 [`InvokerState::is_available`] 恒为 `false`，[`InvokerState::ensure_alive`] 返回
///     `RemoteCall(Destroyed)`；
/// - **执行 (How)**：销毁写入使用 `AcqRel`，读取使用 `Acquire`，保证销毁前的资源释放对后续观察者可见。
#[derive(Debug)]
pub struct InvokerState {
    available: AtomicBool,
    destroyed: AtomicBool,
}

impl InvokerState {
    pub fn new() -> Self {
        Self::with_availability(true)
    }

    pub fn with_availability(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.is_destroyed() && self.available.load(Ordering::Acquire)
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// 标记为已销毁；仅首次调用返回 `true`。
    pub fn mark_destroyed(&self) -> bool {
        let first = self
            .destroyed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.available.store(false, Ordering::Release);
        }
        first
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// 已销毁时返回指明服务与地址的 `RemoteCall(Destroyed)` 错误。
    pub fn ensure_alive(&self, service_type: &ServiceType, url: &Url) -> Result<(), RpcError> {
        if self.is_destroyed() {
            return Err(RpcError::destroyed(service_type.name(), url));
        }
        Ok(())
    }
}

impl Default for InvokerState {
    fn default() -> Self {
        Self::new()
    }
}
