//! Filter 链：围绕 Invoker 的嵌套装饰器。
//!
//! # 设计背景（Why）
//! - 鉴权、超时告警、访问日志等横切逻辑需要在不改动服务实现的前提下插入调用路径；
//! - 借鉴洋葱模型：外层 Filter 决定是否、以及如何调用内层，再在返回路径上加工结果。
//!
//! # 契约说明（What）
//! - 链在导出或引用时只装配一次，装配结果是线程安全、可复用的 Invoker；
//! - 第一个 Filter 位于最外层：前置阶段按 A→B→C→base 访问，后置阶段按 C→B→A 返回；
//! - Filter 返回 `Err` 即中止链路，外层 Filter 只能看到这个 `Err`，而不会收到
//!   “内层已返回结果”的后置回调；以数据形式返回的失败（`Ok(RpcResult)`）照常逐层回传。
//!
//! # 风险提示（Trade-offs）
//! - Filter 自身不得持有按调用变化的可变状态，所有逐次状态都放在 `Invocation` / `RpcResult` 中。

mod access_log;
mod activation;
mod echo;
mod timeout;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::RpcError, invocation::Invocation, invoker::Invoker, result::RpcResult, sealed::Sealed,
    service::ServiceType, url::Url,
};

pub use access_log::AccessLogFilter;
pub use activation::{Activation, FilterCatalog, FilterSide};
pub use echo::EchoFilter;
pub use timeout::TimeoutFilter;

/// 可链式组合的调用拦截器。
///
/// # 教案式说明
/// - **意图 (Why)**：以显式返回值而不是异常传播表达“短路”与“中止”；
/// - **契约 (What)**：
///   - `next` 是链中的下一环，调用 `next.invoke(invocation).await` 即进入内层；
///   - 不调用 `next` 即短路，直接返回自行构造的结果；
///   - 只允许读写附件，禁止改写方法身份（`Invocation` 不提供相应 setter）；
/// - **并发 (Concurrency)**：同一实例被所有调用共享，必须 `Send + Sync`。
#[async_trait]
pub trait Filter: Send + Sync + 'static + Sealed {
    async fn invoke(&self, next: &dyn Invoker, invocation: Invocation) -> Result<RpcResult, RpcError>;
}

/// 链中的一个节点：持有本层 Filter 与下一环。
struct FilterNode {
    base: Arc<dyn Invoker>,
    filter: Arc<dyn Filter>,
    next: Arc<dyn Invoker>,
}

#[async_trait]
impl Invoker for FilterNode {
    fn service_type(&self) -> &ServiceType {
        self.base.service_type()
    }

    fn url(&self) -> &Url {
        self.base.url()
    }

    fn is_available(&self) -> bool {
        self.base.is_available()
    }

    async fn invoke(&self, invocation: Invocation) -> Result<RpcResult, RpcError> {
        self.filter.invoke(self.next.as_ref(), invocation).await
    }

    fn destroy(&self) {
        self.base.destroy();
    }
}

/// Filter 链装配入口。
pub struct FilterChain;

impl FilterChain {
    /// 将 `filters` 按顺序嵌套在 `base` 之外，`filters[0]` 位于最外层。
    ///
    /// - 空列表直接返回 `base`，不引入额外节点；
    /// - 每个节点的服务类型、URL、可用性均取自 `base`，`destroy` 直达 `base`。
    pub fn build(base: Arc<dyn Invoker>, filters: &[Arc<dyn Filter>]) -> Arc<dyn Invoker> {
        filters.iter().rev().fold(Arc::clone(&base), |next, filter| {
            Arc::new(FilterNode {
                base: Arc::clone(&base),
                filter: Arc::clone(filter),
                next,
            }) as Arc<dyn Invoker>
        })
    }
}
