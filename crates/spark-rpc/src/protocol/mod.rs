//! Protocol：可插拔传输抽象。
//!
//! # 设计背景（Why）
//! - 传输层（进程内、TCP、HTTP…）的差异被收敛到 `export` / `refer` / `destroy` 三个动作；
//! - 导出、引用链路上的公共横切能力（Filter 装配、监听器通知）以包装器形式叠加，不进入具体协议；
//! - [`ProtocolResources`] 为具体协议提供可复用的导出表、端点表与引用表，保证幂等与可重入。
//!
//! # 状态机（How）
//! - `idle → export/refer → active(N exported, M referred) → destroy → idle`，`idle → active` 可无限次重入；
//! - `destroy` 释放一切资源，但不禁用实例，之后的 `export` / `refer` 会重新申请资源。
//!
//! # 契约说明（What）
//! - `export` 对服务键幂等：同一 (服务类型, 端点) 第二次导出不得创建第二个监听端点；
//! - `refer` 在 `check=false` 时不得因初次连接失败而报错，返回的 Invoker 负责后续恢复；
//! - 传输实现必须在派发每个入站请求前调用 [`Invocation::set_remote_address`](crate::Invocation::set_remote_address)
//!   记录调用方地址。

mod adaptive;
mod filter_wrapper;
mod listener_wrapper;
mod resources;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::RpcError, exporter::Exporter, invoker::Invoker, sealed::Sealed, service::ServiceType,
    url::Url,
};

pub use adaptive::AdaptiveProtocol;
pub use filter_wrapper::ProtocolFilterWrapper;
pub use listener_wrapper::ProtocolListenerWrapper;
pub use resources::{Endpoint, ExporterDirectory, InvokerRegistration, ProtocolResources};

/// 传输协议扩展点。
///
/// # 教案式说明
/// - **意图 (Why)**：让服务的发布与获取对上层透明，换协议只需换扩展名；
/// - **契约 (What)**：
///   - `default_port`：端点描述符缺省端口（`0`）时采用的端口；
///   - `export`：发布 Invoker，返回的 Exporter 持有端点存活；同一服务键重复导出返回既有 Exporter；
///   - `refer`：返回转发到远端的 Invoker；`check` 关闭时必须返回可用（可能尚未连通）的 Invoker；
///   - `destroy`：尽力释放全部资源，单个端点失败不影响其余端点，之后实例仍可继续使用；
/// - **并发 (Concurrency)**：实例在进程内共享，所有方法都可被并发调用。
#[async_trait]
pub trait Protocol: Send + Sync + 'static + Sealed {
    fn default_port(&self) -> u16;

    async fn export(&self, invoker: Arc<dyn Invoker>) -> Result<Arc<dyn Exporter>, RpcError>;

    async fn refer(&self, service_type: ServiceType, url: Url) -> Result<Arc<dyn Invoker>, RpcError>;

    fn destroy(&self);
}

/// 端口为 `0` 时以协议缺省端口补齐。
///
/// [`AdaptiveProtocol`] 在 `refer` 前调用；具体协议在导出绑定端点前调用。
pub fn with_default_port(url: Url, protocol: &dyn Protocol) -> Url {
    if url.port() == 0 {
        let port = protocol.default_port();
        url.with_port(port)
    } else {
        url
    }
}
