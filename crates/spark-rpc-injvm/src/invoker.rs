use std::{
    fmt,
    net::{Ipv4Addr, SocketAddr},
};

use spark_rpc::{
    Invocation, Invoker, InvokerState, RemoteCallKind, RpcError, RpcResult, ServiceType, Url,
    async_trait,
    protocol::{ExporterDirectory, InvokerRegistration},
};
use tracing::debug;

/// 进程内调用登记的调用方地址。
const LOCAL_CALLER: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 0);

/// 引用方 Invoker：每次调用按服务键查找导出表，并直接调用提供方 Invoker。
///
/// # 教案式说明
/// - **意图 (Why)**：`check=false` 的引用需要在提供方稍后上线时自动恢复，提供方下线后立即失效；
/// - **契约 (What)**：
///   - `is_available()` 仅在自身未销毁且导出表存在对应键时为真；
///   - 无提供方时调用返回 `RemoteCall(Network)`，销毁后返回 `RemoteCall(Destroyed)`；
///   - 提供方看到的调用方地址固定为 `127.0.0.1:0`；
///   - 首次 `destroy` 撤销在协议引用表中的登记；
/// - **执行 (How)**：持有 [`ExporterDirectory`] 只读句柄，不缓存 Exporter；
/// - **风险 (Trade-offs)**：每次调用一次 `DashMap` 查找，换取上下线即时可见。
pub struct InjvmInvoker {
    service_type: ServiceType,
    url: Url,
    key: String,
    exporters: ExporterDirectory,
    state: InvokerState,
    registration: InvokerRegistration,
}

impl InjvmInvoker {
    pub fn new(
        service_type: ServiceType,
        url: Url,
        key: String,
        exporters: ExporterDirectory,
        registration: InvokerRegistration,
    ) -> Self {
        Self {
            service_type,
            url,
            key,
            exporters,
            state: InvokerState::new(),
            registration,
        }
    }

    /// 查找使用的服务键。
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl Invoker for InjvmInvoker {
    fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn is_available(&self) -> bool {
        self.state.is_available() && self.exporters.contains(&self.key)
    }

    async fn invoke(&self, mut invocation: Invocation) -> Result<RpcResult, RpcError> {
        self.state.ensure_alive(&self.service_type, &self.url)?;
        let exporter = self.exporters.get(&self.key).ok_or_else(|| {
            RpcError::remote(
                RemoteCallKind::Network,
                format!("no in-process provider for `{}` at {}", self.key, self.url),
            )
        })?;
        invocation.set_remote_address(LOCAL_CALLER);
        exporter.invoker().invoke(invocation).await
    }

    fn destroy(&self) {
        if self.state.mark_destroyed() {
            self.registration.release();
            debug!(service = %self.key, "in-process invoker destroyed");
        }
    }
}

impl fmt::Debug for InjvmInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjvmInvoker")
            .field("key", &self.key)
            .field("url", &self.url.to_string())
            .field("destroyed", &self.state.is_destroyed())
            .finish()
    }
}
