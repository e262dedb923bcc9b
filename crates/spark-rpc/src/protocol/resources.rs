use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::{debug, warn};

use crate::{
    error::RpcError,
    exporter::Exporter,
    invoker::{Invoker, invoker_addr},
    sealed::Sealed,
};

/// 协议持有的监听端点（服务端 socket、进程内注册点等）。
pub trait Endpoint: Send + Sync + 'static + Sealed {
    /// `host:port` 形式的绑定地址，作为共享键。
    fn address(&self) -> &str;

    /// 关闭端点。失败只影响本端点，协议会继续关闭其余端点。
    fn close(&self) -> Result<(), RpcError>;
}

/// 协议实例的资源台账。
///
/// # 教案式说明
/// - **意图 (Why)**：每个具体协议都需要“导出表 + 端点表 + 引用表”，并且都要满足导出幂等、
///   销毁后可重入、逐端点隔离失败三条契约，集中实现避免各协议各写一遍；
/// - **契约 (What)**：
///   - [`ProtocolResources::export_with`] 以服务键去重，重复导出不会调用 `create`；
///     表中已下线（正在拆除）的 Exporter 视为空位，重新导出会替换它；
///   - [`ProtocolResources::endpoint_or_bind`] 以地址去重，同一地址只绑定一次；
///   - [`ProtocolResources::track_invoker`] 登记引用方 Invoker，登记在其 `destroy` 或被丢弃后撤销；
///   - [`ProtocolResources::destroy_all`] 清空全部表，之后可再次导出与引用；
/// - **执行 (How)**：三张表均为 `DashMap`，通过 entry API 保证“检查 + 插入”原子完成；
///   引用表只持有弱引用，不延长调用方丢弃的 Invoker 的生命周期；
/// - **风险 (Trade-offs)**：`create` / `bind` 闭包在持有分片锁期间执行，闭包内不得再访问同一张表。
#[derive(Clone, Default)]
pub struct ProtocolResources {
    exporters: Arc<DashMap<String, Arc<dyn Exporter>>>,
    endpoints: Arc<DashMap<String, Arc<dyn Endpoint>>>,
    invokers: Arc<DashMap<u64, Weak<dyn Invoker>>>,
    next_invoker_id: Arc<AtomicU64>,
}

impl ProtocolResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按服务键导出；已存在时直接返回既有 Exporter。
    pub fn export_with<F>(&self, key: impl Into<String>, create: F) -> Result<Arc<dyn Exporter>, RpcError>
    where
        F: FnOnce() -> Result<Arc<dyn Exporter>, RpcError>,
    {
        match self.exporters.entry(key.into()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_unexported() {
                    debug!(key = %entry.key(), "replacing exporter that is being unexported");
                    let exporter = create()?;
                    entry.insert(Arc::clone(&exporter));
                    return Ok(exporter);
                }
                debug!(key = %entry.key(), "service already exported; reusing exporter");
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => {
                let exporter = create()?;
                entry.insert(Arc::clone(&exporter));
                Ok(exporter)
            }
        }
    }

    /// 构造 Exporter 的下线钩子：仅当表项仍属于 `invoker` 且已下线时才移除。
    ///
    /// 钩子只持有导出表的弱引用，不会与表中的 Exporter 形成环。
    /// 同键已被重新导出的新 Exporter 尚未下线，不会被旧钩子移除。
    pub fn unexport_hook(
        &self,
        key: impl Into<String>,
        invoker: &Arc<dyn Invoker>,
    ) -> impl Fn() + Send + Sync + 'static {
        let exporters = Arc::downgrade(&self.exporters);
        let key = key.into();
        let owner = invoker_addr(invoker);
        move || {
            if let Some(exporters) = exporters.upgrade() {
                exporters.remove_if(&key, |_, exporter| {
                    exporter.is_unexported() && invoker_addr(exporter.invoker()) == owner
                });
            }
        }
    }

    /// 导出表的只读视图，供引用方逐次查找。
    pub fn exporters(&self) -> ExporterDirectory {
        ExporterDirectory {
            exporters: Arc::clone(&self.exporters),
        }
    }

    /// 获取或绑定地址对应的端点。
    pub fn endpoint_or_bind<F>(&self, address: impl Into<String>, bind: F) -> Result<Arc<dyn Endpoint>, RpcError>
    where
        F: FnOnce() -> Result<Arc<dyn Endpoint>, RpcError>,
    {
        match self.endpoints.entry(address.into()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let endpoint = bind()?;
                debug!(endpoint = endpoint.address(), "endpoint bound");
                entry.insert(Arc::clone(&endpoint));
                Ok(endpoint)
            }
        }
    }

    /// 构造并登记引用方 Invoker，协议销毁时一并销毁。
    ///
    /// - `create` 收到本次登记的 [`InvokerRegistration`]，Invoker 应在自身 `destroy` 时调用
    ///   [`InvokerRegistration::release`] 撤销登记；
    /// - 表中只保存弱引用，调用方丢弃的 Invoker 在下一次登记时被清理。
    pub fn track_invoker<I, F>(&self, create: F) -> Arc<I>
    where
        I: Invoker,
        F: FnOnce(InvokerRegistration) -> I,
    {
        let id = self.next_invoker_id.fetch_add(1, Ordering::Relaxed);
        let invoker = Arc::new(create(InvokerRegistration {
            id,
            invokers: Arc::downgrade(&self.invokers),
        }));
        let erased: Arc<dyn Invoker> = invoker.clone();
        self.invokers.retain(|_, tracked| tracked.strong_count() > 0);
        self.invokers.insert(id, Arc::downgrade(&erased));
        invoker
    }

    pub fn exporter_count(&self) -> usize {
        self.exporters.len()
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// 已绑定端点的地址，按字典序排列。
    pub fn endpoint_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self
            .endpoints
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        addresses.sort();
        addresses
    }

    /// 仍存活的已登记引用方 Invoker 数。
    pub fn invoker_count(&self) -> usize {
        self.invokers
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    /// 释放全部资源：关闭端点、销毁引用方 Invoker、下线 Exporter。
    ///
    /// - 先把表项逐个移出再执行回调，回调期间不持有任何分片锁；
    /// - 端点关闭失败以 `warn!` 记录并继续，返回失败个数；
    /// - 返回后三张表为空，协议可以再次导出与引用。
    pub fn destroy_all(&self, protocol: &str) -> usize {
        let mut failures = 0;
        for endpoint in drain(&self.endpoints) {
            if let Err(err) = endpoint.close() {
                failures += 1;
                warn!(
                    protocol,
                    endpoint = endpoint.address(),
                    error = %err,
                    "failed to close endpoint; continuing teardown"
                );
            }
        }
        for invoker in drain(&self.invokers).iter().filter_map(Weak::upgrade) {
            debug!(protocol, service = invoker.service_type().name(), "destroying referred invoker");
            invoker.destroy();
        }
        for exporter in drain(&self.exporters) {
            exporter.unexport();
        }
        failures
    }
}

fn drain<K, V>(map: &DashMap<K, V>) -> Vec<V>
where
    K: Eq + std::hash::Hash + Clone,
{
    let keys: Vec<K> = map.iter().map(|entry| entry.key().clone()).collect();
    keys.into_iter()
        .filter_map(|key| map.remove(&key).map(|(_, value)| value))
        .collect()
}

impl fmt::Debug for ProtocolResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolResources")
            .field("exporters", &self.exporter_count())
            .field("endpoints", &self.endpoint_count())
            .field("invokers", &self.invoker_count())
            .finish()
    }
}

/// 引用方 Invoker 在登记表中的席位。
///
/// 只持有登记表的弱引用；[`InvokerRegistration::release`] 可重复调用，登记表已释放时什么也不做。
pub struct InvokerRegistration {
    id: u64,
    invokers: Weak<DashMap<u64, Weak<dyn Invoker>>>,
}

impl InvokerRegistration {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 撤销登记。
    pub fn release(&self) {
        if let Some(invokers) = self.invokers.upgrade() {
            invokers.remove(&self.id);
        }
    }
}

impl fmt::Debug for InvokerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokerRegistration")
            .field("id", &self.id)
            .finish()
    }
}

/// 导出表的只读句柄。
#[derive(Clone)]
pub struct ExporterDirectory {
    exporters: Arc<DashMap<String, Arc<dyn Exporter>>>,
}

impl ExporterDirectory {
    pub fn get(&self, key: &str) -> Option<Arc<dyn Exporter>> {
        self.exporters.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.exporters.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.exporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exporters.is_empty()
    }
}

impl fmt::Debug for ExporterDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterDirectory")
            .field("exporters", &self.len())
            .finish()
    }
}
