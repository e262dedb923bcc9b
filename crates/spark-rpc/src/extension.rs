//! 显式扩展注册表：名称 → 单例实现。
//!
//! # 设计背景（Why）
//! - Protocol、Filter、ProxyFactory、InvokerListener 都是可插拔扩展点，需要“按名获取单例”
//!   与“按端点描述符参数自适应选择”两种查找方式；
//! - 注册表在进程启动时用构建器一次性装配，随后冻结并显式传递给需要的组件，不引入全局可变状态。
//!
//! # 契约说明（What）
//! - 每个扩展点可指定一个缺省名称，`""` 与 `"default"` 均解析为缺省实现；
//! - 名称未注册返回 [`RpcError::NoSuchExtension`]；
//! - [`ExtensionRegistry`] 中的协议已按 `ListenerWrapper(FilterWrapper(protocol))` 包装且只包装一次。

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    error::RpcError,
    filter::{AccessLogFilter, Activation, EchoFilter, Filter, FilterCatalog, TimeoutFilter},
    keys::{ACCESS_LOG_KEY, DEFAULT_KEY, DEFAULT_PROTOCOL, DEFAULT_PROXY_FACTORY, PROXY_KEY},
    listener::InvokerListener,
    protocol::{AdaptiveProtocol, Protocol, ProtocolFilterWrapper, ProtocolListenerWrapper},
    proxy::{DefaultProxyFactory, ProxyFactory},
    url::Url,
};

/// 单个扩展点的具名实现表。
pub struct ExtensionLoader<T: ?Sized> {
    point: &'static str,
    default_name: Option<String>,
    extensions: BTreeMap<String, Arc<T>>,
}

impl<T: ?Sized> ExtensionLoader<T> {
    pub fn new(point: &'static str) -> Self {
        Self {
            point,
            default_name: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_name = Some(name.into());
    }

    /// 注册实现，返回被同名替换的旧实现。
    pub fn register(&mut self, name: impl Into<String>, extension: Arc<T>) -> Option<Arc<T>> {
        self.extensions.insert(name.into(), extension)
    }

    pub fn point(&self) -> &'static str {
        self.point
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    /// 按名称获取单例；`""` 与 `"default"` 解析为缺省实现。
    pub fn get(&self, name: &str) -> Result<Arc<T>, RpcError> {
        let resolved = match name {
            "" | DEFAULT_KEY => self.default_name.as_deref().unwrap_or(DEFAULT_KEY),
            other => other,
        };
        self.extensions
            .get(resolved)
            .cloned()
            .ok_or_else(|| RpcError::NoSuchExtension {
                point: self.point,
                name: resolved.to_owned(),
            })
    }

    pub fn default_extension(&self) -> Result<Arc<T>, RpcError> {
        self.get(DEFAULT_KEY)
    }

    /// 读取 `url` 中 `key` 参数作为扩展名，缺失时回落到缺省实现。
    pub fn adaptive(&self, url: &Url, key: &str) -> Result<Arc<T>, RpcError> {
        self.get(url.parameter_or(key, ""))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<T>)> {
        self.extensions
            .iter()
            .map(|(name, extension)| (name.as_str(), extension))
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    fn map<U: ?Sized>(&self, mut wrap: impl FnMut(&Arc<T>) -> Arc<U>) -> ExtensionLoader<U> {
        ExtensionLoader {
            point: self.point,
            default_name: self.default_name.clone(),
            extensions: self
                .extensions
                .iter()
                .map(|(name, extension)| (name.clone(), wrap(extension)))
                .collect(),
        }
    }
}

impl<T: ?Sized> Clone for ExtensionLoader<T> {
    fn clone(&self) -> Self {
        Self {
            point: self.point,
            default_name: self.default_name.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ExtensionLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionLoader")
            .field("point", &self.point)
            .field("default", &self.default_name)
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// 扩展注册表构建器。
///
/// # 教案式说明
/// - **意图 (Why)**：进程启动阶段集中登记全部扩展，构建完成后不可变；
/// - **契约 (What)**：
///   - 内置 Filter `echo`、`timeout`、`accesslog` 与缺省 ProxyFactory `generated` 自动登记；
///   - Protocol 缺省名为 `dubbo`，可通过 [`ExtensionRegistryBuilder::default_protocol`] 覆盖；
///   - [`ExtensionRegistryBuilder::build`] 对每个协议恰好包装一次监听器与 Filter 层。
pub struct ExtensionRegistryBuilder {
    protocols: ExtensionLoader<dyn Protocol>,
    filters: FilterCatalog,
    listeners: Vec<Arc<dyn InvokerListener>>,
    proxy_factories: ExtensionLoader<dyn ProxyFactory>,
}

impl ExtensionRegistryBuilder {
    pub fn new() -> Self {
        let mut filters = FilterCatalog::new();
        filters
            .register(
                "echo",
                Activation::provider().with_order(EchoFilter::ORDER),
                Arc::new(EchoFilter),
            )
            .register("timeout", Activation::provider(), Arc::new(TimeoutFilter))
            .register(
                "accesslog",
                Activation::provider().with_required_key(ACCESS_LOG_KEY),
                Arc::new(AccessLogFilter),
            );

        let mut proxy_factories =
            ExtensionLoader::<dyn ProxyFactory>::new("proxy_factory").with_default(DEFAULT_PROXY_FACTORY);
        proxy_factories.register(DEFAULT_PROXY_FACTORY, Arc::new(DefaultProxyFactory::new()));

        Self {
            protocols: ExtensionLoader::new("protocol").with_default(DEFAULT_PROTOCOL),
            filters,
            listeners: Vec::new(),
            proxy_factories,
        }
    }

    pub fn register_protocol(mut self, name: impl Into<String>, protocol: Arc<dyn Protocol>) -> Self {
        self.protocols.register(name, protocol);
        self
    }

    pub fn default_protocol(mut self, name: impl Into<String>) -> Self {
        self.protocols.set_default(name);
        self
    }

    pub fn register_filter(
        mut self,
        name: impl Into<String>,
        activation: Activation,
        filter: Arc<dyn Filter>,
    ) -> Self {
        self.filters.register(name, activation, filter);
        self
    }

    pub fn register_listener(mut self, listener: Arc<dyn InvokerListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn register_proxy_factory(
        mut self,
        name: impl Into<String>,
        factory: Arc<dyn ProxyFactory>,
    ) -> Self {
        self.proxy_factories.register(name, factory);
        self
    }

    pub fn default_proxy_factory(mut self, name: impl Into<String>) -> Self {
        self.proxy_factories.set_default(name);
        self
    }

    pub fn build(self) -> ExtensionRegistry {
        let filters = Arc::new(self.filters);
        let listeners = self.listeners;
        let protocols = self.protocols.map(|protocol| {
            let filtered: Arc<dyn Protocol> = Arc::new(ProtocolFilterWrapper::new(
                Arc::clone(protocol),
                Arc::clone(&filters),
            ));
            Arc::new(ProtocolListenerWrapper::new(filtered, listeners.clone())) as Arc<dyn Protocol>
        });
        ExtensionRegistry {
            protocols,
            filters,
            listeners,
            proxy_factories: self.proxy_factories,
        }
    }
}

impl Default for ExtensionRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 冻结后的扩展注册表。
#[derive(Clone)]
pub struct ExtensionRegistry {
    protocols: ExtensionLoader<dyn Protocol>,
    filters: Arc<FilterCatalog>,
    listeners: Vec<Arc<dyn InvokerListener>>,
    proxy_factories: ExtensionLoader<dyn ProxyFactory>,
}

impl ExtensionRegistry {
    pub fn builder() -> ExtensionRegistryBuilder {
        ExtensionRegistryBuilder::new()
    }

    /// 已包装的具名协议。
    pub fn protocol(&self, name: &str) -> Result<Arc<dyn Protocol>, RpcError> {
        self.protocols.get(name)
    }

    pub fn protocols(&self) -> &ExtensionLoader<dyn Protocol> {
        &self.protocols
    }

    /// 按 URL 协议名逐次选择的自适应协议。
    pub fn adaptive_protocol(&self) -> AdaptiveProtocol {
        AdaptiveProtocol::new(self.protocols.clone())
    }

    pub fn proxy_factory(&self, name: &str) -> Result<Arc<dyn ProxyFactory>, RpcError> {
        self.proxy_factories.get(name)
    }

    /// 读取 URL 参数 `proxy` 选择 ProxyFactory。
    pub fn adaptive_proxy_factory(&self, url: &Url) -> Result<Arc<dyn ProxyFactory>, RpcError> {
        self.proxy_factories.adaptive(url, PROXY_KEY)
    }

    pub fn filters(&self) -> &FilterCatalog {
        &self.filters
    }

    pub fn listeners(&self) -> &[Arc<dyn InvokerListener>] {
        &self.listeners
    }

    /// 销毁全部协议。
    pub fn destroy(&self) {
        for (_, protocol) in self.protocols.iter() {
            protocol.destroy();
        }
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("protocols", &self.protocols)
            .field("filters", &self.filters)
            .field("listeners", &self.listeners.len())
            .field("proxy_factories", &self.proxy_factories)
            .finish()
    }
}
