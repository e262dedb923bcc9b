#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]
#![allow(private_bounds)]
#![doc = "spark-rpc: 协议无关的远程调用内核：调用模型、Invoker、Filter 链、Exporter、Protocol、监听器与代理适配。"]
#![doc = ""]
#![doc = "== 调用路径 =="]
#![doc = "服务端：实现 → `ProxyFactory::get_invoker` → `Protocol::export`（装配提供方 Filter 链）→ `Exporter`。"]
#![doc = "客户端：`Protocol::refer`（装配消费方 Filter 链、通知监听器）→ `get_proxy` → 强类型方法调用 → `Invocation` → `RpcResult::recreate`。"]
#![doc = ""]
#![doc = "== 错误通道 =="]
#![doc = "框架级故障以 `Err(RpcError)` 立即返回；业务失败以数据形式装在 `RpcResult` 中，仅在 `recreate` 处重新浮现。"]

/// 重新导出 `async_trait`，供实现扩展点与 `rpc_service!` 展开使用，调用方无需直接依赖。
pub use async_trait::async_trait;
/// 参数与返回值的类型擦除载体。
pub use serde_json::Value;

mod sealed;

pub mod error;
pub mod exporter;
pub mod extension;
pub mod filter;
pub mod invocation;
pub mod invoker;
pub mod keys;
pub mod listener;
pub mod protocol;
pub mod proxy;
pub mod result;
pub mod service;
pub mod url;

pub use error::{ErrorCause, RemoteCallKind, RpcError, ServiceFault, codes};
pub use exporter::{BaseExporter, Exporter};
pub use extension::{ExtensionLoader, ExtensionRegistry, ExtensionRegistryBuilder};
pub use filter::{Activation, Filter, FilterCatalog, FilterChain, FilterSide};
pub use invocation::Invocation;
pub use invoker::{Invoker, InvokerState};
pub use listener::{InvokerListener, ListenerInvoker};
pub use protocol::{Endpoint, Protocol, ProtocolResources};
pub use proxy::{
    DefaultProxyFactory, GenericProxy, InvocationHandler, ProxyFactory, ResponseFuture, RpcProxy,
    ServiceDispatch,
};
pub use result::RpcResult;
pub use service::{MethodDescriptor, ServiceType};
pub use url::{Url, UrlError};
