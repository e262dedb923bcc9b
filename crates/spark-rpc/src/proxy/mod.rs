//! ProxyFactory：强类型接口与 Invoker 之间的双向桥。
//!
//! # 设计背景（Why）
//! - Rust 没有运行时动态代理，调用拦截改由编译期生成的适配器完成：[`rpc_service!`](crate::rpc_service)
//!   为每个接口生成代理（接口 → Invoker）与骨架（Invoker → 实现）；
//! - 对于手头没有编译期接口的调用方，[`GenericProxy`] 以“方法名 + 参数数组”的泛化约定提供同样能力。
//!
//! # 契约说明（What）
//! - 客户端方向：[`InvocationHandler`] 把一次方法调用翻译为 [`Invocation`](crate::Invocation)，
//!   交给 Invoker 执行后以 `recreate` 还原返回值或失败；
//! - 服务端方向：[`ProxyFactory::get_invoker`] 把 [`ServiceDispatch`] 包装为本地 Invoker，供 `Protocol::export` 使用；
//! - 参数与返回值以 `serde_json::Value` 承载，编解码失败属于 `RemoteCall(Serialization)`。

mod future;
mod generic;
mod handler;
mod invoker;
mod macros;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    error::RpcError, invoker::Invoker, sealed::Sealed, service::ServiceType, url::Url,
};

pub use future::ResponseFuture;
pub use generic::GenericProxy;
pub use handler::{IDENTITY_EQ, IDENTITY_HASH, IDENTITY_TO_STRING, InvocationHandler};
pub use invoker::ProxyInvoker;

/// 服务端的类型擦除分派能力：按方法名调用实现。
///
/// # 契约说明（What）
/// - 业务失败以 [`RpcError::Service`] 返回，会被 [`ProxyInvoker`] 捕获为结果数据；
/// - 参数缺失、类型不符、方法不存在等属于框架错误，原样向上传播。
#[async_trait]
pub trait ServiceDispatch: Send + Sync + 'static + Sealed {
    fn service_type(&self) -> ServiceType;

    async fn dispatch(&self, method: &str, arguments: Vec<Value>) -> Result<Value, RpcError>;
}

/// 编译期生成的强类型代理。
pub trait RpcProxy: Sized + Send + Sync + 'static + Sealed {
    /// 代理所实现接口的服务类型。
    fn service_type() -> ServiceType;

    fn from_handler(handler: InvocationHandler) -> Self;

    fn handler(&self) -> &InvocationHandler;
}

/// 代理工厂扩展点。
///
/// # 教案式说明
/// - **意图 (Why)**：把“如何生成代理”与“如何包装实现”做成可替换扩展，缺省实现为编译期生成适配器；
/// - **契约 (What)**：
///   - `handler`：为 Invoker 构造调用处理器，`generic` 为真时允许无方法描述符的泛化调用；
///   - `get_invoker`：把服务实现包装为本地 Invoker，服务类型为空或与实现声明不一致时返回
///     [`RpcError::Construction`]；
///   - 强类型入口 `get_proxy` 与泛化入口 `get_generic_proxy` 定义在 `dyn ProxyFactory` 上，保持对象安全。
pub trait ProxyFactory: Send + Sync + 'static + Sealed {
    fn handler(&self, invoker: Arc<dyn Invoker>, generic: bool) -> Result<InvocationHandler, RpcError>;

    fn get_invoker(
        &self,
        service: Arc<dyn ServiceDispatch>,
        service_type: ServiceType,
        url: Url,
    ) -> Result<Arc<dyn Invoker>, RpcError>;
}

impl dyn ProxyFactory {
    /// 为 Invoker 生成强类型代理，服务类型必须与代理声明一致。
    pub fn get_proxy<P: RpcProxy>(&self, invoker: Arc<dyn Invoker>) -> Result<P, RpcError> {
        let expected = P::service_type();
        if invoker.service_type() != &expected {
            return Err(RpcError::construction(format!(
                "proxy for `{}` can not wrap an invoker of `{}`",
                expected.name(),
                invoker.service_type().name()
            )));
        }
        Ok(P::from_handler(self.handler(invoker, false)?))
    }

    /// 为 Invoker 生成泛化代理。
    pub fn get_generic_proxy(&self, invoker: Arc<dyn Invoker>) -> Result<GenericProxy, RpcError> {
        Ok(GenericProxy::new(self.handler(invoker, true)?))
    }
}

/// 缺省 ProxyFactory：配合 `rpc_service!` 生成的代理与骨架工作。
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultProxyFactory;

impl DefaultProxyFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ProxyFactory for DefaultProxyFactory {
    fn handler(&self, invoker: Arc<dyn Invoker>, generic: bool) -> Result<InvocationHandler, RpcError> {
        if invoker.service_type().name().is_empty() {
            return Err(RpcError::construction("proxy requires an invoker with a service type"));
        }
        Ok(InvocationHandler::new(invoker, generic))
    }

    fn get_invoker(
        &self,
        service: Arc<dyn ServiceDispatch>,
        service_type: ServiceType,
        url: Url,
    ) -> Result<Arc<dyn Invoker>, RpcError> {
        Ok(Arc::new(ProxyInvoker::new(service, service_type, url)?))
    }
}

/// 编码单个参数或返回值。
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(RpcError::from)
}

/// 解码单个参数或返回值。
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(RpcError::from)
}

/// 骨架使用：按声明顺序取出并解码下一个参数。
pub fn take_argument<T: DeserializeOwned>(
    arguments: &mut std::vec::IntoIter<Value>,
    method: &str,
    name: &str,
) -> Result<T, RpcError> {
    let value = arguments.next().ok_or_else(|| {
        RpcError::serialization(format!("method `{method}` is missing argument `{name}`"))
    })?;
    decode_value(value).map_err(|err| {
        RpcError::serialization(format!("argument `{name}` of method `{method}` is malformed"))
            .with_cause(err)
    })
}

/// 骨架使用：确认参数已全部消费。
pub fn finish_arguments(arguments: std::vec::IntoIter<Value>, method: &str) -> Result<(), RpcError> {
    match arguments.len() {
        0 => Ok(()),
        extra => Err(RpcError::serialization(format!(
            "method `{method}` received {extra} unexpected argument(s)"
        ))),
    }
}

impl fmt::Debug for dyn ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProxyFactory")
    }
}
