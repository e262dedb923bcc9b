use std::fmt;

use serde_json::Value;

use crate::keys::ECHO_METHOD;

use super::{InvocationHandler, ResponseFuture};

/// 泛化代理：调用方只知道方法名与参数，不持有编译期接口。
///
/// 调用会携带 `generic` 附件；服务类型声明了该方法时沿用其参数类型，否则以不透明类型发送。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericProxy {
    handler: InvocationHandler,
}

impl GenericProxy {
    pub fn new(handler: InvocationHandler) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &InvocationHandler {
        &self.handler
    }

    /// 按名称调用。名称带 `_async` 后缀时同样按异步约定分派。
    pub fn invoke(&self, method: &str, arguments: Vec<Value>) -> ResponseFuture<Value> {
        self.handler.call_future(method, arguments)
    }

    /// 回声探活。
    pub fn echo(&self, value: Value) -> ResponseFuture<Value> {
        self.invoke(ECHO_METHOD, vec![value])
    }
}

impl fmt::Display for GenericProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.handler, f)
    }
}
