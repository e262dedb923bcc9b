use std::{
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde_json::Value;

use crate::{
    error::RpcError,
    invocation::Invocation,
    invoker::{Invoker, describe, identity_hash, invoker_addr},
    keys::{ASYNC_KEY, ASYNC_SUFFIX, ECHO_METHOD, FUTURE_KEY, GENERIC_KEY, TRUE_VALUE},
    result::RpcResult,
};

use super::ResponseFuture;

/// 身份方法：字符串表示。
pub const IDENTITY_TO_STRING: &str = "to_string";
/// 身份方法：哈希值。
pub const IDENTITY_HASH: &str = "hash";
/// 身份方法：判等，参数为另一代理的身份令牌。
pub const IDENTITY_EQ: &str = "eq";

/// 无描述符调用的参数类型名。
const OPAQUE_PARAMETER_TYPE: &str = "object";

/// 客户端调用处理器：把“方法名 + 参数”翻译为 Invocation 并驱动 Invoker。
///
/// # 教案式说明
/// - **意图 (Why)**：所有强类型代理与泛化代理共用同一条分派路径，保证异步后缀、回声、身份方法的语义一致；
/// - **契约 (What)**：
///   1. 身份方法（`to_string` / `hash` / `eq`）直接依据 Invoker 对象身份作答，不构造 Invocation，也不触达传输；
///      服务类型自身声明了同名同参方法时不拦截；
///   2. 方法名精确匹配描述符时按描述符构造 Invocation；
///   3. 否则若带有 `_async` 后缀，去掉后缀按参数个数查找同步方法描述符，并写入 `future` 与 `async` 附件；
///   4. 泛化处理器允许无描述符调用并写入 `generic` 附件；强类型处理器找不到方法返回 `NoSuchMethod`；
///   5. 调用 `invoker.invoke`，再以 `recreate` 还原返回值或被捕获的失败；
/// - **并发 (Concurrency)**：处理器只持有 `Arc<dyn Invoker>`，可自由克隆并跨线程使用。
#[derive(Clone)]
pub struct InvocationHandler {
    invoker: Arc<dyn Invoker>,
    generic: bool,
}

impl InvocationHandler {
    pub fn new(invoker: Arc<dyn Invoker>, generic: bool) -> Self {
        Self { invoker, generic }
    }

    pub fn invoker(&self) -> &Arc<dyn Invoker> {
        &self.invoker
    }

    pub fn is_generic(&self) -> bool {
        self.generic
    }

    /// 对象身份，同一 Invoker 上的处理器相同。
    pub fn identity(&self) -> usize {
        invoker_addr(&self.invoker)
    }

    /// `eq` 身份方法使用的比较令牌。
    pub fn identity_token(&self) -> Value {
        Value::from(self.identity() as u64)
    }

    /// 身份方法的直接应答；非身份方法返回 `None`。
    pub fn answer_identity(&self, method: &str, arguments: &[Value]) -> Option<Value> {
        if self
            .invoker
            .service_type()
            .find_method_by_arity(method, arguments.len())
            .is_some()
        {
            return None;
        }
        match (method, arguments) {
            (IDENTITY_TO_STRING, []) => Some(Value::String(self.to_string())),
            (IDENTITY_HASH, []) => Some(self.identity_token()),
            (IDENTITY_EQ, [other]) => Some(Value::Bool(*other == self.identity_token())),
            _ => None,
        }
    }

    /// 依据方法名与参数构造 Invocation。
    pub fn build_invocation(&self, method: &str, arguments: Vec<Value>) -> Result<Invocation, RpcError> {
        let service_type = self.invoker.service_type();
        let arity = arguments.len();

        let invocation = if let Some(descriptor) = service_type.find_method_by_arity(method, arity) {
            Invocation::from_method(descriptor, arguments)
        } else if let Some(descriptor) = method
            .strip_suffix(ASYNC_SUFFIX)
            .and_then(|sync_name| service_type.find_method_by_arity(sync_name, arity))
        {
            Invocation::from_method(descriptor, arguments)
                .with_attachment(FUTURE_KEY, TRUE_VALUE)
                .with_attachment(ASYNC_KEY, TRUE_VALUE)
        } else if method == ECHO_METHOD && arity == 1 {
            Invocation::new(ECHO_METHOD, vec![Cow::Borrowed(OPAQUE_PARAMETER_TYPE)], arguments)
        } else if self.generic {
            Invocation::new(
                method.to_owned(),
                vec![Cow::Borrowed(OPAQUE_PARAMETER_TYPE); arity],
                arguments,
            )
        } else {
            return Err(RpcError::no_such_method(service_type.name(), method));
        };

        Ok(if self.generic {
            invocation.with_attachment(GENERIC_KEY, TRUE_VALUE)
        } else {
            invocation
        })
    }

    /// 直接驱动 Invoker，不做 `recreate`。
    pub async fn invoke_raw(&self, invocation: Invocation) -> Result<RpcResult, RpcError> {
        self.invoker.invoke(invocation).await
    }

    /// 完整的分派路径：身份方法 → 构造 Invocation → 调用 → `recreate`。
    pub async fn call(&self, method: &str, arguments: Vec<Value>) -> Result<Value, RpcError> {
        if let Some(answer) = self.answer_identity(method, &arguments) {
            return Ok(answer);
        }
        let invocation = self.build_invocation(method, arguments)?;
        self.invoke_raw(invocation).await?.recreate()
    }

    /// 以 future 句柄观察结果；句柄被丢弃时调用随之取消。
    pub fn call_future(&self, method: &str, arguments: Vec<Value>) -> ResponseFuture<Value> {
        let handler = self.clone();
        let method = method.to_owned();
        ResponseFuture::new(async move { handler.call(&method, arguments).await })
    }
}

impl fmt::Display for InvocationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(self.invoker.as_ref()))
    }
}

impl fmt::Debug for InvocationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationHandler")
            .field("invoker", &self.invoker)
            .field("generic", &self.generic)
            .finish()
    }
}

impl PartialEq for InvocationHandler {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for InvocationHandler {}

impl Hash for InvocationHandler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        identity_hash(&self.invoker, state);
    }
}
