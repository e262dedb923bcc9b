//! 服务类型与方法描述符。
//!
//! # 设计背景（Why）
//! - 运行时没有反射，服务接口的方法签名需要以数据形式随 Invoker 流转，
//!   供 Proxy 解析方法、Filter 记录日志、Protocol 计算服务键；
//! - 服务类型在多个 Invoker、Exporter 间共享，内部使用 `Arc` 使克隆只增加引用计数。
//!
//! # 契约说明（What）
//! - 服务类型按名称判等与哈希，方法表只用于解析，不参与身份；
//! - 方法按声明顺序保存，同名重载通过参数个数区分。

use std::{
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// 方法描述符：名称、参数类型名与返回类型名。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    name: Cow<'static, str>,
    parameter_types: Vec<Cow<'static, str>>,
    return_type: Cow<'static, str>,
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        parameter_types: impl IntoIterator<Item = impl Into<Cow<'static, str>>>,
        return_type: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_types: parameter_types.into_iter().map(Into::into).collect(),
            return_type: return_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[Cow<'static, str>] {
        &self.parameter_types
    }

    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }
}

#[derive(Debug)]
struct ServiceTypeInner {
    name: Cow<'static, str>,
    methods: Vec<MethodDescriptor>,
}

/// 服务接口的运行时描述。
///
/// # 教案式说明
/// - **意图 (Why)**：在 Invoker 的 `service_type()` 中携带接口身份，Exporter 与 Proxy 依据它校验匹配；
/// - **契约 (What)**：
///   - 名称即身份，两个同名服务类型视为同一接口；
///   - [`ServiceType::opaque`] 构造不带方法表的类型，供泛化调用或测试替身使用；
/// - **风险 (Trade-offs)**：同名但方法表不同的类型会被判等，由注册方保证名称唯一。
#[derive(Clone)]
pub struct ServiceType {
    inner: Arc<ServiceTypeInner>,
}

impl ServiceType {
    pub fn builder(name: impl Into<Cow<'static, str>>) -> ServiceTypeBuilder {
        ServiceTypeBuilder {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// 不携带方法表的服务类型。
    pub fn opaque(name: impl Into<Cow<'static, str>>) -> Self {
        Self::builder(name).build()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.inner.methods
    }

    /// 按名称查找首个匹配的方法。
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.inner.methods.iter().find(|m| m.name() == name)
    }

    /// 按名称与参数个数查找方法，用于重载与异步后缀解析。
    pub fn find_method_by_arity(&self, name: &str, arity: usize) -> Option<&MethodDescriptor> {
        self.inner
            .methods
            .iter()
            .find(|m| m.name() == name && m.arity() == arity)
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceType")
            .field("name", &self.name())
            .field("methods", &self.inner.methods.len())
            .finish()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// [`ServiceType`] 构建器。
#[derive(Debug)]
pub struct ServiceTypeBuilder {
    name: Cow<'static, str>,
    methods: Vec<MethodDescriptor>,
}

impl ServiceTypeBuilder {
    pub fn method(
        mut self,
        name: impl Into<Cow<'static, str>>,
        parameter_types: &[&'static str],
        return_type: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.methods.push(MethodDescriptor::new(
            name,
            parameter_types.iter().copied(),
            return_type,
        ));
        self
    }

    pub fn descriptor(mut self, descriptor: MethodDescriptor) -> Self {
        self.methods.push(descriptor);
        self
    }

    pub fn build(self) -> ServiceType {
        ServiceType {
            inner: Arc::new(ServiceTypeInner {
                name: self.name,
                methods: self.methods,
            }),
        }
    }
}
