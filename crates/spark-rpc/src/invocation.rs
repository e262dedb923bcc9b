//! 单次调用的描述：方法身份、参数与附件。
//!
//! # 设计背景（Why）
//! - 调用方与提供方之间唯一的请求载体，Filter 只能读取身份并增删附件；
//! - 方法名与参数类型在构造后不可改写，避免中途被 Filter 篡改导致分派错位。
//!
//! # 契约说明（What）
//! - 参数以 [`serde_json::Value`] 承载，类型信息由 `parameter_types` 描述；
//! - 附件为有序字符串映射，跨 Filter 传播开关（`async`、`future`、`generic`）与上下文；
//! - `remote_address` 由 Protocol 在派发前填写。

use std::{borrow::Cow, collections::BTreeMap, net::SocketAddr};

use serde_json::Value;

use crate::{
    keys::{ASYNC_KEY, FUTURE_KEY, GENERIC_KEY, TRUE_VALUE},
    service::MethodDescriptor,
};

/// 一次远程调用。
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    method_name: Cow<'static, str>,
    parameter_types: Vec<Cow<'static, str>>,
    arguments: Vec<Value>,
    attachments: BTreeMap<String, String>,
    remote_address: Option<SocketAddr>,
}

impl Invocation {
    pub fn new(
        method_name: impl Into<Cow<'static, str>>,
        parameter_types: Vec<Cow<'static, str>>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            parameter_types,
            arguments,
            attachments: BTreeMap::new(),
            remote_address: None,
        }
    }

    /// 依据方法描述符构造，参数类型取自描述符。
    pub fn from_method(method: &MethodDescriptor, arguments: Vec<Value>) -> Self {
        Self::new(
            method.name().to_owned(),
            method.parameter_types().to_vec(),
            arguments,
        )
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn parameter_types(&self) -> &[Cow<'static, str>] {
        &self.parameter_types
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn attachments(&self) -> &BTreeMap<String, String> {
        &self.attachments
    }

    pub fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }

    pub fn set_attachment(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attachments.insert(key.into(), value.into());
    }

    pub fn with_attachment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attachment(key, value);
        self
    }

    fn flag(&self, key: &str) -> bool {
        self.attachment(key)
            .is_some_and(|value| value.eq_ignore_ascii_case(TRUE_VALUE))
    }

    pub fn is_async(&self) -> bool {
        self.flag(ASYNC_KEY)
    }

    pub fn is_future(&self) -> bool {
        self.flag(FUTURE_KEY)
    }

    pub fn is_generic(&self) -> bool {
        self.flag(GENERIC_KEY)
    }

    pub fn remote_address(&self) -> Option<SocketAddr> {
        self.remote_address
    }

    pub fn set_remote_address(&mut self, address: SocketAddr) {
        self.remote_address = Some(address);
    }

    pub fn into_arguments(self) -> Vec<Value> {
        self.arguments
    }
}
