//! 调用结果：返回值或被捕获的失败，外加回传附件。
//!
//! # 设计背景（Why）
//! - 业务失败需要以数据形式穿过 Filter 链与传输层，直到调用方才重新抛出；
//! - 因此 `invoke` 的 `Ok(RpcResult)` 既可能承载值，也可能承载失败，而 `Err` 仅留给框架级故障。
//!
//! # 契约说明（What）
//! - 值与失败二者恰有其一；
//! - [`RpcResult::recreate`] 是唯一把被捕获失败还原为 `Err` 的出口。

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::RpcError;

/// 调用结果。
#[derive(Clone, Debug)]
pub struct RpcResult {
    outcome: Result<Value, RpcError>,
    attachments: BTreeMap<String, String>,
}

impl RpcResult {
    pub fn from_value(value: Value) -> Self {
        Self::from_outcome(Ok(value))
    }

    pub fn from_failure(error: RpcError) -> Self {
        Self::from_outcome(Err(error))
    }

    pub fn from_outcome(outcome: Result<Value, RpcError>) -> Self {
        Self {
            outcome,
            attachments: BTreeMap::new(),
        }
    }

    /// 返回值；承载失败时为 `None`。
    pub fn value(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&RpcError> {
        self.outcome.as_ref().err()
    }

    pub fn has_failure(&self) -> bool {
        self.outcome.is_err()
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

    /// 还原调用结果：值返回 `Ok`，被捕获的失败原样返回 `Err`。
    pub fn recreate(self) -> Result<Value, RpcError> {
        self.outcome
    }
}

impl From<Value> for RpcResult {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
