use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RpcError;

use super::decode_value;

type BoxResponse<T> = Pin<Box<dyn Future<Output = Result<T, RpcError>> + Send + 'static>>;

/// 异步调用约定返回的结果句柄。
///
/// # 契约说明（What）
/// - 轮询到完成时给出返回值或失败，语义与同步调用的 `recreate` 一致；
/// - 句柄被丢弃即取消调用，其结果的值与附件不会被应用到任何共享状态。
pub struct ResponseFuture<T> {
    inner: BoxResponse<T>,
}

impl<T> ResponseFuture<T> {
    pub fn new(future: impl Future<Output = Result<T, RpcError>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(future),
        }
    }

    /// 立即以失败完成的句柄。
    pub fn failed(error: RpcError) -> Self
    where
        T: Send + 'static,
    {
        Self::new(async move { Err(error) })
    }
}

impl ResponseFuture<Value> {
    /// 将返回值解码为强类型。
    pub fn decode<T>(self) -> ResponseFuture<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        ResponseFuture::new(async move { decode_value(self.await?) })
    }
}

impl<T> Future for ResponseFuture<T> {
    type Output = Result<T, RpcError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for ResponseFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFuture").finish_non_exhaustive()
    }
}
