//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 调用内核区分三类框架级故障与一类业务故障：构造错误、远程调用错误、导出/引用错误，以及以数据形式
//!   捕获在 [`RpcResult`](crate::RpcResult) 中的业务失败；
//! - 业务失败只有在 [`RpcResult::recreate`](crate::RpcResult::recreate) 处才重新浮现为 `Err`，其余错误在
//!   发生点立即以 `Result` 返回。
//!
//! ## 设计要求（What）
//! - [`RpcError`] 必须 `Clone + Send + Sync + 'static`，以便在 Filter 之间复制、跨线程传递；
//! - 每个变体都映射到 [`codes`] 中的稳定错误码，便于日志与告警聚合；
//! - 底层原因以 [`ErrorCause`] 保存，`source()` 链路保持可回溯。

use std::{borrow::Cow, error::Error as StdError, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 可克隆的底层错误原因。
pub type ErrorCause = Arc<dyn StdError + Send + Sync + 'static>;

/// 稳定错误码。命名遵循 `<域>.<语义>`。
pub mod codes {
    pub const CONSTRUCTION: &str = "rpc.construction";
    pub const REMOTE_UNKNOWN: &str = "rpc.remote.unknown";
    pub const REMOTE_NETWORK: &str = "rpc.remote.network";
    pub const REMOTE_TIMEOUT: &str = "rpc.remote.timeout";
    pub const REMOTE_SERIALIZATION: &str = "rpc.remote.serialization";
    pub const REMOTE_FORBIDDEN: &str = "rpc.remote.forbidden";
    pub const REMOTE_DESTROYED: &str = "rpc.remote.destroyed";
    pub const REMOTE_NO_SUCH_METHOD: &str = "rpc.remote.no_such_method";
    pub const EXPORT: &str = "rpc.export";
    pub const REFER: &str = "rpc.refer";
    pub const SERVICE: &str = "rpc.service";
    pub const NO_SUCH_EXTENSION: &str = "rpc.extension.missing";
}

/// 远程调用错误的细分类别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteCallKind {
    Unknown,
    Network,
    Timeout,
    Serialization,
    Forbidden,
    /// Invoker 已销毁后仍被调用。
    Destroyed,
    /// 目标方法在服务类型上不存在。
    NoSuchMethod,
}

impl RemoteCallKind {
    fn code(self) -> &'static str {
        match self {
            RemoteCallKind::Unknown => codes::REMOTE_UNKNOWN,
            RemoteCallKind::Network => codes::REMOTE_NETWORK,
            RemoteCallKind::Timeout => codes::REMOTE_TIMEOUT,
            RemoteCallKind::Serialization => codes::REMOTE_SERIALIZATION,
            RemoteCallKind::Forbidden => codes::REMOTE_FORBIDDEN,
            RemoteCallKind::Destroyed => codes::REMOTE_DESTROYED,
            RemoteCallKind::NoSuchMethod => codes::REMOTE_NO_SUCH_METHOD,
        }
    }
}

impl fmt::Display for RemoteCallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 业务实现抛出的失败，以数据形式跨越调用边界。
///
/// # 教案式说明
/// - **意图 (Why)**：远端业务异常不能以原生控制流穿越传输层，必须先序列化为数据，
///   到达调用方的 [`RpcResult::recreate`](crate::RpcResult::recreate) 时再还原；
/// - **契约 (What)**：`kind` 为业务自定义的稳定类别名，`message` 为人类可读描述，两者均可序列化。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct ServiceFault {
    kind: String,
    message: String,
}

impl ServiceFault {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// 调用内核的统一错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：将构造、调用、导出/引用、业务与扩展查找五类失败收敛到一个枚举，
///   调用方可以用 `match` 精确决定重试、熔断或直接上抛；
/// - **契约 (What)**：
///   - `Construction` 在构造点同步返回，永不延迟；
///   - `RemoteCall` 表示 `invoke` 自身的框架级故障（连接、序列化、超时、已销毁…）；
///   - `Export` / `Refer` 表示绑定端点或建立连接失败；
///   - `Service` 是被捕获的业务失败，只应出现在 [`RpcResult`](crate::RpcResult) 内或 `recreate` 的返回中；
/// - **风险 (Trade-offs)**：`message` 使用 `String`，换取可读性；底层原因用 `Arc` 包装以保持 `Clone`。
#[derive(Clone, Debug, Error)]
pub enum RpcError {
    #[error("invalid construction: {detail}")]
    Construction { detail: Cow<'static, str> },

    #[error("remote call failed [{kind}]: {message}")]
    RemoteCall {
        kind: RemoteCallKind,
        message: String,
        #[source]
        cause: Option<ErrorCause>,
    },

    #[error("failed to export `{url}`: {message}")]
    Export {
        url: String,
        message: String,
        #[source]
        cause: Option<ErrorCause>,
    },

    #[error("failed to refer `{url}`: {message}")]
    Refer {
        url: String,
        message: String,
        #[source]
        cause: Option<ErrorCause>,
    },

    #[error("service failure: {0}")]
    Service(ServiceFault),

    #[error("no extension named `{name}` for extension point `{point}`")]
    NoSuchExtension { point: &'static str, name: String },
}

impl RpcError {
    /// 构造参数非法。
    pub fn construction(detail: impl Into<Cow<'static, str>>) -> Self {
        RpcError::Construction {
            detail: detail.into(),
        }
    }

    /// 框架级远程调用故障。
    pub fn remote(kind: RemoteCallKind, message: impl Into<String>) -> Self {
        RpcError::RemoteCall {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn export(url: impl fmt::Display, message: impl Into<String>) -> Self {
        RpcError::Export {
            url: url.to_string(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn refer(url: impl fmt::Display, message: impl Into<String>) -> Self {
        RpcError::Refer {
            url: url.to_string(),
            message: message.into(),
            cause: None,
        }
    }

    /// 包装业务失败，供服务实现返回。
    pub fn service(kind: impl Into<String>, message: impl Into<String>) -> Self {
        RpcError::Service(ServiceFault::new(kind, message))
    }

    pub fn destroyed(service: &str, url: impl fmt::Display) -> Self {
        Self::remote(
            RemoteCallKind::Destroyed,
            format!("invoker for service `{service}` on `{url}` is destroyed and can not be invoked any more"),
        )
    }

    pub fn no_such_method(service: &str, method: &str) -> Self {
        Self::remote(
            RemoteCallKind::NoSuchMethod,
            format!("service `{service}` has no method `{method}`"),
        )
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::remote(RemoteCallKind::Serialization, message)
    }

    /// 附加底层原因；`Construction`、`Service` 与 `NoSuchExtension` 不携带原因，原样返回。
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        match &mut self {
            RpcError::RemoteCall { cause: slot, .. }
            | RpcError::Export { cause: slot, .. }
            | RpcError::Refer { cause: slot, .. } => *slot = Some(Arc::new(cause)),
            _ => {}
        }
        self
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::Construction { .. } => codes::CONSTRUCTION,
            RpcError::RemoteCall { kind, .. } => kind.code(),
            RpcError::Export { .. } => codes::EXPORT,
            RpcError::Refer { .. } => codes::REFER,
            RpcError::Service(_) => codes::SERVICE,
            RpcError::NoSuchExtension { .. } => codes::NO_SUCH_EXTENSION,
        }
    }

    /// 是否为业务失败。
    pub fn is_service(&self) -> bool {
        matches!(self, RpcError::Service(_))
    }

    /// 远程调用故障的细分类别。
    pub fn remote_kind(&self) -> Option<RemoteCallKind> {
        match self {
            RpcError::RemoteCall { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::serialization(err.to_string()).with_cause(err)
    }
}

const _: fn() = || {
    fn assert_error_traits<T: StdError + Clone + Send + Sync + 'static>() {}

    assert_error_traits::<RpcError>();
    assert_error_traits::<ServiceFault>();
};
