//! Exporter：已发布 Invoker 的生命周期句柄。
//!
//! # 设计背景（Why）
//! - 导出后的 Invoker 会被多个上层组件（注册中心、配置刷新、优雅停机）同时持有，任何一方都可能触发下线；
//! - 下线必须“恰好一次”地销毁 Invoker，否则会出现重复关闭端点、重复注销等连锁故障。
//!
//! # 契约说明（What）
//! - 一个 Exporter 恰好关联一个 Invoker，且关联不可变；
//! - `unexport` 以单次 CAS 翻转一次性标记，首个调用者负责 `destroy`，其余调用者（含并发竞争者）直接返回；
//! - 已下线的 Exporter 即使仍留在协议导出表中也视为空位，重新导出会替换它。

use std::{fmt, sync::Arc};

#[cfg(not(loom))]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(loom)]
use loom::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::{error::RpcError, invoker::Invoker, sealed::Sealed};

/// 导出句柄。
pub trait Exporter: Send + Sync + 'static + Sealed {
    /// 被导出的 Invoker，恒定不变。
    fn invoker(&self) -> &Arc<dyn Invoker>;

    /// 下线；重复或并发调用只生效一次。
    fn unexport(&self);

    /// 一次性标记是否已翻转。
    fn is_unexported(&self) -> bool;
}

type UnexportHook = Box<dyn Fn() + Send + Sync + 'static>;

/// 通用 Exporter 实现，供各协议复用。
///
/// # 教案式说明
/// - **意图 (Why)**：把“一次性守卫 + 销毁 + 协议侧清理”三步收敛在一个类型中；
/// - **契约 (What)**：
///   - 构造时立即校验 Invoker 的服务类型名与 URL 协议非空，不满足返回 [`RpcError::Construction`]；
///   - `unexport` 首次调用先执行可选的清理钩子（移出导出表），再执行 `invoker.destroy()`；
///     `destroy` 期间同键重新导出看到的是空位，不会拿到正在销毁的 Exporter；
/// - **执行 (How)**：`compare_exchange(false, true, AcqRel, Acquire)`，失败方观察到已设置的标记后立即返回；
/// - **风险 (Trade-offs)**：清理钩子在调用线程上同步执行，不得阻塞或再次调用本 Exporter 的 `unexport`。
pub struct BaseExporter {
    invoker: Arc<dyn Invoker>,
    unexported: AtomicBool,
    on_unexport: Option<UnexportHook>,
}

impl BaseExporter {
    pub fn new(invoker: Arc<dyn Invoker>) -> Result<Self, RpcError> {
        if invoker.service_type().name().is_empty() {
            return Err(RpcError::construction(
                "exporter requires an invoker with a service type",
            ));
        }
        if invoker.url().protocol().is_empty() {
            return Err(RpcError::construction(
                "exporter requires an invoker with an endpoint descriptor",
            ));
        }
        Ok(Self {
            invoker,
            unexported: AtomicBool::new(false),
            on_unexport: None,
        })
    }

    /// 附加下线时的协议侧清理动作，如从导出表中移除；在 `destroy` 之前执行。
    pub fn with_unexport_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unexport = Some(Box::new(hook));
        self
    }
}

impl Exporter for BaseExporter {
    fn invoker(&self) -> &Arc<dyn Invoker> {
        &self.invoker
    }

    fn unexport(&self) {
        if self
            .unexported
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!(
            service = self.invoker.service_type().name(),
            url = %self.invoker.url(),
            "unexporting service"
        );
        if let Some(hook) = &self.on_unexport {
            hook();
        }
        self.invoker.destroy();
    }

    fn is_unexported(&self) -> bool {
        self.unexported.load(Ordering::Acquire)
    }
}

impl fmt::Debug for BaseExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseExporter")
            .field("invoker", &self.invoker)
            .field("unexported", &self.is_unexported())
            .finish()
    }
}

impl fmt::Display for BaseExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::invoker::describe(self.invoker.as_ref()))
    }
}
