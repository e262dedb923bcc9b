use std::sync::atomic::{AtomicBool, Ordering};

use spark_rpc::{Endpoint, RpcError};
use tracing::debug;

/// 进程内“监听点”：只记录地址与关闭状态，不持有任何系统资源。
#[derive(Debug)]
pub struct LocalEndpoint {
    address: String,
    closed: AtomicBool,
}

impl LocalEndpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Endpoint for LocalEndpoint {
    fn address(&self) -> &str {
        &self.address
    }

    fn close(&self) -> Result<(), RpcError> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!(endpoint = %self.address, "in-process endpoint closed");
        }
        Ok(())
    }
}
