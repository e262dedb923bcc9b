use std::sync::Arc;

use spark_rpc::{
    BaseExporter, Endpoint, Exporter, Invoker, Protocol, ProtocolResources, RpcError, ServiceType,
    Url, async_trait,
    keys::{CHECK_KEY, GROUP_KEY, VERSION_KEY},
    protocol::with_default_port,
    url::compose_service_key,
};
use tracing::{debug, warn};

use crate::{DEFAULT_PORT, NAME, endpoint::LocalEndpoint, invoker::InjvmInvoker};

/// 进程内协议。
///
/// 克隆得到的实例共享同一份资源台账。
#[derive(Clone, Debug, Default)]
pub struct InjvmProtocol {
    resources: ProtocolResources,
}

impl InjvmProtocol {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 资源台账，供观测与测试读取计数。
    pub fn resources(&self) -> &ProtocolResources {
        &self.resources
    }
}

/// `[group/]path[:version]`，`path` 为空时回落服务类型名。
fn service_key(service_type: &ServiceType, url: &Url) -> String {
    let name = if url.path().is_empty() {
        service_type.name()
    } else {
        url.path()
    };
    compose_service_key(url.parameter(GROUP_KEY), name, url.parameter(VERSION_KEY))
}

#[async_trait]
impl Protocol for InjvmProtocol {
    fn default_port(&self) -> u16 {
        DEFAULT_PORT
    }

    async fn export(&self, invoker: Arc<dyn Invoker>) -> Result<Arc<dyn Exporter>, RpcError> {
        let url = invoker.url();
        let key = service_key(invoker.service_type(), url);
        let address = with_default_port(url.clone(), self).address();
        self.resources.export_with(key.clone(), || {
            debug!(protocol = NAME, service = %key, "exporting in-process service");
            let hook = self.resources.unexport_hook(key.clone(), &invoker);
            let exporter = BaseExporter::new(Arc::clone(&invoker))?.with_unexport_hook(hook);
            self.resources.endpoint_or_bind(address.clone(), || {
                Ok(Arc::new(LocalEndpoint::new(address.clone())) as Arc<dyn Endpoint>)
            })?;
            Ok(Arc::new(exporter) as Arc<dyn Exporter>)
        })
    }

    async fn refer(&self, service_type: ServiceType, url: Url) -> Result<Arc<dyn Invoker>, RpcError> {
        let key = service_key(&service_type, &url);
        let exporters = self.resources.exporters();
        if !exporters.contains(&key) {
            if url.bool_parameter(CHECK_KEY, true) {
                return Err(RpcError::refer(
                    &url,
                    format!("no in-process provider exported for `{key}`"),
                ));
            }
            warn!(
                protocol = NAME,
                service = %key,
                "referring in-process service before it is exported; calls fail until it is"
            );
        }

        let invoker = self.resources.track_invoker(|registration| {
            InjvmInvoker::new(service_type, url, key, exporters, registration)
        });
        Ok(invoker)
    }

    fn destroy(&self) {
        let failures = self.resources.destroy_all(NAME);
        debug!(protocol = NAME, failures, "in-process protocol destroyed");
    }
}
