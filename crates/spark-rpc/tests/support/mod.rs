//! 契约测试共享的替身：记录型 Invoker 与基于 `ProtocolResources` 的内存协议。
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use spark_rpc::{
    BaseExporter, Endpoint, Exporter, Invocation, Invoker, InvokerState, Protocol,
    ProtocolResources, RpcError, RpcResult, ServiceType, Url, Value, async_trait,
    keys::CHECK_KEY,
    protocol::with_default_port,
};

/// 测试统一使用的服务类型。
pub fn greeter_type() -> ServiceType {
    ServiceType::builder("demo.Greeter")
        .method("greet", &["String"], "String")
        .method("ping", &[], "()")
        .build()
}

pub fn greeter_url() -> Url {
    Url::new("mock", "127.0.0.1", 20880).with_path("demo.Greeter")
}

/// 按调用顺序记录事件的共享日志。
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().expect("日志锁不应中毒").push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("日志锁不应中毒").clone()
    }
}

type Responder = dyn Fn(&Invocation) -> Result<RpcResult, RpcError> + Send + Sync;

/// 记录每次调用并按预设应答的 Invoker。
pub struct RecordingInvoker {
    service_type: ServiceType,
    url: Url,
    state: InvokerState,
    journal: Journal,
    invocations: Mutex<Vec<Invocation>>,
    destroy_calls: AtomicUsize,
    responder: Box<Responder>,
}

impl RecordingInvoker {
    pub fn new(service_type: ServiceType, url: Url) -> Self {
        Self::with_responder(service_type, url, |invocation| {
            Ok(RpcResult::from_value(Value::from(invocation.method_name())))
        })
    }

    pub fn with_responder(
        service_type: ServiceType,
        url: Url,
        responder: impl Fn(&Invocation) -> Result<RpcResult, RpcError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            service_type,
            url,
            state: InvokerState::new(),
            journal: Journal::default(),
            invocations: Mutex::new(Vec::new()),
            destroy_calls: AtomicUsize::new(0),
            responder: Box::new(responder),
        }
    }

    pub fn greeter() -> Arc<Self> {
        Arc::new(Self::new(greeter_type(), greeter_url()))
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().expect("记录锁不应中毒").clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().expect("记录锁不应中毒").len()
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Invoker for RecordingInvoker {
    fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn is_available(&self) -> bool {
        self.state.is_available()
    }

    async fn invoke(&self, invocation: Invocation) -> Result<RpcResult, RpcError> {
        self.state.ensure_alive(&self.service_type, &self.url)?;
        self.journal.push("base");
        let outcome = (self.responder)(&invocation);
        self.invocations
            .lock()
            .expect("记录锁不应中毒")
            .push(invocation);
        outcome
    }

    fn destroy(&self) {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        self.state.mark_destroyed();
    }
}

struct MockEndpoint {
    address: String,
}

impl Endpoint for MockEndpoint {
    fn address(&self) -> &str {
        &self.address
    }

    fn close(&self) -> Result<(), RpcError> {
        Ok(())
    }
}

/// 基于 `ProtocolResources` 的内存协议：导出按服务键去重，引用返回记录型 Invoker。
#[derive(Default)]
pub struct MockProtocol {
    pub resources: ProtocolResources,
    pub referred: Mutex<Vec<Arc<RecordingInvoker>>>,
    pub destroy_calls: AtomicUsize,
}

impl MockProtocol {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn referred(&self) -> Vec<Arc<RecordingInvoker>> {
        self.referred.lock().expect("记录锁不应中毒").clone()
    }
}

#[async_trait]
impl Protocol for MockProtocol {
    fn default_port(&self) -> u16 {
        20880
    }

    async fn export(&self, invoker: Arc<dyn Invoker>) -> Result<Arc<dyn Exporter>, RpcError> {
        let address = with_default_port(invoker.url().clone(), self).address();
        let key = invoker.url().service_key();
        self.resources.export_with(key.clone(), || {
            let hook = self.resources.unexport_hook(key.clone(), &invoker);
            let exporter = BaseExporter::new(Arc::clone(&invoker))?.with_unexport_hook(hook);
            self.resources.endpoint_or_bind(address.clone(), || {
                Ok(Arc::new(MockEndpoint {
                    address: address.clone(),
                }) as Arc<dyn Endpoint>)
            })?;
            Ok(Arc::new(exporter) as Arc<dyn Exporter>)
        })
    }

    async fn refer(&self, service_type: ServiceType, url: Url) -> Result<Arc<dyn Invoker>, RpcError> {
        let exported = self.resources.exporters().contains(&url.service_key());
        if !exported && url.bool_parameter(CHECK_KEY, true) {
            return Err(RpcError::refer(&url, "no provider available"));
        }
        let invoker = self
            .resources
            .track_invoker(|_| RecordingInvoker::new(service_type, url));
        self.referred
            .lock()
            .expect("记录锁不应中毒")
            .push(Arc::clone(&invoker));
        Ok(invoker)
    }

    fn destroy(&self) {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        self.resources.destroy_all("mock");
    }
}
