//! 代理分派契约：强类型往返、身份方法、异步后缀、泛化调用、取消与骨架错误。

#[path = "../support/mod.rs"]
mod support;

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use futures::executor::block_on;
use serde_json::json;
use spark_rpc::{
    DefaultProxyFactory, ExtensionRegistry, InvocationHandler, Invocation, Invoker, ProxyFactory,
    RemoteCallKind, RpcError, RpcProxy, ServiceType, Url, Value, async_trait,
};
use support::RecordingInvoker;

spark_rpc::rpc_service! {
    /// 问候服务。
    pub trait Greeter("demo.Greeter") {
        fn greet(&self, name: String) -> String => greet_async;
        fn add(&self, left: i64, right: i64) -> i64;
        fn fail(&self, reason: String) -> ();
    }
    pub proxy GreeterProxy;
    pub skeleton GreeterSkeleton;
}

struct FriendlyGreeter;

#[async_trait]
impl Greeter for FriendlyGreeter {
    async fn greet(&self, name: String) -> Result<String, RpcError> {
        Ok(format!("hello {name}"))
    }

    async fn add(&self, left: i64, right: i64) -> Result<i64, RpcError> {
        Ok(left + right)
    }

    async fn fail(&self, reason: String) -> Result<(), RpcError> {
        Err(RpcError::service("Rejected", reason))
    }
}

fn provider_url() -> Url {
    Url::new("injvm", "127.0.0.1", 0).with_path("demo.Greeter")
}

fn factory() -> Arc<dyn ProxyFactory> {
    ExtensionRegistry::builder()
        .build()
        .proxy_factory("")
        .expect("缺省 ProxyFactory 必须可用")
}

fn local_greeter() -> Arc<dyn Invoker> {
    factory()
        .get_invoker(
            Arc::new(GreeterSkeleton(FriendlyGreeter)),
            GreeterProxy::service_type(),
            provider_url(),
        )
        .expect("本地 Invoker 构造应当成功")
}

fn recording_greeter() -> Arc<RecordingInvoker> {
    Arc::new(RecordingInvoker::new(GreeterProxy::service_type(), provider_url()))
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn typed_proxy_round_trips_through_local_invoker() {
    let proxy: GreeterProxy = factory()
        .get_proxy(local_greeter())
        .expect("服务类型一致时必须生成代理");

    assert_eq!(
        block_on(proxy.greet("spark".to_owned())).expect("调用应当成功"),
        "hello spark"
    );
    assert_eq!(block_on(proxy.add(2, 3)).expect("调用应当成功"), 5);
    assert_eq!(
        block_on(proxy.greet_async("async".to_owned())).expect("future 约定同样可用"),
        "hello async"
    );
}

#[test]
fn business_failure_resurfaces_only_at_recreate() {
    let invoker = local_greeter();
    let proxy: GreeterProxy = factory().get_proxy(Arc::clone(&invoker)).expect("生成代理");

    match block_on(proxy.fail("closed".to_owned())) {
        Err(RpcError::Service(fault)) => {
            assert_eq!(fault.kind(), "Rejected");
            assert_eq!(fault.message(), "closed");
        }
        other => panic!("业务失败必须在 recreate 处原样浮现，实际为 {other:?}"),
    }

    let handler = InvocationHandler::new(invoker, false);
    let invocation = handler
        .build_invocation("fail", vec![json!("closed")])
        .expect("方法存在");
    let result = block_on(handler.invoke_raw(invocation)).expect("业务失败不是框架错误");
    assert!(result.has_failure(), "业务失败以数据形式装在结果中");
}

#[test]
fn identity_methods_never_reach_the_invoker() {
    let recording = recording_greeter();
    let factory = factory();
    let proxy: GreeterProxy = factory.get_proxy(recording.clone()).expect("生成代理");
    let twin: GreeterProxy = factory.get_proxy(recording.clone()).expect("生成代理");
    let stranger: GreeterProxy = factory.get_proxy(recording_greeter()).expect("生成代理");

    assert_eq!(proxy, twin);
    assert_ne!(proxy, stranger);
    assert_eq!(hash_of(&proxy), hash_of(&twin));
    assert!(proxy.to_string().contains("demo.Greeter"));
    assert!(format!("{proxy:?}").contains("GreeterProxy"));

    let generic = factory
        .get_generic_proxy(recording.clone())
        .expect("生成泛化代理");
    let token = generic.handler().identity_token();
    assert_eq!(
        block_on(generic.invoke("to_string", vec![])).expect("身份方法直接作答"),
        Value::String(proxy.to_string())
    );
    assert_eq!(block_on(generic.invoke("hash", vec![])).expect("身份方法直接作答"), token);
    assert_eq!(
        block_on(generic.invoke("eq", vec![token.clone()])).expect("身份方法直接作答"),
        json!(true)
    );
    assert_eq!(
        block_on(generic.invoke("eq", vec![json!(0)])).expect("身份方法直接作答"),
        json!(false)
    );

    assert_eq!(recording.invocation_count(), 0, "身份方法不得构造 Invocation");
}

#[test]
fn async_suffix_dispatches_sync_descriptor_with_markers() {
    let recording = recording_greeter();
    let proxy: GreeterProxy = factory().get_proxy(recording.clone()).expect("生成代理");

    let value = block_on(proxy.greet_async("spark".to_owned())).expect("调用应当成功");
    assert_eq!(value, "greet", "记录型 Invoker 回显方法名");

    let invocations = recording.invocations();
    assert_eq!(invocations.len(), 1);
    let invocation = &invocations[0];
    assert_eq!(invocation.method_name(), "greet");
    assert_eq!(invocation.parameter_types(), ["String"]);
    assert_eq!(invocation.arguments(), [json!("spark")]);
    assert!(invocation.is_future() && invocation.is_async(), "必须写入异步标记");

    block_on(proxy.greet("sync".to_owned())).expect("同步调用应当成功");
    let invocations = recording.invocations();
    let sync = &invocations[1];
    assert!(!sync.is_async() && !sync.is_future(), "同步调用不携带异步标记");
}

#[test]
fn exact_method_match_wins_over_suffix_stripping() {
    let loader = ServiceType::builder("demo.Loader")
        .method("load", &["u64"], "String")
        .method("load_async", &["u64"], "String")
        .build();
    let invoker: Arc<dyn Invoker> = Arc::new(RecordingInvoker::new(loader, provider_url()));
    let handler = InvocationHandler::new(invoker, false);

    let invocation = handler
        .build_invocation("load_async", vec![json!(7)])
        .expect("精确匹配的方法必须可用");
    assert_eq!(invocation.method_name(), "load_async");
    assert!(!invocation.is_async());
}

#[test]
fn typed_handler_rejects_unknown_methods_while_generic_marks_them() {
    let recording = recording_greeter();
    let handler = InvocationHandler::new(recording.clone(), false);
    let err = handler
        .build_invocation("missing", vec![])
        .expect_err("强类型处理器不得放行未知方法");
    assert_eq!(err.remote_kind(), Some(RemoteCallKind::NoSuchMethod));

    let generic = factory().get_generic_proxy(recording.clone()).expect("生成泛化代理");
    block_on(generic.invoke("missing", vec![json!(1)])).expect("泛化调用无需描述符");
    block_on(generic.invoke("greet", vec![json!("spark")])).expect("泛化调用已声明方法");

    let invocations = recording.invocations();
    assert!(invocations.iter().all(Invocation::is_generic), "泛化调用必须写入 generic 标记");
    assert_eq!(invocations[0].parameter_types(), ["object"]);
    assert_eq!(invocations[1].parameter_types(), ["String"]);
}

#[test]
fn get_proxy_rejects_mismatched_service_type() {
    let other: Arc<dyn Invoker> = Arc::new(RecordingInvoker::new(
        ServiceType::opaque("demo.Other"),
        provider_url(),
    ));
    let result: Result<GreeterProxy, _> = factory().get_proxy(other);
    assert!(matches!(result, Err(RpcError::Construction { .. })));

    let mismatched = DefaultProxyFactory::new().get_invoker(
        Arc::new(GreeterSkeleton(FriendlyGreeter)),
        ServiceType::opaque("demo.Other"),
        provider_url(),
    );
    assert!(matches!(mismatched, Err(RpcError::Construction { .. })));
}

#[test]
fn dropping_response_future_cancels_the_call() {
    let recording = recording_greeter();
    let proxy: GreeterProxy = factory().get_proxy(recording.clone()).expect("生成代理");

    let pending = proxy.greet_async("never".to_owned());
    drop(pending);
    assert_eq!(recording.invocation_count(), 0, "未被轮询即丢弃的调用不得执行");
}

#[test]
fn skeleton_reports_framework_errors_as_err() {
    let invoker = local_greeter();

    let malformed = Invocation::new(
        "add",
        vec!["i64".into(), "i64".into()],
        vec![json!("NaN"), json!(1)],
    );
    let err = block_on(invoker.invoke(malformed)).expect_err("参数类型不符属于框架错误");
    assert_eq!(err.remote_kind(), Some(RemoteCallKind::Serialization));

    let surplus = Invocation::new("greet", vec![], vec![json!("a"), json!("b")]);
    let err = block_on(invoker.invoke(surplus)).expect_err("多余参数属于框架错误");
    assert_eq!(err.remote_kind(), Some(RemoteCallKind::Serialization));

    let unknown = Invocation::new("wave", vec![], vec![]);
    let err = block_on(invoker.invoke(unknown)).expect_err("未知方法属于框架错误");
    assert_eq!(err.remote_kind(), Some(RemoteCallKind::NoSuchMethod));
}

#[test]
fn destroyed_local_invoker_fails_predictably() {
    let invoker = local_greeter();
    invoker.destroy();
    assert!(!invoker.is_available());

    let proxy: GreeterProxy = factory().get_proxy(invoker).expect("生成代理");
    let err = block_on(proxy.greet("late".to_owned())).expect_err("销毁后调用必须失败");
    assert_eq!(err.remote_kind(), Some(RemoteCallKind::Destroyed));
}
