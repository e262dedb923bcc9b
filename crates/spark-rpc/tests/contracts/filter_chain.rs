//! Filter 链契约：嵌套顺序、框架错误中止、以数据返回的失败照常回传、短路。

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use futures::executor::block_on;
use serde_json::json;
use spark_rpc::{
    Filter, FilterChain, Invocation, Invoker, RemoteCallKind, RpcError, RpcResult, async_trait,
    filter::EchoFilter,
};
use support::{Journal, RecordingInvoker, greeter_type, greeter_url};

/// 前置写入 `name:before`，后置写入 `name:after`；后置阶段只在内层返回 `Ok` 时执行。
struct Tracing {
    name: &'static str,
    journal: Journal,
}

#[async_trait]
impl Filter for Tracing {
    async fn invoke(&self, next: &dyn Invoker, invocation: Invocation) -> Result<RpcResult, RpcError> {
        self.journal.push(format!("{}:before", self.name));
        let result = next.invoke(invocation).await?;
        self.journal.push(format!("{}:after", self.name));
        Ok(result)
    }
}

/// 前置阶段直接以框架错误中止。
struct Reject {
    journal: Journal,
}

#[async_trait]
impl Filter for Reject {
    async fn invoke(&self, _next: &dyn Invoker, _invocation: Invocation) -> Result<RpcResult, RpcError> {
        self.journal.push("reject");
        Err(RpcError::remote(RemoteCallKind::Forbidden, "caller is not authorized"))
    }
}

/// 向结果写入附件，验证后置加工。
struct StampResult;

#[async_trait]
impl Filter for StampResult {
    async fn invoke(&self, next: &dyn Invoker, invocation: Invocation) -> Result<RpcResult, RpcError> {
        let result = next.invoke(invocation).await?;
        Ok(result.with_attachment("stamped", "true"))
    }
}

fn tracing(name: &'static str, journal: &Journal) -> Arc<dyn Filter> {
    Arc::new(Tracing {
        name,
        journal: journal.clone(),
    })
}

fn greet(name: &str) -> Invocation {
    Invocation::new("greet", vec!["String".into()], vec![json!(name)])
}

#[test]
fn chain_is_nested_not_sequential() {
    let journal = Journal::default();
    let base: Arc<dyn Invoker> = Arc::new(
        RecordingInvoker::new(greeter_type(), greeter_url()).with_journal(journal.clone()),
    );
    let filters = [
        tracing("A", &journal),
        tracing("B", &journal),
        tracing("C", &journal),
    ];
    let chain = FilterChain::build(base, &filters);

    block_on(chain.invoke(greet("spark"))).expect("调用应当成功");
    assert_eq!(
        journal.entries(),
        [
            "A:before", "B:before", "C:before", "base", "C:after", "B:after", "A:after"
        ],
        "前置阶段自外向内，后置阶段自内向外"
    );
}

#[test]
fn framework_error_aborts_remaining_chain() {
    let journal = Journal::default();
    let recording = Arc::new(
        RecordingInvoker::new(greeter_type(), greeter_url()).with_journal(journal.clone()),
    );
    let filters: [Arc<dyn Filter>; 3] = [
        tracing("A", &journal),
        Arc::new(Reject {
            journal: journal.clone(),
        }),
        tracing("C", &journal),
    ];
    let chain = FilterChain::build(recording.clone(), &filters);

    let err = block_on(chain.invoke(greet("spark"))).expect_err("框架错误必须中止链路");
    assert_eq!(err.remote_kind(), Some(RemoteCallKind::Forbidden));
    assert_eq!(
        journal.entries(),
        ["A:before", "reject"],
        "外层不得收到后置回调，内层与 base 不得被访问"
    );
    assert_eq!(recording.invocation_count(), 0);
}

#[test]
fn failure_returned_as_data_still_flows_through_post_processing() {
    let journal = Journal::default();
    let base: Arc<dyn Invoker> = Arc::new(
        RecordingInvoker::with_responder(greeter_type(), greeter_url(), |_| {
            Ok(RpcResult::from_failure(RpcError::service(
                "IllegalState",
                "greeter is closed",
            )))
        })
        .with_journal(journal.clone()),
    );
    let filters = [tracing("A", &journal), Arc::new(StampResult) as Arc<dyn Filter>];
    let chain = FilterChain::build(base, &filters);

    let result = block_on(chain.invoke(greet("spark"))).expect("业务失败以数据形式返回");
    assert!(result.has_failure());
    assert_eq!(result.attachment("stamped"), Some("true"));
    assert_eq!(journal.entries(), ["A:before", "base", "A:after"]);
    assert!(matches!(result.recreate(), Err(RpcError::Service(fault)) if fault.kind() == "IllegalState"));
}

#[test]
fn echo_filter_short_circuits_before_the_service() {
    let recording = RecordingInvoker::greeter();
    let chain = FilterChain::build(recording.clone(), &[Arc::new(EchoFilter) as Arc<dyn Filter>]);

    let echo = Invocation::new("$echo", vec!["object".into()], vec![json!({"ping": 1})]);
    let result = block_on(chain.invoke(echo)).expect("回声调用应当成功");
    assert_eq!(result.recreate().expect("回声返回参数本身"), json!({"ping": 1}));
    assert_eq!(recording.invocation_count(), 0, "回声不得触达服务实现");

    block_on(chain.invoke(greet("spark"))).expect("普通调用照常下传");
    assert_eq!(recording.invocation_count(), 1);
}

#[test]
fn chain_reports_base_metadata_and_destroys_base() {
    let recording = RecordingInvoker::greeter();
    let journal = Journal::default();
    let chain = FilterChain::build(
        recording.clone(),
        &[tracing("A", &journal), tracing("B", &journal)],
    );

    assert_eq!(chain.service_type(), &greeter_type());
    assert_eq!(chain.url(), &greeter_url());
    assert!(chain.is_available());

    chain.destroy();
    assert_eq!(recording.destroy_calls(), 1);
    assert!(!chain.is_available());

    let err = block_on(chain.invoke(greet("spark"))).expect_err("销毁后调用必须失败");
    assert_eq!(err.remote_kind(), Some(RemoteCallKind::Destroyed));
}

#[test]
fn empty_chain_is_the_base_itself() {
    let base: Arc<dyn Invoker> = RecordingInvoker::greeter();
    let chain = FilterChain::build(Arc::clone(&base), &[]);
    assert!(Arc::ptr_eq(&base, &chain));
}
