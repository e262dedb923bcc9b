//! Exporter 生命周期契约：构造校验、一次性下线、导出幂等。

#[path = "../support/mod.rs"]
mod support;

use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use futures::executor::block_on;
use spark_rpc::{BaseExporter, Exporter, Invoker, Protocol, RpcError, ServiceType, Url};
use support::{MockProtocol, RecordingInvoker, greeter_type, greeter_url};

#[test]
fn construction_rejects_missing_identity_eagerly() {
    let anonymous: Arc<dyn Invoker> = Arc::new(RecordingInvoker::new(
        ServiceType::opaque(""),
        greeter_url(),
    ));
    assert!(
        matches!(BaseExporter::new(anonymous), Err(RpcError::Construction { .. })),
        "缺少服务类型必须在构造时立即失败"
    );

    let unaddressed: Arc<dyn Invoker> = Arc::new(RecordingInvoker::new(
        greeter_type(),
        Url::default(),
    ));
    assert!(
        matches!(BaseExporter::new(unaddressed), Err(RpcError::Construction { .. })),
        "缺少端点描述符必须在构造时立即失败"
    );
}

#[test]
fn invoker_is_constant_and_unexport_destroys_once() {
    let recording = RecordingInvoker::greeter();
    let invoker: Arc<dyn Invoker> = recording.clone();
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let hook_counter = Arc::clone(&hook_calls);
    let observed = Arc::clone(&recording);
    let exporter = BaseExporter::new(Arc::clone(&invoker))
        .expect("合法 Invoker 必须构造成功")
        .with_unexport_hook(move || {
            assert_eq!(observed.destroy_calls(), 0, "钩子必须在 destroy 之前执行");
            hook_counter.fetch_add(1, Ordering::SeqCst);
        });

    assert!(Arc::ptr_eq(exporter.invoker(), &invoker));
    assert!(!exporter.is_unexported());

    for _ in 0..3 {
        exporter.unexport();
    }
    assert!(exporter.is_unexported());
    assert_eq!(recording.destroy_calls(), 1);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    assert!(!invoker.is_available(), "下线后 Invoker 不再可用");
}

#[test]
fn concurrent_unexport_destroys_exactly_once() {
    const CALLERS: usize = 16;

    let recording = RecordingInvoker::greeter();
    let exporter = Arc::new(
        BaseExporter::new(recording.clone()).expect("合法 Invoker 必须构造成功"),
    );
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let exporter = Arc::clone(&exporter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                exporter.unexport();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("下线线程不应 panic");
    }

    assert_eq!(recording.destroy_calls(), 1, "并发下线只能销毁一次");
}

#[test]
fn repeated_export_of_same_invoker_shares_one_exporter() {
    let protocol = MockProtocol::new();
    let recording = RecordingInvoker::greeter();
    let invoker: Arc<dyn Invoker> = recording.clone();

    let first = block_on(protocol.export(Arc::clone(&invoker))).expect("首次导出应当成功");
    let second = block_on(protocol.export(Arc::clone(&invoker))).expect("重复导出应当成功");

    assert!(Arc::ptr_eq(&first, &second), "同一服务键必须复用 Exporter");
    assert_eq!(protocol.resources.endpoint_count(), 1, "不得创建第二个监听端点");
    assert_eq!(protocol.resources.exporter_count(), 1);

    first.unexport();
    second.unexport();
    assert_eq!(recording.destroy_calls(), 1, "两个句柄合计只能销毁一次");
    assert_eq!(protocol.resources.exporter_count(), 0);
}

#[test]
fn exporting_after_destroy_reacquires_resources() {
    let protocol = MockProtocol::new();
    block_on(protocol.export(RecordingInvoker::greeter())).expect("导出应当成功");
    protocol.destroy();
    assert_eq!(protocol.resources.endpoint_count(), 0);
    assert_eq!(protocol.resources.exporter_count(), 0);

    block_on(protocol.export(RecordingInvoker::greeter())).expect("销毁后仍可再次导出");
    assert_eq!(protocol.resources.endpoint_count(), 1);
    assert_eq!(protocol.resources.exporter_count(), 1);
}

#[test]
fn failed_construction_binds_no_endpoint() {
    let protocol = MockProtocol::new();
    let anonymous = Arc::new(RecordingInvoker::new(ServiceType::opaque(""), greeter_url()));
    let err = block_on(protocol.export(anonymous))
        .err()
        .expect("缺少服务类型必须导出失败");
    assert!(matches!(err, RpcError::Construction { .. }));
    assert_eq!(protocol.resources.endpoint_count(), 0, "构造失败不得遗留端点");
    assert_eq!(protocol.resources.exporter_count(), 0);
}
