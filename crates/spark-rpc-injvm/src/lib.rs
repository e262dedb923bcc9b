#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]
#![doc = r#"
# spark-rpc-injvm

## 设计动机（Why）
- **定位**：提供名为 `injvm` 的进程内协议，导出方与引用方在同一进程内直接对接，
  不经过任何线路编解码。
- **架构角色**：作为 [`spark_rpc::Protocol`] 的参考实现，覆盖导出幂等、引用检查、
  销毁后可重入等协议契约，同时为上层提供零网络开销的本地调用路径。

## 核心契约（What）
- **导出**：同一地址只绑定一次进程内端点；同一服务键（`[group/]path[:version]`，
  `path` 为空时回落服务类型名）重复导出返回同一个 Exporter；
- **引用**：`check` 缺省为真，此时无提供方直接返回 `RpcError::Refer`；`check=false`
  时照常返回 Invoker，提供方就绪前 `is_available()` 为假，调用返回网络类错误；
- **销毁**：释放全部端点、引用方 Invoker 与 Exporter，之后协议可再次使用。

## 实现策略（How）
- 资源台账复用 [`spark_rpc::ProtocolResources`]；
- 引用方 Invoker 每次调用都按服务键查找导出表，因而提供方随时上线即可恢复，
  下线后立即失效，不缓存任何 Exporter 引用。

## 风险与考量（Trade-offs）
- 调用直接在调用方任务中执行提供方逻辑，没有线程切换；提供方阻塞会直接阻塞调用方。
- 参数不经序列化，`Value` 原样穿过；依赖序列化副作用的行为在本协议下观察不到。
"#]

mod endpoint;
mod invoker;
mod protocol;

pub use endpoint::LocalEndpoint;
pub use invoker::InjvmInvoker;
pub use protocol::InjvmProtocol;

/// 协议扩展名。
pub const NAME: &str = "injvm";

/// 进程内协议不占用端口。
pub const DEFAULT_PORT: u16 = 0;
