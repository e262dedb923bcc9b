//! 端点描述符参数键与附件键的集中定义。
//!
//! # 设计背景（Why）
//! - 调用内核不负责配置加载，所有可调参数都经由 [`Url`](crate::Url) 的参数表传入；
//! - 将键名集中在一处，避免在 Filter、Protocol 与 Proxy 之间散落魔法字符串。
//!
//! # 契约说明（What）
//! - 参数键（`*_KEY`）读取自端点描述符；附件键（`ASYNC_KEY`、`FUTURE_KEY`、`GENERIC_KEY`）写入 [`Invocation`](crate::Invocation)；
//! - 附件取值统一使用字符串 `"true"` 表示开启。

/// 引用时是否检查提供方可达，缺省为 `true`。
pub const CHECK_KEY: &str = "check";

/// 调用超时阈值（毫秒）。
pub const TIMEOUT_KEY: &str = "timeout";

/// [`TIMEOUT_KEY`] 缺省值。
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// 提供方 Filter 选择键。
pub const SERVICE_FILTER_KEY: &str = "service.filter";

/// 消费方 Filter 选择键。
pub const REFERENCE_FILTER_KEY: &str = "reference.filter";

/// ProxyFactory 选择键。
pub const PROXY_KEY: &str = "proxy";

/// 访问日志开关。
pub const ACCESS_LOG_KEY: &str = "accesslog";

/// 服务分组。
pub const GROUP_KEY: &str = "group";

/// 服务版本。
pub const VERSION_KEY: &str = "version";

/// 附件：本次调用按异步语义处理。
pub const ASYNC_KEY: &str = "async";

/// 附件：调用方以 future 句柄观察结果。
pub const FUTURE_KEY: &str = "future";

/// 附件：泛化调用，调用方未持有编译期接口。
pub const GENERIC_KEY: &str = "generic";

/// 附件与开关的“开启”取值。
pub const TRUE_VALUE: &str = "true";

/// 异步调用约定的方法名后缀。
pub const ASYNC_SUFFIX: &str = "_async";

/// 回声探活方法名。
pub const ECHO_METHOD: &str = "$echo";

/// Filter 选择列表中代表“全部自动激活项”的占位名。
pub const DEFAULT_KEY: &str = "default";

/// Filter 选择列表中的剔除前缀。
pub const REMOVE_VALUE_PREFIX: char = '-';

/// Protocol 扩展点缺省实现名。
pub const DEFAULT_PROTOCOL: &str = "dubbo";

/// ProxyFactory 扩展点缺省实现名：编译期生成的适配器。
pub const DEFAULT_PROXY_FACTORY: &str = "generated";
