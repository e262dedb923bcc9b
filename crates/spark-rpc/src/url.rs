//! 端点描述符：协议、地址、服务路径与参数表。
//!
//! # 设计背景（Why）
//! - 调用内核对外只暴露一种配置载体，Filter 激活、超时阈值、引用检查等参数都从这里读取；
//! - 参数表使用 `BTreeMap`，保证 `Display` 输出与哈希结果稳定，便于作为日志字段与缓存键。
//!
//! # 契约说明（What）
//! - 文本形式：`protocol://host[:port][/path][?k=v&flag]`，端口 `0` 与空查询串在输出时省略；
//! - 无值参数（`?flag`）解析为空字符串值；
//! - 解析失败返回 [`UrlError`]，不会 panic。

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::{GROUP_KEY, TRUE_VALUE, VERSION_KEY};

/// 端点描述符解析错误。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("url `{input}` is missing a `<protocol>://` prefix")]
    MissingProtocol { input: String },
    #[error("url `{input}` carries an invalid port `{port}`")]
    InvalidPort { input: String, port: String },
}

/// 端点描述符。
///
/// # 教案式说明
/// - **意图 (Why)**：在 Protocol、Filter 与 Proxy 之间传递“目标在哪里、如何调用”的全部信息；
/// - **契约 (What)**：值类型，可克隆、可比较、可哈希、可序列化；所有 `with_*` 方法均返回新值；
/// - **风险 (Trade-offs)**：不做百分号编码，参数值中出现 `&`、`=` 时需由调用方自行转义。
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Url {
    protocol: String,
    host: String,
    port: u16,
    path: String,
    parameters: BTreeMap<String, String>,
}

impl Url {
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            path: String::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into().trim_start_matches('/').to_owned();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// 读取参数，空值与缺失都回落到 `default`。
    pub fn parameter_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.parameter(key) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        }
    }

    /// 布尔参数，仅 `"true"`（忽略大小写）视为开启。
    pub fn bool_parameter(&self, key: &str, default: bool) -> bool {
        match self.parameter(key) {
            Some(value) if !value.is_empty() => value.eq_ignore_ascii_case(TRUE_VALUE),
            _ => default,
        }
    }

    /// 整型参数，无法解析时回落到 `default`。
    pub fn u64_parameter(&self, key: &str, default: u64) -> u64 {
        self.parameter(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// 逗号分隔的列表参数，去除空白与空项。
    pub fn list_parameter(&self, key: &str) -> Vec<&str> {
        self.parameter(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `host:port` 形式的地址，作为端点共享键。
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `[group/]path[:version]` 形式的服务键。
    pub fn service_key(&self) -> String {
        compose_service_key(
            self.parameter(GROUP_KEY),
            &self.path,
            self.parameter(VERSION_KEY),
        )
    }
}

/// 按 `[group/]name[:version]` 组合服务键，空分组与空版本省略。
pub fn compose_service_key(group: Option<&str>, name: &str, version: Option<&str>) -> String {
    let mut key = String::with_capacity(name.len() + 16);
    if let Some(group) = group.filter(|g| !g.is_empty()) {
        key.push_str(group);
        key.push('/');
    }
    key.push_str(name);
    if let Some(version) = version.filter(|v| !v.is_empty()) {
        key.push(':');
        key.push_str(version);
    }
    key
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.host)?;
        if self.port != 0 {
            write!(f, ":{}", self.port)?;
        }
        if !self.path.is_empty() {
            write!(f, "/{}", self.path)?;
        }
        let mut separator = '?';
        for (key, value) in &self.parameters {
            if value.is_empty() {
                write!(f, "{separator}{key}")?;
            } else {
                write!(f, "{separator}{key}={value}")?;
            }
            separator = '&';
        }
        Ok(())
    }
}

impl FromStr for Url {
    type Err = UrlError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (protocol, rest) = input
            .split_once("://")
            .filter(|(protocol, _)| !protocol.is_empty())
            .ok_or_else(|| UrlError::MissingProtocol {
                input: input.to_owned(),
            })?;

        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };
        let (authority, path) = match location.split_once('/') {
            Some((authority, path)) => (authority, path),
            None => (location, ""),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| UrlError::InvalidPort {
                    input: input.to_owned(),
                    port: port.to_owned(),
                })?;
                (host, port)
            }
            None => (authority, 0),
        };

        let mut url = Url::new(protocol, host, port).with_path(path);
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            url = match pair.split_once('=') {
                Some((key, value)) => url.with_parameter(key, value),
                None => url.with_parameter(pair, ""),
            };
        }
        Ok(url)
    }
}
