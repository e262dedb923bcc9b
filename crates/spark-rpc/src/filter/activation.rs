use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::{
    error::RpcError,
    keys::{DEFAULT_KEY, REMOVE_VALUE_PREFIX},
    url::Url,
};

use super::Filter;

/// Filter 生效的一侧。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterSide {
    /// 服务提供方，导出时装配。
    Provider,
    /// 服务消费方，引用时装配。
    Consumer,
}

/// Filter 的自动激活元数据。
///
/// # 契约说明（What）
/// - `sides` 为空表示只能通过 URL 显式选择；
/// - `order` 越小越靠外层，先执行前置逻辑；同序按名称字典序排列；
/// - `required_key` 非空时，只有 URL 中存在该键且取值不为 `"false"` 才自动激活。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activation {
    provider: bool,
    consumer: bool,
    order: i32,
    required_key: Option<&'static str>,
}

impl Activation {
    pub fn provider() -> Self {
        Self::on(true, false)
    }

    pub fn consumer() -> Self {
        Self::on(false, true)
    }

    pub fn both() -> Self {
        Self::on(true, true)
    }

    /// 不自动激活，仅能显式选择。
    pub fn manual() -> Self {
        Self::on(false, false)
    }

    fn on(provider: bool, consumer: bool) -> Self {
        Self {
            provider,
            consumer,
            order: 0,
            required_key: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_required_key(mut self, key: &'static str) -> Self {
        self.required_key = Some(key);
        self
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn applies_to(&self, side: FilterSide) -> bool {
        match side {
            FilterSide::Provider => self.provider,
            FilterSide::Consumer => self.consumer,
        }
    }

    fn auto_activates(&self, url: &Url, side: FilterSide) -> bool {
        self.applies_to(side)
            && self.required_key.is_none_or(|key| {
                url.parameter(key)
                    .is_some_and(|value| !value.eq_ignore_ascii_case("false"))
            })
    }
}

#[derive(Clone)]
struct CatalogEntry {
    name: String,
    activation: Activation,
    filter: Arc<dyn Filter>,
}

/// 具名 Filter 目录，负责“给定 URL 与一侧，得出有序 Filter 列表”。
///
/// # 教案式说明
/// - **意图 (Why)**：链的组成由配置决定，但排序必须确定，重复装配必须得到同一条链；
/// - **契约 (What)**：选择列表取自 URL 参数 `key`（逗号分隔）：
///   - 普通名称显式加入，名称未注册时返回 [`RpcError::NoSuchExtension`]；
///   - `-name` 剔除该 Filter，优先级高于显式加入；
///   - `-default` 关闭全部自动激活项，`default` 仅为占位；
///   - 最终按 `(order, name)` 排序，与注册顺序无关；
/// - **风险 (Trade-offs)**：同名重复注册时后者覆盖前者。
#[derive(Clone, Default)]
pub struct FilterCatalog {
    entries: Vec<CatalogEntry>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        activation: Activation,
        filter: Arc<dyn Filter>,
    ) -> &mut Self {
        let name = name.into();
        self.entries.retain(|entry| entry.name != name);
        self.entries.push(CatalogEntry {
            name,
            activation,
            filter,
        });
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 选出适用于 `side` 的 Filter 名称，按 `(order, name)` 排序。
    pub fn activate_names(
        &self,
        url: &Url,
        key: &str,
        side: FilterSide,
    ) -> Result<Vec<String>, RpcError> {
        Ok(self
            .select(url, key, side)?
            .into_iter()
            .map(|entry| entry.name.clone())
            .collect())
    }

    /// 选出适用于 `side` 的 Filter 实例，顺序同 [`FilterCatalog::activate_names`]。
    pub fn activate(
        &self,
        url: &Url,
        key: &str,
        side: FilterSide,
    ) -> Result<Vec<Arc<dyn Filter>>, RpcError> {
        Ok(self
            .select(url, key, side)?
            .into_iter()
            .map(|entry| Arc::clone(&entry.filter))
            .collect())
    }

    fn select(&self, url: &Url, key: &str, side: FilterSide) -> Result<Vec<&CatalogEntry>, RpcError> {
        let requested = url.list_parameter(key);
        let removed: BTreeSet<&str> = requested
            .iter()
            .filter_map(|name| name.strip_prefix(REMOVE_VALUE_PREFIX))
            .collect();
        let explicit: BTreeSet<&str> = requested
            .iter()
            .copied()
            .filter(|name| !name.starts_with(REMOVE_VALUE_PREFIX) && *name != DEFAULT_KEY)
            .collect();

        if let Some(missing) = explicit.iter().find(|name| !self.contains(name)) {
            return Err(RpcError::NoSuchExtension {
                point: "filter",
                name: (*missing).to_owned(),
            });
        }

        let auto_enabled = !removed.contains(DEFAULT_KEY);
        let mut selected: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| !removed.contains(entry.name.as_str()))
            .filter(|entry| {
                explicit.contains(entry.name.as_str())
                    || (auto_enabled && entry.activation.auto_activates(url, side))
            })
            .collect();
        selected.sort_by(|a, b| {
            (a.activation.order, a.name.as_str()).cmp(&(b.activation.order, b.name.as_str()))
        });
        Ok(selected)
    }
}

impl fmt::Debug for FilterCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (&e.name, &e.activation)))
            .finish()
    }
}
