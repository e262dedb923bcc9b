//! 内部 sealed 模块，为公开扩展点保留演进空间。
//!
//! # 设计背景（Why）
//! - `Invoker`、`Filter`、`Protocol` 等 Trait 是整个调用内核的扩展点，后续需要在不破坏 SemVer 的前提下追加默认方法。
//! - 通过统一的 `Sealed` 标记，未来若要收紧实现者集合，只需修改此处的 blanket 实现。
//!
//! # 契约说明（What）
//! - 任意类型默认满足 `Sealed`，调用方无需显式实现；
//! - 公共 Trait 的行为契约仍在各自定义处描述，此模块只负责“实现许可”。
pub(crate) trait Sealed {}

impl<T: ?Sized> Sealed for T {}
