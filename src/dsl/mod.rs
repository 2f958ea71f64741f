//! Descriptor model of a widget definition file.
//!
//! A definition is a JSON document with the sections `action`, `layout`,
//! `fields.filter`, `fields.table`, `config`, `cprops` and `computes.in/out`.
//! Every section may be omitted or null and then parses to its empty value.

mod action;
mod cloud;
mod compute;
mod field;
mod kind;
mod layout;
mod widget;

pub use action::{ActionDsl, BindDsl, Hook, HookStage, Operation, ProcessBinding, Route};
pub use cloud::CloudProp;
pub use compute::{Compute, Computes};
pub use field::{
    ComponentDsl, ComponentSlot, FieldCollection, FieldComputes, FieldDsl, FieldsDsl, SourceRef,
    props_xpath,
};
pub use kind::WidgetKind;
pub use layout::{LayoutColumn, LayoutDsl, LayoutSection};
pub use widget::{SourceBinding, WidgetDescriptor};

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` like an omitted member.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
