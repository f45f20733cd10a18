// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Typed OpenShift resources and their column tables
//!
//! Each resource kind is a serde struct with a `kube::Resource` impl and a
//! static list of [`Column`]s. A column pairs an output name and type with a
//! pure projection from the typed object to a [`Cell`]. Every table starts
//! with the common object metadata columns and ends with `title`.

use std::collections::BTreeMap;
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::Resource;
use kube::core::DynamicResourceScope;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::field_selectors::KeyColumn;

mod build;
mod deployment_config;
mod image_stream;
mod oauth_access_token;
mod project;
mod route;
mod user;

pub use build::{Build, BuildConfig};
pub use deployment_config::DeploymentConfig;
pub use image_stream::ImageStream;
pub use oauth_access_token::OAuthAccessToken;
pub use project::Project;
pub use route::Route;
pub use user::User;

/// Implements `kube::Resource` for a hand-written OpenShift type
///
/// Scope is always `DynamicResourceScope` so one `Api` constructor serves both
/// namespaced and cluster-scoped kinds.
macro_rules! openshift_resource {
    ($ty:ident, group = $group:literal, version = $version:literal, kind = $kind:literal, plural = $plural:literal) => {
        impl ::kube::Resource for $ty {
            type DynamicType = ();
            type Scope = ::kube::core::DynamicResourceScope;

            fn kind(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed($kind)
            }

            fn group(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed($group)
            }

            fn version(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed($version)
            }

            fn api_version(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed(concat!($group, "/", $version))
            }

            fn plural(_: &()) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed($plural)
            }

            fn meta(&self) -> &::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                &self.metadata
            }

            fn meta_mut(&mut self) -> &mut ::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                &mut self.metadata
            }
        }
    };
}
pub(crate) use openshift_resource;

/// Output column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Int,
    Bool,
    /// UTC timestamp, millisecond precision
    Timestamp,
    /// Nested structure serialized as JSON text
    Json,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Int => "integer",
            ColumnType::Bool => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Json => "json",
        }
    }
}

/// One projected value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Cell {
    pub fn text(value: Option<&str>) -> Cell {
        value.map_or(Cell::Null, |s| Cell::Text(s.to_string()))
    }

    pub fn int<T: Into<i64>>(value: Option<T>) -> Cell {
        value.map_or(Cell::Null, |v| Cell::Int(v.into()))
    }

    pub fn bool(value: Option<bool>) -> Cell {
        value.map_or(Cell::Null, Cell::Bool)
    }

    pub fn timestamp(value: Option<&Time>) -> Cell {
        value.map_or(Cell::Null, |t| Cell::Timestamp(t.0))
    }

    /// Serialize a nested value; absent or null values give `Null`
    pub fn json<T: Serialize + ?Sized>(value: Option<&T>) -> Cell {
        match value.and_then(|v| serde_json::to_value(v).ok()) {
            None | Some(serde_json::Value::Null) => Cell::Null,
            Some(v) => Cell::Json(v),
        }
    }

    /// Render a label selector map as `a=b,c=d`, sorted by key
    ///
    /// An absent or empty map gives `Null`.
    pub fn selector(value: Option<&BTreeMap<String, String>>) -> Cell {
        match value {
            Some(map) if !map.is_empty() => Cell::Text(
                map.iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            _ => Cell::Null,
        }
    }
}

/// Maps one output column to a projection of `K`
pub struct Column<K> {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub description: &'static str,
    pub project: fn(&K) -> Cell,
}

impl<K> Column<K> {
    pub const fn new(
        name: &'static str,
        column_type: ColumnType,
        description: &'static str,
        project: fn(&K) -> Cell,
    ) -> Self {
        Self {
            name,
            column_type,
            description,
            project,
        }
    }
}

impl<K> Clone for Column<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Column<K> {}

impl<K> Debug for Column<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("column_type", &self.column_type)
            .finish()
    }
}

/// Columns shared by every OpenShift object
fn metadata_columns<K: Resource>() -> Vec<Column<K>> {
    use ColumnType::*;
    vec![
        Column::new(
            "name",
            Text,
            "Name of the object. Name must be unique within a namespace.",
            |k| Cell::text(k.meta().name.as_deref()),
        ),
        Column::new(
            "namespace",
            Text,
            "Namespace defines the space within which each name must be unique.",
            |k| Cell::text(k.meta().namespace.as_deref()),
        ),
        Column::new(
            "uid",
            Text,
            "UID is the unique in time and space value for this object.",
            |k| Cell::text(k.meta().uid.as_deref().filter(|uid| !uid.is_empty())),
        ),
        Column::new(
            "generate_name",
            Text,
            "Optional prefix used by the server to generate a unique name when none is given.",
            |k| Cell::text(k.meta().generate_name.as_deref()),
        ),
        Column::new(
            "resource_version",
            Text,
            "Opaque value that represents the internal version of this object.",
            |k| Cell::text(k.meta().resource_version.as_deref()),
        ),
        Column::new(
            "generation",
            Int,
            "A sequence number representing a specific generation of the desired state.",
            |k| Cell::int(k.meta().generation),
        ),
        Column::new(
            "creation_timestamp",
            Timestamp,
            "Server time when this object was created.",
            |k| Cell::timestamp(k.meta().creation_timestamp.as_ref()),
        ),
        Column::new(
            "deletion_timestamp",
            Timestamp,
            "Time at which this resource will be deleted.",
            |k| Cell::timestamp(k.meta().deletion_timestamp.as_ref()),
        ),
        Column::new(
            "deletion_grace_period_seconds",
            Int,
            "Seconds allowed for this object to gracefully terminate before removal.",
            |k| Cell::int(k.meta().deletion_grace_period_seconds),
        ),
        Column::new(
            "labels",
            Json,
            "Map of string keys and values used to organize and select objects.",
            |k| Cell::json(k.meta().labels.as_ref()),
        ),
        Column::new(
            "annotations",
            Json,
            "Unstructured key value map set by external tools.",
            |k| Cell::json(k.meta().annotations.as_ref()),
        ),
        Column::new(
            "owner_references",
            Json,
            "Objects depended on by this object.",
            |k| Cell::json(k.meta().owner_references.as_ref()),
        ),
        Column::new(
            "finalizers",
            Json,
            "Identifiers that must be removed before the object is deleted.",
            |k| Cell::json(k.meta().finalizers.as_ref()),
        ),
    ]
}

fn title_column<K: Resource>() -> Column<K> {
    Column::new("title", ColumnType::Text, "Title of the resource.", |k| {
        Cell::text(k.meta().name.as_deref())
    })
}

/// An OpenShift resource kind exposed as a SQL table
pub trait OpenShiftTable:
    Resource<DynamicType = (), Scope = DynamicResourceScope>
    + Clone
    + DeserializeOwned
    + Debug
    + Send
    + Sync
    + 'static
{
    const TABLE: &'static str;
    const DESCRIPTION: &'static str;
    const NAMESPACED: bool;
    /// Largest page requested from the API server
    const PAGE_CEILING: u32 = 1000;
    /// Key columns the list call turns into a field selector
    const LIST_KEY_QUALS: &'static [KeyColumn];

    /// Columns specific to this kind
    fn kind_columns() -> Vec<Column<Self>>;

    /// Key columns that must all be bound for a point lookup
    fn get_keys() -> &'static [KeyColumn] {
        if Self::NAMESPACED {
            &[KeyColumn::Name, KeyColumn::Namespace]
        } else {
            &[KeyColumn::Name]
        }
    }

    /// Full column table: metadata, kind specific, then `title`
    fn columns() -> Vec<Column<Self>> {
        let mut columns = metadata_columns::<Self>();
        columns.extend(Self::kind_columns());
        columns.push(title_column::<Self>());
        columns
    }

    fn info() -> TableInfo {
        TableInfo {
            name: Self::TABLE,
            api_version: Self::api_version(&()).into_owned(),
            kind: Self::kind(&()).into_owned(),
            namespaced: Self::NAMESPACED,
            description: Self::DESCRIPTION,
            columns: Self::columns()
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name,
                    column_type: c.column_type,
                    description: c.description,
                })
                .collect(),
        }
    }
}

/// Column metadata without the projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub description: &'static str,
}

/// Registry entry for one table
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: &'static str,
    pub api_version: String,
    pub kind: String,
    pub namespaced: bool,
    pub description: &'static str,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn scope(&self) -> &'static str {
        if self.namespaced {
            "Namespaced"
        } else {
            "Cluster"
        }
    }

    pub fn gvk(&self) -> String {
        format!("{}/{}", self.api_version, self.kind)
    }
}

/// Every table, sorted by name
pub fn all_tables() -> Vec<TableInfo> {
    let mut tables = vec![
        Build::info(),
        BuildConfig::info(),
        DeploymentConfig::info(),
        ImageStream::info(),
        OAuthAccessToken::info(),
        Project::info(),
        Route::info(),
        User::info(),
    ];
    tables.sort_by_key(|t| t.name);
    tables
}
