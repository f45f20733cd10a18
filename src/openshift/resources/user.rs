// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use super::{Cell, Column, ColumnType, OpenShiftTable, openshift_resource};
use crate::openshift::field_selectors::KeyColumn;

/// `user.openshift.io/v1` User, cluster scoped
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub full_name: Option<String>,
    pub identities: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
}

openshift_resource!(User, group = "user.openshift.io", version = "v1", kind = "User", plural = "users");

impl OpenShiftTable for User {
    const TABLE: &'static str = "openshift_user";
    const DESCRIPTION: &'static str = "Retrieve information about OpenShift users.";
    const NAMESPACED: bool = false;
    const LIST_KEY_QUALS: &'static [KeyColumn] = &[];

    fn kind_columns() -> Vec<Column<Self>> {
        vec![
            Column::new("full_name", ColumnType::Text, "Full name of the user.", |u| {
                Cell::text(u.full_name.as_deref())
            }),
            Column::new(
                "identities",
                ColumnType::Json,
                "Identities associated with this user.",
                |u| Cell::json(u.identities.as_ref()),
            ),
            Column::new(
                "groups",
                ColumnType::Json,
                "Group names this user is a member of.",
                |u| Cell::json(u.groups.as_ref()),
            ),
        ]
    }
}
