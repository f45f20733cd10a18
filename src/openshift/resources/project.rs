// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use super::{Cell, Column, ColumnType, OpenShiftTable, openshift_resource};
use crate::openshift::field_selectors::KeyColumn;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub finalizers: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub phase: Option<String>,
}

/// `project.openshift.io/v1` Project, cluster scoped
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ProjectSpec,
    #[serde(default)]
    pub status: ProjectStatus,
}

openshift_resource!(Project, group = "project.openshift.io", version = "v1", kind = "Project", plural = "projects");

impl OpenShiftTable for Project {
    const TABLE: &'static str = "openshift_project";
    const DESCRIPTION: &'static str = "Retrieve information about OpenShift Projects.";
    const NAMESPACED: bool = false;
    const LIST_KEY_QUALS: &'static [KeyColumn] = &[];

    fn kind_columns() -> Vec<Column<Self>> {
        vec![
            Column::new(
                "phase",
                ColumnType::Text,
                "Current lifecycle phase of the project.",
                |p| Cell::text(p.status.phase.as_deref()),
            ),
            Column::new(
                "spec_finalizers",
                ColumnType::Json,
                "Opaque values that must be empty to permanently remove the object from storage.",
                |p| Cell::json(p.spec.finalizers.as_ref()),
            ),
        ]
    }
}
