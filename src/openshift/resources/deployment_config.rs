// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Cell, Column, ColumnType, OpenShiftTable, openshift_resource};
use crate::openshift::field_selectors::KeyColumn;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigSpec {
    pub strategy: Option<Value>,
    pub min_ready_seconds: Option<i32>,
    pub triggers: Option<Vec<Value>>,
    pub replicas: Option<i32>,
    pub revision_history_limit: Option<i32>,
    pub test: Option<bool>,
    pub paused: Option<bool>,
    pub selector: Option<BTreeMap<String, String>>,
    pub template: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigStatus {
    pub latest_version: Option<i64>,
    pub observed_generation: Option<i64>,
    pub replicas: Option<i32>,
    pub updated_replicas: Option<i32>,
    pub available_replicas: Option<i32>,
    pub unavailable_replicas: Option<i32>,
    pub details: Option<Value>,
    pub conditions: Option<Vec<Value>>,
    pub ready_replicas: Option<i32>,
}

/// `apps.openshift.io/v1` DeploymentConfig
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DeploymentConfigSpec,
    #[serde(default)]
    pub status: DeploymentConfigStatus,
}

openshift_resource!(DeploymentConfig, group = "apps.openshift.io", version = "v1", kind = "DeploymentConfig", plural = "deploymentconfigs");

impl OpenShiftTable for DeploymentConfig {
    const TABLE: &'static str = "openshift_deployment_config";
    const DESCRIPTION: &'static str = "Retrieve information about OpenShift deployment configs.";
    const NAMESPACED: bool = true;
    const LIST_KEY_QUALS: &'static [KeyColumn] = &[KeyColumn::Name, KeyColumn::Namespace];

    fn kind_columns() -> Vec<Column<Self>> {
        use ColumnType::*;
        vec![
            Column::new(
                "strategy",
                Json,
                "How a deployment is executed.",
                |dc| Cell::json(dc.spec.strategy.as_ref()),
            ),
            Column::new(
                "min_ready_seconds",
                Int,
                "Minimum seconds a new pod must be ready without crashing to count as available.",
                |dc| Cell::int(dc.spec.min_ready_seconds),
            ),
            Column::new(
                "triggers",
                Json,
                "How updates to this deployment config result in new deployments.",
                |dc| Cell::json(dc.spec.triggers.as_ref()),
            ),
            Column::new(
                "replicas",
                Int,
                "Desired number of replicas.",
                |dc| Cell::int(dc.spec.replicas),
            ),
            Column::new(
                "revision_history_limit",
                Int,
                "Number of old replication controllers kept for rollbacks.",
                |dc| Cell::int(dc.spec.revision_history_limit),
            ),
            Column::new(
                "test",
                Bool,
                "Keeps zero replicas except while a deployment is running.",
                |dc| Cell::bool(dc.spec.test),
            ),
            Column::new(
                "paused",
                Bool,
                "No new deployments are triggered while paused.",
                |dc| Cell::bool(dc.spec.paused),
            ),
            Column::new(
                "selector",
                Text,
                "Label query over pods that should match the replica count, as `key=value` pairs.",
                |dc| Cell::selector(dc.spec.selector.as_ref()),
            ),
            Column::new(
                "template",
                Json,
                "Pod template used when insufficient replicas are detected.",
                |dc| Cell::json(dc.spec.template.as_ref()),
            ),
            Column::new(
                "latest_version",
                Int,
                "Used to determine whether the current deployment is out of sync.",
                |dc| Cell::int(dc.status.latest_version),
            ),
            Column::new(
                "observed_generation",
                Int,
                "Most recent generation observed by the deployment config controller.",
                |dc| Cell::int(dc.status.observed_generation),
            ),
            Column::new(
                "status_replicas",
                Int,
                "Total number of pods targeted by this deployment config.",
                |dc| Cell::int(dc.status.replicas),
            ),
            Column::new(
                "updated_replicas",
                Int,
                "Non-terminated pods that have the desired template spec.",
                |dc| Cell::int(dc.status.updated_replicas),
            ),
            Column::new(
                "available_replicas",
                Int,
                "Available pods targeted by this deployment config.",
                |dc| Cell::int(dc.status.available_replicas),
            ),
            Column::new(
                "unavailable_replicas",
                Int,
                "Unavailable pods targeted by this deployment config.",
                |dc| Cell::int(dc.status.unavailable_replicas),
            ),
            Column::new(
                "details",
                Json,
                "Reasons for the update to this deployment config.",
                |dc| Cell::json(dc.status.details.as_ref()),
            ),
            Column::new(
                "conditions",
                Json,
                "Latest available observations of the deployment config's state.",
                |dc| Cell::json(dc.status.conditions.as_ref()),
            ),
            Column::new(
                "ready_replicas",
                Int,
                "Ready pods targeted by this deployment.",
                |dc| Cell::int(dc.status.ready_replicas),
            ),
        ]
    }
}
