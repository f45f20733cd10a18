// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! `build.openshift.io/v1` Build and BuildConfig

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Cell, Column, ColumnType, OpenShiftTable, openshift_resource};
use crate::openshift::field_selectors::KeyColumn;

/// Fields shared by build and build config specs are inlined in the API
/// object, so everything not modelled explicitly lands in `common`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    pub triggered_by: Option<Vec<Value>>,
    #[serde(flatten)]
    pub common: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatus {
    pub phase: Option<String>,
    pub cancelled: Option<bool>,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub start_timestamp: Option<Time>,
    pub completion_timestamp: Option<Time>,
    /// Nanoseconds
    pub duration: Option<i64>,
    pub output_docker_image_reference: Option<String>,
    pub config: Option<Value>,
    pub output: Option<Value>,
    pub stages: Option<Vec<Value>>,
    pub log_snippet: Option<String>,
    pub conditions: Option<Vec<Value>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: BuildSpec,
    #[serde(default)]
    pub status: BuildStatus,
}

openshift_resource!(Build, group = "build.openshift.io", version = "v1", kind = "Build", plural = "builds");

fn common_spec(common: &Map<String, Value>) -> Cell {
    if common.is_empty() {
        Cell::Null
    } else {
        Cell::json(Some(common))
    }
}

impl OpenShiftTable for Build {
    const TABLE: &'static str = "openshift_build";
    const DESCRIPTION: &'static str = "Retrieve information about OpenShift builds.";
    const NAMESPACED: bool = true;
    const LIST_KEY_QUALS: &'static [KeyColumn] = &[KeyColumn::Name, KeyColumn::Namespace];

    fn kind_columns() -> Vec<Column<Self>> {
        use ColumnType::*;
        vec![
            Column::new(
                "common_spec",
                Json,
                "The information that represents a build.",
                |b| common_spec(&b.spec.common),
            ),
            Column::new(
                "triggered_by",
                Json,
                "Triggers that started the most recent update to the build configuration.",
                |b| Cell::json(b.spec.triggered_by.as_ref()),
            ),
            Column::new(
                "phase",
                Text,
                "Point in the build lifecycle: New, Pending, Running, Complete, Failed, Error or Cancelled.",
                |b| Cell::text(b.status.phase.as_deref()),
            ),
            Column::new(
                "cancelled",
                Bool,
                "Whether a cancel event was triggered for the build.",
                |b| Cell::bool(b.status.cancelled),
            ),
            Column::new(
                "reason",
                Text,
                "Brief CamelCase string that describes any failure.",
                |b| Cell::text(b.status.reason.as_deref()),
            ),
            Column::new(
                "message",
                Text,
                "Human-readable message indicating why the build has this status.",
                |b| Cell::text(b.status.message.as_deref()),
            ),
            Column::new(
                "start_timestamp",
                Timestamp,
                "Server time when this build started running in a pod.",
                |b| Cell::timestamp(b.status.start_timestamp.as_ref()),
            ),
            Column::new(
                "completion_timestamp",
                Timestamp,
                "Server time when this build finished, whether it failed or succeeded.",
                |b| Cell::timestamp(b.status.completion_timestamp.as_ref()),
            ),
            Column::new(
                "duration",
                Int,
                "Build time in nanoseconds.",
                |b| Cell::int(b.status.duration),
            ),
            Column::new(
                "output_docker_image_reference",
                Text,
                "Reference to the image built by this build, including the registry address.",
                |b| Cell::text(b.status.output_docker_image_reference.as_deref()),
            ),
            Column::new(
                "config",
                Json,
                "Reference to the BuildConfig this build is based on.",
                |b| Cell::json(b.status.config.as_ref()),
            ),
            Column::new(
                "output",
                Json,
                "The image the build has produced.",
                |b| Cell::json(b.status.output.as_ref()),
            ),
            Column::new(
                "stages",
                Json,
                "Details about each stage of the build, with start time, duration and steps.",
                |b| Cell::json(b.status.stages.as_ref()),
            ),
            Column::new(
                "log_snippet",
                Text,
                "Last few lines of the build log. Only set for failed builds.",
                |b| Cell::text(b.status.log_snippet.as_deref()),
            ),
            Column::new(
                "conditions",
                Json,
                "Latest available observations of the build's current state.",
                |b| Cell::json(b.status.conditions.as_ref()),
            ),
        ]
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfigSpec {
    pub triggers: Option<Vec<Value>>,
    pub run_policy: Option<String>,
    pub successful_builds_history_limit: Option<i32>,
    pub failed_builds_history_limit: Option<i32>,
    #[serde(flatten)]
    pub common: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfigStatus {
    pub last_version: Option<i64>,
    pub image_change_triggers: Option<Vec<Value>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: BuildConfigSpec,
    #[serde(default)]
    pub status: BuildConfigStatus,
}

openshift_resource!(BuildConfig, group = "build.openshift.io", version = "v1", kind = "BuildConfig", plural = "buildconfigs");

impl OpenShiftTable for BuildConfig {
    const TABLE: &'static str = "openshift_build_config";
    const DESCRIPTION: &'static str = "Retrieve information about OpenShift build configs.";
    const NAMESPACED: bool = true;
    const LIST_KEY_QUALS: &'static [KeyColumn] = &[KeyColumn::Name, KeyColumn::Namespace];

    fn kind_columns() -> Vec<Column<Self>> {
        use ColumnType::*;
        vec![
            Column::new(
                "common_spec",
                Json,
                "The desired build specification.",
                |bc| common_spec(&bc.spec.common),
            ),
            Column::new(
                "triggers",
                Json,
                "How new builds can be launched from this build config.",
                |bc| Cell::json(bc.spec.triggers.as_ref()),
            ),
            Column::new(
                "run_policy",
                Text,
                "How new builds from this build config are scheduled. Defaults to Serial.",
                |bc| Cell::text(bc.spec.run_policy.as_deref()),
            ),
            Column::new(
                "successful_builds_history_limit",
                Int,
                "Number of old successful builds to retain.",
                |bc| Cell::int(bc.spec.successful_builds_history_limit),
            ),
            Column::new(
                "failed_builds_history_limit",
                Int,
                "Number of old failed builds to retain.",
                |bc| Cell::int(bc.spec.failed_builds_history_limit),
            ),
            Column::new(
                "last_version",
                Int,
                "Number of the last triggered build.",
                |bc| Cell::int(bc.status.last_version),
            ),
            Column::new(
                "image_change_triggers",
                Json,
                "Runtime state of each image change trigger in the spec.",
                |bc| Cell::json(bc.status.image_change_triggers.as_ref()),
            ),
        ]
    }
}
