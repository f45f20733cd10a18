// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Cell, Column, ColumnType, OpenShiftTable, openshift_resource};
use crate::openshift::field_selectors::KeyColumn;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamSpec {
    pub lookup_policy: Option<Value>,
    pub tags: Option<Vec<Value>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamStatus {
    pub docker_image_repository: Option<String>,
    pub public_docker_image_repository: Option<String>,
    pub tags: Option<Vec<Value>>,
}

/// `image.openshift.io/v1` ImageStream
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImageStream {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ImageStreamSpec,
    #[serde(default)]
    pub status: ImageStreamStatus,
}

openshift_resource!(ImageStream, group = "image.openshift.io", version = "v1", kind = "ImageStream", plural = "imagestreams");

impl OpenShiftTable for ImageStream {
    const TABLE: &'static str = "openshift_image_stream";
    const DESCRIPTION: &'static str = "Retrieve information about your image streams.";
    const NAMESPACED: bool = true;
    // image stream objects carry full tag histories
    const PAGE_CEILING: u32 = 500;
    const LIST_KEY_QUALS: &'static [KeyColumn] = &[KeyColumn::Name, KeyColumn::Namespace];

    fn kind_columns() -> Vec<Column<Self>> {
        use ColumnType::*;
        vec![
            Column::new(
                "lookup_policy",
                Json,
                "Controls how other resources reference images within this namespace.",
                |is| Cell::json(is.spec.lookup_policy.as_ref()),
            ),
            Column::new(
                "spec_tags",
                Json,
                "Tags mapping arbitrary string values to specific image locators.",
                |is| Cell::json(is.spec.tags.as_ref()),
            ),
            Column::new(
                "docker_image_repository",
                Text,
                "Effective location this stream may be accessed at.",
                |is| Cell::text(is.status.docker_image_repository.as_deref()),
            ),
            Column::new(
                "public_docker_image_repository",
                Text,
                "Public location the image can be pulled from outside the cluster.",
                |is| Cell::text(is.status.public_docker_image_repository.as_deref()),
            ),
            Column::new(
                "status_tags",
                Json,
                "Historical record of images associated with each tag.",
                |is| Cell::json(is.status.tags.as_ref()),
            ),
        ]
    }
}
