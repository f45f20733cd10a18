// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Cell, Column, ColumnType, OpenShiftTable, openshift_resource};
use crate::openshift::field_selectors::KeyColumn;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    pub host: Option<String>,
    pub path: Option<String>,
    pub to: Option<Value>,
    pub alternate_backends: Option<Vec<Value>>,
    pub port: Option<Value>,
    pub subdomain: Option<String>,
    pub tls: Option<Value>,
    pub wildcard_policy: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RouteStatus {
    pub ingress: Option<Vec<Value>>,
}

/// `route.openshift.io/v1` Route
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: RouteSpec,
    #[serde(default)]
    pub status: RouteStatus,
}

openshift_resource!(Route, group = "route.openshift.io", version = "v1", kind = "Route", plural = "routes");

impl OpenShiftTable for Route {
    const TABLE: &'static str = "openshift_route";
    const DESCRIPTION: &'static str = "Retrieve information about OpenShift routes.";
    const NAMESPACED: bool = true;
    const LIST_KEY_QUALS: &'static [KeyColumn] = &[KeyColumn::Name, KeyColumn::Namespace];

    fn kind_columns() -> Vec<Column<Self>> {
        use ColumnType::*;
        vec![
            Column::new(
                "host",
                Text,
                "Alias/DNS name that points to the service.",
                |r| Cell::text(r.spec.host.as_deref()),
            ),
            Column::new(
                "path",
                Text,
                "Path the router watches for to route traffic to the service.",
                |r| Cell::text(r.spec.path.as_deref()),
            ),
            Column::new(
                "spec_to",
                Json,
                "Primary backend of the route.",
                |r| Cell::json(r.spec.to.as_ref()),
            ),
            Column::new(
                "alternate_backends",
                Json,
                "Up to 3 additional weighted backends.",
                |r| Cell::json(r.spec.alternate_backends.as_ref()),
            ),
            Column::new(
                "port",
                Json,
                "Port the router uses for the service endpoints.",
                |r| Cell::json(r.spec.port.as_ref()),
            ),
            Column::new(
                "subdomain",
                Text,
                "DNS subdomain requested within the ingress controller's domain.",
                |r| Cell::text(r.spec.subdomain.as_deref()),
            ),
            Column::new(
                "tls",
                Json,
                "Certificates and termination for the route.",
                |r| Cell::json(r.spec.tls.as_ref()),
            ),
            Column::new(
                "wildcard_policy",
                Text,
                "Wildcard policy for the route: Subdomain or None.",
                |r| Cell::text(r.spec.wildcard_policy.as_deref()),
            ),
            Column::new(
                "ingress",
                Json,
                "Places where the route may be exposed.",
                |r| Cell::json(r.status.ingress.as_ref()),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openshift::resources::tests::{column_names, project};

    #[test]
    fn test_route_columns() {
        let route: Route = serde_json::from_value(serde_json::json!({
            "apiVersion": "route.openshift.io/v1",
            "kind": "Route",
            "metadata": {
                "name": "frontend",
                "namespace": "shop",
                "creationTimestamp": "2024-01-15T10:30:00Z"
            },
            "spec": {
                "host": "shop.apps.example.com",
                "to": {"kind": "Service", "name": "frontend", "weight": 100},
                "tls": {"termination": "edge"},
                "wildcardPolicy": "None"
            },
            "status": {"ingress": [{"host": "shop.apps.example.com", "routerName": "default"}]}
        }))
        .unwrap();

        assert_eq!(project(&route, "host"), Cell::Text("shop.apps.example.com".to_string()));
        assert_eq!(project(&route, "path"), Cell::Null);
        assert_eq!(
            project(&route, "spec_to"),
            Cell::Json(serde_json::json!({"kind": "Service", "name": "frontend", "weight": 100}))
        );
        assert_eq!(project(&route, "wildcard_policy"), Cell::Text("None".to_string()));
        assert_eq!(project(&route, "namespace"), Cell::Text("shop".to_string()));
        assert!(matches!(project(&route, "creation_timestamp"), Cell::Timestamp(_)));
    }

    #[test]
    fn test_route_column_order() {
        let names = column_names::<Route>();
        assert_eq!(names[0], "name");
        assert_eq!(names[1], "namespace");
        assert_eq!(names.last(), Some(&"title"));
        assert_eq!(names[names.len() - 2], "ingress");
    }
}
