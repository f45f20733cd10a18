// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use super::{Cell, Column, ColumnType, OpenShiftTable, openshift_resource};
use crate::openshift::field_selectors::KeyColumn;

/// `oauth.openshift.io/v1` OAuthAccessToken, cluster scoped
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthAccessToken {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub client_name: Option<String>,
    pub expires_in: Option<i64>,
    pub scopes: Option<Vec<String>>,
    #[serde(rename = "redirectURI")]
    pub redirect_uri: Option<String>,
    pub user_name: Option<String>,
    #[serde(rename = "userUID")]
    pub user_uid: Option<String>,
    pub authorize_token: Option<String>,
    pub refresh_token: Option<String>,
    pub inactivity_timeout_seconds: Option<i32>,
}

openshift_resource!(OAuthAccessToken, group = "oauth.openshift.io", version = "v1", kind = "OAuthAccessToken", plural = "oauthaccesstokens");

impl OpenShiftTable for OAuthAccessToken {
    const TABLE: &'static str = "openshift_oauth_access_token";
    const DESCRIPTION: &'static str = "Retrieve information about OpenShift OAuth access tokens.";
    const NAMESPACED: bool = false;
    const LIST_KEY_QUALS: &'static [KeyColumn] = &[];

    fn kind_columns() -> Vec<Column<Self>> {
        use ColumnType::*;
        vec![
            Column::new(
                "client_name",
                Text,
                "Client that created this token.",
                |t| Cell::text(t.client_name.as_deref()),
            ),
            Column::new(
                "expires_in",
                Int,
                "Seconds from creation before this token expires.",
                |t| Cell::int(t.expires_in),
            ),
            Column::new(
                "scopes",
                Json,
                "Requested scopes.",
                |t| Cell::json(t.scopes.as_ref()),
            ),
            Column::new(
                "redirect_uri",
                Text,
                "Redirection associated with the token.",
                |t| Cell::text(t.redirect_uri.as_deref()),
            ),
            Column::new(
                "user_name",
                Text,
                "User name associated with this token.",
                |t| Cell::text(t.user_name.as_deref()),
            ),
            Column::new(
                "user_uid",
                Text,
                "Unique UID of the user associated with this token.",
                |t| Cell::text(t.user_uid.as_deref()),
            ),
            Column::new(
                "authorize_token",
                Text,
                "Token that authorized this token.",
                |t| Cell::text(t.authorize_token.as_deref()),
            ),
            Column::new(
                "refresh_token",
                Text,
                "Value by which this token can be renewed. Can be blank.",
                |t| Cell::text(t.refresh_token.as_deref()),
            ),
            Column::new(
                "inactivity_timeout_seconds",
                Int,
                "Seconds from creation after which the token can no longer be used.",
                |t| Cell::int(t.inactivity_timeout_seconds),
            ),
        ]
    }
}
