//! Entitlement lookups
//!
//! Read-only calls against the entitlements and entitlement type endpoints.

use super::client::{vendor_error_code, SaviyntClient, VendorStatus};
use super::error::ApiResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const GET_ENTITLEMENTS_PATH: &str = "ECM/api/v5/getEntitlements";
pub const GET_ENTITLEMENT_TYPE_PATH: &str = "ECM/api/v5/getEntitlementType";

pub const DEFAULT_MAX_RESULTS: i64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitlementQuery {
    pub endpoint: String,
    #[serde(rename = "entitlementtype", skip_serializing_if = "Option::is_none")]
    pub entitlement_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement_value: Option<String>,
    pub max: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitlementsResponse {
    #[serde(default, rename = "errorCode")]
    pub error_code: Option<Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default, rename = "displaycount")]
    pub display_count: Option<Value>,
    #[serde(default, rename = "totalEntitlementCount")]
    pub total_count: Option<Value>,
    #[serde(default, rename = "Entitlementdetails")]
    pub entitlements: Vec<Map<String, Value>>,
}

impl VendorStatus for EntitlementsResponse {
    fn vendor_error(&self) -> Option<(String, String)> {
        vendor_error_code(self.error_code.as_ref(), self.msg.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitlementTypeQuery {
    #[serde(rename = "endpointname")]
    pub endpoint: String,
    #[serde(rename = "entitlementname", skip_serializing_if = "Option::is_none")]
    pub entitlement_type_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitlementTypesResponse {
    #[serde(default, rename = "errorCode")]
    pub error_code: Option<Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default, rename = "entitlementTypeDetails")]
    pub entitlement_types: Vec<Map<String, Value>>,
}

impl VendorStatus for EntitlementTypesResponse {
    fn vendor_error(&self) -> Option<(String, String)> {
        vendor_error_code(self.error_code.as_ref(), self.msg.as_deref())
    }
}

/// Flatten a JSON object into string attributes.
/// Nulls are dropped, nested values are kept as compact JSON.
pub fn flatten_attributes(item: &Map<String, Value>) -> BTreeMap<String, String> {
    item.iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

/// Read a count that Saviynt reports either as a number or a numeric string
pub fn count_value(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl SaviyntClient {
    pub async fn get_entitlements(
        &self,
        query: &EntitlementQuery,
    ) -> ApiResult<EntitlementsResponse> {
        tracing::debug!("Looking up entitlements for endpoint {}", query.endpoint);
        self.authenticated_call_with_retry(GET_ENTITLEMENTS_PATH, query)
            .await
    }

    pub async fn get_entitlement_types(
        &self,
        query: &EntitlementTypeQuery,
    ) -> ApiResult<EntitlementTypesResponse> {
        tracing::debug!("Looking up entitlement types for endpoint {}", query.endpoint);
        self.authenticated_call_with_retry(GET_ENTITLEMENT_TYPE_PATH, query)
            .await
    }
}
