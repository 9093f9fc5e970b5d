//! Entitlement data sources

use super::{configured_client, diagnostics, schema, ClientHandle};
use crate::saviynt::entitlements::{
    count_value, flatten_attributes, EntitlementQuery, EntitlementTypeQuery, DEFAULT_MAX_RESULTS,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tf_provider::{
    map, AttributePath, AttributeType, Block, DataSource, Description, Diagnostics, Schema, Value,
    ValueEmpty,
};

type AttributeMaps = Vec<BTreeMap<String, String>>;

fn list_of_maps() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Map(Box::new(AttributeType::String))))
}

fn known_string(value: &Value<String>) -> Option<String> {
    match value {
        Value::Value(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn require_endpoint(diags: &mut Diagnostics, endpoint: &Value<String>) -> Option<String> {
    let endpoint = known_string(endpoint);
    if endpoint.is_none() {
        diags.error(
            "Missing endpoint",
            "endpoint must be a non-empty string",
            AttributePath::new("endpoint"),
        );
    }
    endpoint
}

// =============================================================================
// Entitlements
// =============================================================================

/// `data "saviynt_entitlement_datasource"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitlementState {
    pub endpoint: Value<String>,
    pub entitlement_type: Value<String>,
    pub entitlement_value: Value<String>,
    pub max: Value<i64>,
    pub offset: Value<i64>,
    pub id: Value<String>,
    pub entitlements: Value<AttributeMaps>,
    pub display_count: Value<i64>,
    pub total_count: Value<i64>,
    pub msg: Value<String>,
}

impl EntitlementState {
    fn query(&self, endpoint: String) -> EntitlementQuery {
        EntitlementQuery {
            endpoint,
            entitlement_type: known_string(&self.entitlement_type),
            entitlement_value: known_string(&self.entitlement_value),
            max: match self.max {
                Value::Value(n) => n,
                _ => DEFAULT_MAX_RESULTS,
            },
            offset: match self.offset {
                Value::Value(n) => n,
                _ => 0,
            },
        }
    }
}

pub struct EntitlementDataSource {
    client: ClientHandle,
}

impl EntitlementDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for EntitlementDataSource {
    type State<'a> = EntitlementState;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: schema::SCHEMA_VERSION,
            block: Block {
                attributes: map! {
                    "endpoint" => schema::string_attribute(true, "Endpoint to list entitlements of"),
                    "entitlement_type" => schema::string_attribute(false, "Restrict to one entitlement type"),
                    "entitlement_value" => schema::string_attribute(false, "Restrict to one entitlement value"),
                    "max" => schema::optional_computed(AttributeType::Number, "Page size (default 50)"),
                    "offset" => schema::optional_computed(AttributeType::Number, "Page offset (default 0)"),
                    "id" => schema::computed(AttributeType::String, "Lookup identifier"),
                    "entitlements" => schema::computed(list_of_maps(), "Entitlement attributes, one map per entitlement"),
                    "display_count" => schema::computed(AttributeType::Number, "Entitlements in this page"),
                    "total_count" => schema::computed(AttributeType::Number, "Entitlements matching the query"),
                    "msg" => schema::computed(AttributeType::String, "Message returned by Saviynt"),
                },
                description: Description::plain("Look up entitlements of an endpoint"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        for (attribute, value) in [("max", &config.max), ("offset", &config.offset)] {
            if let Value::Value(n) = value {
                if *n < 0 {
                    diags.error(
                        format!("Invalid {attribute}"),
                        format!("{attribute} must not be negative, got {n}"),
                        AttributePath::new(attribute),
                    );
                }
            }
        }
        if let Value::Value(endpoint) = &config.endpoint {
            if endpoint.trim().is_empty() {
                diags.error(
                    "Missing endpoint",
                    "endpoint must be a non-empty string",
                    AttributePath::new("endpoint"),
                );
            }
        }
        diags.errors.is_empty().then_some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let endpoint = require_endpoint(diags, &config.endpoint)?;
        let query = config.query(endpoint);
        let client = configured_client(&self.client, diags).await?;

        let response = match client.get_entitlements(&query).await {
            Ok(response) => response,
            Err(err) => {
                diagnostics::api_error(diags, "getEntitlements", &err);
                return None;
            }
        };

        let entitlements: AttributeMaps = response
            .entitlements
            .iter()
            .map(flatten_attributes)
            .collect();
        let display_count =
            count_value(response.display_count.as_ref()).unwrap_or(entitlements.len() as i64);
        tracing::debug!(
            "Found {} entitlement(s) for endpoint {}",
            entitlements.len(),
            query.endpoint
        );

        Some(EntitlementState {
            id: Value::Value(format!(
                "{}:{}:{}",
                query.endpoint, query.offset, query.max
            )),
            max: Value::Value(query.max),
            offset: Value::Value(query.offset),
            entitlements: Value::Value(entitlements),
            display_count: Value::Value(display_count),
            total_count: count_value(response.total_count.as_ref())
                .map_or(Value::Null, Value::Value),
            msg: response.msg.map_or(Value::Null, Value::Value),
            ..config
        })
    }
}

// =============================================================================
// Entitlement types
// =============================================================================

/// `data "saviynt_entitlement_type_datasource"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitlementTypeState {
    pub endpoint: Value<String>,
    pub entitlement_type_name: Value<String>,
    pub id: Value<String>,
    pub entitlement_types: Value<AttributeMaps>,
    pub msg: Value<String>,
}

pub struct EntitlementTypeDataSource {
    client: ClientHandle,
}

impl EntitlementTypeDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for EntitlementTypeDataSource {
    type State<'a> = EntitlementTypeState;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: schema::SCHEMA_VERSION,
            block: Block {
                attributes: map! {
                    "endpoint" => schema::string_attribute(true, "Endpoint to list entitlement types of"),
                    "entitlement_type_name" => schema::string_attribute(false, "Restrict to one entitlement type"),
                    "id" => schema::computed(AttributeType::String, "Lookup identifier"),
                    "entitlement_types" => schema::computed(list_of_maps(), "Entitlement type attributes, one map per type"),
                    "msg" => schema::computed(AttributeType::String, "Message returned by Saviynt"),
                },
                description: Description::plain("Look up entitlement types of an endpoint"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(endpoint) = &config.endpoint {
            if endpoint.trim().is_empty() {
                diags.error(
                    "Missing endpoint",
                    "endpoint must be a non-empty string",
                    AttributePath::new("endpoint"),
                );
                return None;
            }
        }
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let endpoint = require_endpoint(diags, &config.endpoint)?;
        let query = EntitlementTypeQuery {
            endpoint,
            entitlement_type_name: known_string(&config.entitlement_type_name),
        };
        let client = configured_client(&self.client, diags).await?;

        let response = match client.get_entitlement_types(&query).await {
            Ok(response) => response,
            Err(err) => {
                diagnostics::api_error(diags, "getEntitlementType", &err);
                return None;
            }
        };

        Some(EntitlementTypeState {
            id: Value::Value(query.endpoint.clone()),
            entitlement_types: Value::Value(
                response
                    .entitlement_types
                    .iter()
                    .map(flatten_attributes)
                    .collect(),
            ),
            msg: response.msg.map_or(Value::Null, Value::Value),
            ..config
        })
    }
}
