//! Terraform provider surface
//!
//! Binds the job trigger model and the Saviynt client to the Terraform
//! plugin protocol.
//!
//! # Module Structure
//!
//! - [`resource`] - Generic job trigger resource, one instance per job type
//! - [`data_source`] - Entitlement lookups
//! - [`schema`] - Schema builders shared by resources and data sources
//! - [`diagnostics`] - Mapping of domain errors to Terraform diagnostics

pub mod data_source;
pub mod diagnostics;
pub mod resource;
pub mod schema;

use crate::config::{
    max_retries_setting, timeout_setting, FileConfig, ProviderOverrides, ProviderSettings,
    PROVIDER_BLOCK,
};
use crate::jobs::kinds::{
    AccountsImportFullJob, AccountsImportIncrementalJob, AnalyticsJob, ApplicationDataImportJob,
    CustomQueryJob, EcmJob, EcmSapUserJob, FileTransferJob, SchemaAccountJob, SchemaRoleJob,
    SchemaUserJob, TriggerChainJob, UserImportJob, WsRetryBlockingJob, WsRetryJob,
};
use crate::jobs::JobKind;
use crate::saviynt::SaviyntClient;
use async_trait::async_trait;
use data_source::{EntitlementDataSource, EntitlementTypeDataSource};
use resource::JobTriggerResource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tf_provider::{
    map, AttributePath, Block, Description, Diagnostics, Provider, Schema, Value, ValueEmpty,
};
use tokio::sync::RwLock;

/// Client slot shared by every resource; filled by `configure`
pub type ClientHandle = Arc<RwLock<Option<Arc<SaviyntClient>>>>;

/// Fetch the configured client or report that the provider is not configured
pub(crate) async fn configured_client(
    handle: &ClientHandle,
    diags: &mut Diagnostics,
) -> Option<Arc<SaviyntClient>> {
    let client = handle.read().await.clone();
    if client.is_none() {
        diags.root_error(
            "Provider not configured",
            "The saviynt provider must be configured before resources can be managed",
        );
    }
    client
}

/// `provider "saviynt"` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub server_url: Value<String>,
    pub username: Value<String>,
    pub password: Value<String>,
    pub max_retries: Value<i64>,
    pub request_timeout_secs: Value<i64>,
}

impl ProviderConfig {
    fn overrides(&self) -> ProviderOverrides {
        ProviderOverrides {
            server_url: known(&self.server_url).cloned(),
            username: known(&self.username).cloned(),
            password: known(&self.password).cloned(),
            max_retries: known(&self.max_retries).copied(),
            request_timeout_secs: known(&self.request_timeout_secs).copied(),
        }
    }
}

fn known<T>(value: &Value<T>) -> Option<&T> {
    match value {
        Value::Value(v) => Some(v),
        Value::Null | Value::Unknown => None,
    }
}

#[derive(Default, Clone)]
pub struct SaviyntProvider {
    client: ClientHandle,
}

impl std::fmt::Debug for SaviyntProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaviyntProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for SaviyntProvider {
    type Config<'a> = ProviderConfig;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: schema::SCHEMA_VERSION,
            block: Block {
                attributes: map! {
                    "server_url" => schema::string_attribute(false, "Saviynt base URL, e.g. https://tenant.saviyntcloud.com (env SAVIYNT_URL)"),
                    "username" => schema::string_attribute(false, "API user (env SAVIYNT_USERNAME)"),
                    "password" => schema::sensitive_string_attribute(false, "API password (env SAVIYNT_PASSWORD)"),
                    "max_retries" => schema::number_attribute(false, "Retries for 401 and transient failures (default 3)"),
                    "request_timeout_secs" => schema::number_attribute(false, "Per request timeout in seconds (default 60)"),
                },
                description: Description::plain("Manage Saviynt job triggers"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        let numbers = [
            known(&config.max_retries).map(|n| max_retries_setting(*n, PROVIDER_BLOCK).err()),
            known(&config.request_timeout_secs).map(|n| timeout_setting(*n, PROVIDER_BLOCK).err()),
        ];
        for err in numbers.into_iter().flatten().flatten() {
            diags.error(
                format!("Invalid {}", err.attribute()),
                err.to_string(),
                AttributePath::new(err.attribute()),
            );
        }
        if let Value::Value(url) = &config.server_url {
            if let Err(err) = crate::config::normalize_base_url(url) {
                diags.error("Invalid server_url", err.to_string(), AttributePath::new("server_url"));
            }
        }

        diags.errors.is_empty().then_some(())
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        tracing::info!("Configuring saviynt provider (terraform {})", terraform_version);

        let file = FileConfig::load();
        let settings = match ProviderSettings::resolve(config.overrides(), &file) {
            Ok(settings) => settings,
            Err(err) => {
                diags.error(
                    "Invalid provider configuration",
                    err.to_string(),
                    AttributePath::new(err.attribute()),
                );
                return None;
            }
        };

        let client = match SaviyntClient::new(&settings) {
            Ok(client) => client,
            Err(err) => {
                diags.root_error("Failed to create Saviynt client", err.to_string());
                return None;
            }
        };

        tracing::info!(
            "Saviynt client ready for {} as {}",
            settings.base_url,
            settings.credentials.username
        );
        *self.client.write().await = Some(Arc::new(client));
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn tf_provider::resource::DynamicResource>>> {
        let c = &self.client;
        Some(map! {
            AccountsImportFullJob::RESOURCE => JobTriggerResource::<AccountsImportFullJob>::new(c.clone()),
            AccountsImportIncrementalJob::RESOURCE => JobTriggerResource::<AccountsImportIncrementalJob>::new(c.clone()),
            ApplicationDataImportJob::RESOURCE => JobTriggerResource::<ApplicationDataImportJob>::new(c.clone()),
            EcmJob::RESOURCE => JobTriggerResource::<EcmJob>::new(c.clone()),
            UserImportJob::RESOURCE => JobTriggerResource::<UserImportJob>::new(c.clone()),
            EcmSapUserJob::RESOURCE => JobTriggerResource::<EcmSapUserJob>::new(c.clone()),
            SchemaUserJob::RESOURCE => JobTriggerResource::<SchemaUserJob>::new(c.clone()),
            SchemaAccountJob::RESOURCE => JobTriggerResource::<SchemaAccountJob>::new(c.clone()),
            SchemaRoleJob::RESOURCE => JobTriggerResource::<SchemaRoleJob>::new(c.clone()),
            FileTransferJob::RESOURCE => JobTriggerResource::<FileTransferJob>::new(c.clone()),
            WsRetryJob::RESOURCE => JobTriggerResource::<WsRetryJob>::new(c.clone()),
            WsRetryBlockingJob::RESOURCE => JobTriggerResource::<WsRetryBlockingJob>::new(c.clone()),
            AnalyticsJob::RESOURCE => JobTriggerResource::<AnalyticsJob>::new(c.clone()),
            CustomQueryJob::RESOURCE => JobTriggerResource::<CustomQueryJob>::new(c.clone()),
            TriggerChainJob::RESOURCE => JobTriggerResource::<TriggerChainJob>::new(c.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn tf_provider::data_source::DynamicDataSource>>> {
        Some(map! {
            "entitlement_datasource" => EntitlementDataSource::new(self.client.clone()),
            "entitlement_type_datasource" => EntitlementTypeDataSource::new(self.client.clone()),
        })
    }
}
