//! Job control API
//!
//! Wire models and calls for trigger management (`createUpdateTrigger`,
//! `deleteTrigger`).

use super::client::{vendor_error_code, SaviyntClient, VendorStatus};
use super::error::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const CREATE_UPDATE_TRIGGER_PATH: &str = "ECM/api/v5/createUpdateTrigger";
pub const DELETE_TRIGGER_PATH: &str = "ECM/api/v5/deleteTrigger";

/// One trigger in a `createUpdateTrigger` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub name: String,
    pub job_name: String,
    pub job_group: String,
    pub group_name: String,
    pub cron_exp: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrUpdateTriggersRequest {
    pub triggers: Vec<TriggerRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTriggerRequest {
    pub triggername: String,
    pub jobname: String,
    pub jobgroup: String,
}

/// Response shared by the job control endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobControlResponse {
    #[serde(default, rename = "errorCode")]
    pub error_code: Option<Value>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl VendorStatus for JobControlResponse {
    fn vendor_error(&self) -> Option<(String, String)> {
        vendor_error_code(self.error_code.as_ref(), self.msg.as_deref())
    }
}

/// Trigger operations, implemented by [`SaviyntClient`] and by test doubles
#[async_trait]
pub trait JobControlApi: Send + Sync {
    async fn create_or_update_triggers(
        &self,
        request: &CreateOrUpdateTriggersRequest,
    ) -> ApiResult<JobControlResponse>;

    /// The endpoint removes a single trigger per call
    async fn delete_trigger(&self, request: &DeleteTriggerRequest)
        -> ApiResult<JobControlResponse>;
}

#[async_trait]
impl JobControlApi for SaviyntClient {
    async fn create_or_update_triggers(
        &self,
        request: &CreateOrUpdateTriggersRequest,
    ) -> ApiResult<JobControlResponse> {
        self.authenticated_call_with_retry(CREATE_UPDATE_TRIGGER_PATH, request)
            .await
    }

    async fn delete_trigger(
        &self,
        request: &DeleteTriggerRequest,
    ) -> ApiResult<JobControlResponse> {
        self.authenticated_call_with_retry(DELETE_TRIGGER_PATH, request)
            .await
    }
}
