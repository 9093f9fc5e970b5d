//! Trigger lifecycle
//!
//! The create/update/delete flow shared by every job resource. Failures are
//! classified the same way everywhere: a 412 is a warning, everything else
//! (including vendor error codes inside a 200) is an error.

use super::{JobError, JobWarning, TriggerSpec};
use crate::saviynt::error::ApiError;
use crate::saviynt::job_control::{
    CreateOrUpdateTriggersRequest, DeleteTriggerRequest, JobControlApi,
};

/// Accumulated outcome of one lifecycle operation
#[derive(Debug, Default)]
pub struct Report {
    pub errors: Vec<JobError>,
    pub warnings: Vec<JobWarning>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: Report) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    fn record(&mut self, operation: &'static str, triggers: Vec<String>, err: ApiError) {
        if err.is_precondition_failed() {
            tracing::warn!("{} returned 412 for {:?}: {}", operation, triggers, err);
            self.warnings.push(JobWarning {
                summary: format!("{operation}: precondition failed"),
                detail: format!("{err} (triggers: {})", triggers.join(", ")),
            });
        } else {
            tracing::error!("{} failed for {:?}: {}", operation, triggers, err);
            self.errors.push(JobError::Api {
                operation,
                triggers,
                source: err,
            });
        }
    }
}

/// Create or update all triggers in a single `createUpdateTrigger` call
pub async fn upsert_triggers(api: &dyn JobControlApi, triggers: &[TriggerSpec]) -> Report {
    let mut report = Report::default();
    if triggers.is_empty() {
        return report;
    }

    let names: Vec<String> = triggers
        .iter()
        .map(|t| t.common.trigger_name.clone())
        .collect();
    let request = CreateOrUpdateTriggersRequest {
        triggers: triggers.iter().map(TriggerSpec::to_request).collect(),
    };

    match api.create_or_update_triggers(&request).await {
        Ok(response) => {
            tracing::info!(
                "Saved {} trigger(s) {:?}: {}",
                names.len(),
                names,
                response.msg.as_deref().unwrap_or("ok")
            );
        }
        Err(err) => report.record("createUpdateTrigger", names, err),
    }

    report
}

/// Delete triggers one call at a time; the endpoint has no bulk form.
/// Every target is attempted even after a failure.
pub async fn delete_triggers<'t, I>(api: &dyn JobControlApi, targets: I) -> Report
where
    I: IntoIterator<Item = &'t DeleteTriggerRequest>,
{
    let mut report = Report::default();

    for target in targets {
        match api.delete_trigger(target).await {
            Ok(_) => tracing::info!("Deleted trigger {}", target.triggername),
            Err(err) => report.record("deleteTrigger", vec![target.triggername.clone()], err),
        }
    }

    report
}

/// After an update, delete triggers that were renamed or removed from config
pub async fn remove_stale_triggers(
    api: &dyn JobControlApi,
    prior: &[DeleteTriggerRequest],
    planned: &[TriggerSpec],
) -> Report {
    let stale = super::stale_triggers(prior, planned);
    if !stale.is_empty() {
        tracing::info!("Removing {} trigger(s) no longer in configuration", stale.len());
    }
    delete_triggers(api, stale).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobParams, TriggerCommon};
    use crate::saviynt::error::ApiResult;
    use crate::saviynt::job_control::JobControlResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records calls and answers deletes from a script keyed by trigger name
    #[derive(Default)]
    struct FakeApi {
        upserts: Mutex<Vec<CreateOrUpdateTriggersRequest>>,
        deletes: Mutex<Vec<String>>,
        fail_upsert_with: Mutex<Option<ApiError>>,
        fail_delete: Vec<(&'static str, u16)>,
    }

    #[async_trait]
    impl JobControlApi for FakeApi {
        async fn create_or_update_triggers(
            &self,
            request: &CreateOrUpdateTriggersRequest,
        ) -> ApiResult<JobControlResponse> {
            self.upserts.lock().unwrap().push(request.clone());
            match self.fail_upsert_with.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(JobControlResponse::default()),
            }
        }

        async fn delete_trigger(
            &self,
            request: &DeleteTriggerRequest,
        ) -> ApiResult<JobControlResponse> {
            self.deletes.lock().unwrap().push(request.triggername.clone());
            match self
                .fail_delete
                .iter()
                .find(|(name, _)| *name == request.triggername)
            {
                Some((_, 412)) => Err(ApiError::PreconditionFailed {
                    message: "not scheduled".to_string(),
                }),
                Some((_, status)) => Err(ApiError::Status {
                    status: *status,
                    message: "boom".to_string(),
                }),
                None => Ok(JobControlResponse::default()),
            }
        }
    }

    fn spec(name: &str) -> TriggerSpec {
        TriggerSpec {
            common: TriggerCommon {
                trigger_name: name.to_string(),
                job_name: "WSRetryJob".to_string(),
                job_group: "UTILITY".to_string(),
                group_name: None,
                cron_exp: "0 */5 * * * ?".to_string(),
            },
            params: JobParams::new(),
        }
    }

    fn target(name: &str) -> DeleteTriggerRequest {
        spec(name).delete_request()
    }

    #[tokio::test]
    async fn test_upsert_sends_one_request_for_all_triggers() {
        let api = FakeApi::default();
        let report = upsert_triggers(&api, &[spec("a"), spec("b")]).await;

        assert!(report.is_success());
        let upserts = api.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].triggers.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_vendor_error_is_an_error() {
        let api = FakeApi::default();
        *api.fail_upsert_with.lock().unwrap() = Some(ApiError::Vendor {
            code: "1".to_string(),
            message: "Invalid cron".to_string(),
        });

        let report = upsert_triggers(&api, &[spec("a")]).await;
        assert!(!report.is_success());
        assert!(report.errors[0].to_string().contains("vendor error code 1"));
    }

    #[tokio::test]
    async fn test_upsert_412_is_a_warning() {
        let api = FakeApi::default();
        *api.fail_upsert_with.lock().unwrap() = Some(ApiError::PreconditionFailed {
            message: "job is running".to_string(),
        });

        let report = upsert_triggers(&api, &[spec("a")]).await;
        assert!(report.is_success());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].detail.contains("job is running"));
    }

    #[tokio::test]
    async fn test_upsert_with_no_triggers_makes_no_call() {
        let api = FakeApi::default();
        let report = upsert_triggers(&api, &[]).await;
        assert!(report.is_success());
        assert!(api.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_attempts_every_trigger() {
        let api = FakeApi {
            fail_delete: vec![("b", 500), ("c", 412)],
            ..Default::default()
        };
        let targets = vec![target("a"), target("b"), target("c"), target("d")];

        let report = delete_triggers(&api, &targets).await;

        assert_eq!(*api.deletes.lock().unwrap(), vec!["a", "b", "c", "d"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_stale_triggers_only_deletes_missing_names() {
        let api = FakeApi::default();
        let prior = vec![target("keep"), target("renamed-old")];
        let planned = vec![spec("keep"), spec("renamed-new")];

        let report = remove_stale_triggers(&api, &prior, &planned).await;

        assert!(report.is_success());
        assert_eq!(*api.deletes.lock().unwrap(), vec!["renamed-old"]);
    }
}
