//! Job trigger resource
//!
//! One generic resource drives every job type. The Terraform state is the
//! configured `jobs` list plus a computed id; Saviynt offers no per-trigger
//! read, so state is what was last applied.

use super::{configured_client, diagnostics, schema, ClientHandle};
use crate::jobs::validate::Phase;
use crate::jobs::{
    collect_triggers, delete_targets, delete_triggers, remove_stale_triggers, resource_id,
    upsert_triggers, JobKind, Report,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tf_provider::{AttributePath, Diagnostics, Resource, Schema, Value, ValueEmpty};

/// Terraform state of a job trigger resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "B: Serialize",
    deserialize = "B: serde::de::DeserializeOwned"
))]
pub struct JobResourceState<B> {
    pub id: Value<String>,
    pub jobs: Value<Vec<Value<B>>>,
}

/// Outcome of reading the `jobs` list of a state
enum Blocks<B> {
    Known(Vec<B>),
    /// The list or one of its elements is not known yet
    Pending,
}

impl<B: Clone> JobResourceState<B> {
    fn blocks(&self) -> Blocks<B> {
        match &self.jobs {
            Value::Null => Blocks::Known(Vec::new()),
            Value::Unknown => Blocks::Pending,
            Value::Value(items) => {
                let mut blocks = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Value(block) => blocks.push(block.clone()),
                        Value::Null => {}
                        Value::Unknown => return Blocks::Pending,
                    }
                }
                Blocks::Known(blocks)
            }
        }
    }
}

pub struct JobTriggerResource<K> {
    client: ClientHandle,
    _kind: PhantomData<fn() -> K>,
}

impl<K: JobKind> JobTriggerResource<K> {
    pub fn new(client: ClientHandle) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    /// Id as it will be after apply, or unknown while trigger names are pending
    fn planned_id(state: &JobResourceState<K::Block>) -> Value<String> {
        let Blocks::Known(blocks) = state.blocks() else {
            return Value::Unknown;
        };
        let (triggers, errors) = collect_triggers::<K>(&blocks, Phase::Config);
        if errors.is_empty() && triggers.len() == blocks.len() {
            Value::Value(resource_id(K::RESOURCE, &triggers))
        } else {
            Value::Unknown
        }
    }

    /// Known blocks at apply time; anything still unknown is a hard error
    fn apply_blocks(
        diags: &mut Diagnostics,
        state: &JobResourceState<K::Block>,
    ) -> Option<Vec<K::Block>> {
        match state.blocks() {
            Blocks::Known(blocks) => Some(blocks),
            Blocks::Pending => {
                diags.error(
                    "Unknown jobs",
                    "The jobs list must be fully known at apply time",
                    AttributePath::new("jobs"),
                );
                None
            }
        }
    }

    /// Upsert the planned triggers; with a prior state, clean up renamed ones
    async fn apply(
        &self,
        diags: &mut Diagnostics,
        prior: Option<&JobResourceState<K::Block>>,
        planned: JobResourceState<K::Block>,
    ) -> Option<JobResourceState<K::Block>> {
        let blocks = Self::apply_blocks(diags, &planned)?;
        let (triggers, errors) = collect_triggers::<K>(&blocks, Phase::Apply);
        if !errors.is_empty() {
            diagnostics::job_errors(diags, &errors);
            return None;
        }

        let client = configured_client(&self.client, diags).await?;
        let mut report = upsert_triggers(client.as_ref(), &triggers).await;

        if let (true, Some(prior)) = (report.is_success(), prior) {
            let prior_blocks = Self::apply_blocks(diags, prior)?;
            let (targets, errors) = delete_targets::<K>(&prior_blocks);
            report.merge(Report {
                errors,
                warnings: Vec::new(),
            });
            report.merge(remove_stale_triggers(client.as_ref(), &targets, &triggers).await);
        }

        if !diagnostics::report(diags, &report) {
            return None;
        }

        Some(JobResourceState {
            id: Value::Value(resource_id(K::RESOURCE, &triggers)),
            jobs: planned.jobs,
        })
    }
}

#[async_trait]
impl<K: JobKind> Resource for JobTriggerResource<K> {
    type State<'a> = JobResourceState<K::Block>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(schema::job_resource_schema::<K>())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        let Blocks::Known(blocks) = config.blocks() else {
            return Some(());
        };
        let (_, errors) = collect_triggers::<K>(&blocks, Phase::Config);
        if errors.is_empty() {
            Some(())
        } else {
            diagnostics::job_errors(diags, &errors);
            None
        }
    }

    async fn read<'a>(
        &self,
        _diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let id = Self::planned_id(&proposed_state);
        Some((
            JobResourceState {
                id,
                jobs: proposed_state.jobs,
            },
            ValueEmpty::default(),
        ))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let id = Self::planned_id(&proposed_state);
        Some((
            JobResourceState {
                id,
                jobs: proposed_state.jobs,
            },
            ValueEmpty::default(),
            Vec::new(),
        ))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        _prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        Some(())
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        tracing::info!("Creating {} triggers", K::RESOURCE);
        let state = self.apply(diags, None, planned_state).await?;
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        tracing::info!("Updating {} triggers", K::RESOURCE);
        let state = self.apply(diags, Some(&prior_state), planned_state).await?;
        Some((state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        tracing::info!("Deleting {} triggers", K::RESOURCE);
        let blocks = Self::apply_blocks(diags, &prior_state)?;
        let (targets, errors) = delete_targets::<K>(&blocks);

        let client = configured_client(&self.client, diags).await?;
        let mut report = delete_triggers(client.as_ref(), &targets).await;
        report.merge(Report {
            errors,
            warnings: Vec::new(),
        });

        diagnostics::report(diags, &report).then_some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::kinds::{WsRetryJob, WsRetryJobBlock};
    use crate::provider::test_support::configured_handle;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const UPSERT: &str = "/ECM/api/v5/createUpdateTrigger";
    const DELETE: &str = "/ECM/api/v5/deleteTrigger";

    fn ok() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"errorCode": "0", "msg": "Success"}))
    }

    fn s(v: &str) -> Value<String> {
        Value::Value(v.to_string())
    }

    fn block(trigger: Value<String>) -> WsRetryJobBlock {
        WsRetryJobBlock {
            trigger_name: trigger,
            job_name: s("WSRetryJob"),
            job_group: s("UTILITY"),
            group_name: Value::Null,
            cron_exp: s("0 */5 * * * ?"),
            security_systems: Value::Value(vec![s("AD")]),
            task_types: Value::Null,
        }
    }

    fn state(blocks: Vec<WsRetryJobBlock>) -> JobResourceState<WsRetryJobBlock> {
        JobResourceState {
            id: Value::Unknown,
            jobs: Value::Value(blocks.into_iter().map(Value::Value).collect()),
        }
    }

    #[test]
    fn test_planned_id_from_known_names() {
        let planned = state(vec![block(s("retry-a")), block(s("retry-b"))]);
        assert_eq!(
            JobTriggerResource::<WsRetryJob>::planned_id(&planned),
            Value::Value("wsretry_job_resource:retry-a,retry-b".to_string())
        );
    }

    #[test]
    fn test_planned_id_unknown_while_names_pending() {
        let planned = state(vec![block(s("retry-a")), block(Value::Unknown)]);
        assert_eq!(
            JobTriggerResource::<WsRetryJob>::planned_id(&planned),
            Value::Unknown
        );
    }

    #[tokio::test]
    async fn test_validate_reports_attribute_errors() {
        let resource = JobTriggerResource::<WsRetryJob>::new(ClientHandle::default());
        let mut bad = block(s("retry"));
        bad.job_name = s("EcmImportJob");

        let mut diags = Diagnostics::default();
        assert!(resource.validate(&mut diags, state(vec![bad])).await.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_validate_accepts_unknown_values() {
        let resource = JobTriggerResource::<WsRetryJob>::new(ClientHandle::default());
        let mut diags = Diagnostics::default();
        let config = state(vec![block(Value::Unknown)]);
        assert!(resource.validate(&mut diags, config).await.is_some());
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn test_create_without_configuration_fails() {
        let resource = JobTriggerResource::<WsRetryJob>::new(ClientHandle::default());
        let planned = state(vec![block(s("retry"))]);

        let mut diags = Diagnostics::default();
        let created = resource
            .create(
                &mut diags,
                planned.clone(),
                planned,
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await;
        assert!(created.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_create_saves_state_when_upsert_returns_412() {
        let server = MockServer::start().await;
        let resource = JobTriggerResource::<WsRetryJob>::new(configured_handle(&server).await);

        Mock::given(method("POST"))
            .and(path(UPSERT))
            .respond_with(
                ResponseTemplate::new(412).set_body_json(json!({"msg": "Trigger already exists"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let planned = state(vec![block(s("retry-a")), block(s("retry-b"))]);
        let mut diags = Diagnostics::default();
        let (created, _) = resource
            .create(
                &mut diags,
                planned.clone(),
                planned.clone(),
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await
            .expect("a 412 must not fail the apply");

        assert!(diags.errors.is_empty());
        assert_eq!(diags.warnings.len(), 1);
        assert!(diags.warnings[0].detail.contains("Trigger already exists"));
        assert_eq!(
            created.id,
            Value::Value("wsretry_job_resource:retry-a,retry-b".to_string())
        );
        assert_eq!(created.jobs, planned.jobs);
    }

    #[tokio::test]
    async fn test_create_fails_on_server_error() {
        let server = MockServer::start().await;
        let resource = JobTriggerResource::<WsRetryJob>::new(configured_handle(&server).await);

        Mock::given(method("POST"))
            .and(path(UPSERT))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"msg": "boom"})))
            .expect(1)
            .mount(&server)
            .await;

        let planned = state(vec![block(s("retry-a"))]);
        let mut diags = Diagnostics::default();
        let created = resource
            .create(
                &mut diags,
                planned.clone(),
                planned,
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await;

        assert!(created.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_update_deletes_renamed_trigger() {
        let server = MockServer::start().await;
        let resource = JobTriggerResource::<WsRetryJob>::new(configured_handle(&server).await);

        Mock::given(method("POST"))
            .and(path(UPSERT))
            .and(body_partial_json(json!({"triggers": [{"name": "retry-b"}]})))
            .respond_with(ok())
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DELETE))
            .and(body_partial_json(json!({"triggername": "retry-a"})))
            .respond_with(ok())
            .expect(1)
            .mount(&server)
            .await;

        let prior = JobResourceState {
            id: Value::Value("wsretry_job_resource:retry-a".to_string()),
            ..state(vec![block(s("retry-a"))])
        };
        let planned = state(vec![block(s("retry-b"))]);

        let mut diags = Diagnostics::default();
        let (updated, _) = resource
            .update(
                &mut diags,
                prior,
                planned.clone(),
                planned,
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await
            .expect("update should succeed");

        assert!(diags.errors.is_empty());
        assert_eq!(
            updated.id,
            Value::Value("wsretry_job_resource:retry-b".to_string())
        );
    }

    #[tokio::test]
    async fn test_destroy_deletes_each_job() {
        let server = MockServer::start().await;
        let resource = JobTriggerResource::<WsRetryJob>::new(configured_handle(&server).await);

        for name in ["retry-a", "retry-b"] {
            Mock::given(method("POST"))
                .and(path(DELETE))
                .and(body_partial_json(json!({
                    "triggername": name,
                    "jobname": "WSRetryJob",
                    "jobgroup": "UTILITY"
                })))
                .respond_with(ok())
                .expect(1)
                .mount(&server)
                .await;
        }

        let prior = state(vec![block(s("retry-a")), block(s("retry-b"))]);
        let mut diags = Diagnostics::default();
        let destroyed = resource
            .destroy(&mut diags, prior, ValueEmpty::default())
            .await;

        assert!(destroyed.is_some());
        assert!(diags.errors.is_empty());
    }
}
