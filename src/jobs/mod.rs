//! Job trigger domain model
//!
//! Every job resource shares the same shape: a list of job blocks, each made
//! of the common trigger fields plus a handful of parameters specific to the
//! job type. A job type is described by a [`JobKind`]; everything else
//! (validation, request construction, the create/update/delete flow) is
//! written once against that trait.
//!
//! # Module Structure
//!
//! - [`kinds`] - The concrete job types and their Terraform blocks
//! - [`lifecycle`] - Upsert and delete flows with error classification
//! - [`validate`] - Field validators that collect per-job errors

pub mod kinds;
pub mod lifecycle;
pub mod validate;

use crate::saviynt::error::ApiError;
use crate::saviynt::job_control::{DeleteTriggerRequest, TriggerRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use tf_provider::Value;
use thiserror::Error;
use validate::{Phase, Validator};

pub use lifecycle::{delete_triggers, remove_stale_triggers, upsert_triggers, Report};

/// Errors raised while turning job blocks into API calls
#[derive(Debug, Error)]
pub enum JobError {
    #[error("jobs[{index}].{field}: {reason}")]
    Validation {
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("jobs[{index}].trigger_name: \"{name}\" is already used by jobs[{first}]")]
    DuplicateTrigger {
        index: usize,
        first: usize,
        name: String,
    },

    #[error("{operation} failed for {}: {source}", trigger_label(.triggers))]
    Api {
        operation: &'static str,
        triggers: Vec<String>,
        #[source]
        source: ApiError,
    },
}

fn trigger_label(triggers: &[String]) -> String {
    match triggers {
        [single] => format!("trigger \"{single}\""),
        many => format!("triggers [{}]", many.join(", ")),
    }
}

/// Non-fatal outcome reported to Terraform as a warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobWarning {
    pub summary: String,
    pub detail: String,
}

/// Validated common trigger fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerCommon {
    pub trigger_name: String,
    pub job_name: String,
    pub job_group: String,
    pub group_name: Option<String>,
    pub cron_exp: String,
}

/// Borrowed view of the common fields of a job block
pub struct CommonFields<'b> {
    pub trigger_name: &'b Value<String>,
    pub job_name: &'b Value<String>,
    pub job_group: &'b Value<String>,
    pub group_name: &'b Value<String>,
    pub cron_exp: &'b Value<String>,
}

/// Job specific parameters, sent as the trigger's `valueMap`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobParams(BTreeMap<String, String>);

impl JobParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn str(&mut self, key: &str, value: Option<String>) -> &mut Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value);
        }
        self
    }

    /// Lists travel as comma separated strings
    pub fn list(&mut self, key: &str, value: Option<Vec<String>>) -> &mut Self {
        if let Some(items) = value {
            self.0.insert(key.to_string(), items.join(","));
        }
        self
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// A fully validated trigger ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSpec {
    pub common: TriggerCommon,
    pub params: JobParams,
}

impl TriggerSpec {
    pub fn to_request(&self) -> TriggerRequest {
        let common = &self.common;
        TriggerRequest {
            name: common.trigger_name.clone(),
            job_name: common.job_name.clone(),
            job_group: common.job_group.clone(),
            group_name: common
                .group_name
                .clone()
                .unwrap_or_else(|| common.job_group.clone()),
            cron_exp: common.cron_exp.clone(),
            value_map: self.params.clone().into_inner(),
        }
    }

    pub fn delete_request(&self) -> DeleteTriggerRequest {
        DeleteTriggerRequest {
            triggername: self.common.trigger_name.clone(),
            jobname: self.common.job_name.clone(),
            jobgroup: self.common.job_group.clone(),
        }
    }
}

/// Value type of a job specific attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    StringList,
}

/// Schema description of a job specific attribute
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn string(name: &'static str, required: bool, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
            required,
            description,
        }
    }

    pub const fn list(name: &'static str, required: bool, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::StringList,
            required,
            description,
        }
    }
}

/// One job type exposed as a Terraform resource
pub trait JobKind: Send + Sync + 'static {
    /// Terraform block for one entry of `jobs`
    type Block: Serialize + DeserializeOwned + Clone + Debug + Default + PartialEq + Send + Sync;

    /// Resource type name without the provider prefix
    const RESOURCE: &'static str;
    /// The only accepted value of `job_name`
    const JOB_NAME: &'static str;
    const DESCRIPTION: &'static str;
    /// Job specific attributes, in schema order
    const PARAMETERS: &'static [ParamSpec];

    fn common(block: &Self::Block) -> CommonFields<'_>;

    /// Validate and collect the job specific parameters
    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams;
}

fn validate_common<K: JobKind>(block: &K::Block, v: &mut Validator<'_>) -> Option<TriggerCommon> {
    let fields = K::common(block);
    let trigger_name = v.required_str("trigger_name", fields.trigger_name);
    let job_name = v.literal("job_name", fields.job_name, K::JOB_NAME);
    let job_group = v.required_str("job_group", fields.job_group);
    let group_name = v.optional_str("group_name", fields.group_name);
    let cron_exp = v.cron("cron_exp", fields.cron_exp);

    Some(TriggerCommon {
        trigger_name: trigger_name?,
        job_name: job_name?,
        job_group: job_group?,
        group_name,
        cron_exp: cron_exp?,
    })
}

/// Validate every block and build the triggers.
///
/// Returns the triggers together with every error found; callers must not
/// call the API when the error list is non-empty.
pub fn collect_triggers<K: JobKind>(
    blocks: &[K::Block],
    phase: Phase,
) -> (Vec<TriggerSpec>, Vec<JobError>) {
    let mut errors = Vec::new();
    let mut triggers = Vec::with_capacity(blocks.len());
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    for (index, block) in blocks.iter().enumerate() {
        let mut v = Validator::new(index, phase, &mut errors);
        let common = validate_common::<K>(block, &mut v);
        let params = K::params(block, &mut v);

        let Some(common) = common else { continue };
        if let Some(&first) = seen.get(&common.trigger_name) {
            errors.push(JobError::DuplicateTrigger {
                index,
                first,
                name: common.trigger_name.clone(),
            });
            continue;
        }
        seen.insert(common.trigger_name.clone(), index);
        triggers.push(TriggerSpec { common, params });
    }

    (triggers, errors)
}

/// Identify the triggers to delete from prior state.
///
/// Only the identifying fields are required here: a delete must still work
/// for state written by an older schema.
pub fn delete_targets<K: JobKind>(blocks: &[K::Block]) -> (Vec<DeleteTriggerRequest>, Vec<JobError>) {
    let mut errors = Vec::new();
    let mut targets = Vec::with_capacity(blocks.len());

    for (index, block) in blocks.iter().enumerate() {
        let fields = K::common(block);
        let mut v = Validator::new(index, Phase::Apply, &mut errors);
        let triggername = v.required_str("trigger_name", fields.trigger_name);
        let jobname = v.required_str("job_name", fields.job_name);
        let jobgroup = v.required_str("job_group", fields.job_group);

        if let (Some(triggername), Some(jobname), Some(jobgroup)) = (triggername, jobname, jobgroup) {
            targets.push(DeleteTriggerRequest {
                triggername,
                jobname,
                jobgroup,
            });
        }
    }

    (targets, errors)
}

/// Trigger names present in `prior` but gone from `planned`
pub fn stale_triggers<'p>(
    prior: &'p [DeleteTriggerRequest],
    planned: &[TriggerSpec],
) -> Vec<&'p DeleteTriggerRequest> {
    let keep: HashSet<&str> = planned
        .iter()
        .map(|t| t.common.trigger_name.as_str())
        .collect();
    prior
        .iter()
        .filter(|p| !keep.contains(p.triggername.as_str()))
        .collect()
}

/// Stable resource id derived from the trigger names
pub fn resource_id(resource: &str, triggers: &[TriggerSpec]) -> String {
    let names: Vec<&str> = triggers
        .iter()
        .map(|t| t.common.trigger_name.as_str())
        .collect();
    format!("{}:{}", resource, names.join(","))
}

#[cfg(test)]
mod tests {
    use super::kinds::{SchemaRoleJob, SchemaRoleJobBlock};
    use super::*;

    fn s(v: &str) -> Value<String> {
        Value::Value(v.to_string())
    }

    fn role_block(trigger: &str, job_name: &str) -> SchemaRoleJobBlock {
        SchemaRoleJobBlock {
            trigger_name: s(trigger),
            job_name: s(job_name),
            job_group: s("SCHEMA"),
            group_name: Value::Null,
            cron_exp: s("0 0 1 * * ?"),
            schema_file_names: Value::Value(vec![s("roles.sav")]),
        }
    }

    #[test]
    fn test_collect_valid_triggers() {
        let blocks = vec![
            role_block("roles-a", "SchemaRoleJob"),
            role_block("roles-b", "SchemaRoleJob"),
        ];
        let (triggers, errors) = collect_triggers::<SchemaRoleJob>(&blocks, Phase::Apply);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(triggers.len(), 2);

        let request = triggers[0].to_request();
        assert_eq!(request.group_name, "SCHEMA");
        assert_eq!(request.value_map["schemaFileNames"], "roles.sav");
    }

    #[test]
    fn test_job_name_mismatch_is_reported() {
        let blocks = vec![
            role_block("roles-a", "SchemaRoleJob"),
            role_block("roles-b", "SchemaUserJob"),
        ];
        let (triggers, errors) = collect_triggers::<SchemaRoleJob>(&blocks, Phase::Apply);
        assert_eq!(triggers.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            JobError::Validation { index: 1, field: "job_name", .. }
        ));
    }

    #[test]
    fn test_duplicate_trigger_names() {
        let blocks = vec![
            role_block("roles", "SchemaRoleJob"),
            role_block("roles", "SchemaRoleJob"),
        ];
        let (_, errors) = collect_triggers::<SchemaRoleJob>(&blocks, Phase::Apply);
        assert_eq!(
            errors[0].to_string(),
            "jobs[1].trigger_name: \"roles\" is already used by jobs[0]"
        );
    }

    #[test]
    fn test_delete_targets_need_identifiers_only() {
        let mut block = role_block("roles", "SchemaRoleJob");
        block.cron_exp = Value::Null;
        let (targets, errors) = delete_targets::<SchemaRoleJob>(&[block]);
        assert!(errors.is_empty());
        assert_eq!(targets[0].triggername, "roles");
        assert_eq!(targets[0].jobgroup, "SCHEMA");
    }

    #[test]
    fn test_stale_triggers() {
        let prior = vec![
            role_block("keep", "SchemaRoleJob"),
            role_block("drop", "SchemaRoleJob"),
        ];
        let planned = vec![role_block("keep", "SchemaRoleJob")];

        let (prior, _) = delete_targets::<SchemaRoleJob>(&prior);
        let (planned, _) = collect_triggers::<SchemaRoleJob>(&planned, Phase::Apply);
        let stale = stale_triggers(&prior, &planned);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].triggername, "drop");
    }

    #[test]
    fn test_api_error_label() {
        let err = JobError::Api {
            operation: "deleteTrigger",
            triggers: vec!["nightly".to_string()],
            source: ApiError::Unauthorized { attempts: 4 },
        };
        assert_eq!(
            err.to_string(),
            "deleteTrigger failed for trigger \"nightly\": request unauthorized (401) after 4 attempt(s)"
        );
    }
}
