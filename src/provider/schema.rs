//! Terraform schema builders

use crate::jobs::{JobKind, ParamKind, ParamSpec};
use std::collections::HashMap;
use tf_provider::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};

pub const SCHEMA_VERSION: i64 = 1;

fn constraint(required: bool) -> AttributeConstraint {
    if required {
        AttributeConstraint::Required
    } else {
        AttributeConstraint::Optional
    }
}

pub fn string_attribute(required: bool, description: &str) -> Attribute {
    Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(description),
        constraint: constraint(required),
        ..Default::default()
    }
}

pub fn number_attribute(required: bool, description: &str) -> Attribute {
    Attribute {
        attr_type: AttributeType::Number,
        description: Description::plain(description),
        constraint: constraint(required),
        ..Default::default()
    }
}

pub fn sensitive_string_attribute(required: bool, description: &str) -> Attribute {
    Attribute {
        sensitive: true,
        ..string_attribute(required, description)
    }
}

pub fn string_list_attribute(required: bool, description: &str) -> Attribute {
    Attribute {
        attr_type: AttributeType::List(Box::new(AttributeType::String)),
        description: Description::plain(description),
        constraint: constraint(required),
        ..Default::default()
    }
}

/// Optional input that the provider fills in when left unset
pub fn optional_computed(attr_type: AttributeType, description: &str) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint: AttributeConstraint::OptionalComputed,
        ..Default::default()
    }
}

pub fn computed(attr_type: AttributeType, description: &str) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint: AttributeConstraint::Computed,
        ..Default::default()
    }
}

fn param_attribute(param: &ParamSpec) -> Attribute {
    match param.kind {
        ParamKind::String => string_attribute(param.required, param.description),
        ParamKind::StringList => string_list_attribute(param.required, param.description),
    }
}

/// Attributes every job block carries
pub fn common_job_attributes(job_name: &str) -> HashMap<String, Attribute> {
    HashMap::from([
        (
            "trigger_name".to_string(),
            string_attribute(true, "Unique name of the trigger"),
        ),
        (
            "job_name".to_string(),
            string_attribute(true, &format!("Job to schedule, must be \"{job_name}\"")),
        ),
        (
            "job_group".to_string(),
            string_attribute(true, "Job group the trigger belongs to"),
        ),
        (
            "group_name".to_string(),
            string_attribute(false, "Trigger group name, defaults to job_group"),
        ),
        (
            "cron_exp".to_string(),
            string_attribute(true, "Quartz cron expression (6 or 7 fields)"),
        ),
    ])
}

/// Schema of a job trigger resource: a computed id plus a `jobs` block list
pub fn job_resource_schema<K: JobKind>() -> Schema {
    let mut attributes = common_job_attributes(K::JOB_NAME);
    for param in K::PARAMETERS {
        attributes.insert(param.name.to_string(), param_attribute(param));
    }

    let jobs = Block {
        attributes,
        description: Description::plain("Trigger definition"),
        ..Default::default()
    };

    Schema {
        version: SCHEMA_VERSION,
        block: Block {
            attributes: HashMap::from([(
                "id".to_string(),
                computed(AttributeType::String, "Identifier derived from the trigger names"),
            )]),
            blocks: HashMap::from([("jobs".to_string(), NestedBlock::List(jobs))]),
            description: Description::plain(K::DESCRIPTION),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::kinds::{FileTransferJob, WsRetryJob};

    fn jobs_block(schema: &Schema) -> &Block {
        match schema.block.blocks.get("jobs") {
            Some(NestedBlock::List(block)) => block,
            _ => panic!("jobs should be a list block"),
        }
    }

    #[test]
    fn test_job_schema_has_common_and_specific_attributes() {
        let schema = job_resource_schema::<FileTransferJob>();
        let jobs = jobs_block(&schema);

        for name in [
            "trigger_name",
            "job_name",
            "job_group",
            "group_name",
            "cron_exp",
            "file_transfer_action",
            "external_connection",
            "source_path",
            "destination_path",
        ] {
            assert!(jobs.attributes.contains_key(name), "missing {name}");
        }
        assert_eq!(jobs.attributes.len(), 9);
        assert!(schema.block.attributes.contains_key("id"));
    }

    #[test]
    fn test_list_parameters_use_list_type() {
        let schema = job_resource_schema::<WsRetryJob>();
        let jobs = jobs_block(&schema);
        assert!(matches!(
            jobs.attributes["security_systems"].attr_type,
            AttributeType::List(_)
        ));
        assert!(matches!(
            jobs.attributes["security_systems"].constraint,
            AttributeConstraint::Required
        ));
        assert!(matches!(
            jobs.attributes["task_types"].constraint,
            AttributeConstraint::Optional
        ));
    }
}
