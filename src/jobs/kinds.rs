//! Job kinds
//!
//! One zero-sized type per job resource. Each carries its Terraform block, the
//! `job_name` literal the server expects, and how its parameters map onto the
//! trigger's `valueMap`.

use super::validate::{StringList, Validator};
use super::{CommonFields, JobKind, JobParams, ParamSpec};
use serde::{Deserialize, Serialize};
use tf_provider::Value;

pub const IMPORT_TYPES: &[&str] = &["FULL", "INCREMENTAL"];
pub const FILE_TRANSFER_ACTIONS: &[&str] = &["PUT", "GET"];
pub const ON_FAILURE_ACTIONS: &[&str] = &["STOP", "CONTINUE"];

const SECURITY_SYSTEMS: ParamSpec =
    ParamSpec::list("security_systems", true, "Security systems the job runs against");
const CONNECTION_NAME: ParamSpec =
    ParamSpec::string("connection_name", false, "Connection used to reach the target");
const CONNECTION_NAME_REQUIRED: ParamSpec =
    ParamSpec::string("connection_name", true, "Connection used to reach the target");
const IMPORT_TYPE: ParamSpec =
    ParamSpec::string("import_type", false, "Import mode, one of FULL or INCREMENTAL");
const SCHEMA_FILE_NAMES: ParamSpec =
    ParamSpec::list("schema_file_names", true, "Schema files to process, in order");

macro_rules! common_fields {
    ($block:expr) => {
        CommonFields {
            trigger_name: &$block.trigger_name,
            job_name: &$block.job_name,
            job_group: &$block.job_group,
            group_name: &$block.group_name,
            cron_exp: &$block.cron_exp,
        }
    };
}

// =============================================================================
// Account imports
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct AccountsImportFullJob;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsImportBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub security_systems: Value<StringList>,
    pub connection_name: Value<String>,
}

fn accounts_import_params(block: &AccountsImportBlock, v: &mut Validator<'_>) -> JobParams {
    let mut params = JobParams::new();
    params
        .list(
            "securitySystems",
            v.required_list("security_systems", &block.security_systems),
        )
        .str(
            "connectionName",
            v.optional_str("connection_name", &block.connection_name),
        );
    params
}

impl JobKind for AccountsImportFullJob {
    type Block = AccountsImportBlock;

    const RESOURCE: &'static str = "accounts_import_full_job_resource";
    const JOB_NAME: &'static str = "AccountsImportFullJob";
    const DESCRIPTION: &'static str = "Schedules full account imports from security systems";
    const PARAMETERS: &'static [ParamSpec] = &[SECURITY_SYSTEMS, CONNECTION_NAME];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        accounts_import_params(block, v)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AccountsImportIncrementalJob;

impl JobKind for AccountsImportIncrementalJob {
    type Block = AccountsImportBlock;

    const RESOURCE: &'static str = "accounts_import_incremental_job_resource";
    const JOB_NAME: &'static str = "AccountsImportIncrementalJob";
    const DESCRIPTION: &'static str =
        "Schedules incremental account imports from security systems";
    const PARAMETERS: &'static [ParamSpec] = &[SECURITY_SYSTEMS, CONNECTION_NAME];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        accounts_import_params(block, v)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationDataImportJob;

impl JobKind for ApplicationDataImportJob {
    type Block = AccountsImportBlock;

    const RESOURCE: &'static str = "application_data_import_job_resource";
    const JOB_NAME: &'static str = "ApplicationDataImportJob";
    const DESCRIPTION: &'static str = "Schedules application data imports";
    const PARAMETERS: &'static [ParamSpec] = &[SECURITY_SYSTEMS, CONNECTION_NAME];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        accounts_import_params(block, v)
    }
}

// =============================================================================
// ECM and user imports
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionImportBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub connection_name: Value<String>,
    pub import_type: Value<String>,
}

fn connection_import_params(block: &ConnectionImportBlock, v: &mut Validator<'_>) -> JobParams {
    let mut params = JobParams::new();
    params
        .str(
            "connectionName",
            v.required_str("connection_name", &block.connection_name),
        )
        .str(
            "importType",
            v.one_of("import_type", &block.import_type, IMPORT_TYPES),
        );
    params
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EcmJob;

impl JobKind for EcmJob {
    type Block = ConnectionImportBlock;

    const RESOURCE: &'static str = "ecm_job_resource";
    const JOB_NAME: &'static str = "EcmImportJob";
    const DESCRIPTION: &'static str = "Schedules ECM imports over a connection";
    const PARAMETERS: &'static [ParamSpec] = &[CONNECTION_NAME_REQUIRED, IMPORT_TYPE];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        connection_import_params(block, v)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UserImportJob;

impl JobKind for UserImportJob {
    type Block = ConnectionImportBlock;

    const RESOURCE: &'static str = "user_import_job_resource";
    const JOB_NAME: &'static str = "UserImportJob";
    const DESCRIPTION: &'static str = "Schedules user imports over a connection";
    const PARAMETERS: &'static [ParamSpec] = &[CONNECTION_NAME_REQUIRED, IMPORT_TYPE];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        connection_import_params(block, v)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EcmSapUserJob;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcmSapUserJobBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub connection_name: Value<String>,
}

impl JobKind for EcmSapUserJob {
    type Block = EcmSapUserJobBlock;

    const RESOURCE: &'static str = "ecm_sap_user_job_resource";
    const JOB_NAME: &'static str = "EcmSapUserJob";
    const DESCRIPTION: &'static str = "Schedules SAP user imports";
    const PARAMETERS: &'static [ParamSpec] = &[CONNECTION_NAME_REQUIRED];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        let mut params = JobParams::new();
        params.str(
            "connectionName",
            v.required_str("connection_name", &block.connection_name),
        );
        params
    }
}

// =============================================================================
// Schema jobs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaJobBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub schema_file_names: Value<StringList>,
}

pub type SchemaRoleJobBlock = SchemaJobBlock;

fn schema_params(block: &SchemaJobBlock, v: &mut Validator<'_>) -> JobParams {
    let mut params = JobParams::new();
    params.list(
        "schemaFileNames",
        v.required_list("schema_file_names", &block.schema_file_names),
    );
    params
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaUserJob;

impl JobKind for SchemaUserJob {
    type Block = SchemaJobBlock;

    const RESOURCE: &'static str = "schema_user_job_resource";
    const JOB_NAME: &'static str = "SchemaUserJob";
    const DESCRIPTION: &'static str = "Schedules user imports from schema files";
    const PARAMETERS: &'static [ParamSpec] = &[SCHEMA_FILE_NAMES];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        schema_params(block, v)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaAccountJob;

impl JobKind for SchemaAccountJob {
    type Block = SchemaJobBlock;

    const RESOURCE: &'static str = "schema_account_job_resource";
    const JOB_NAME: &'static str = "SchemaAccountJob";
    const DESCRIPTION: &'static str = "Schedules account imports from schema files";
    const PARAMETERS: &'static [ParamSpec] = &[SCHEMA_FILE_NAMES];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        schema_params(block, v)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaRoleJob;

impl JobKind for SchemaRoleJob {
    type Block = SchemaJobBlock;

    const RESOURCE: &'static str = "schema_role_job_resource";
    const JOB_NAME: &'static str = "SchemaRoleJob";
    const DESCRIPTION: &'static str = "Schedules role imports from schema files";
    const PARAMETERS: &'static [ParamSpec] = &[SCHEMA_FILE_NAMES];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        schema_params(block, v)
    }
}

// =============================================================================
// File transfer
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct FileTransferJob;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileTransferJobBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub file_transfer_action: Value<String>,
    pub external_connection: Value<String>,
    pub source_path: Value<String>,
    pub destination_path: Value<String>,
}

impl JobKind for FileTransferJob {
    type Block = FileTransferJobBlock;

    const RESOURCE: &'static str = "file_transfer_job_resource";
    const JOB_NAME: &'static str = "FileTransferJob";
    const DESCRIPTION: &'static str = "Schedules file transfers through an external connection";
    const PARAMETERS: &'static [ParamSpec] = &[
        ParamSpec::string("file_transfer_action", true, "Transfer direction, PUT or GET"),
        ParamSpec::string("external_connection", true, "External connection to transfer through"),
        ParamSpec::string("source_path", true, "Path to read files from"),
        ParamSpec::string("destination_path", true, "Path to write files to"),
    ];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        let mut params = JobParams::new();
        params
            .str(
                "fileTransferAction",
                v.required_one_of(
                    "file_transfer_action",
                    &block.file_transfer_action,
                    FILE_TRANSFER_ACTIONS,
                ),
            )
            .str(
                "externalConnection",
                v.required_str("external_connection", &block.external_connection),
            )
            .str("sourcePath", v.required_str("source_path", &block.source_path))
            .str(
                "destinationPath",
                v.required_str("destination_path", &block.destination_path),
            );
        params
    }
}

// =============================================================================
// Provisioning retries
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct WsRetryJob;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WsRetryJobBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub security_systems: Value<StringList>,
    pub task_types: Value<StringList>,
}

impl JobKind for WsRetryJob {
    type Block = WsRetryJobBlock;

    const RESOURCE: &'static str = "wsretry_job_resource";
    const JOB_NAME: &'static str = "WSRetryJob";
    const DESCRIPTION: &'static str = "Schedules retries of failed provisioning tasks";
    const PARAMETERS: &'static [ParamSpec] = &[
        SECURITY_SYSTEMS,
        ParamSpec::list("task_types", false, "Task types to retry, all when unset"),
    ];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        let mut params = JobParams::new();
        params
            .list(
                "securitySystems",
                v.required_list("security_systems", &block.security_systems),
            )
            .list("taskTypes", v.optional_list("task_types", &block.task_types));
        params
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WsRetryBlockingJob;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WsRetryBlockingJobBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub security_systems: Value<StringList>,
}

impl JobKind for WsRetryBlockingJob {
    type Block = WsRetryBlockingJobBlock;

    const RESOURCE: &'static str = "wsretry_blocking_job_resource";
    const JOB_NAME: &'static str = "WSRetryBlockingJob";
    const DESCRIPTION: &'static str =
        "Schedules blocking retries of failed provisioning tasks";
    const PARAMETERS: &'static [ParamSpec] = &[SECURITY_SYSTEMS];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        let mut params = JobParams::new();
        params.list(
            "securitySystems",
            v.required_list("security_systems", &block.security_systems),
        );
        params
    }
}

// =============================================================================
// Analytics, queries and chains
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsJob;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsJobBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub analytics_names: Value<StringList>,
}

impl JobKind for AnalyticsJob {
    type Block = AnalyticsJobBlock;

    const RESOURCE: &'static str = "analytics_job_resource";
    const JOB_NAME: &'static str = "AnalyticsJob";
    const DESCRIPTION: &'static str = "Schedules analytics runs";
    const PARAMETERS: &'static [ParamSpec] = &[ParamSpec::list("analytics_names", true, "Analytics controls to run")];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        let mut params = JobParams::new();
        params.list(
            "analyticsNames",
            v.required_list("analytics_names", &block.analytics_names),
        );
        params
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CustomQueryJob;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomQueryJobBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub query_name: Value<String>,
}

impl JobKind for CustomQueryJob {
    type Block = CustomQueryJobBlock;

    const RESOURCE: &'static str = "custom_query_job_resource";
    const JOB_NAME: &'static str = "CustomQueryJob";
    const DESCRIPTION: &'static str = "Schedules a saved custom query";
    const PARAMETERS: &'static [ParamSpec] = &[ParamSpec::string("query_name", true, "Name of the saved query")];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        let mut params = JobParams::new();
        params.str("queryName", v.required_str("query_name", &block.query_name));
        params
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TriggerChainJob;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerChainJobBlock {
    pub trigger_name: Value<String>,
    pub job_name: Value<String>,
    pub job_group: Value<String>,
    pub group_name: Value<String>,
    pub cron_exp: Value<String>,
    pub trigger_chain: Value<StringList>,
    pub on_failure: Value<String>,
}

impl JobKind for TriggerChainJob {
    type Block = TriggerChainJobBlock;

    const RESOURCE: &'static str = "trigger_chain_job_resource";
    const JOB_NAME: &'static str = "TriggerChainJob";
    const DESCRIPTION: &'static str = "Schedules a chain of existing triggers run in sequence";
    const PARAMETERS: &'static [ParamSpec] = &[
        ParamSpec::list("trigger_chain", true, "Trigger names to run, in order"),
        ParamSpec::string("on_failure", false, "What to do when a link fails, STOP or CONTINUE"),
    ];

    fn common(block: &Self::Block) -> CommonFields<'_> {
        common_fields!(block)
    }

    fn params(block: &Self::Block, v: &mut Validator<'_>) -> JobParams {
        let chain = v.required_list("trigger_chain", &block.trigger_chain);
        // A chain that starts itself never finishes
        if let (Some(chain), Value::Value(own)) = (&chain, &block.trigger_name) {
            if chain.iter().any(|t| t == own) {
                v.error("trigger_chain", format!("must not contain the chain's own trigger \"{own}\""));
            }
        }

        let mut params = JobParams::new();
        params
            .list("triggerChain", chain)
            .str(
                "onFailure",
                v.one_of("on_failure", &block.on_failure, ON_FAILURE_ACTIONS),
            );
        params
    }
}
