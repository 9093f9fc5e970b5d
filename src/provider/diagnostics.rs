//! Conversion of job and API failures into Terraform diagnostics

use crate::jobs::{JobError, Report};
use crate::saviynt::error::ApiError;
use tf_provider::{AttributePath, Diagnostics};

/// Validation errors point at the offending attribute inside `jobs`
pub fn job_errors(diags: &mut Diagnostics, errors: &[JobError]) {
    for err in errors {
        match err {
            JobError::Validation { index, field, .. } => diags.error(
                format!("Invalid {field}"),
                err.to_string(),
                job_attribute(*index, *field),
            ),
            JobError::DuplicateTrigger { index, .. } => diags.error(
                "Duplicate trigger_name",
                err.to_string(),
                job_attribute(*index, "trigger_name"),
            ),
            JobError::Api { operation, .. } => {
                diags.root_error(format!("Saviynt {operation} failed"), err.to_string())
            }
        }
    }
}

/// Emit every warning and error from a lifecycle report; true when it succeeded
pub fn report(diags: &mut Diagnostics, report: &Report) -> bool {
    for warning in &report.warnings {
        diags.root_warning(warning.summary.clone(), warning.detail.clone());
    }
    job_errors(diags, &report.errors);
    report.is_success()
}

/// Report a failed data source lookup.
/// A lookup has no state to fall back on, so even a 412 is an error here.
pub fn api_error(diags: &mut Diagnostics, context: &str, err: &ApiError) {
    diags.root_error(format!("{context} failed"), err.to_string());
}

fn job_attribute(index: usize, field: &'static str) -> AttributePath {
    AttributePath::new("jobs").index(index as i64).attribute(field)
}
