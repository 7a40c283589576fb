//! Variable payload construction
//!
//! Converts the fields present in a provider update into the typed variable
//! set the workflow engine understands.

use accord_record_store::ProviderFieldUpdate;

use crate::engine::{VariableUpdate, VariableValue};
use crate::error::{ServerError, ServerResult};

// Names of the process variables fed back into the engine.
const VAR_PROVIDERS_BUDGET: &str = "providersBudget";
const VAR_PROVIDERS_COMMENT: &str = "providersComment";
const VAR_MEET_REQUIREMENT: &str = "meetRequirement";
const VAR_PROVIDERS_NAME: &str = "providersName";

/// Build the typed variable set for the fields present in an update.
///
/// Exactly one entry per present field; absent fields are excluded entirely
/// rather than sent as null placeholders, so the corresponding engine
/// variables stay untouched. A budget value that does not coerce to an
/// integer is a BuildFailure and must prevent delivery to any instance.
pub fn build_variable_update(update: &ProviderFieldUpdate) -> ServerResult<VariableUpdate> {
    let mut variables = VariableUpdate::new();

    match update.budget() {
        Ok(Some(budget)) => variables.push(VAR_PROVIDERS_BUDGET, VariableValue::Integer(budget)),
        Ok(None) => {}
        Err(err) => return Err(ServerError::BuildFailure(err.to_string())),
    }

    if let Some(comment) = &update.providers_comment {
        variables.push(VAR_PROVIDERS_COMMENT, VariableValue::String(comment.clone()));
    }

    if let Some(assessment) = &update.meet_requirement {
        variables.push(VAR_MEET_REQUIREMENT, VariableValue::String(assessment.clone()));
    }

    if let Some(name) = &update.providers_name {
        variables.push(VAR_PROVIDERS_NAME, VariableValue::String(name.clone()));
    }

    Ok(variables)
}
