use chrono::NaiveDate;

/// Problems caught before anything is sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("end date {end} is before start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("{kind} {id} does not exist")]
    UnknownReference { kind: &'static str, id: i64 },
}

/// Require a non-blank string field, returning it trimmed.
pub fn require(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Turn an operation error into the message shown to the user. Validation
/// failures are shown as-is; anything else gets a generic retry hint.
pub fn user_message(err: &anyhow::Error, action: &str) -> String {
    match err.downcast_ref::<ValidationError>() {
        Some(validation) => validation.to_string(),
        None => format!("Could not {action}. Please try again."),
    }
}
