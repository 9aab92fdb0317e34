use thiserror::Error;

use crate::cv::models::{CvRecord, EditableCv};

/// User-correctable input problems. Reported before any encode or backend
/// call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your name")]
    MissingName,

    #[error("Please provide at least one contact method (email or phone)")]
    MissingContact,
}

/// The save gate: a non-blank name and at least one non-blank contact method.
/// Nothing else about the CV is checked.
pub fn validate_for_save(cv: &EditableCv) -> Result<(), ValidationError> {
    check_required(&cv.name, &cv.email, &cv.phone)
}

/// Same gate applied to an already-encoded record, used server side.
pub fn validate_record(record: &CvRecord) -> Result<(), ValidationError> {
    check_required(&record.name, &record.email, &record.phone)
}

/// Trims a profile name, rejecting it when nothing is left.
pub fn normalize_profile_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    Ok(name.to_string())
}

fn check_required(name: &str, email: &str, phone: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if email.trim().is_empty() && phone.trim().is_empty() {
        return Err(ValidationError::MissingContact);
    }
    Ok(())
}
