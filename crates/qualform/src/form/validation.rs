use super::domain::{FormState, LevelCatalog, QualificationRecord, RecordDraft, Tier};

/// Per-record validation failures, reported one at a time in field order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("required field missing: {0}")]
    MissingField(&'static str),
    #[error("invalid format for {0}: expected a 4-digit year or blank")]
    InvalidFormat(&'static str),
    #[error("level '{level}' is not offered for the {tier} tier")]
    UnknownLevel { tier: Tier, level: String },
}

impl ValidationError {
    /// The field the failure concerns, for structured API responses.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) | ValidationError::InvalidFormat(field) => field,
            ValidationError::UnknownLevel { .. } => "level",
        }
    }
}

fn is_four_ascii_digits(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Validate a raw draft for insertion into `tier`, producing the normalized
/// (trimmed) record.
///
/// Checks short-circuit in field order: subject, level, grade, then the year
/// format. Level-set membership is enforced last so the ordered failures
/// match what the form surfaces field by field.
pub fn validate_entry(
    catalog: &LevelCatalog,
    tier: Tier,
    draft: &RecordDraft,
) -> Result<QualificationRecord, ValidationError> {
    let subject = draft.subject.trim();
    if subject.is_empty() {
        return Err(ValidationError::MissingField("subject"));
    }

    let level = draft.level.trim();
    if level.is_empty() {
        return Err(ValidationError::MissingField("level"));
    }

    let grade = draft.grade.trim();
    if grade.is_empty() {
        return Err(ValidationError::MissingField("grade"));
    }

    let year = draft.year.trim();
    if !year.is_empty() && !is_four_ascii_digits(year) {
        return Err(ValidationError::InvalidFormat("year"));
    }

    if !catalog.permits(tier, level) {
        return Err(ValidationError::UnknownLevel {
            tier,
            level: level.to_string(),
        });
    }

    Ok(QualificationRecord {
        subject: subject.to_string(),
        level: level.to_string(),
        grade: grade.to_string(),
        year: year.to_string(),
    })
}

fn gcse_subject_mentions(state: &FormState, needle: &str) -> bool {
    state
        .gcse
        .iter()
        .any(|record| record.subject.to_lowercase().contains(needle))
}

/// Pre-submission validation over the whole form. Collects every problem
/// rather than stopping at the first; an empty list means the form may be
/// submitted.
pub fn submission_problems(state: &FormState) -> Vec<String> {
    let mut problems = Vec::new();

    if state.gcse.is_empty() {
        problems.push("Please add at least one GCSE or equivalent.".to_string());
    }
    if !gcse_subject_mentions(state, "math") {
        problems.push("GCSE section should include Maths (subject containing “Math”).".to_string());
    }
    if !gcse_subject_mentions(state, "english") {
        problems.push(
            "GCSE section should include English (subject containing “English”).".to_string(),
        );
    }

    problems
}
