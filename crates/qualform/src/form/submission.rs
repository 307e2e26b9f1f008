use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{FormState, QualificationRecord};

/// The payload handed to the submission sink. Assembly never fails and
/// leaves the form state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub gcse: Vec<QualificationRecord>,
    pub level3: Vec<QualificationRecord>,
    pub higher: Vec<QualificationRecord>,
    pub extenuating: Option<String>,
    pub submitted_at: String,
}

/// Build the submission payload from the current form contents.
///
/// The note is trimmed, and an all-whitespace note becomes `None`. The
/// timestamp is RFC 3339 UTC at millisecond precision.
pub fn build_payload(state: &FormState, submitted_at: DateTime<Utc>) -> SubmissionPayload {
    let note = state.extenuating.trim();
    SubmissionPayload {
        gcse: state.gcse.clone(),
        level3: state.l3.clone(),
        higher: state.higher.clone(),
        extenuating: (!note.is_empty()).then(|| note.to_string()),
        submitted_at: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}
