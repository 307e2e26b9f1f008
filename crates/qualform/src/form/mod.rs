//! Qualifications form core: record store, validation, progress, submission.

pub mod domain;
pub mod persistence;
mod progress;
mod routes;
mod service;
mod submission;
mod validation;

pub use progress::{compute_progress, ProgressBreakdown, ProgressComponent, ProgressRule};
pub use routes::form_router;
pub use service::{FormServiceError, QualificationFormService};
pub use submission::{build_payload, SubmissionPayload};
pub use validation::{submission_problems, validate_entry, ValidationError};
