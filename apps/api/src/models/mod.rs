// Persisted row types. Enumerated columns are plain text here and parsed into
// the workflow/scoring enums by the services that act on them.

pub mod applicant;
pub mod fellow;
pub mod placement;
