// Operations exposed over HTTP. Each one reads what it needs from the store,
// validates the requested status change before any evaluator call, and writes
// its results in a single store call so a failure leaves prior state intact.

pub mod analytics;
pub mod applicants;
pub mod bulk;
pub mod check_ins;
pub mod cohorts;
pub mod fellows;
pub mod microship;
pub mod placement;
pub mod risk;
pub mod warnings;
