pub mod attendance;
pub mod catalog;
pub mod ledger;
pub mod plan;
pub mod registry;

pub use attendance::AttendanceRecorder;
pub use catalog::ProgramCatalog;
pub use ledger::EnrollmentLedger;
pub use plan::{PlanQuote, compute_plan};
pub use registry::MemberRegistry;
