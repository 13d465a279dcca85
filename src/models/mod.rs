pub mod attendance;
pub mod enrollment;
pub mod member;
pub mod program;

pub use attendance::{AttendanceOutcome, AttendanceRecord, AttendanceRequest, RosterEntry};
pub use enrollment::{
    Enrollment, EnrollmentReceipt, NewEnrollmentRequest, PaymentStatus, PlanFields, PlanInput,
    RegistrationRequest, SalesSummary, UpdateEnrollmentRequest,
};
pub use member::{Member, MemberDetails, UpdateMemberRequest};
pub use program::{NewProgramRequest, Program, ScheduleSlot};
