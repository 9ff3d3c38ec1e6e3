//! Data models for Faena

pub mod assignment;
pub mod assignment_request;
pub mod enums;
pub mod equipment;
pub mod loan;
pub mod notification;
pub mod operator;
pub mod user;
pub mod weekly_assignment;

// Re-export commonly used types
pub use assignment::{Assignment, EvidenceNote};
pub use assignment_request::AssignmentRequest;
pub use enums::{AssignmentStatus, BindingStatus, LoanStatus, RequestStatus, Shift};
pub use equipment::Equipment;
pub use loan::{Attestation, EquipmentLoan};
pub use notification::PushToken;
pub use operator::Operator;
pub use user::{AdminRecord, Principal, Role, UserClaims, UserProfile};
pub use weekly_assignment::WeeklyAssignment;
