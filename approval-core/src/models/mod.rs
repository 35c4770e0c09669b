pub mod application;
pub mod auditlog;
pub mod directory;
pub mod number;
pub mod route;
pub mod step;
pub mod errors;

pub type ApplicationId = i64;
pub type ApplicationTypeId = i64;
pub type RouteId = i64;
pub type StepRecordId = i64;
pub type UserId = i64;
pub type DepartmentId = i64;
