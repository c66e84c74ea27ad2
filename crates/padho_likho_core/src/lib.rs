pub mod booking;
pub mod domain;
pub mod guard;
pub mod ports;
pub mod routes;
pub mod session;
pub mod token;

pub use booking::{BookingFlow, FlowError, Stage, SubmitOutcome, WizardEvent, WizardState};
pub use domain::{
    AuthGrant, Booking, BookingDraft, BookingRequest, BookingStatus, Credential, LessonDuration,
    ProfileUpdate, Registration, Role, Teacher, Viewer,
};
pub use guard::{authorize, GuardOutcome, Redirect, RoleGuard, RouteAuthorization, Subject};
pub use ports::{
    AuthService, BookingService, Clock, CredentialStore, PortError, PortResult, SystemClock,
    TeacherCatalog,
};
pub use routes::{RouteAccess, RouteRule, RouteTable};
pub use session::{Session, SessionSnapshot, Validation};
pub use token::{decode_claims, decode_role, RoleDecode, TokenClaims, TokenError};
