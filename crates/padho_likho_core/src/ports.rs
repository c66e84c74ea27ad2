//! crates/padho_likho_core/src/ports.rs
//!
//! Defines the service contracts (traits) the portal core depends on.
//! These traits are the boundary of the hexagonal architecture: the backend
//! REST API, client-local credential storage and the teacher catalog all sit
//! behind them, so the guard and the wizard can be tested with fakes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    AuthGrant, Booking, BookingRequest, Credential, ProfileUpdate, Registration, Teacher, Viewer,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, disk).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Rejected by backend: {0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The backend's authentication endpoints.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> PortResult<AuthGrant>;

    async fn register(&self, registration: &Registration) -> PortResult<AuthGrant>;

    /// Resolves the viewer a token belongs to. Fails for invalid or expired tokens.
    async fn current_user(&self, token: &str) -> PortResult<Viewer>;

    async fn forgot_password(&self, email: &str) -> PortResult<()>;

    async fn reset_password(&self, reset_token: &str, new_password: &str) -> PortResult<()>;

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> PortResult<Viewer>;
}

/// Client-local persistent storage for the credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> PortResult<Option<Credential>>;

    async fn save(&self, credential: &Credential) -> PortResult<()>;

    async fn clear(&self) -> PortResult<()>;
}

#[async_trait]
pub trait BookingService: Send + Sync {
    /// Persists a confirmed booking on behalf of the token's owner.
    async fn submit_booking(&self, token: &str, request: &BookingRequest) -> PortResult<Booking>;
}

#[async_trait]
pub trait TeacherCatalog: Send + Sync {
    /// Lists teachers, optionally only those offering `subject`.
    async fn list_teachers(&self, subject: Option<&str>) -> PortResult<Vec<Teacher>>;

    async fn teacher(&self, id: &str) -> PortResult<Teacher>;
}

/// Source of "now", injected so date validation and token expiry are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}
