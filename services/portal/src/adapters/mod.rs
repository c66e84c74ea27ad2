pub mod catalog;
pub mod credential_file;
pub mod http;
pub mod memory;

pub use catalog::SampleTeacherCatalog;
pub use credential_file::FileCredentialStore;
pub use http::BackendClient;
pub use memory::{InMemoryCredentialStore, LocalBookingLedger};
