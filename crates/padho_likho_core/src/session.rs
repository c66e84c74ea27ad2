//! crates/padho_likho_core/src/session.rs
//!
//! The session context: the one place that owns the cached credential and
//! the resolved viewer. Components receive it by reference instead of
//! reading client storage themselves.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{Credential, ProfileUpdate, Registration, Role, Viewer};
use crate::ports::{AuthService, Clock, CredentialStore, PortError, PortResult};
use crate::token::decode_role;

/// A consistent view of the session at one instant.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub credential: Option<Credential>,
    pub viewer: Option<Viewer>,
}

/// How a round-trip to the backend's "who am I" endpoint ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Confirmed(Viewer),
    /// The backend refused the credential; it has been cleared.
    Rejected,
    NoCredential,
    Cancelled,
    /// A login or logout landed while the backend was answering; the answer
    /// was dropped and the session should be read again.
    Superseded,
}

pub struct Session {
    store: Arc<dyn CredentialStore>,
    auth: Arc<dyn AuthService>,
    clock: Arc<dyn Clock>,
    state: RwLock<SessionSnapshot>,
}

impl Session {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        auth: Arc<dyn AuthService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            auth,
            clock,
            state: RwLock::new(SessionSnapshot::default()),
        }
    }

    /// Loads the persisted credential. Call once at application start.
    ///
    /// An unreadable store is treated like an empty one.
    pub async fn init(&self) -> SessionSnapshot {
        let credential = match self.store.load().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Could not read stored credential, starting signed out: {}", e);
                None
            }
        };
        debug!("Session initialised (credential present: {})", credential.is_some());

        let mut state = self.state.write().await;
        *state = SessionSnapshot {
            credential,
            viewer: None,
        };
        state.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.state.read().await.credential.clone()
    }

    pub async fn viewer(&self) -> Option<Viewer> {
        self.state.read().await.viewer.clone()
    }

    /// `Authorization` header value for backend calls, if signed in.
    pub async fn bearer(&self) -> Option<String> {
        self.state.read().await.credential.as_ref().map(Credential::bearer)
    }

    /// The role guessed from the cached credential, before the backend confirms it.
    pub fn optimistic_role(&self, credential: &Credential) -> Option<Role> {
        decode_role(&credential.token, self.clock.now())
            .role()
            .or(credential.role)
    }

    pub async fn login(&self, email: &str, password: &str) -> PortResult<Viewer> {
        let grant = self.auth.login(email, password).await?;
        info!("Signed in as {} ({})", grant.user.display_name, grant.user.role);
        self.establish(grant.token, grant.user).await
    }

    pub async fn register(&self, registration: &Registration) -> PortResult<Viewer> {
        let grant = self.auth.register(registration).await?;
        info!("Registered {} as {}", grant.user.display_name, grant.user.role);
        self.establish(grant.token, grant.user).await
    }

    async fn establish(&self, token: String, viewer: Viewer) -> PortResult<Viewer> {
        let credential = Credential::new(token, Some(viewer.role));
        self.store.save(&credential).await?;

        let mut state = self.state.write().await;
        state.credential = Some(credential);
        state.viewer = Some(viewer.clone());
        Ok(viewer)
    }

    /// Asks the backend who the cached credential belongs to.
    ///
    /// A confirmed viewer replaces any optimistic role. Any failure clears the
    /// credential; cancellation leaves the session untouched.
    pub async fn validate(&self, cancel: &CancellationToken) -> Validation {
        let Some(credential) = self.credential().await else {
            return Validation::NoCredential;
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Credential validation cancelled");
                return Validation::Cancelled;
            }
            outcome = self.auth.current_user(&credential.token) => outcome,
        };

        let mut state = self.state.write().await;
        if state.credential.as_ref() != Some(&credential) {
            debug!("Credential changed during validation, discarding result");
            return Validation::Superseded;
        }

        match outcome {
            Ok(viewer) => {
                let confirmed = Credential::new(credential.token.clone(), Some(viewer.role));
                if confirmed != credential {
                    if let Err(e) = self.store.save(&confirmed).await {
                        warn!("Could not persist confirmed role: {}", e);
                    }
                }
                state.credential = Some(confirmed);
                state.viewer = Some(viewer.clone());
                Validation::Confirmed(viewer)
            }
            Err(e) => {
                warn!("Stored credential rejected, signing out: {}", e);
                if let Err(e) = self.store.clear().await {
                    warn!("Could not clear stored credential: {}", e);
                }
                *state = SessionSnapshot::default();
                Validation::Rejected
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> PortResult<Viewer> {
        let credential = self.credential().await.ok_or(PortError::Unauthorized)?;
        let viewer = self.auth.update_profile(&credential.token, update).await?;

        let mut state = self.state.write().await;
        if state.credential.as_ref() == Some(&credential) {
            state.viewer = Some(viewer.clone());
        }
        Ok(viewer)
    }

    pub async fn forgot_password(&self, email: &str) -> PortResult<()> {
        self.auth.forgot_password(email).await
    }

    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> PortResult<()> {
        self.auth.reset_password(reset_token, new_password).await
    }

    /// Ends the session: forgets the credential and viewer, in memory and in
    /// storage.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        if let Err(e) = self.store.clear().await {
            warn!("Could not clear stored credential: {}", e);
        }
        *state = SessionSnapshot::default();
        info!("Signed out");
    }

    /// Drops the credential only if nobody replaced it in the meantime.
    pub(crate) async fn clear_if_current(&self, credential: &Credential) {
        let mut state = self.state.write().await;
        if state.credential.as_ref() != Some(credential) {
            return;
        }
        if let Err(e) = self.store.clear().await {
            warn!("Could not clear stored credential: {}", e);
        }
        *state = SessionSnapshot::default();
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    fn session(store: Arc<MemoryStore>, auth: Arc<FakeAuth>) -> Session {
        Session::new(store, auth, FixedClock::at_epoch())
    }

    #[tokio::test]
    async fn login_persists_token_and_role() {
        let store = Arc::new(MemoryStore::default());
        let auth = Arc::new(FakeAuth::knowing(
            "token-asha@example.com",
            viewer("asha", Role::Student),
        ));
        let session = session(store.clone(), auth);

        let viewer = session.login("asha@example.com", "secret").await.unwrap();

        assert_eq!(viewer.role, Role::Student);
        assert_eq!(
            store.current(),
            Some(Credential::new("token-asha@example.com", Some(Role::Student)))
        );
        assert_eq!(
            session.bearer().await.as_deref(),
            Some("Bearer token-asha@example.com")
        );
    }

    #[tokio::test]
    async fn failed_login_leaves_session_alone() {
        let store = Arc::new(MemoryStore::default());
        let session = session(store.clone(), Arc::new(FakeAuth::default()));

        let result = session.login("asha@example.com", "wrong").await;

        assert!(matches!(result, Err(PortError::Rejected(_))));
        assert!(store.current().is_none());
        assert!(session.viewer().await.is_none());
    }

    #[tokio::test]
    async fn rejected_credential_is_cleared() {
        let store = Arc::new(MemoryStore::holding(Credential::new("stale", Some(Role::Teacher))));
        let session = session(store.clone(), Arc::new(FakeAuth::default()));
        session.init().await;

        let outcome = session.validate(&CancellationToken::new()).await;

        assert_eq!(outcome, Validation::Rejected);
        assert!(store.current().is_none());
        assert!(session.credential().await.is_none());
    }

    #[tokio::test]
    async fn confirmed_role_replaces_stored_role() {
        let store = Arc::new(MemoryStore::holding(Credential::new("tok", Some(Role::Student))));
        let auth = Arc::new(FakeAuth::knowing("tok", viewer("ravi", Role::Parent)));
        let session = session(store.clone(), auth);
        session.init().await;

        let outcome = session.validate(&CancellationToken::new()).await;

        assert!(matches!(outcome, Validation::Confirmed(ref v) if v.role == Role::Parent));
        assert_eq!(store.current().and_then(|c| c.role), Some(Role::Parent));
    }

    #[tokio::test]
    async fn cancelled_validation_changes_nothing() {
        let store = Arc::new(MemoryStore::holding(Credential::new("tok", Some(Role::Student))));
        let auth = Arc::new(FakeAuth {
            gate: Some(Arc::new(tokio::sync::Notify::new())),
            ..FakeAuth::knowing("tok", viewer("ravi", Role::Student))
        });
        let session = session(store.clone(), auth);
        session.init().await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = session.validate(&cancel).await;

        assert_eq!(outcome, Validation::Cancelled);
        assert!(store.current().is_some());
        assert!(session.viewer().await.is_none());
    }

    #[tokio::test]
    async fn login_during_validation_supersedes_the_old_answer() {
        let store = Arc::new(MemoryStore::holding(Credential::new("old", Some(Role::Student))));
        let gate = Arc::new(tokio::sync::Notify::new());
        let auth = Arc::new(FakeAuth {
            gate: Some(gate.clone()),
            ..FakeAuth::knowing("old", viewer("s", Role::Student))
        });
        auth.users
            .lock()
            .unwrap()
            .push(("token-t@x.in".to_string(), viewer("t", Role::Teacher)));
        let session = session(store.clone(), auth.clone());
        session.init().await;

        let cancel = CancellationToken::new();
        let (outcome, _) = tokio::join!(session.validate(&cancel), async {
            while !auth.calls.lock().unwrap().iter().any(|c| c == "current_user") {
                tokio::task::yield_now().await;
            }
            session.login("t@x.in", "secret").await.unwrap();
            gate.notify_one();
        });

        assert_eq!(outcome, Validation::Superseded);
        assert_eq!(session.viewer().await.map(|v| v.role), Some(Role::Teacher));
        assert_eq!(store.current(), Some(Credential::new("token-t@x.in", Some(Role::Teacher))));
    }

    #[tokio::test]
    async fn unreadable_store_starts_signed_out() {
        let store = Arc::new(MemoryStore {
            fail_load: true,
            ..Default::default()
        });
        let session = session(store, Arc::new(FakeAuth::default()));

        let snapshot = session.init().await;

        assert!(snapshot.credential.is_none());
        assert_eq!(
            session.validate(&CancellationToken::new()).await,
            Validation::NoCredential
        );
    }

    #[tokio::test]
    async fn logout_forgets_everything() {
        let store = Arc::new(MemoryStore::default());
        let auth = Arc::new(FakeAuth::knowing("token-a@b.c", viewer("a", Role::Teacher)));
        let session = session(store.clone(), auth);
        session.login("a@b.c", "secret").await.unwrap();

        session.logout().await;

        assert!(store.current().is_none());
        assert!(session.snapshot().await.viewer.is_none());
    }

    #[tokio::test]
    async fn profile_update_needs_a_credential() {
        let auth = Arc::new(FakeAuth::knowing("token-a@b.c", viewer("a", Role::Teacher)));
        let session = session(Arc::new(MemoryStore::default()), auth);
        let update = ProfileUpdate {
            name: Some("Meera".to_string()),
            ..Default::default()
        };

        assert_eq!(
            session.update_profile(&update).await,
            Err(PortError::Unauthorized)
        );

        session.login("a@b.c", "secret").await.unwrap();
        let viewer = session.update_profile(&update).await.unwrap();
        assert_eq!(viewer.display_name, "Meera");
        assert_eq!(session.viewer().await.map(|v| v.display_name), Some("Meera".to_string()));
    }

    #[tokio::test]
    async fn registration_signs_in() {
        let store = Arc::new(MemoryStore::default());
        let session = session(store.clone(), Arc::new(FakeAuth::default()));
        let registration = Registration {
            name: "Kiran".to_string(),
            email: "kiran@example.com".to_string(),
            password: "secret".to_string(),
            role: Role::Parent,
            phone: None,
        };

        let viewer = session.register(&registration).await.unwrap();

        assert_eq!(viewer.role, Role::Parent);
        assert_eq!(store.current().and_then(|c| c.role), Some(Role::Parent));
    }
}
