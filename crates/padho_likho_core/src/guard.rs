//! crates/padho_likho_core/src/guard.rs
//!
//! Decides whether the current viewer may render a requested screen.
//!
//! `authorize` is the pure decision; `RoleGuard` gathers its input from the
//! session, validating a cached credential with the backend when needed.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::Role;
use crate::routes::{RouteAccess, RouteTable};
use crate::session::{Session, Validation};

pub const LOGIN_PATH: &str = "/login";

/// What the guard knows about the viewer at the moment of the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// A credential exists but the backend has not confirmed it yet.
    Resolving,
    Anonymous,
    Authenticated(Role),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    /// Where to send the viewer back to after signing in.
    pub return_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAuthorization {
    Allow,
    /// Show a neutral loading indicator; neither content nor redirect yet.
    Pending,
    Redirect(Redirect),
}

pub fn authorize(subject: Subject, access: &RouteAccess, requested_path: &str) -> RouteAuthorization {
    if *access == RouteAccess::Public {
        return RouteAuthorization::Allow;
    }
    match subject {
        Subject::Resolving => RouteAuthorization::Pending,
        Subject::Anonymous => RouteAuthorization::Redirect(Redirect {
            target: LOGIN_PATH.to_string(),
            return_to: Some(requested_path.to_string()),
        }),
        Subject::Authenticated(role) if access.permits(role) => RouteAuthorization::Allow,
        Subject::Authenticated(role) => RouteAuthorization::Redirect(Redirect {
            target: role.home_path().to_string(),
            return_to: None,
        }),
    }
}

/// A finished guard evaluation, with the roles that went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOutcome {
    pub authorization: RouteAuthorization,
    pub optimistic_role: Option<Role>,
    pub confirmed_role: Option<Role>,
}

pub struct RoleGuard {
    session: Arc<Session>,
    routes: RouteTable,
}

impl RoleGuard {
    pub fn new(session: Arc<Session>, routes: RouteTable) -> Self {
        Self { session, routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The decision available right now, without talking to the backend.
    pub async fn evaluate(&self, path: &str) -> RouteAuthorization {
        let access = self.routes.access_for(path);
        let snapshot = self.session.snapshot().await;
        let subject = match (snapshot.viewer, snapshot.credential) {
            (Some(viewer), _) => Subject::Authenticated(viewer.role),
            (None, Some(_)) => Subject::Resolving,
            (None, None) => Subject::Anonymous,
        };
        authorize(subject, &access, path)
    }

    /// Runs the full resolution for `path`.
    ///
    /// Returns `None` only when `cancel` fires first, e.g. because the viewer
    /// navigated elsewhere; the session is then left as it was.
    pub async fn resolve(&self, path: &str, cancel: &CancellationToken) -> Option<GuardOutcome> {
        let access = self.routes.access_for(path);
        if access == RouteAccess::Public {
            return Some(self.finish(path, &access, Subject::Anonymous, None, None));
        }

        let snapshot = self.session.snapshot().await;
        if let Some(viewer) = snapshot.viewer {
            let subject = Subject::Authenticated(viewer.role);
            return Some(self.finish(path, &access, subject, None, Some(viewer.role)));
        }

        let Some(credential) = snapshot.credential else {
            return Some(self.finish(path, &access, Subject::Anonymous, None, None));
        };

        let optimistic_role = self.session.optimistic_role(&credential);
        if optimistic_role.is_none() {
            debug!("Cached credential carries no usable role, discarding it");
            self.session.clear_if_current(&credential).await;
            return Some(self.finish(path, &access, Subject::Anonymous, None, None));
        }

        let (subject, confirmed_role) = match self.session.validate(cancel).await {
            Validation::Confirmed(viewer) => (Subject::Authenticated(viewer.role), Some(viewer.role)),
            Validation::Rejected | Validation::NoCredential => (Subject::Anonymous, None),
            Validation::Superseded => match self.session.viewer().await {
                Some(viewer) => (Subject::Authenticated(viewer.role), Some(viewer.role)),
                None => (Subject::Anonymous, None),
            },
            Validation::Cancelled => return None,
        };
        Some(self.finish(path, &access, subject, optimistic_role, confirmed_role))
    }

    fn finish(
        &self,
        path: &str,
        access: &RouteAccess,
        subject: Subject,
        optimistic_role: Option<Role>,
        confirmed_role: Option<Role>,
    ) -> GuardOutcome {
        let authorization = authorize(subject, access, path);
        match &authorization {
            RouteAuthorization::Redirect(redirect) => {
                info!("Redirecting {} to {}", path, redirect.target)
            }
            other => debug!("Route {} resolved to {:?}", path, other),
        }
        GuardOutcome {
            authorization,
            optimistic_role,
            confirmed_role,
        }
    }
}
