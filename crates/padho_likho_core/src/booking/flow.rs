//! crates/padho_likho_core/src/booking/flow.rs
//!
//! Drives the pure wizard and carries out its effects against the booking
//! collaborator.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::booking::wizard::{transition, Effect, WizardEvent, WizardState};
use crate::domain::{Booking, Teacher};
use crate::ports::{BookingService, Clock, PortError};
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("the booking was abandoned before the backend answered")]
    Cancelled,
}

/// How an accepted confirmation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Booked(Booking),
    /// Draft kept; confirm again to retry.
    Failed(String),
    /// There was no open confirmation prompt or the draft was invalid.
    NotSubmitted,
}

/// One wizard instance for one teacher. Dropping it discards the draft.
pub struct BookingFlow {
    teacher: Teacher,
    state: WizardState,
    bookings: Arc<dyn BookingService>,
    session: Arc<Session>,
    clock: Arc<dyn Clock>,
}

impl BookingFlow {
    pub fn new(
        teacher: Teacher,
        bookings: Arc<dyn BookingService>,
        session: Arc<Session>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            teacher,
            state: WizardState::default(),
            bookings,
            session,
            clock,
        }
    }

    pub fn teacher(&self) -> &Teacher {
        &self.teacher
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Feeds one event through the wizard and returns its effects.
    pub fn apply(&mut self, event: WizardEvent) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = transition(&self.teacher, state, event, self.clock.today());
        self.state = state;
        effects
    }

    /// Accepts the open confirmation prompt and submits the booking.
    ///
    /// Cancelling `cancel` while the backend is working abandons the flow;
    /// the caller is expected to drop it.
    pub async fn accept(&mut self, cancel: &CancellationToken) -> Result<SubmitOutcome, FlowError> {
        let effects = self.apply(WizardEvent::AcceptConfirm);
        let Some(request) = effects.into_iter().find_map(|effect| match effect {
            Effect::Submit(request) => Some(request),
            Effect::Acknowledge(_) => None,
        }) else {
            return Ok(SubmitOutcome::NotSubmitted);
        };

        info!(
            "Submitting booking with {} for {} on {}",
            self.teacher.name, request.subject, request.date
        );
        let submission = async {
            let credential = self.session.credential().await.ok_or(PortError::Unauthorized)?;
            self.bookings.submit_booking(&credential.token, &request).await
        };
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Booking abandoned while submitting");
                return Err(FlowError::Cancelled);
            }
            result = submission => result,
        };

        match result {
            Ok(booking) => {
                info!("Booking {} confirmed", booking.id);
                self.apply(WizardEvent::SubmissionSucceeded(booking.clone()));
                Ok(SubmitOutcome::Booked(booking))
            }
            Err(e) => {
                error!("Booking submission failed: {}", e);
                let message = e.to_string();
                self.apply(WizardEvent::SubmissionFailed(message.clone()));
                Ok(SubmitOutcome::Failed(message))
            }
        }
    }
}
