//! services/portal/src/adapters/memory.rs
//!
//! In-process implementations of the storage ports, used when nothing should
//! touch the disk or the backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use padho_likho_core::domain::{Booking, BookingRequest, BookingStatus, Credential};
use padho_likho_core::ports::{BookingService, CredentialStore, PortResult};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Credential storage that lives only as long as the process.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> PortResult<Option<Credential>> {
        Ok(self.credential.lock().await.clone())
    }

    async fn save(&self, credential: &Credential) -> PortResult<()> {
        *self.credential.lock().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        *self.credential.lock().await = None;
        Ok(())
    }
}

/// Accepts every booking and keeps it in memory, keyed by the booker's token.
#[derive(Default)]
pub struct LocalBookingLedger {
    bookings: Mutex<HashMap<String, Vec<Booking>>>,
}

impl LocalBookingLedger {
    pub async fn bookings_for(&self, token: &str) -> Vec<Booking> {
        self.bookings
            .lock()
            .await
            .get(token)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl BookingService for LocalBookingLedger {
    async fn submit_booking(&self, token: &str, request: &BookingRequest) -> PortResult<Booking> {
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            request: request.clone(),
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        info!("Recorded booking {} locally", booking.id);
        self.bookings
            .lock()
            .await
            .entry(token.to_string())
            .or_default()
            .push(booking.clone());
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use padho_likho_core::domain::{LessonDuration, Role};

    #[tokio::test]
    async fn credential_round_trips_in_memory() {
        let store = InMemoryCredentialStore::default();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&Credential::new("t", Some(Role::Parent))).await.unwrap();
        assert_eq!(store.load().await.unwrap().and_then(|c| c.role), Some(Role::Parent));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn ledger_keeps_bookings_per_viewer() {
        let ledger = LocalBookingLedger::default();
        let request = BookingRequest {
            teacher_id: "t-1".to_string(),
            subject: "Mathematics".to_string(),
            class: "10".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            time: "10:00 AM".to_string(),
            duration_minutes: LessonDuration::OneHour,
            topic: "Algebra".to_string(),
            notes: None,
            total_amount: 500.0,
        };

        let first = ledger.submit_booking("a", &request).await.unwrap();
        ledger.submit_booking("b", &request).await.unwrap();

        assert_eq!(ledger.bookings_for("a").await, vec![first]);
        assert_eq!(ledger.bookings_for("b").await.len(), 1);
        assert!(ledger.bookings_for("c").await.is_empty());
    }
}
