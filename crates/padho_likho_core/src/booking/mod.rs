//! crates/padho_likho_core/src/booking/mod.rs
//!
//! Booking a lesson with a teacher: the four-stage wizard, its pricing and
//! the driver that talks to the booking collaborator.

pub mod flow;
pub mod wizard;

pub use flow::{BookingFlow, FlowError, SubmitOutcome};
pub use wizard::{
    booking_request, transition, validate_stage, DraftEdit, DraftError, DraftField, Effect,
    ReviewSummary, Stage, Submission, WizardEvent, WizardState,
};

use crate::domain::LessonDuration;

pub const CURRENCY_SYMBOL: &str = "₹";

/// Price of one lesson: the hourly rate scaled by the lesson length.
pub fn total_amount(hourly_rate: f64, duration: LessonDuration) -> f64 {
    hourly_rate * f64::from(duration.minutes()) / 60.0
}

pub fn format_amount(amount: f64) -> String {
    format!("{CURRENCY_SYMBOL}{amount}")
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::Teacher;

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    pub fn sample_teacher(hourly_rate: f64) -> Teacher {
        Teacher {
            id: "t-1".to_string(),
            name: "Priya Sharma".to_string(),
            hourly_rate,
            subjects: vec!["Mathematics".to_string(), "Physics".to_string()],
            classes: vec!["10".to_string(), "11".to_string(), "12".to_string()],
            availability: vec!["10:00 AM".to_string(), "4:00 PM".to_string()],
        }
    }

    #[test]
    fn ninety_minutes_at_six_hundred_is_nine_hundred() {
        assert_eq!(total_amount(600.0, LessonDuration::NinetyMinutes), 900.0);
        assert_eq!(
            total_amount(600.0, LessonDuration::NinetyMinutes),
            total_amount(600.0, LessonDuration::NinetyMinutes)
        );
    }

    #[test]
    fn amounts_keep_native_float_display() {
        assert_eq!(format_amount(total_amount(500.0, LessonDuration::OneHour)), "₹500");
        assert_eq!(format_amount(total_amount(333.0, LessonDuration::NinetyMinutes)), "₹499.5");
    }
}
