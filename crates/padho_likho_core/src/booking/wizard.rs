//! crates/padho_likho_core/src/booking/wizard.rs
//!
//! The booking wizard as a pure state machine.
//!
//! `transition` takes the current state and one event and returns the next
//! state plus the effects the caller must carry out. It never performs I/O,
//! so every path can be tested without a UI or a backend.

use chrono::NaiveDate;
use tracing::debug;

use crate::booking::total_amount;
use crate::domain::{Booking, BookingDraft, BookingRequest, LessonDuration, Teacher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SelectSubjectClass,
    ChooseDateTime,
    EnterDetails,
    ReviewConfirm,
    Booked,
}

impl Stage {
    pub fn index(self) -> usize {
        match self {
            Stage::SelectSubjectClass => 0,
            Stage::ChooseDateTime => 1,
            Stage::EnterDetails => 2,
            Stage::ReviewConfirm => 3,
            Stage::Booked => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::SelectSubjectClass => "Select subject & class",
            Stage::ChooseDateTime => "Choose date & time",
            Stage::EnterDetails => "Session details",
            Stage::ReviewConfirm => "Review & confirm",
            Stage::Booked => "Booked",
        }
    }

    fn next(self) -> Option<Stage> {
        match self {
            Stage::SelectSubjectClass => Some(Stage::ChooseDateTime),
            Stage::ChooseDateTime => Some(Stage::EnterDetails),
            Stage::EnterDetails => Some(Stage::ReviewConfirm),
            Stage::ReviewConfirm | Stage::Booked => None,
        }
    }

    fn previous(self) -> Option<Stage> {
        match self {
            Stage::ChooseDateTime => Some(Stage::SelectSubjectClass),
            Stage::EnterDetails => Some(Stage::ChooseDateTime),
            Stage::ReviewConfirm => Some(Stage::EnterDetails),
            Stage::SelectSubjectClass | Stage::Booked => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Subject,
    Class,
    Date,
    Time,
    Duration,
    Topic,
    Notes,
}

impl DraftField {
    /// The only stage in which this field can be edited.
    pub fn stage(self) -> Stage {
        match self {
            DraftField::Subject | DraftField::Class => Stage::SelectSubjectClass,
            DraftField::Date | DraftField::Time | DraftField::Duration => Stage::ChooseDateTime,
            DraftField::Topic | DraftField::Notes => Stage::EnterDetails,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DraftField::Subject => "subject",
            DraftField::Class => "class",
            DraftField::Date => "date",
            DraftField::Time => "time",
            DraftField::Duration => "duration",
            DraftField::Topic => "topic",
            DraftField::Notes => "notes",
        }
    }
}

/// A change to exactly one draft field.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Subject(String),
    Class(String),
    Date(Option<NaiveDate>),
    Time(String),
    Duration(LessonDuration),
    Topic(String),
    Notes(String),
}

impl DraftEdit {
    pub fn field(&self) -> DraftField {
        match self {
            DraftEdit::Subject(_) => DraftField::Subject,
            DraftEdit::Class(_) => DraftField::Class,
            DraftEdit::Date(_) => DraftField::Date,
            DraftEdit::Time(_) => DraftField::Time,
            DraftEdit::Duration(_) => DraftField::Duration,
            DraftEdit::Topic(_) => DraftField::Topic,
            DraftEdit::Notes(_) => DraftField::Notes,
        }
    }

    fn apply(self, draft: &mut BookingDraft) {
        match self {
            DraftEdit::Subject(subject) => draft.subject = subject,
            DraftEdit::Class(class) => draft.class = class,
            DraftEdit::Date(date) => draft.date = date,
            DraftEdit::Time(time) => draft.time = time,
            DraftEdit::Duration(duration) => draft.duration = duration,
            DraftEdit::Topic(topic) => draft.topic = topic,
            DraftEdit::Notes(notes) => draft.notes = notes,
        }
    }
}

fn labels(fields: &[DraftField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why `Next` (or confirmation) was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Please fill in: {}", labels(.0))]
    MissingFields(Vec<DraftField>),
    #[error("{0} is not taught by this teacher")]
    SubjectNotOffered(String),
    #[error("Class {0} is not taught by this teacher")]
    ClassNotOffered(String),
    #[error("{0} is in the past, please pick today or a later date")]
    DateInPast(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Submission {
    #[default]
    Idle,
    InProgress,
    /// The last attempt failed; confirming again retries with the same draft.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    Edit(DraftEdit),
    Next,
    Back,
    Confirm,
    DismissConfirm,
    AcceptConfirm,
    SubmissionSucceeded(Booking),
    SubmissionFailed(String),
}

/// Work the caller must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Submit(BookingRequest),
    Acknowledge(Booking),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub stage: Stage,
    pub draft: BookingDraft,
    pub error: Option<DraftError>,
    pub prompt_open: bool,
    pub submission: Submission,
    pub booking: Option<Booking>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            stage: Stage::SelectSubjectClass,
            draft: BookingDraft::default(),
            error: None,
            prompt_open: false,
            submission: Submission::Idle,
            booking: None,
        }
    }
}

impl WizardState {
    pub fn is_submitting(&self) -> bool {
        self.submission == Submission::InProgress
    }

    /// The summary shown on the review stage.
    pub fn summary(&self, teacher: &Teacher) -> Option<ReviewSummary> {
        let date = self.draft.date?;
        Some(ReviewSummary {
            teacher_name: teacher.name.clone(),
            subject: self.draft.subject.clone(),
            class: self.draft.class.clone(),
            date,
            time: self.draft.time.clone(),
            duration: self.draft.duration,
            topic: self.draft.topic.clone(),
            notes: self.draft.notes.clone(),
            total_amount: total_amount(teacher.hourly_rate, self.draft.duration),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub teacher_name: String,
    pub subject: String,
    pub class: String,
    pub date: NaiveDate,
    pub time: String,
    pub duration: LessonDuration,
    pub topic: String,
    pub notes: String,
    pub total_amount: f64,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Checks the required fields of one stage.
pub fn validate_stage(
    teacher: &Teacher,
    draft: &BookingDraft,
    stage: Stage,
    today: NaiveDate,
) -> Result<(), DraftError> {
    match stage {
        Stage::SelectSubjectClass => {
            let mut missing = Vec::new();
            if blank(&draft.subject) {
                missing.push(DraftField::Subject);
            }
            if blank(&draft.class) {
                missing.push(DraftField::Class);
            }
            if !missing.is_empty() {
                return Err(DraftError::MissingFields(missing));
            }
            if !teacher.offers_subject(&draft.subject) {
                return Err(DraftError::SubjectNotOffered(draft.subject.clone()));
            }
            if !teacher.offers_class(&draft.class) {
                return Err(DraftError::ClassNotOffered(draft.class.clone()));
            }
            Ok(())
        }
        Stage::ChooseDateTime => {
            let mut missing = Vec::new();
            if draft.date.is_none() {
                missing.push(DraftField::Date);
            }
            if blank(&draft.time) {
                missing.push(DraftField::Time);
            }
            if !missing.is_empty() {
                return Err(DraftError::MissingFields(missing));
            }
            match draft.date {
                Some(date) if date < today => Err(DraftError::DateInPast(date)),
                _ => Ok(()),
            }
        }
        Stage::EnterDetails if blank(&draft.topic) => {
            Err(DraftError::MissingFields(vec![DraftField::Topic]))
        }
        Stage::EnterDetails | Stage::ReviewConfirm | Stage::Booked => Ok(()),
    }
}

/// Builds the submission payload, re-checking every stage on the way.
pub fn booking_request(
    teacher: &Teacher,
    draft: &BookingDraft,
    today: NaiveDate,
) -> Result<BookingRequest, DraftError> {
    for stage in [Stage::SelectSubjectClass, Stage::ChooseDateTime, Stage::EnterDetails] {
        validate_stage(teacher, draft, stage, today)?;
    }
    let date = draft
        .date
        .ok_or_else(|| DraftError::MissingFields(vec![DraftField::Date]))?;
    let notes = draft.notes.trim();

    Ok(BookingRequest {
        teacher_id: teacher.id.clone(),
        subject: draft.subject.clone(),
        class: draft.class.clone(),
        date,
        time: draft.time.clone(),
        duration_minutes: draft.duration,
        topic: draft.topic.trim().to_string(),
        notes: (!notes.is_empty()).then(|| notes.to_string()),
        total_amount: total_amount(teacher.hourly_rate, draft.duration),
    })
}

/// Advances the wizard by one event.
pub fn transition(
    teacher: &Teacher,
    mut state: WizardState,
    event: WizardEvent,
    today: NaiveDate,
) -> (WizardState, Vec<Effect>) {
    if state.stage == Stage::Booked {
        return (state, Vec::new());
    }

    if state.is_submitting() {
        match event {
            WizardEvent::SubmissionSucceeded(booking) => {
                state.stage = Stage::Booked;
                state.submission = Submission::Idle;
                state.booking = Some(booking.clone());
                return (state, vec![Effect::Acknowledge(booking)]);
            }
            WizardEvent::SubmissionFailed(message) => {
                state.submission = Submission::Failed(message);
            }
            other => debug!("Ignoring {:?} while the booking is being submitted", other),
        }
        return (state, Vec::new());
    }

    match event {
        WizardEvent::Edit(edit) => {
            let field = edit.field();
            if field.stage() == state.stage {
                edit.apply(&mut state.draft);
            } else {
                debug!("Ignoring edit to {} outside its stage", field.label());
            }
        }
        WizardEvent::Next => {
            if let Some(next) = state.stage.next() {
                match validate_stage(teacher, &state.draft, state.stage, today) {
                    Ok(()) => {
                        state.stage = next;
                        state.error = None;
                    }
                    Err(e) => state.error = Some(e),
                }
            }
        }
        WizardEvent::Back => {
            if let Some(previous) = state.stage.previous() {
                state.stage = previous;
                state.error = None;
                state.prompt_open = false;
                state.submission = Submission::Idle;
            }
        }
        WizardEvent::Confirm if state.stage == Stage::ReviewConfirm => {
            match booking_request(teacher, &state.draft, today) {
                Ok(_) => {
                    state.prompt_open = true;
                    state.error = None;
                }
                Err(e) => state.error = Some(e),
            }
        }
        WizardEvent::DismissConfirm => state.prompt_open = false,
        WizardEvent::AcceptConfirm if state.prompt_open => {
            state.prompt_open = false;
            match booking_request(teacher, &state.draft, today) {
                Ok(request) => {
                    state.submission = Submission::InProgress;
                    state.error = None;
                    return (state, vec![Effect::Submit(request)]);
                }
                Err(e) => state.error = Some(e),
            }
        }
        other => debug!("Ignoring {:?} at stage {:?}", other, state.stage),
    }
    (state, Vec::new())
}
