//! services/portal/src/cli.rs
//!
//! The terminal front-end: command parsing, screens rendered as text, and the
//! interactive booking wizard. Every screen goes through the role guard first.

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use padho_likho_core::booking::{format_amount, DraftEdit, Stage, SubmitOutcome, WizardEvent};
use padho_likho_core::domain::{
    LessonDuration, ProfileUpdate, Registration, Role, Teacher, UnknownRole,
};
use padho_likho_core::guard::{RoleGuard, RouteAuthorization, LOGIN_PATH};
use padho_likho_core::ports::{BookingService, Clock, PortError, TeacherCatalog};
use padho_likho_core::session::{Session, Validation};
use padho_likho_core::BookingFlow;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::PortalError;

//=========================================================================================
// Commands
//=========================================================================================

const PORTAL_AFTER_HELP: &str = "\
Environment:
  PADHO_API_BASE_URL          Backend root (default http://localhost:5000)
  PADHO_CREDENTIAL_PATH       Where the sign-in token is kept
  PADHO_REQUEST_TIMEOUT_SECS  Backend request timeout
  PADHO_BOOKING_BACKEND       remote | local
  RUST_LOG                    Log level";

#[derive(Debug, Parser)]
#[command(name = "portal")]
#[command(about = "Padho Likho: find a teacher and book a lesson")]
#[command(arg_required_else_help = true)]
#[command(after_help = PORTAL_AFTER_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Sign in, then open your dashboard or the page given by --next.
    Login {
        email: String,
        password: String,
        #[arg(long)]
        next: Option<String>,
    },
    /// Create an account.
    Register {
        name: String,
        email: String,
        password: String,
        #[arg(value_parser = parse_role)]
        role: Role,
        phone: Option<String>,
    },
    Logout,
    #[command(name = "whoami")]
    WhoAmI,
    /// Open a page through the role guard.
    Visit { path: String },
    /// List teachers, optionally filtered by subject.
    Teachers { subject: Option<String> },
    /// Book a lesson interactively.
    Book { teacher_id: String },
    ForgotPassword { email: String },
    ResetPassword {
        reset_token: String,
        new_password: String,
    },
    /// Update your profile; omitted fields stay as they are.
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
}

fn parse_role(value: &str) -> Result<Role, UnknownRole> {
    value.parse()
}

//=========================================================================================
// Console
//=========================================================================================

/// What the viewer typed at a prompt.
#[derive(Debug, Clone, PartialEq)]
enum Answer {
    Value(String),
    Back,
    Quit,
}

/// Line-oriented terminal I/O, cancelled with the rest of the app.
pub struct Console<R, W> {
    input: R,
    output: W,
    cancel: CancellationToken,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W, cancel: CancellationToken) -> Self {
        Self {
            input,
            output,
            cancel,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub async fn say(&mut self, line: &str) -> std::io::Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// Prompts for one value. An empty answer keeps `current`.
    async fn ask(&mut self, label: &str, current: &str) -> std::io::Result<Answer> {
        let prompt = if current.is_empty() {
            format!("{}: ", label)
        } else {
            format!("{} [{}]: ", label, current)
        };
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        let read = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(Answer::Quit),
            read = self.input.read_line(&mut line) => read?,
        };
        if read == 0 {
            return Ok(Answer::Quit);
        }
        let answer = line.trim();
        Ok(match answer.to_lowercase().as_str() {
            "back" => Answer::Back,
            "quit" => Answer::Quit,
            "" => Answer::Value(current.to_string()),
            _ => Answer::Value(answer.to_string()),
        })
    }
}

//=========================================================================================
// The Portal
//=========================================================================================

/// Everything the screens need, wired once at startup.
pub struct Portal {
    session: Arc<Session>,
    guard: RoleGuard,
    catalog: Arc<dyn TeacherCatalog>,
    bookings: Arc<dyn BookingService>,
    clock: Arc<dyn Clock>,
}

/// How far the viewer got through one wizard stage.
enum StageInput {
    Edits(Vec<DraftEdit>),
    Back,
    Quit,
}

impl Portal {
    pub fn new(
        session: Arc<Session>,
        guard: RoleGuard,
        catalog: Arc<dyn TeacherCatalog>,
        bookings: Arc<dyn BookingService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            guard,
            catalog,
            bookings,
            clock,
        }
    }

    pub async fn run<R, W>(
        &self,
        command: Command,
        console: &mut Console<R, W>,
        cancel: &CancellationToken,
    ) -> Result<(), PortalError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        debug!("Running {:?}", command);
        match command {
            Command::Login {
                email,
                password,
                next,
            } => {
                let viewer = self.session.login(&email, &password).await?;
                console
                    .say(&format!("Welcome back, {}!", viewer.display_name))
                    .await?;
                let destination = next.unwrap_or_else(|| viewer.role.home_path().to_string());
                self.visit(&destination, console, cancel).await?;
            }
            Command::Register {
                name,
                email,
                password,
                role,
                phone,
            } => {
                let registration = Registration {
                    name,
                    email,
                    password,
                    role,
                    phone,
                };
                let viewer = self.session.register(&registration).await?;
                console
                    .say(&format!(
                        "Account created for {} ({})",
                        viewer.display_name, viewer.role
                    ))
                    .await?;
                self.visit(viewer.role.home_path(), console, cancel).await?;
            }
            Command::Logout => {
                self.session.logout().await;
                console.say("Signed out.").await?;
            }
            Command::WhoAmI => {
                let viewer = match self.session.validate(cancel).await {
                    Validation::Confirmed(viewer) => Some(viewer),
                    Validation::Superseded => self.session.viewer().await,
                    Validation::Rejected | Validation::NoCredential => None,
                    Validation::Cancelled => {
                        console.say("Cancelled.").await?;
                        return Ok(());
                    }
                };
                match viewer {
                    Some(viewer) => {
                        let email = viewer.email.unwrap_or_default();
                        console
                            .say(&format!("{} <{}> ({})", viewer.display_name, email, viewer.role))
                            .await?
                    }
                    None => console.say("Not signed in.").await?,
                }
            }
            Command::Visit { path } => {
                self.visit(&path, console, cancel).await?;
            }
            Command::Teachers { subject } => {
                let teachers = self.catalog.list_teachers(subject.as_deref()).await?;
                if teachers.is_empty() {
                    console.say("No teachers found.").await?;
                }
                for teacher in teachers {
                    console
                        .say(&format!(
                            "{:>3}  {:<16} {:>6}/hour  {} (classes {})",
                            teacher.id,
                            teacher.name,
                            format_amount(teacher.hourly_rate),
                            teacher.subjects.join(", "),
                            teacher.classes.join(", ")
                        ))
                        .await?;
                }
            }
            Command::Book { teacher_id } => {
                let path = format!("/book/{}", teacher_id);
                if self.visit(&path, console, cancel).await? {
                    let teacher = self.catalog.teacher(&teacher_id).await?;
                    self.book(teacher, console, cancel).await?;
                }
            }
            Command::ForgotPassword { email } => {
                self.session.forgot_password(&email).await?;
                console
                    .say("If that email is registered, a reset link is on its way.")
                    .await?;
            }
            Command::ResetPassword {
                reset_token,
                new_password,
            } => {
                self.session
                    .reset_password(&reset_token, &new_password)
                    .await?;
                console.say("Password updated. Please sign in again.").await?;
            }
            Command::Profile { name, phone, bio } => {
                let update = ProfileUpdate { name, phone, bio };
                match self.session.update_profile(&update).await {
                    Ok(viewer) => {
                        console
                            .say(&format!("Profile saved for {}.", viewer.display_name))
                            .await?
                    }
                    Err(PortError::Unauthorized) => {
                        console.say("Please sign in to edit your profile.").await?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    /// Runs the guard for `path`. Returns whether the screen may render.
    async fn visit<R, W>(
        &self,
        path: &str,
        console: &mut Console<R, W>,
        cancel: &CancellationToken,
    ) -> Result<bool, PortalError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if self.guard.evaluate(path).await == RouteAuthorization::Pending {
            console.say("Loading...").await?;
        }
        let Some(outcome) = self.guard.resolve(path, cancel).await else {
            console.say("Cancelled.").await?;
            return Ok(false);
        };

        match outcome.authorization {
            RouteAuthorization::Allow => {
                console.say(&format!("Opening {}", path)).await?;
                Ok(true)
            }
            RouteAuthorization::Pending => Ok(false),
            RouteAuthorization::Redirect(redirect) => {
                if redirect.target == LOGIN_PATH {
                    let return_to = redirect.return_to.unwrap_or_default();
                    console
                        .say(&format!(
                            "Please sign in first: portal login <email> <password> --next {}",
                            return_to
                        ))
                        .await?;
                } else {
                    console
                        .say(&format!(
                            "{} is not available to you, redirecting to {}",
                            path, redirect.target
                        ))
                        .await?;
                }
                Ok(false)
            }
        }
    }

    async fn book<R, W>(
        &self,
        teacher: Teacher,
        console: &mut Console<R, W>,
        cancel: &CancellationToken,
    ) -> Result<(), PortalError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        console
            .say(&format!(
                "Booking a lesson with {} at {}/hour. Type 'back' or 'quit' at any prompt.",
                teacher.name,
                format_amount(teacher.hourly_rate)
            ))
            .await?;
        let mut flow = BookingFlow::new(
            teacher,
            self.bookings.clone(),
            self.session.clone(),
            self.clock.clone(),
        );

        loop {
            let stage = flow.state().stage;
            if stage == Stage::Booked {
                return Ok(());
            }
            console
                .say(&format!("\nStep {} of 4: {}", stage.index() + 1, stage.title()))
                .await?;

            if stage == Stage::ReviewConfirm {
                if !self.review(&mut flow, console, cancel).await? {
                    console.say("Booking abandoned.").await?;
                    return Ok(());
                }
                continue;
            }

            match Self::stage_input(&flow, console).await? {
                StageInput::Quit => {
                    console.say("Booking abandoned.").await?;
                    return Ok(());
                }
                StageInput::Back => {
                    flow.apply(WizardEvent::Back);
                }
                StageInput::Edits(edits) => {
                    for edit in edits {
                        flow.apply(WizardEvent::Edit(edit));
                    }
                    flow.apply(WizardEvent::Next);
                    if let Some(error) = &flow.state().error {
                        console.say(&error.to_string()).await?;
                    }
                }
            }
        }
    }

    /// Asks for the fields of the current input stage.
    async fn stage_input<R, W>(
        flow: &BookingFlow,
        console: &mut Console<R, W>,
    ) -> std::io::Result<StageInput>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let teacher = flow.teacher();
        let draft = flow.state().draft.clone();
        let mut edits = Vec::new();

        macro_rules! answer {
            ($label:expr, $current:expr) => {
                match console.ask($label, $current).await? {
                    Answer::Value(value) => value,
                    Answer::Back => return Ok(StageInput::Back),
                    Answer::Quit => return Ok(StageInput::Quit),
                }
            };
        }

        match flow.state().stage {
            Stage::SelectSubjectClass => {
                console
                    .say(&format!("Subjects: {}", teacher.subjects.join(", ")))
                    .await?;
                edits.push(DraftEdit::Subject(answer!("Subject", &draft.subject)));
                console
                    .say(&format!("Classes: {}", teacher.classes.join(", ")))
                    .await?;
                edits.push(DraftEdit::Class(answer!("Class", &draft.class)));
            }
            Stage::ChooseDateTime => {
                let current_date = draft.date.map(|d| d.to_string()).unwrap_or_default();
                let date = answer!("Date (YYYY-MM-DD)", &current_date);
                match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
                    Ok(date) => edits.push(DraftEdit::Date(Some(date))),
                    // A mistyped date leaves the earlier one in place.
                    Err(_) if !date.is_empty() => {
                        console.say("Dates look like 2026-03-14.").await?
                    }
                    Err(_) => {}
                }
                console
                    .say(&format!("Available: {}", teacher.availability.join(", ")))
                    .await?;
                edits.push(DraftEdit::Time(answer!("Time", &draft.time)));
                let minutes = answer!(
                    "Duration in minutes (60/90/120)",
                    &draft.duration.minutes().to_string()
                );
                match minutes.parse::<u32>().ok().map(LessonDuration::try_from) {
                    Some(Ok(duration)) => edits.push(DraftEdit::Duration(duration)),
                    _ => console.say("Keeping the previous duration.").await?,
                }
            }
            Stage::EnterDetails => {
                edits.push(DraftEdit::Topic(answer!("Topic", &draft.topic)));
                edits.push(DraftEdit::Notes(answer!("Notes (optional)", &draft.notes)));
            }
            Stage::ReviewConfirm | Stage::Booked => {}
        }
        Ok(StageInput::Edits(edits))
    }

    /// The review stage. Returns `false` if the viewer walked away.
    async fn review<R, W>(
        &self,
        flow: &mut BookingFlow,
        console: &mut Console<R, W>,
        cancel: &CancellationToken,
    ) -> Result<bool, PortalError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if let Some(summary) = flow.state().summary(flow.teacher()) {
            console.say(&format!("Teacher: {}", summary.teacher_name)).await?;
            console
                .say(&format!("Subject: {} (Class {})", summary.subject, summary.class))
                .await?;
            console
                .say(&format!(
                    "When:    {} at {} for {} minutes",
                    summary.date,
                    summary.time,
                    summary.duration.minutes()
                ))
                .await?;
            console.say(&format!("Topic:   {}", summary.topic)).await?;
            if !summary.notes.trim().is_empty() {
                console.say(&format!("Notes:   {}", summary.notes)).await?;
            }
            console
                .say(&format!("Total:   {}", format_amount(summary.total_amount)))
                .await?;
        }

        match console.ask("Confirm booking? (yes/back/quit)", "").await? {
            Answer::Quit => return Ok(false),
            Answer::Back => {
                flow.apply(WizardEvent::Back);
                return Ok(true);
            }
            Answer::Value(value) if value.eq_ignore_ascii_case("yes") => {}
            Answer::Value(_) => return Ok(true),
        }

        flow.apply(WizardEvent::Confirm);
        if let Some(error) = &flow.state().error {
            console.say(&error.to_string()).await?;
            return Ok(true);
        }
        if !flow.state().prompt_open {
            return Ok(true);
        }

        match console.ask("Are you sure? (yes/no)", "").await? {
            Answer::Value(value) if value.eq_ignore_ascii_case("yes") => {}
            Answer::Quit => return Ok(false),
            _ => {
                flow.apply(WizardEvent::DismissConfirm);
                return Ok(true);
            }
        }

        console.say("Booking...").await?;
        match flow.accept(cancel).await? {
            SubmitOutcome::Booked(booking) => {
                info!("Booked lesson {}", booking.id);
                console
                    .say(&format!(
                        "Booked! Reference {}. Total {}.",
                        booking.id,
                        format_amount(booking.request.total_amount)
                    ))
                    .await?;
            }
            SubmitOutcome::Failed(message) => {
                console
                    .say(&format!(
                        "Booking failed: {}. Your details are kept; confirm again to retry.",
                        message
                    ))
                    .await?;
            }
            SubmitOutcome::NotSubmitted => {
                if let Some(error) = &flow.state().error {
                    console.say(&error.to_string()).await?;
                }
            }
        }
        Ok(true)
    }
}
