//! Booking workflow: draft validation, confirmation, submission and the
//! per-attempt state machine that ties them together.
//!
//! ```text
//! Editing -> Validating -> ValidationFailed -> Editing
//!                       -> Confirming -> Cancelled -> Editing
//!                                     -> Submitting -> Submitted
//!                                                   -> SubmissionFailed -> Editing
//!                                                                       -> Submitting (retry)
//! ```
//!
//! `Validating` and `Cancelled` are instantaneous and never observable through
//! [`BookingController::state`].

use std::{collections::BTreeSet, fmt, sync::Arc};

use chrono::{Local, NaiveDate, NaiveTime};
use shared::{
    domain::{CaregiverId, DependentId, SessionId, TransportId, UserId},
    protocol::BookSessionRequest,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::{ClientError, ControllerError, FieldError, SubmissionError},
    reference::{ReferenceData, UNKNOWN_NAME},
    session::SessionContext,
    BookingBackend,
};

pub const NO_TRANSPORT: &str = "No transport";

/// Largest accepted amount in cents. Keeps [`Amount::as_major`] exact.
const MAX_CENTS: u64 = u32::MAX as u64;

/// Money in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u64);

impl Amount {
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> u64 {
        self.0
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parses user input such as `100`, `99.5` or `99.50`. More than two
    /// decimal places, signs, separators and amounts above 42 949 672.95 are
    /// rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (whole, frac) = match raw.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (raw, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };
        whole
            .checked_mul(100)?
            .checked_add(frac)
            .filter(|cents| *cents <= MAX_CENTS)
            .map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// In-progress booking form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub guardian_id: UserId,
    pub dependent_ids: BTreeSet<DependentId>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub caregiver_id: Option<CaregiverId>,
    pub transport_id: Option<TransportId>,
    /// Raw text from the amount input.
    pub payment_amount: String,
}

impl BookingDraft {
    pub fn new(guardian_id: UserId) -> Self {
        Self {
            guardian_id,
            dependent_ids: BTreeSet::new(),
            date: None,
            start_time: None,
            end_time: None,
            caregiver_id: None,
            transport_id: None,
            payment_amount: String::new(),
        }
    }

    pub fn toggle_dependent(&mut self, id: DependentId) {
        if !self.dependent_ids.remove(&id) {
            self.dependent_ids.insert(id);
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::new(self.guardian_id)
    }
}

/// A draft that passed validation, ready to be confirmed and submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub guardian_id: UserId,
    pub dependent_ids: Vec<DependentId>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub caregiver_id: CaregiverId,
    pub transport_id: Option<TransportId>,
    pub amount: Amount,
    token: Uuid,
}

impl ValidDraft {
    /// Client-generated key sent with every submission of this draft.
    pub fn idempotency_token(&self) -> Uuid {
        self.token
    }

    /// Whether both drafts describe the same booking, ignoring the token.
    pub fn same_booking(&self, other: &ValidDraft) -> bool {
        self.guardian_id == other.guardian_id
            && self.dependent_ids == other.dependent_ids
            && self.date == other.date
            && self.start_time == other.start_time
            && self.end_time == other.end_time
            && self.caregiver_id == other.caregiver_id
            && self.transport_id == other.transport_id
            && self.amount == other.amount
    }

    pub fn to_request(&self) -> BookSessionRequest {
        BookSessionRequest {
            parent_id: self.guardian_id,
            child_ids: self.dependent_ids.clone(),
            session_date: self.date,
            session_start_time: self.start_time,
            session_end_time: self.end_time,
            nanny_id: self.caregiver_id,
            driver_id: self.transport_id,
            payment_amount: self.amount.as_major(),
            client_token: self.token,
        }
    }
}

pub fn validate(draft: &BookingDraft) -> Result<ValidDraft, FieldError> {
    validate_on(draft, Local::now().date_naive())
}

/// Fail-fast validation against an explicit "today".
pub fn validate_on(draft: &BookingDraft, today: NaiveDate) -> Result<ValidDraft, FieldError> {
    if draft.dependent_ids.is_empty() {
        return Err(FieldError::NoDependentSelected);
    }
    let date = draft.date.ok_or(FieldError::MissingDate)?;
    let start_time = draft.start_time.ok_or(FieldError::MissingStartTime)?;
    let end_time = draft.end_time.ok_or(FieldError::MissingEndTime)?;
    if end_time <= start_time {
        return Err(FieldError::EndNotAfterStart);
    }
    let caregiver_id = draft.caregiver_id.ok_or(FieldError::NoCaregiverSelected)?;
    let amount = Amount::parse(&draft.payment_amount)
        .filter(|amount| amount.cents() > 0)
        .ok_or(FieldError::InvalidPaymentAmount)?;
    if date < today {
        return Err(FieldError::DateInPast);
    }

    Ok(ValidDraft {
        guardian_id: draft.guardian_id,
        dependent_ids: draft.dependent_ids.iter().copied().collect(),
        date,
        start_time,
        end_time,
        caregiver_id,
        transport_id: draft.transport_id,
        amount,
        token: Uuid::new_v4(),
    })
}

/// Read-only view of a validated draft shown for confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationSnapshot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub dependent_names: Vec<String>,
    pub caregiver_name: String,
    pub transport_name: Option<String>,
    pub amount: Amount,
}

impl ConfirmationSnapshot {
    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }

    pub fn dependents_line(&self) -> String {
        self.dependent_names.join(", ")
    }

    pub fn transport_line(&self) -> &str {
        self.transport_name.as_deref().unwrap_or(NO_TRANSPORT)
    }
}

pub fn build_confirmation(valid: &ValidDraft, reference: &ReferenceData) -> ConfirmationSnapshot {
    ConfirmationSnapshot {
        date: valid.date,
        start_time: valid.start_time,
        end_time: valid.end_time,
        dependent_names: valid
            .dependent_ids
            .iter()
            .map(|id| reference.dependent_name(*id))
            .collect(),
        caregiver_name: reference.caregiver_name(valid.caregiver_id),
        transport_name: valid.transport_id.map(|id| reference.transport_name(id)),
        amount: valid.amount,
    }
}

/// Where the view goes after a successful booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextView {
    SessionList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub session_id: SessionId,
    pub caregiver_name: String,
    pub transport_name: Option<String>,
    pub next_view: NextView,
}

/// Sends a validated draft to the booking endpoint as a single request.
pub async fn submit(
    backend: &dyn BookingBackend,
    draft: &ValidDraft,
) -> Result<BookingConfirmation, SubmissionError> {
    let request = draft.to_request();
    let response = backend.book_session(&request).await?;
    Ok(BookingConfirmation {
        session_id: response.session_id,
        caregiver_name: response
            .nanny_name
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        transport_name: response.driver_name,
        next_view: NextView::SessionList,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingState {
    Editing,
    ValidationFailed(FieldError),
    Confirming(ConfirmationSnapshot),
    Submitting,
    SubmissionFailed(SubmissionError),
    Submitted(BookingConfirmation),
}

impl BookingState {
    pub fn name(&self) -> &'static str {
        match self {
            BookingState::Editing => "editing",
            BookingState::ValidationFailed(_) => "validation failed",
            BookingState::Confirming(_) => "confirming",
            BookingState::Submitting => "submitting",
            BookingState::SubmissionFailed(_) => "submission failed",
            BookingState::Submitted(_) => "submitted",
        }
    }

    fn is_editable(&self) -> bool {
        matches!(
            self,
            BookingState::Editing
                | BookingState::ValidationFailed(_)
                | BookingState::SubmissionFailed(_)
        )
    }
}

/// Drives one booking screen. Owns the draft; nothing else mutates it.
pub struct BookingController {
    backend: Arc<dyn BookingBackend>,
    context: SessionContext,
    reference: ReferenceData,
    draft: BookingDraft,
    pending: Option<ValidDraft>,
    snapshot: Option<ConfirmationSnapshot>,
    state: BookingState,
    today: Option<NaiveDate>,
}

impl BookingController {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        context: SessionContext,
        reference: ReferenceData,
    ) -> Self {
        let draft = BookingDraft::new(context.user_id);
        Self {
            backend,
            context,
            reference,
            draft,
            pending: None,
            snapshot: None,
            state: BookingState::Editing,
            today: None,
        }
    }

    /// Loads reference lists and opens a controller with an empty draft.
    pub async fn open(
        backend: Arc<dyn BookingBackend>,
        context: SessionContext,
    ) -> Result<Self, ClientError> {
        let reference = ReferenceData::load(backend.as_ref(), &context).await?;
        Ok(Self::new(backend, context, reference))
    }

    /// Pins the date used for the not-in-the-past check.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Mutable access to the draft. Leaves any failure or confirmation state
    /// and returns to `Editing`.
    pub fn edit(&mut self) -> Result<&mut BookingDraft, ControllerError> {
        match self.state {
            BookingState::Submitting | BookingState::Submitted(_) => {
                return Err(self.invalid("edit the draft"));
            }
            BookingState::Confirming(_) => {
                self.snapshot = None;
            }
            _ => {}
        }
        self.state = BookingState::Editing;
        Ok(&mut self.draft)
    }

    /// Validates the draft and, on success, moves to `Confirming`.
    pub fn request_confirmation(&mut self) -> Result<ConfirmationSnapshot, ControllerError> {
        if !self.state.is_editable() {
            return Err(self.invalid("request confirmation"));
        }

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let mut valid = match validate_on(&self.draft, today) {
            Ok(valid) => valid,
            Err(err) => {
                debug!(field = %err.field(), error = %err, "booking: validation failed");
                self.state = BookingState::ValidationFailed(err.clone());
                return Err(err.into());
            }
        };

        // Same booking as an earlier attempt keeps the earlier token so the
        // backend can recognise a resend.
        if let Some(previous) = &self.pending {
            if previous.same_booking(&valid) {
                valid.token = previous.token;
            }
        }

        let snapshot = build_confirmation(&valid, &self.reference);
        self.pending = Some(valid);
        self.snapshot = Some(snapshot.clone());
        self.state = BookingState::Confirming(snapshot.clone());
        Ok(snapshot)
    }

    /// Dismisses the confirmation without submitting.
    pub fn cancel(&mut self) -> Result<(), ControllerError> {
        if !matches!(self.state, BookingState::Confirming(_)) {
            return Err(self.invalid("cancel confirmation"));
        }
        self.snapshot = None;
        self.state = BookingState::Editing;
        Ok(())
    }

    pub async fn confirm(&mut self) -> Result<BookingConfirmation, ControllerError> {
        if !matches!(self.state, BookingState::Confirming(_)) {
            return Err(self.invalid("confirm"));
        }
        self.run_submission().await
    }

    /// Resends the last submitted draft after a retryable failure.
    pub async fn retry(&mut self) -> Result<BookingConfirmation, ControllerError> {
        match &self.state {
            BookingState::SubmissionFailed(err) if err.is_retryable() => {}
            BookingState::SubmissionFailed(_) => return Err(ControllerError::NotRetryable),
            _ => return Err(self.invalid("retry")),
        }
        self.run_submission().await
    }

    /// Starts a fresh draft after a completed booking.
    pub fn start_new(&mut self) -> Result<(), ControllerError> {
        if !matches!(self.state, BookingState::Submitted(_)) {
            return Err(self.invalid("start a new booking"));
        }
        self.state = BookingState::Editing;
        Ok(())
    }

    async fn run_submission(&mut self) -> Result<BookingConfirmation, ControllerError> {
        let Some(valid) = self.pending.clone() else {
            return Err(self.invalid("submit"));
        };
        info!(
            guardian_id = valid.guardian_id.0,
            dependents = valid.dependent_ids.len(),
            caregiver_id = valid.caregiver_id.0,
            token = %valid.token,
            "booking: submitting"
        );

        let outcome = {
            let mut in_flight = InFlight::begin(&mut self.state);
            let outcome = submit(self.backend.as_ref(), &valid).await;
            in_flight.finish();
            outcome
        };

        match outcome {
            Ok(mut confirmation) => {
                if let Some(snapshot) = self.snapshot.take() {
                    if confirmation.caregiver_name == UNKNOWN_NAME {
                        confirmation.caregiver_name = snapshot.caregiver_name;
                    }
                    if confirmation.transport_name.is_none() {
                        confirmation.transport_name = snapshot.transport_name;
                    }
                }
                info!(
                    session_id = confirmation.session_id.0,
                    token = %valid.token,
                    "booking: submitted"
                );
                self.draft = BookingDraft::new(self.context.user_id);
                self.pending = None;
                self.state = BookingState::Submitted(confirmation.clone());
                Ok(confirmation)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    retryable = err.is_retryable(),
                    token = %valid.token,
                    "booking: submission failed"
                );
                self.state = BookingState::SubmissionFailed(err.clone());
                Err(err.into())
            }
        }
    }

    fn invalid(&self, action: &'static str) -> ControllerError {
        ControllerError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

/// Holds the controller in `Submitting` while a request is in flight. If the
/// submitting future is dropped before a response arrives, the attempt is
/// recorded as a retryable failure so the pending draft and its token stay
/// usable.
struct InFlight<'a> {
    state: &'a mut BookingState,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a mut BookingState) -> Self {
        *state = BookingState::Submitting;
        Self {
            state,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("booking: submission abandoned before a response arrived");
        *self.state = BookingState::SubmissionFailed(SubmissionError::Network {
            reason: "submission was interrupted before a response arrived".into(),
        });
    }
}

#[cfg(test)]
#[path = "tests/booking_tests.rs"]
mod tests;
