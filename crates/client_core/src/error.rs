use std::fmt;

use thiserror::Error;

/// A booking form field, used to point the view at the input that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Dependents,
    Date,
    StartTime,
    EndTime,
    Caregiver,
    PaymentAmount,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Dependents => "dependents",
            Field::Date => "date",
            Field::StartTime => "start time",
            Field::EndTime => "end time",
            Field::Caregiver => "caregiver",
            Field::PaymentAmount => "payment amount",
        };
        f.write_str(name)
    }
}

/// User-correctable booking validation failure. Reported inline and never
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("no dependent selected")]
    NoDependentSelected,
    #[error("no session date selected")]
    MissingDate,
    #[error("no start time selected")]
    MissingStartTime,
    #[error("no end time selected")]
    MissingEndTime,
    #[error("end time before start")]
    EndNotAfterStart,
    #[error("no caregiver selected")]
    NoCaregiverSelected,
    #[error("payment amount must be greater than zero")]
    InvalidPaymentAmount,
    #[error("session date is in the past")]
    DateInPast,
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::NoDependentSelected => Field::Dependents,
            FieldError::MissingDate | FieldError::DateInPast => Field::Date,
            FieldError::MissingStartTime => Field::StartTime,
            FieldError::MissingEndTime | FieldError::EndNotAfterStart => Field::EndTime,
            FieldError::NoCaregiverSelected => Field::Caregiver,
            FieldError::InvalidPaymentAmount => Field::PaymentAmount,
        }
    }
}

/// Validation failure on the account, dependent and payment forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("please enter email and password")]
    MissingCredentials,
    #[error("please enter first and last name")]
    MissingName,
    #[error("please fill in all child details")]
    MissingDependentDetails,
    #[error("please enter a valid age (1-18)")]
    DependentAgeOutOfRange,
    #[error("please fill all payment details")]
    MissingPaymentDetails,
    #[error("please enter a valid 16-digit card number")]
    InvalidCardNumber,
    #[error("please use MM/YY format")]
    InvalidExpiry,
    #[error("please enter a valid CVV code")]
    InvalidCvv,
    #[error("no file selected for document upload")]
    EmptyDocument,
    #[error("please upload all required documents before submitting. {uploaded}/{required} documents uploaded")]
    IncompleteDocuments { uploaded: usize, required: usize },
}

/// Failure of a booking submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("could not reach the booking service: {reason}")]
    Network { reason: String },
    #[error("booking request timed out")]
    Timeout,
    #[error("{message}")]
    Rejected { message: String },
    #[error("session expired; please log in again")]
    SessionExpired,
}

impl SubmissionError {
    /// Network and timeout failures may be retried with the same draft and
    /// idempotency token. Rejections need the user to change something first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmissionError::Network { .. } | SubmissionError::Timeout
        )
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, SubmissionError::SessionExpired)
    }
}

/// Failure of a booking controller action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("booking was rejected; edit it before submitting again")]
    NotRetryable,
}

/// Failure of any non-booking backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("could not connect to server: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("{message}")]
    Rejected { message: String },
    #[error("session expired; please log in again")]
    SessionExpired,
    #[error("server returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error(transparent)]
    Form(#[from] FormError),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Timeout => true,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(SubmissionError::Timeout.is_retryable());
        assert!(SubmissionError::Network {
            reason: "connection refused".into()
        }
        .is_retryable());
        assert!(!SubmissionError::Rejected {
            message: "nanny already booked".into()
        }
        .is_retryable());
        assert!(!SubmissionError::SessionExpired.is_retryable());
    }

    #[test]
    fn rejected_message_is_surfaced_verbatim() {
        let err = SubmissionError::Rejected {
            message: "Nanny is already booked for this slot".into(),
        };
        assert_eq!(err.to_string(), "Nanny is already booked for this slot");
    }

    #[test]
    fn field_errors_name_their_field() {
        assert_eq!(FieldError::EndNotAfterStart.field(), Field::EndTime);
        assert_eq!(FieldError::DateInPast.field(), Field::Date);
        assert_eq!(FieldError::NoDependentSelected.to_string(), "no dependent selected");
    }
}
