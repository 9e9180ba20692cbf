//! Client-side core of the WeCare childcare booking app: the booking workflow
//! controller, session bucketing, refresh reconciliation and the REST client
//! used by every screen.

use async_trait::async_trait;
use shared::{
    domain::UserId,
    protocol::{
        BookSessionRequest, BookSessionResponse, CaregiverSummary, DependentSummary,
        TransportSummary,
    },
};

pub mod api;
pub mod booking;
pub mod categorize;
pub mod config;
pub mod documents;
pub mod error;
pub mod forms;
pub mod reconcile;
pub mod reference;
pub mod session;

pub use api::BackendClient;
pub use booking::{
    build_confirmation, submit, validate, validate_on, Amount, BookingConfirmation,
    BookingController, BookingDraft, BookingState, ConfirmationSnapshot, NextView, ValidDraft,
};
pub use categorize::{categorize, Bucket, SessionBoard, SessionBuckets};
pub use config::{load_settings, ClientSettings};
pub use error::{ClientError, ControllerError, Field, FieldError, FormError, SubmissionError};
pub use reconcile::{FetchTicket, Latest};
pub use reference::ReferenceData;
pub use session::{LandingView, SessionContext};

/// Backend operations the booking screen depends on.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn list_dependents(&self, guardian: UserId)
        -> Result<Vec<DependentSummary>, ClientError>;
    async fn list_caregivers(&self) -> Result<Vec<CaregiverSummary>, ClientError>;
    async fn list_transport(&self) -> Result<Vec<TransportSummary>, ClientError>;
    /// Creates a session. `request.client_token` identifies retries of the
    /// same draft.
    async fn book_session(
        &self,
        request: &BookSessionRequest,
    ) -> Result<BookSessionResponse, SubmissionError>;
}
