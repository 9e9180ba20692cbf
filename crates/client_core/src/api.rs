//! HTTP client for the WeCare REST backend.

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{BackgroundCheckId, Role, SessionId, SessionTransition, UserId},
    error::ErrorCode,
    protocol::{
        BackgroundCheckResponse, BookSessionRequest, BookSessionResponse, CaregiverSummary,
        DependentSummary, DocumentUploadResponse, EmptyPayload, EnvelopeHead, LoginResponse,
        SessionRecord, TransportSummary,
    },
};
use tracing::{info, warn};

use crate::{
    config::ClientSettings,
    documents::DocumentUpload,
    error::{ClientError, SubmissionError},
    forms::{LoginForm, NewDependentForm, RegistrationForm},
    session::SessionContext,
    BookingBackend,
};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Outcome of a backend call before it is mapped onto the error type of the
/// calling operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Failure {
    Network(String),
    Timeout,
    Unauthorized,
    Rejected(String),
    Status { status: u16, message: String },
    Decode(String),
}

impl From<Failure> for ClientError {
    fn from(value: Failure) -> Self {
        match value {
            Failure::Network(reason) => ClientError::Network(reason),
            Failure::Timeout => ClientError::Timeout,
            Failure::Unauthorized => ClientError::SessionExpired,
            Failure::Rejected(message) => ClientError::Rejected { message },
            Failure::Status { status, message } => ClientError::Http { status, message },
            Failure::Decode(reason) => ClientError::Decode(reason),
        }
    }
}

impl From<Failure> for SubmissionError {
    fn from(value: Failure) -> Self {
        match value {
            Failure::Network(reason) => SubmissionError::Network { reason },
            Failure::Timeout => SubmissionError::Timeout,
            Failure::Unauthorized => SubmissionError::SessionExpired,
            Failure::Rejected(message) => SubmissionError::Rejected { message },
            // No parsed success flag: the server never ruled on the booking,
            // so the same draft may be sent again.
            Failure::Status { status, message } => SubmissionError::Network {
                reason: format!("HTTP {status}: {message}"),
            },
            Failure::Decode(reason) => SubmissionError::Network {
                reason: format!("malformed response: {reason}"),
            },
        }
    }
}

fn transport_failure(err: reqwest::Error) -> Failure {
    if err.is_timeout() {
        Failure::Timeout
    } else {
        Failure::Network(err.to_string())
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn is_auth_failure(status: u16) -> bool {
    ErrorCode::from_status(status).requires_reauth()
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push('…');
    out
}

/// Decodes a `{ success, message?, ...payload }` response.
pub(crate) fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, Failure> {
    if is_auth_failure(status) {
        return Err(Failure::Unauthorized);
    }

    let value = serde_json::from_str::<Value>(body).ok();
    let head = value
        .as_ref()
        .and_then(|v| serde_json::from_value::<EnvelopeHead>(v.clone()).ok())
        .unwrap_or_default();

    if !is_success(status) {
        return match head.success {
            Some(false) => Err(Failure::Rejected(
                head.message
                    .unwrap_or_else(|| "request was not accepted".to_string()),
            )),
            _ => Err(Failure::Status {
                status,
                message: truncate_body(body),
            }),
        };
    }

    let Some(value) = value else {
        return Err(Failure::Decode(format!(
            "expected JSON body, got '{}'",
            truncate_body(body)
        )));
    };
    match head.success {
        Some(true) => serde_json::from_value(value).map_err(|e| Failure::Decode(e.to_string())),
        Some(false) => Err(Failure::Rejected(
            head.message
                .unwrap_or_else(|| "request was not accepted".to_string()),
        )),
        None => Err(Failure::Decode("response missing success flag".to_string())),
    }
}

/// Decodes a bare JSON array. A non-array body yields an empty list, matching
/// how the listing screens treat unexpected shapes.
pub(crate) fn decode_list<T: DeserializeOwned>(status: u16, body: &str) -> Result<Vec<T>, Failure> {
    if is_auth_failure(status) {
        return Err(Failure::Unauthorized);
    }
    let value = serde_json::from_str::<Value>(body).ok();
    if !is_success(status) {
        let head = value
            .and_then(|v| serde_json::from_value::<EnvelopeHead>(v).ok())
            .unwrap_or_default();
        return match head.success {
            Some(false) => Err(Failure::Rejected(
                head.message.unwrap_or_else(|| "request failed".to_string()),
            )),
            _ => Err(Failure::Status {
                status,
                message: truncate_body(body),
            }),
        };
    }
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| Failure::Decode(e.to_string())))
            .collect(),
        Some(other) => {
            warn!(kind = json_kind(&other), "api: expected a JSON array, treating as empty");
            Ok(Vec::new())
        }
        None => Err(Failure::Decode(format!(
            "expected JSON array, got '{}'",
            truncate_body(body)
        ))),
    }
}

/// Decodes a plain JSON object that is not wrapped in an envelope.
pub(crate) fn decode_plain<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, Failure> {
    if is_auth_failure(status) {
        return Err(Failure::Unauthorized);
    }
    if !is_success(status) {
        return Err(Failure::Status {
            status,
            message: truncate_body(body),
        });
    }
    serde_json::from_str(body).map_err(|e| Failure::Decode(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(u16, String), Failure> {
        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_failure)?;
        Ok((status, body))
    }

    pub async fn login(&self, form: &LoginForm) -> Result<SessionContext, ClientError> {
        let request = form.validate()?;
        let (status, body) = self
            .execute(self.http.post(self.url("/auth/login")).json(&request))
            .await?;
        let response: LoginResponse = decode_envelope(status, &body)?;
        let context = SessionContext::from(response);
        info!(
            user_id = context.user_id.0,
            role = %context.role,
            "auth: logged in"
        );
        Ok(context)
    }

    pub async fn register(&self, form: &RegistrationForm) -> Result<(), ClientError> {
        let request = form.validate()?;
        let (status, body) = self
            .execute(self.http.post(self.url("/auth/register")).json(&request))
            .await?;
        decode_envelope::<EmptyPayload>(status, &body)?;
        info!(role = %request.role, "auth: registered account");
        Ok(())
    }

    pub async fn create_dependent(
        &self,
        context: &SessionContext,
        form: &NewDependentForm,
    ) -> Result<DependentSummary, ClientError> {
        require_role(context, Role::Parent)?;
        let request = form.validate(context.user_id)?;
        let (status, body) = self
            .execute(
                self.http
                    .post(self.url("/child/create"))
                    .query(&[("parentId", context.user_id.0)])
                    .json(&request),
            )
            .await?;
        let created: DependentSummary = decode_plain(status, &body)?;
        info!(
            guardian_id = context.user_id.0,
            dependent_id = created.id.0,
            "dependents: created"
        );
        Ok(created)
    }

    /// Sessions relevant to the signed-in user: booked sessions for a guardian,
    /// assigned sessions for a caregiver, assigned trips for transport.
    pub async fn list_sessions(
        &self,
        context: &SessionContext,
    ) -> Result<Vec<SessionRecord>, ClientError> {
        let path = match context.role {
            Role::Parent => format!("/child-sitting-session/parent/{}", context.user_id),
            Role::Nanny => format!("/nanny/sessions/{}", context.user_id),
            Role::Driver => format!("/driver/trips/{}", context.user_id),
        };
        let (status, body) = self.execute(self.http.get(self.url(&path))).await?;
        Ok(decode_list(status, &body)?)
    }

    pub async fn transition_session(
        &self,
        context: &SessionContext,
        session_id: SessionId,
        transition: SessionTransition,
    ) -> Result<(), ClientError> {
        let path = format!(
            "/child-sitting-session/{}/{}",
            session_id,
            transition.path_segment()
        );
        let (status, body) = self
            .execute(
                self.http
                    .post(self.url(&path))
                    .query(&[("userId", context.user_id.0)]),
            )
            .await?;
        decode_envelope::<EmptyPayload>(status, &body)?;
        info!(
            session_id = session_id.0,
            transition = transition.path_segment(),
            "sessions: transition accepted"
        );
        Ok(())
    }

    pub async fn background_check(
        &self,
        context: &SessionContext,
    ) -> Result<BackgroundCheckId, ClientError> {
        let (status, body) = self
            .execute(
                self.http
                    .post(self.url("/documents/get-or-create-background-check"))
                    .query(&[("userId", context.user_id.0)]),
            )
            .await?;
        let response: BackgroundCheckResponse = decode_envelope(status, &body)?;
        Ok(response.background_check_id)
    }

    pub async fn upload_document(
        &self,
        context: &SessionContext,
        background_check: BackgroundCheckId,
        upload: &DocumentUpload,
    ) -> Result<DocumentUploadResponse, ClientError> {
        let part = multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.mime_type())
            .map_err(|e| ClientError::Decode(format!("invalid mime type: {e}")))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("documentType", upload.kind.label().to_string())
            .text("backgroundCheckId", background_check.to_string())
            .text("uploadedBy", context.user_id.to_string());

        let (status, body) = self
            .execute(self.http.post(self.url("/documents/upload")).multipart(form))
            .await?;
        let response: DocumentUploadResponse = decode_envelope(status, &body)?;
        info!(
            background_check_id = background_check.0,
            document_type = upload.kind.label(),
            size_bytes = upload.bytes.len(),
            "documents: uploaded"
        );
        Ok(response)
    }
}

fn require_role(context: &SessionContext, role: Role) -> Result<(), ClientError> {
    if context.role != role {
        return Err(ClientError::Rejected {
            message: format!("this action requires a {role} account"),
        });
    }
    Ok(())
}

#[async_trait]
impl BookingBackend for BackendClient {
    async fn list_dependents(
        &self,
        guardian: UserId,
    ) -> Result<Vec<DependentSummary>, ClientError> {
        let (status, body) = self
            .execute(self.http.get(self.url(&format!("/child/parent/{guardian}"))))
            .await?;
        Ok(decode_list(status, &body)?)
    }

    async fn list_caregivers(&self) -> Result<Vec<CaregiverSummary>, ClientError> {
        let (status, body) = self.execute(self.http.get(self.url("/nanny/all"))).await?;
        Ok(decode_list(status, &body)?)
    }

    async fn list_transport(&self) -> Result<Vec<TransportSummary>, ClientError> {
        let (status, body) = self.execute(self.http.get(self.url("/driver/all"))).await?;
        Ok(decode_list(status, &body)?)
    }

    async fn book_session(
        &self,
        request: &BookSessionRequest,
    ) -> Result<BookSessionResponse, SubmissionError> {
        let (status, body) = self
            .execute(
                self.http
                    .post(self.url("/child-sitting-session/book"))
                    .header(IDEMPOTENCY_HEADER, request.client_token.to_string())
                    .json(request),
            )
            .await?;
        Ok(decode_envelope(status, &body)?)
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
