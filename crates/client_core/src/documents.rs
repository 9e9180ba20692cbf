//! Background-check document submission.

use shared::domain::BackgroundCheckId;
use tracing::info;

use crate::{
    api::BackendClient,
    error::{ClientError, FormError},
    session::SessionContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Reference,
    PoliceClearance,
    DriverTest,
    DriversLicense,
}

impl DocumentKind {
    pub const REQUIRED: [DocumentKind; 4] = [
        DocumentKind::Reference,
        DocumentKind::PoliceClearance,
        DocumentKind::DriverTest,
        DocumentKind::DriversLicense,
    ];

    /// Value of the `documentType` form field.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Reference => "Reference",
            DocumentKind::PoliceClearance => "Police Clearance",
            DocumentKind::DriverTest => "Driver Test",
            DocumentKind::DriversLicense => "Drivers License",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "reference" => Some(DocumentKind::Reference),
            "policeclearance" => Some(DocumentKind::PoliceClearance),
            "drivertest" => Some(DocumentKind::DriverTest),
            "driverslicense" | "driverslicence" => Some(DocumentKind::DriversLicense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub kind: DocumentKind,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(kind: DocumentKind, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_raw()
            .map(str::to_string);
        Self {
            kind,
            file_name,
            mime_type,
            bytes,
        }
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or("application/pdf")
    }
}

/// Checks that every required document is present and non-empty.
pub fn check_complete(uploads: &[DocumentUpload]) -> Result<(), FormError> {
    if uploads.iter().any(|u| u.bytes.is_empty()) {
        return Err(FormError::EmptyDocument);
    }
    let uploaded = DocumentKind::REQUIRED
        .iter()
        .filter(|kind| uploads.iter().any(|u| u.kind == **kind))
        .count();
    if uploaded < DocumentKind::REQUIRED.len() {
        return Err(FormError::IncompleteDocuments {
            uploaded,
            required: DocumentKind::REQUIRED.len(),
        });
    }
    Ok(())
}

/// Uploads a complete document set against the user's background check,
/// creating the check on first use. Stops at the first failed upload.
pub async fn submit_background_check(
    client: &BackendClient,
    context: &SessionContext,
    uploads: &[DocumentUpload],
) -> Result<BackgroundCheckId, ClientError> {
    check_complete(uploads)?;
    let background_check = client.background_check(context).await?;
    for upload in uploads {
        client
            .upload_document(context, background_check, upload)
            .await?;
    }
    info!(
        background_check_id = background_check.0,
        documents = uploads.len(),
        "documents: background check submitted for review"
    );
    Ok(background_check)
}
