use serde::{Deserialize, Serialize};

/// Coarse classification of a backend HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    RateLimited,
    Unavailable,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorCode::Validation,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            429 => ErrorCode::RateLimited,
            502..=504 => ErrorCode::Unavailable,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether the stored identity should be discarded and the user sent back
    /// to the login screen.
    pub fn requires_reauth(self) -> bool {
        matches!(self, ErrorCode::Unauthorized | ErrorCode::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_auth_statuses_to_reauth() {
        assert!(ErrorCode::from_status(401).requires_reauth());
        assert!(ErrorCode::from_status(403).requires_reauth());
        assert!(!ErrorCode::from_status(409).requires_reauth());
        assert_eq!(ErrorCode::from_status(503), ErrorCode::Unavailable);
    }
}
