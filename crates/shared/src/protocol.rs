//! JSON bodies exchanged with the WeCare REST backend.
//!
//! Field names follow the backend's camelCase wire format. Non-trivial
//! operations answer with an envelope `{ "success": bool, "message"?: string,
//! ...payload }`; list endpoints answer with a bare array.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    BackgroundCheckId, CaregiverId, DependentId, Role, SessionId, SessionStatus, TransportId,
    UserId,
};

/// The part of every envelope that is present regardless of outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeHead {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload for envelope responses that carry nothing beyond the head.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyPayload {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: UserId,
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone1: String,
    pub phone2: String,
    pub house_number: String,
    pub street_name: String,
    pub postal_code: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDependentRequest {
    pub child_name: String,
    pub child_surname: String,
    pub child_age: u8,
    pub parent_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentSummary {
    #[serde(rename = "childId")]
    pub id: DependentId,
    #[serde(rename = "childName")]
    pub first_name: String,
    #[serde(rename = "childSurname", default)]
    pub surname: String,
    #[serde(rename = "childAge", default)]
    pub age: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaregiverSummary {
    #[serde(rename = "nannyId")]
    pub id: CaregiverId,
    #[serde(rename = "nannyName")]
    pub first_name: String,
    #[serde(rename = "nannySurname", default)]
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSummary {
    #[serde(rename = "driverId")]
    pub id: TransportId,
    #[serde(rename = "driverName")]
    pub first_name: String,
    #[serde(rename = "driverSurname", default)]
    pub surname: String,
}

/// Body of `POST /child-sitting-session/book`.
///
/// `client_token` is also sent as the `Idempotency-Key` header so the backend
/// can collapse retries of the same validated draft into one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSessionRequest {
    pub parent_id: UserId,
    pub child_ids: Vec<DependentId>,
    pub session_date: NaiveDate,
    pub session_start_time: NaiveTime,
    pub session_end_time: NaiveTime,
    pub nanny_id: CaregiverId,
    pub driver_id: Option<TransportId>,
    pub payment_amount: f64,
    pub client_token: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSessionResponse {
    pub session_id: SessionId,
    #[serde(default, alias = "caregiverName")]
    pub nanny_name: Option<String>,
    #[serde(default, alias = "transportName")]
    pub driver_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "sessionId", alias = "id")]
    pub id: SessionId,
    #[serde(rename = "sessionDate", alias = "date")]
    pub date: NaiveDate,
    #[serde(rename = "sessionStartTime", alias = "startTime", default)]
    pub start_time: Option<NaiveTime>,
    #[serde(rename = "sessionEndTime", alias = "endTime", default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundCheckResponse {
    pub background_check_id: BackgroundCheckId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploadResponse {
    #[serde(default)]
    pub document_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_request_uses_backend_field_names() {
        let request = BookSessionRequest {
            parent_id: UserId(3),
            child_ids: vec![DependentId(1), DependentId(2)],
            session_date: NaiveDate::from_ymd_opt(2025, 10, 24).expect("date"),
            session_start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
            session_end_time: NaiveTime::from_hms_opt(11, 30, 0).expect("time"),
            nanny_id: CaregiverId(5),
            driver_id: None,
            payment_amount: 150.0,
            client_token: Uuid::nil(),
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["parentId"], 3);
        assert_eq!(value["childIds"], serde_json::json!([1, 2]));
        assert_eq!(value["sessionDate"], "2025-10-24");
        assert_eq!(value["sessionStartTime"], "09:00:00");
        assert_eq!(value["nannyId"], 5);
        assert!(value["driverId"].is_null());
    }

    #[test]
    fn session_record_accepts_short_field_names() {
        let record: SessionRecord = serde_json::from_value(serde_json::json!({
            "id": 9,
            "date": "2025-05-12",
            "status": "scheduled"
        }))
        .expect("deserialize");
        assert_eq!(record.id, SessionId(9));
        assert_eq!(record.status, SessionStatus::Upcoming);
        assert!(record.participants.is_empty());
    }
}
