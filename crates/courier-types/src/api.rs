use serde::{Deserialize, Serialize};

use crate::models::{
    Message, MessageDetail, ReadReceipt, ReceivedMessage, SentMessage, UserDetail, UserSummary,
};

// -- JWT Claims --

/// Claims carried by a session token. Canonical definition shared by the
/// issuer and anything that inspects tokens. There is no `exp`: sessions do
/// not expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub iat: i64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentMessagesResponse {
    pub messages: Vec<SentMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceivedMessagesResponse {
    pub messages: Vec<ReceivedMessage>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub to_username: String,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedMessageResponse {
    pub message: Message,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageDetailResponse {
    pub message: MessageDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadReceiptResponse {
    pub message: ReadReceipt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_rejects_unknown_fields() {
        let body = r#"{"username":"a","password":"b","first_name":"c","last_name":"d","phone":"e","admin":true}"#;
        assert!(serde_json::from_str::<RegisterRequest>(body).is_err());
    }

    #[test]
    fn read_receipt_nests_under_message() {
        let resp = ReadReceiptResponse {
            message: ReadReceipt {
                id: 7,
                read_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
            },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["message"]["id"], 7);
        assert!(json["message"]["read_at"].is_string());
    }
}
