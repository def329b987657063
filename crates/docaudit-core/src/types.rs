//! Domain types shared across the DocAudit crates

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A named byte blob uploaded by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name, including its extension
    pub name: String,
    /// Raw payload
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Extension of the file name including the leading dot, e.g. `.docx`.
    ///
    /// Returns an empty string when the name has no extension.
    pub fn suffix(&self) -> String {
        file_suffix(&self.name)
    }
}

/// Extension of `name` including the leading dot, or an empty string.
pub fn file_suffix(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user
    User,
    /// Message from the assistant
    Assistant,
}

/// A single message sent to or received from the inference endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

/// Ordered message list, oldest first
pub type Conversation = Vec<ConversationMessage>;

/// Status code attached to every audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    #[serde(rename = "100")]
    Starting,
    #[serde(rename = "200")]
    Interim,
    #[serde(rename = "500")]
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Starting => "100",
            AuditStatus::Interim => "200",
            AuditStatus::Error => "500",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One incremental result emitted by the audit flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub status: AuditStatus,
    pub ai_response: String,
}

impl AuditEvent {
    pub fn starting(provider: &str) -> Self {
        Self {
            status: AuditStatus::Starting,
            ai_response: format!("{} starting", provider),
        }
    }

    pub fn result(response: impl Into<String>) -> Self {
        Self {
            status: AuditStatus::Interim,
            ai_response: response.into(),
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            status: AuditStatus::Error,
            ai_response: format!("Internal server error: {}", message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == AuditStatus::Error
    }
}

/// Identity yielded by the authentication collaborator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Outcome of request authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Verified(Identity),
    Failed(String),
}

impl AuthOutcome {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthOutcome::Verified(identity) => Some(identity),
            AuthOutcome::Failed(_) => None,
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Question about a set of previously uploaded files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub sent: NaiveDateTime,
    pub userid: String,
    /// Comma-separated file names
    pub file_names: String,
    pub user_input: String,
    pub template_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub received: NaiveDateTime,
    pub status: String,
    pub ai_response: String,
}

impl QueryResponse {
    pub fn ok(ai_response: impl Into<String>) -> Self {
        Self {
            received: now(),
            status: "200".to_string(),
            ai_response: ai_response.into(),
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            received: now(),
            status: "500".to_string(),
            ai_response: format!("Internal server error: {}", message),
        }
    }
}

/// Presigned upload target for a new user file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUpload {
    pub presigned_url: String,
    pub file_key: String,
}

/// Request to audit an uploaded document against the style guides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocAuditRequest {
    #[serde(default = "now")]
    pub sent: NaiveDateTime,
    #[serde(default)]
    pub userid: String,
    /// Comma-separated file names
    #[serde(default)]
    pub file_name: String,
    /// Comma-separated style guide names, empty for the full library
    #[serde(default)]
    pub style_guide_file_names: String,
    #[serde(default)]
    pub template_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocAuditResponse {
    pub received: NaiveDateTime,
    pub status: String,
    pub ai_response: String,
}

impl From<AuditEvent> for DocAuditResponse {
    fn from(event: AuditEvent) -> Self {
        Self {
            received: now(),
            status: event.status.to_string(),
            ai_response: event.ai_response,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub created: NaiveDateTime,
    pub category: String,
    pub feedback: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub received: NaiveDateTime,
    pub status: String,
    pub message: String,
}

impl FeedbackResponse {
    pub fn new(status: &str, message: impl Into<String>) -> Self {
        Self {
            received: now(),
            status: status.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_file_suffix() {
        assert_eq!(UploadedFile::new("report.docx", vec![]).suffix(), ".docx");
        assert_eq!(UploadedFile::new("archive.tar.gz", vec![]).suffix(), ".gz");
        assert_eq!(UploadedFile::new("README", vec![]).suffix(), "");
        assert_eq!(UploadedFile::new("DATA.PDF", vec![]).suffix(), ".PDF");
    }

    #[test]
    fn test_message_serialization() {
        let message = ConversationMessage::user("hello");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }

    #[test]
    fn test_audit_event_constructors() {
        let start = AuditEvent::starting("SCOTi");
        assert_eq!(start.status, AuditStatus::Starting);
        assert_eq!(start.ai_response, "SCOTi starting");

        let error = AuditEvent::error("boom");
        assert!(error.is_error());
        assert_eq!(error.ai_response, "Internal server error: boom");
    }

    #[test]
    fn test_audit_status_wire_format() {
        let event = AuditEvent::result("done");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "200");

        let response = DocAuditResponse::from(AuditEvent::starting("SCOTi"));
        assert_eq!(response.status, "100");
    }

    #[test]
    fn test_doc_audit_request_defaults() {
        let request: DocAuditRequest =
            serde_json::from_str(r#"{"userid": "u1", "file_name": "a.docx"}"#).unwrap();
        assert_eq!(request.userid, "u1");
        assert!(request.style_guide_file_names.is_empty());
    }

    #[test]
    fn test_query_request_parses_naive_timestamp() {
        let request: QueryRequest = serde_json::from_str(
            r#"{"sent": "2022-01-01T00:00:00", "userid": "u1", "file_names": "a.txt,b.txt",
                "user_input": "what is the meaning of life", "template_name": "doc_analyst"}"#,
        )
        .unwrap();
        assert_eq!(request.file_names, "a.txt,b.txt");
    }
}
