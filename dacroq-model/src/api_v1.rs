use crate::tests::{ChipType, IdentitySnapshot, Role, TestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "validator")]
use validator::Validate;

const DEFAULT_LIMIT: u32 = 50;

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub enabled: bool,
    pub created: DateTime<Utc>,
    pub last_online: Option<DateTime<Utc>>,
    pub test_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: i32,
    pub created: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub last_ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub session: SessionSummary,
    pub token: String,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListUsersRequest {
    #[cfg_attr(feature = "validator", validate(range(min = 1, max = 100)))]
    pub limit: u32,
    pub offset: u32,
    pub search: Option<String>,
}

impl Default for ListUsersRequest {
    fn default() -> Self {
        ListUsersRequest {
            limit: DEFAULT_LIMIT,
            offset: 0,
            search: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub items: Vec<UserSummary>,
    pub total: i64,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub name: String,
    #[cfg_attr(feature = "validator", validate(email))]
    pub email: String,
    #[cfg_attr(feature = "validator", validate(length(min = 8, max = 255)))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub name: Option<String>,
    #[cfg_attr(feature = "validator", validate(email))]
    pub email: Option<String>,
    #[cfg_attr(feature = "validator", validate(length(min = 8, max = 255)))]
    pub password: Option<String>,
    /// Admin only.
    pub role: Option<Role>,
    /// Admin only.
    pub enabled: Option<bool>,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListTestsRequest {
    #[cfg_attr(feature = "validator", validate(range(min = 1, max = 100)))]
    pub limit: u32,
    pub offset: u32,
    pub status: Option<TestStatus>,
    pub chip_type: Option<ChipType>,
}

impl Default for ListTestsRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            status: None,
            chip_type: None,
        }
    }
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTestRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub name: String,
    pub chip_type: ChipType,
    /// Free-form results blob, usually filled in once the run completes.
    pub results: Option<serde_json::Value>,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTestRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub name: Option<String>,
    pub status: Option<TestStatus>,
    pub results: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: i32,
    pub name: String,
    pub chip_type: ChipType,
    pub status: TestStatus,
    pub created: DateTime<Utc>,
    pub completed: Option<DateTime<Utc>>,
    pub results: Option<serde_json::Value>,
    pub created_by: IdentitySnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTestsResponse {
    pub items: Vec<TestSummary>,
    pub total: i64,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListPostsRequest {
    #[cfg_attr(feature = "validator", validate(range(min = 1, max = 100)))]
    pub limit: u32,
    pub offset: u32,
}

impl Default for ListPostsRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub title: String,
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 20000)))]
    pub content: String,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub title: Option<String>,
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 20000)))]
    pub content: Option<String>,
    pub answered: Option<bool>,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinPostRequest {
    pub pinned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author: IdentitySnapshot,
    pub created: DateTime<Utc>,
    pub views: i32,
    pub reply_count: i32,
    pub pinned: bool,
    pub answered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPostsResponse {
    pub items: Vec<PostSummary>,
    pub total: i64,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReplyRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 20000)))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplySummary {
    pub id: i32,
    pub post_id: i32,
    pub content: String,
    pub author: IdentitySnapshot,
    pub created: DateTime<Utc>,
}

#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    System,
    Alert,
    Update,
    Info,
}

impl Default for NotificationKind {
    fn default() -> Self {
        Self::Info
    }
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub title: String,
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 5000)))]
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
    /// Explicit recipients. Omitted or empty means every user.
    #[serde(default)]
    pub recipients: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub global: bool,
    pub recipients: Vec<i32>,
    /// Whether the requesting user has read it.
    pub read: bool,
    pub created: DateTime<Utc>,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSystemFlagRequest {
    pub enabled: bool,
    #[cfg_attr(feature = "validator", validate(length(max = 1000)))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemFlagSummary {
    pub name: String,
    pub enabled: bool,
    pub message: Option<String>,
    pub updated: DateTime<Utc>,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutDocRequest {
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 255)))]
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSummary {
    pub section_id: String,
    pub title: String,
    pub content: String,
    pub updated: DateTime<Utc>,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFeedbackRequest {
    #[serde(rename = "type")]
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 64)))]
    pub kind: String,
    #[cfg_attr(feature = "validator", validate(length(min = 1, max = 10000)))]
    pub description: String,
    #[cfg_attr(feature = "validator", validate(email))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub email: Option<String>,
    pub status: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSample {
    pub time: DateTime<Utc>,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub online: bool,
    pub checked: Option<DateTime<Utc>>,
    pub detail: Option<serde_json::Value>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub health: HealthSnapshot,
    pub metrics: Vec<MetricSample>,
    pub metrics_error: Option<String>,
}

#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Tests,
    Users,
    Posts,
    Notifications,
    System,
    Docs,
    SatResults,
}

#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChangeEvent {
    /// Position in the server's change sequence, increasing by one per event.
    pub seq: u64,
    pub collection: Collection,
    /// Record key, numeric ids are rendered as strings.
    pub id: String,
    pub kind: ChangeKind,
    pub time: DateTime<Utc>,
}

#[cfg_attr(feature = "validator", derive(Validate))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitChangesRequest {
    pub collection: Option<Collection>,
    /// Cursor from the previous response. Retained events after it are
    /// returned immediately.
    pub since: Option<u64>,
    #[serde(default = "default_wait_timeout")]
    #[cfg_attr(feature = "validator", validate(range(min = 1, max = 60)))]
    pub timeout_secs: u64,
}

fn default_wait_timeout() -> u64 {
    25
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitChangesResponse {
    pub events: Vec<ChangeEvent>,
    /// Pass back as `since` to resume after these events.
    pub cursor: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_requests_fill_defaults() {
        let req: ListTestsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.limit, DEFAULT_LIMIT);
        assert_eq!(req.offset, 0);
        assert!(req.status.is_none());
    }

    #[test]
    fn feedback_type_field_name() {
        let req: SubmitFeedbackRequest =
            serde_json::from_str(r#"{"type": "bug", "description": "broken"}"#).unwrap();
        assert_eq!(req.kind, "bug");
        assert!(req.email.is_none());
    }

    #[test]
    fn notification_recipients_default_to_global() {
        let req: CreateNotificationRequest =
            serde_json::from_str(r#"{"title": "t", "message": "m"}"#).unwrap();
        assert!(req.recipients.is_empty());
        assert_eq!(req.kind, NotificationKind::Info);
    }

    #[test]
    fn wait_request_cursor_is_optional() {
        let req: WaitChangesRequest = serde_json::from_str(r#"{"collection": null}"#).unwrap();
        assert!(req.since.is_none());
        assert_eq!(req.timeout_secs, 25);
        let req: WaitChangesRequest = serde_json::from_str(r#"{"since": 41}"#).unwrap();
        assert_eq!(req.since, Some(41));
    }

    #[cfg(feature = "validator")]
    #[test]
    fn create_user_rejects_short_password() {
        let req = CreateUserRequest {
            name: "Grace".into(),
            email: "grace@example.com".into(),
            password: "short".into(),
            role: Role::User,
        };
        assert!(req.validate().is_err());
    }
}
