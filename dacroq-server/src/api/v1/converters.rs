use crate::api::error::DacroqApiError;
use crate::database;
use dacroq_model::api_v1::*;
use dacroq_model::sat::SatResultSummary;
use dacroq_model::tests::IdentitySnapshot;
use std::convert::TryFrom;
use std::net::IpAddr;

pub fn user_summary(user: database::User, test_count: i64) -> UserSummary {
    UserSummary {
        id: user.id,
        role: user.role(),
        name: user.name,
        email: user.email,
        enabled: user.enabled,
        created: user.created,
        last_online: user.last_online,
        test_count,
    }
}

impl From<database::Session> for SessionSummary {
    fn from(session: database::Session) -> Self {
        Self {
            id: session.id,
            created: session.created,
            last_used: session.last_used,
            last_ip: bincode::deserialize::<IpAddr>(&session.last_ip)
                .ok()
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "".to_string()),
            user_agent: session.user_agent,
        }
    }
}

impl TryFrom<database::Test> for TestSummary {
    type Error = DacroqApiError;

    fn try_from(test: database::Test) -> Result<Self, Self::Error> {
        Ok(Self {
            id: test.id,
            name: test.name,
            chip_type: serde_plain::from_str(&test.chip_type)?,
            status: serde_plain::from_str(&test.status)?,
            created: test.created,
            completed: test.completed,
            results: test.results,
            created_by: serde_json::from_value::<IdentitySnapshot>(test.creator)?,
        })
    }
}

impl TryFrom<database::Post> for PostSummary {
    type Error = DacroqApiError;

    fn try_from(post: database::Post) -> Result<Self, Self::Error> {
        Ok(Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author: serde_json::from_value(post.author)?,
            created: post.created,
            views: post.views,
            reply_count: post.reply_count,
            pinned: post.pinned,
            answered: post.answered,
        })
    }
}

impl TryFrom<database::Reply> for ReplySummary {
    type Error = DacroqApiError;

    fn try_from(reply: database::Reply) -> Result<Self, Self::Error> {
        Ok(Self {
            id: reply.id,
            post_id: reply.post_id,
            content: reply.content,
            author: serde_json::from_value(reply.author)?,
            created: reply.created,
        })
    }
}

pub fn notification_summary(
    notification: database::Notification,
    user_id: i32,
) -> Result<NotificationSummary, DacroqApiError> {
    Ok(NotificationSummary {
        id: notification.id,
        read: notification.read_by(user_id),
        kind: serde_plain::from_str(&notification.kind)?,
        title: notification.title,
        message: notification.message,
        global: notification.global,
        recipients: notification.recipients,
        created: notification.created,
    })
}

impl From<database::SystemFlag> for SystemFlagSummary {
    fn from(flag: database::SystemFlag) -> Self {
        Self {
            name: flag.name,
            enabled: flag.enabled,
            message: flag.message,
            updated: flag.updated,
        }
    }
}

impl From<database::Doc> for DocSummary {
    fn from(doc: database::Doc) -> Self {
        Self {
            section_id: doc.section_id,
            title: doc.title,
            content: doc.content,
            updated: doc.updated,
        }
    }
}

impl From<database::FeedbackEntry> for FeedbackSummary {
    fn from(entry: database::FeedbackEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind,
            description: entry.description,
            email: entry.email,
            status: entry.status,
            created: entry.created,
        }
    }
}

impl From<database::SatResult> for SatResultSummary {
    fn from(result: database::SatResult) -> Self {
        Self {
            id: result.id,
            batch_id: result.batch_id,
            problem_id: result.problem_id,
            source: result.source,
            variables: result.variables,
            clauses: result.clauses,
            solver: result.solver,
            solved: result.solved,
            satisfiable: result.satisfiable,
            time_ms: result.time_ms,
            energy_nj: result.energy_nj,
            created: result.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dacroq_model::tests::{ChipType, Role, TestStatus};
    use serde_json::json;

    #[test]
    fn stored_test_converts_to_summary() {
        let test = database::Test {
            id: 9,
            name: "ldpc sweep".into(),
            chip_type: "LDPC".into(),
            status: "running".into(),
            created: Utc::now(),
            completed: None,
            results: None,
            created_by: Some(2),
            creator: json!({"uid": 2, "name": "Ada", "email": "ada@example.com", "role": "moderator"}),
        };
        let summary = TestSummary::try_from(test).unwrap();
        assert_eq!(summary.chip_type, ChipType::Ldpc);
        assert_eq!(summary.status, TestStatus::Running);
        assert_eq!(summary.created_by.role, Role::Moderator);
        assert!(summary.created_by.avatar.is_none());
    }

    #[test]
    fn unknown_stored_status_is_an_error() {
        let test = database::Test {
            id: 9,
            name: "bad".into(),
            chip_type: "3SAT".into(),
            status: "paused".into(),
            created: Utc::now(),
            completed: None,
            results: None,
            created_by: None,
            creator: json!({}),
        };
        assert!(TestSummary::try_from(test).is_err());
    }
}
