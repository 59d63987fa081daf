use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "task_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    DailyPost,
}

impl TaskType {
    pub fn to_str(&self) -> &str {
        match self {
            TaskType::DailyPost => "daily_post",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Revoked,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct TaskCompletion {
    pub id: Uuid,
    pub wallet_address: String,
    pub task_type: TaskType,
    pub points_awarded: i64,
    pub completion_date: NaiveDate,
    pub metadata: Option<serde_json::Value>,
    pub status: TaskStatus,

    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,

    #[serde(rename = "revokedAt")]
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Outcome of reading a completion's metadata. Malformed payloads are an
/// explicit case so sweeps can count them instead of silently skipping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMetadata {
    None,
    Tweet(String),
    Malformed,
}

#[derive(Debug, Deserialize)]
struct TweetMetadata {
    tweet_url: String,
}

impl TaskCompletion {
    pub fn parsed_metadata(&self) -> TaskMetadata {
        match &self.metadata {
            None => TaskMetadata::None,
            Some(value) => match serde_json::from_value::<TweetMetadata>(value.clone()) {
                Ok(meta) => TaskMetadata::Tweet(meta.tweet_url),
                Err(_) => TaskMetadata::Malformed,
            },
        }
    }

    pub fn tweet_metadata(url: &str) -> serde_json::Value {
        serde_json::json!({ "tweet_url": url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn completion(metadata: Option<serde_json::Value>) -> TaskCompletion {
        TaskCompletion {
            id: Uuid::new_v4(),
            wallet_address: "0xabc".to_string(),
            task_type: TaskType::DailyPost,
            points_awarded: 100,
            completion_date: Utc::now().date_naive(),
            metadata,
            status: TaskStatus::Active,
            completed_at: Utc::now(),
            revoked_at: None,
        }
    }

    #[test]
    fn metadata_roundtrip() {
        let row = completion(Some(TaskCompletion::tweet_metadata(
            "https://x.com/a/status/1",
        )));
        assert_eq!(
            row.parsed_metadata(),
            TaskMetadata::Tweet("https://x.com/a/status/1".to_string())
        );
    }

    #[test]
    fn missing_metadata_is_none() {
        assert_eq!(completion(None).parsed_metadata(), TaskMetadata::None);
    }

    #[test]
    fn malformed_metadata_is_explicit() {
        let row = completion(Some(serde_json::json!({ "tweet": 42 })));
        assert_eq!(row.parsed_metadata(), TaskMetadata::Malformed);
    }
}
