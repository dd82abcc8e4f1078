use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::Span;

/// ユーザーがプロジェクトに費やした時間の記録。作成後は変更しない。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    pub user_id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeEntry {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// ユーザーのプロジェクト。名前はユーザーごとに一意。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}
