use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
#[cfg(test)]
use mockall::automock;

use crate::error::Rows;
use crate::goal::GoalWithEntries;
use crate::time_entry::{Project, TimeEntry};
use crate::window::AggregationWindow;

/// タイムエントリーを取得するためのストア。
///
/// 0件の場合は`Rows::Empty`を返し、それ以外の失敗は`Err`で返す。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// 開始時刻が`window`に含まれるユーザーのタイムエントリーを返す。
    async fn entries_for_user_in_window(
        &self,
        user_id: i64,
        window: &AggregationWindow,
    ) -> Result<Rows<TimeEntry>>;

    /// 開始時刻が`window`に含まれるプロジェクトのタイムエントリーを返す。
    async fn entries_for_project_in_window(
        &self,
        user_id: i64,
        project_id: i64,
        window: &AggregationWindow,
    ) -> Result<Rows<TimeEntry>>;

    /// ゴール期間`[window_start, window_end]`に日付単位で掛かるプロジェクトのタイムエントリーを返す。
    async fn entries_for_goal_window(
        &self,
        user_id: i64,
        project_id: i64,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Rows<TimeEntry>>;
}

/// プロジェクトを取得するためのストア。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// ユーザーのプロジェクトを登録順に返す。
    async fn projects_for_user(&self, user_id: i64) -> Result<Rows<Project>>;
}

/// ゴールを取得するためのストア。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GoalStore: Send + Sync {
    /// プロジェクトのゴールを、期間に掛かるタイムエントリーを添えて返す。
    async fn goals_for_project(
        &self,
        user_id: i64,
        project_id: i64,
    ) -> Result<Rows<GoalWithEntries>>;
}
