use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::Rows;
use crate::goal::{Goal, GoalWithEntries};
use crate::interval::{overlaps_goal_window, starts_within};
use crate::store::{EntryStore, GoalStore, ProjectStore};
use crate::time_entry::{Project, TimeEntry};
use crate::window::AggregationWindow;

/// Time Tracker APIのタイムエントリーをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ApiEntry {
    id: i64,
    project_id: i64,
    #[serde(default)]
    name: String,
    time_start: DateTime<Utc>,
    time_end: DateTime<Utc>,
}

/// Time Tracker APIのプロジェクト情報をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ApiProject {
    id: i64,
    name: String,
}

/// Time Tracker APIのゴールをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ApiGoal {
    id: i64,
    project_id: i64,
    user_id: i64,
    time_seconds: i64,
    name: String,
    date_start: DateTime<Utc>,
    date_end: DateTime<Utc>,
}

/// Time Tracker APIと通信するためのクライアント。
///
/// APIはエントリーを期間で絞り込めないため、全件を取得してからクライアント側で絞り込む。
///
/// # Examples
///
/// ```
/// let client = TrackerClient::new("http://localhost:8080", None);
/// let projects = client.projects_for_user(1).await.unwrap();
/// ```
pub struct TrackerClient {
    client: Client,
    api_url: String,
    api_token: Option<String>,
}

impl TrackerClient {
    /// 新しい`TrackerClient`を返す。
    ///
    /// # Arguments
    ///
    /// * `api_url` - APIのベースURL
    /// * `api_token` - 設定されている場合はBasic認証に利用する
    pub fn new(api_url: &str, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    /// GETリクエストを送り、JSONの配列を取得する。
    ///
    /// 404は行が存在しないものとして`Rows::Empty`を返す。
    async fn get_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Rows<T>> {
        let url = format!("{}{}", self.api_url, path);
        let mut request = self.client.get(&url).header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.api_token {
            request = request.basic_auth(token, Some("api_token"));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to Time Tracker API at {}", url))?;
        if response.status() == StatusCode::NOT_FOUND {
            info!("No rows at {}", url);
            return Ok(Rows::Empty);
        }

        let rows = response
            .error_for_status()
            .context("Request returned an error status")?
            .json::<Vec<T>>()
            .await
            .context("Failed to deserialize response")?;
        info!("length of rows at {}: {}", url, rows.len());

        Ok(Rows::from_vec(rows))
    }

    /// ユーザーの全タイムエントリーを取得する。
    async fn read_entries(&self, user_id: i64) -> Result<Vec<TimeEntry>> {
        let entries = self
            .get_rows::<ApiEntry>("/me/entries")
            .await
            .context("Failed to get entries from Time Tracker API")?
            .into_vec()
            .into_iter()
            .map(|entry| TimeEntry {
                id: entry.id,
                user_id,
                project_id: entry.project_id,
                name: entry.name,
                start: entry.time_start,
                end: entry.time_end,
            })
            .collect();

        Ok(entries)
    }
}

#[async_trait]
impl EntryStore for TrackerClient {
    async fn entries_for_user_in_window(
        &self,
        user_id: i64,
        window: &AggregationWindow,
    ) -> Result<Rows<TimeEntry>> {
        let entries = self
            .read_entries(user_id)
            .await?
            .into_iter()
            .filter(|entry| starts_within(&entry.span(), &window.span()))
            .collect();

        Ok(Rows::from_vec(entries))
    }

    async fn entries_for_project_in_window(
        &self,
        user_id: i64,
        project_id: i64,
        window: &AggregationWindow,
    ) -> Result<Rows<TimeEntry>> {
        let entries = self
            .read_entries(user_id)
            .await?
            .into_iter()
            .filter(|entry| entry.project_id == project_id)
            .filter(|entry| starts_within(&entry.span(), &window.span()))
            .collect();

        Ok(Rows::from_vec(entries))
    }

    async fn entries_for_goal_window(
        &self,
        user_id: i64,
        project_id: i64,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Rows<TimeEntry>> {
        let entries = self
            .read_entries(user_id)
            .await?
            .into_iter()
            .filter(|entry| entry.project_id == project_id)
            .filter(|entry| overlaps_goal_window(&entry.span(), window_start, window_end))
            .collect();

        Ok(Rows::from_vec(entries))
    }
}

#[async_trait]
impl ProjectStore for TrackerClient {
    async fn projects_for_user(&self, user_id: i64) -> Result<Rows<Project>> {
        let projects = self
            .get_rows::<ApiProject>("/me/projects")
            .await
            .context("Failed to get project list from Time Tracker API")?
            .into_vec()
            .into_iter()
            .map(|project| Project {
                id: project.id,
                user_id,
                name: project.name,
            })
            .collect();

        Ok(Rows::from_vec(projects))
    }
}

#[async_trait]
impl GoalStore for TrackerClient {
    async fn goals_for_project(
        &self,
        user_id: i64,
        project_id: i64,
    ) -> Result<Rows<GoalWithEntries>> {
        let goals = self
            .get_rows::<ApiGoal>(&format!("/me/projects/{}/goals", project_id))
            .await
            .context("Failed to get goals from Time Tracker API")?
            .into_vec();
        if goals.is_empty() {
            return Ok(Rows::Empty);
        }

        let entries: Vec<TimeEntry> = self
            .read_entries(user_id)
            .await?
            .into_iter()
            .filter(|entry| entry.project_id == project_id)
            .collect();

        let mut goals: Vec<GoalWithEntries> = goals
            .into_iter()
            .map(|goal| {
                let goal = Goal {
                    id: goal.id,
                    project_id: goal.project_id,
                    user_id: goal.user_id,
                    name: goal.name,
                    target_seconds: goal.time_seconds,
                    window_start: goal.date_start.date_naive(),
                    window_end: goal.date_end.date_naive(),
                };
                let spans = entries
                    .iter()
                    .map(TimeEntry::span)
                    .filter(|span| overlaps_goal_window(span, goal.window_start, goal.window_end))
                    .collect();
                GoalWithEntries {
                    goal,
                    entries: spans,
                }
            })
            .collect();
        goals.sort_by_key(|goal| goal.goal.window_start);

        Ok(Rows::from_vec(goals))
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::TrackerClient;
    use crate::error::Rows;
    use crate::store::{EntryStore, GoalStore, ProjectStore};
    use crate::window::AggregationWindow;

    const ENTRIES_BODY: &str = r#"[
        {"id": 1, "project_id": 1, "project_name": "work", "name": "task1",
         "time_start": "2024-03-01T09:00:00Z", "time_end": "2024-03-01T10:00:00Z"},
        {"id": 2, "project_id": 2, "project_name": "hobby", "name": "",
         "time_start": "2024-03-02T09:00:00Z", "time_end": "2024-03-02T09:30:00Z"},
        {"id": 3, "project_id": 1, "project_name": "work", "name": "task2",
         "time_start": "2024-03-10T12:00:00+03:00", "time_end": "2024-03-10T13:00:00+03:00"}
    ]"#;

    fn expected_auth() -> String {
        format!("Basic {}", STANDARD.encode("secret:api_token"))
    }

    /// Basic認証のヘッダーを付けてプロジェクト一覧を取得することを確認する。
    #[tokio::test]
    async fn test_projects_for_user() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/me/projects")
            .match_header("authorization", expected_auth().as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "name": "work"}, {"id": 2, "name": "hobby"}]"#)
            .create_async()
            .await;

        let client = TrackerClient::new(&server.url(), Some("secret".to_string()));
        let projects = client.projects_for_user(7).await.unwrap().into_vec();

        mock.assert_async().await;
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].name, "hobby");
        assert_eq!(projects[1].user_id, 7);
    }

    #[tokio::test]
    async fn test_projects_for_user_not_found_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/projects")
            .with_status(404)
            .create_async()
            .await;

        let client = TrackerClient::new(&server.url(), None);
        let projects = client.projects_for_user(1).await.unwrap();

        assert_eq!(projects, Rows::Empty);
    }

    #[tokio::test]
    async fn test_projects_for_user_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/projects")
            .with_status(500)
            .create_async()
            .await;

        let client = TrackerClient::new(&server.url(), None);
        let result = client.projects_for_user(1).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_entries_for_project_in_window() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/entries")
            .with_status(200)
            .with_body(ENTRIES_BODY)
            .create_async()
            .await;
        let window = AggregationWindow::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let client = TrackerClient::new(&server.url(), None);
        let entries = client
            .entries_for_project_in_window(1, 1, &window)
            .await
            .unwrap()
            .into_vec();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "task1");
    }

    #[tokio::test]
    async fn test_entries_for_user_in_window_none_match() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/entries")
            .with_status(200)
            .with_body(ENTRIES_BODY)
            .create_async()
            .await;
        let window = AggregationWindow::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let client = TrackerClient::new(&server.url(), None);
        let entries = client.entries_for_user_in_window(1, &window).await.unwrap();

        assert_eq!(entries, Rows::Empty);
    }

    /// ゴール期間は日付単位で判定し、他のプロジェクトのエントリーは含めない。
    #[tokio::test]
    async fn test_entries_for_goal_window() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/me/entries")
            .match_header("authorization", expected_auth().as_str())
            .with_status(200)
            .with_body(ENTRIES_BODY)
            .expect(2)
            .create_async()
            .await;

        let client = TrackerClient::new(&server.url(), Some("secret".to_string()));
        let entries = client
            .entries_for_goal_window(
                1,
                1,
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            )
            .await
            .unwrap()
            .into_vec();
        let none = client
            .entries_for_goal_window(
                1,
                2,
                NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "task2");
        assert_eq!(
            entries[0].start,
            Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
        );
        assert_eq!(none, Rows::Empty);
    }

    /// ゴールには期間に掛かるエントリーだけが添えられ、期間の開始日順に並ぶ。
    #[tokio::test]
    async fn test_goals_for_project() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/projects/1/goals")
            .with_status(200)
            .with_body(
                r#"[
                {"id": 2, "project_id": 1, "user_id": 1, "time_seconds": 7200, "name": "march",
                 "date_start": "2024-03-05T00:00:00Z", "date_end": "2024-03-31T00:00:00Z",
                 "duration_seconds": 0, "percent": 0},
                {"id": 1, "project_id": 1, "user_id": 1, "time_seconds": 3600, "name": "first day",
                 "date_start": "2024-03-01T00:00:00Z", "date_end": "2024-03-01T00:00:00Z",
                 "duration_seconds": 0, "percent": 0}
            ]"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/me/entries")
            .with_status(200)
            .with_body(ENTRIES_BODY)
            .create_async()
            .await;

        let client = TrackerClient::new(&server.url(), None);
        let goals = client.goals_for_project(1, 1).await.unwrap().into_vec();

        assert_eq!(goals.len(), 2);
        assert_eq!(goals[0].goal.id, 1);
        assert_eq!(goals[0].goal.window_end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(goals[0].entries.len(), 1);
        assert_eq!(goals[1].goal.target_seconds, 7200);
        assert_eq!(goals[1].entries.len(), 1);
    }

    /// ゴールが1つもない場合はエントリーを取得しない。
    #[tokio::test]
    async fn test_goals_for_project_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/projects/1/goals")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let entries = server
            .mock("GET", "/me/entries")
            .expect(0)
            .create_async()
            .await;

        let client = TrackerClient::new(&server.url(), None);
        let goals = client.goals_for_project(1, 1).await.unwrap();

        entries.assert_async().await;
        assert_eq!(goals, Rows::Empty);
    }
}
