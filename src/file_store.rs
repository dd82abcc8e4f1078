use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Rows, TrackerError};
use crate::goal::{Goal, GoalWithEntries};
use crate::interval::{overlaps_goal_window, starts_within};
use crate::store::{EntryStore, GoalStore, ProjectStore};
use crate::time_entry::{Project, TimeEntry};
use crate::window::AggregationWindow;

/// JSONファイルに保存するデータ全体。
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub entries: Vec<TimeEntry>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

/// JSONファイルを読み込んで各ストアとして振る舞う。
///
/// 1回の呼び出しの間はメモリ上のスナップショットだけを参照する。
pub struct FileStore {
    path: PathBuf,
    snapshot: Snapshot,
}

impl FileStore {
    /// 既定のデータファイルのパスを返す。`~/.timetrack/data.json`となる。
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;

        Ok(home.join(".timetrack").join("data.json"))
    }

    /// データファイルを読み込む。ファイルが存在しない場合は空のデータとする。
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot = if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read data file: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse data file: {}", path.display()))?
        } else {
            Snapshot::default()
        };
        info!(
            "Loaded {} projects, {} entries and {} goals from {}",
            snapshot.projects.len(),
            snapshot.entries.len(),
            snapshot.goals.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            snapshot,
        })
    }

    /// データファイルへ保存する。一時ファイルに書いてから置き換える。
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(&self.snapshot)
            .context("Failed to serialize data file")?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, data)
            .with_context(|| format!("Failed to write data file: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace data file: {}", self.path.display()))?;

        Ok(())
    }

    /// プロジェクトを追加する。同じユーザーに同名のプロジェクトがある場合はエラーとする。
    pub fn add_project(&mut self, user_id: i64, name: &str) -> Result<i64, TrackerError> {
        let exists = self
            .snapshot
            .projects
            .iter()
            .any(|project| project.user_id == user_id && project.name == name);
        if exists {
            return Err(TrackerError::AlreadyExists(format!("project {:?}", name)));
        }

        let id = next_id(self.snapshot.projects.iter().map(|project| project.id));
        self.snapshot.projects.push(Project {
            id,
            user_id,
            name: name.to_string(),
        });

        Ok(id)
    }

    /// タイムエントリーを追加する。
    pub fn add_entry(
        &mut self,
        user_id: i64,
        project_id: i64,
        name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        if end < start {
            return Err(TrackerError::InvalidInput(format!(
                "entry end {} is before start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        self.ensure_project(user_id, project_id)?;

        let id = next_id(self.snapshot.entries.iter().map(|entry| entry.id));
        self.snapshot.entries.push(TimeEntry {
            id,
            user_id,
            project_id,
            name: name.to_string(),
            start,
            end,
        });

        Ok(id)
    }

    /// ゴールを追加する。
    pub fn add_goal(
        &mut self,
        user_id: i64,
        project_id: i64,
        name: &str,
        target_seconds: i64,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<i64, TrackerError> {
        self.ensure_project(user_id, project_id)?;

        let goal = Goal {
            id: next_id(self.snapshot.goals.iter().map(|goal| goal.id)),
            project_id,
            user_id,
            name: name.to_string(),
            target_seconds,
            window_start,
            window_end,
        };
        goal.validate()?;

        let id = goal.id;
        self.snapshot.goals.push(goal);

        Ok(id)
    }

    fn ensure_project(&self, user_id: i64, project_id: i64) -> Result<(), TrackerError> {
        let found = self
            .snapshot
            .projects
            .iter()
            .any(|project| project.user_id == user_id && project.id == project_id);
        if !found {
            return Err(TrackerError::InvalidInput(format!(
                "unknown project {}",
                project_id
            )));
        }

        Ok(())
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

#[async_trait]
impl EntryStore for FileStore {
    async fn entries_for_user_in_window(
        &self,
        user_id: i64,
        window: &AggregationWindow,
    ) -> Result<Rows<TimeEntry>> {
        let entries = self
            .snapshot
            .entries
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .filter(|entry| starts_within(&entry.span(), &window.span()))
            .cloned()
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
            .snapshot
            .entries
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.project_id == project_id)
            .filter(|entry| starts_within(&entry.span(), &window.span()))
            .cloned()
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
            .snapshot
            .entries
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.project_id == project_id)
            .filter(|entry| overlaps_goal_window(&entry.span(), window_start, window_end))
            .cloned()
            .collect();

        Ok(Rows::from_vec(entries))
    }
}

#[async_trait]
impl ProjectStore for FileStore {
    async fn projects_for_user(&self, user_id: i64) -> Result<Rows<Project>> {
        let projects = self
            .snapshot
            .projects
            .iter()
            .filter(|project| project.user_id == user_id)
            .cloned()
            .collect();

        Ok(Rows::from_vec(projects))
    }
}

#[async_trait]
impl GoalStore for FileStore {
    async fn goals_for_project(
        &self,
        user_id: i64,
        project_id: i64,
    ) -> Result<Rows<GoalWithEntries>> {
        let mut goals = Vec::new();
        for goal in self
            .snapshot
            .goals
            .iter()
            .filter(|goal| goal.user_id == user_id && goal.project_id == project_id)
        {
            let entries = self
                .entries_for_goal_window(user_id, project_id, goal.window_start, goal.window_end)
                .await?
                .into_vec()
                .iter()
                .map(TimeEntry::span)
                .collect();
            goals.push(GoalWithEntries {
                goal: goal.clone(),
                entries,
            });
        }
        goals.sort_by_key(|goal| goal.goal.window_start);

        Ok(Rows::from_vec(goals))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use tempfile::tempdir;

    use super::FileStore;
    use crate::error::{Rows, TrackerError};
    use crate::store::{EntryStore, GoalStore, ProjectStore};
    use crate::window::AggregationWindow;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    /// テスト用のデータを持つ`FileStore`を作成する。
    fn dummy_store(dir: &std::path::Path) -> FileStore {
        let mut store = FileStore::open(&dir.join("data.json")).unwrap();
        let work = store.add_project(1, "work").unwrap();
        let hobby = store.add_project(1, "hobby").unwrap();
        store.add_project(2, "work").unwrap();
        store.add_entry(1, work, "task1", at(1, 9), at(1, 10)).unwrap();
        store.add_entry(1, work, "task2", at(2, 23), at(3, 2)).unwrap();
        store.add_entry(1, hobby, "", at(5, 9), at(5, 10)).unwrap();
        store
    }

    #[test]
    fn test_open_nonexistent() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::open(&dir.path().join("nonexistent.json"))?;

        assert!(store.snapshot.projects.is_empty());
        assert!(store.snapshot.entries.is_empty());

        Ok(())
    }

    #[test]
    fn test_save_open() -> Result<()> {
        let dir = tempdir()?;
        let store = dummy_store(dir.path());

        store.save()?;
        let loaded = FileStore::open(&dir.path().join("data.json"))?;

        assert_eq!(loaded.snapshot.projects, store.snapshot.projects);
        assert_eq!(loaded.snapshot.entries, store.snapshot.entries);

        Ok(())
    }

    #[test]
    fn test_add_project_duplicate_name() {
        let dir = tempdir().unwrap();
        let mut store = dummy_store(dir.path());

        let result = store.add_project(1, "work");

        assert!(matches!(result, Err(TrackerError::AlreadyExists(_))));
    }

    #[test]
    fn test_add_entry_rejects_invalid() {
        let dir = tempdir().unwrap();
        let mut store = dummy_store(dir.path());

        let reversed = store.add_entry(1, 1, "x", at(1, 10), at(1, 9));
        let unknown_project = store.add_entry(1, 3, "x", at(1, 9), at(1, 10));

        assert!(matches!(reversed, Err(TrackerError::InvalidInput(_))));
        assert!(matches!(unknown_project, Err(TrackerError::InvalidInput(_))));
    }

    #[test]
    fn test_add_goal_rejects_non_positive_target() {
        let dir = tempdir().unwrap();
        let mut store = dummy_store(dir.path());

        let result = store.add_goal(1, 1, "goal", 0, date(1), date(31));

        assert!(matches!(result, Err(TrackerError::InvalidInput(_))));
        assert!(store.snapshot.goals.is_empty());
    }

    #[tokio::test]
    async fn test_projects_for_user_in_insertion_order() {
        let dir = tempdir().unwrap();
        let store = dummy_store(dir.path());

        let projects = store.projects_for_user(1).await.unwrap().into_vec();
        let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["work", "hobby"]);
        assert_eq!(store.projects_for_user(3).await.unwrap(), Rows::Empty);
    }

    /// 開始時刻が区間内のエントリーだけを返し、終了時刻が区間外でも含める。
    #[tokio::test]
    async fn test_entries_for_project_in_window_filters_by_start() {
        let dir = tempdir().unwrap();
        let store = dummy_store(dir.path());
        let window = AggregationWindow::new(at(2, 0), at(3, 0)).unwrap();

        let entries = store
            .entries_for_project_in_window(1, 1, &window)
            .await
            .unwrap()
            .into_vec();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "task2");
    }

    #[tokio::test]
    async fn test_entries_for_user_in_window_end_is_exclusive() {
        let dir = tempdir().unwrap();
        let store = dummy_store(dir.path());
        let window = AggregationWindow::new(at(1, 0), at(5, 9)).unwrap();

        let entries = store
            .entries_for_user_in_window(1, &window)
            .await
            .unwrap()
            .into_vec();

        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_entries_for_goal_window_by_date() {
        let dir = tempdir().unwrap();
        let store = dummy_store(dir.path());

        let entries = store
            .entries_for_goal_window(1, 1, date(3), date(4))
            .await
            .unwrap()
            .into_vec();
        let none = store
            .entries_for_goal_window(1, 1, date(20), date(25))
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "task2");
        assert_eq!(none, Rows::Empty);
    }

    #[tokio::test]
    async fn test_goals_for_project_attach_overlapping_entries() {
        let dir = tempdir().unwrap();
        let mut store = dummy_store(dir.path());
        store.add_goal(1, 1, "later", 3600, date(3), date(10)).unwrap();
        store.add_goal(1, 1, "earlier", 3600, date(1), date(1)).unwrap();

        let goals = store.goals_for_project(1, 1).await.unwrap().into_vec();

        assert_eq!(goals.len(), 2);
        assert_eq!(goals[0].goal.name, "earlier");
        assert_eq!(goals[0].entries.len(), 1);
        assert_eq!(goals[1].goal.name, "later");
        assert_eq!(goals[1].entries.len(), 1);
        assert_eq!(goals[1].entries[0].end - goals[1].entries[0].start, Duration::hours(3));
    }

    /// ゴールに添えられるエントリーは`entries_for_goal_window`の結果と一致する。
    #[tokio::test]
    async fn test_goals_for_project_uses_goal_window_entries() {
        let dir = tempdir().unwrap();
        let mut store = dummy_store(dir.path());
        store.add_goal(1, 1, "span", 3600, date(2), date(4)).unwrap();
        store.add_goal(1, 1, "empty", 3600, date(20), date(25)).unwrap();

        let goals = store.goals_for_project(1, 1).await.unwrap().into_vec();
        let expected: Vec<_> = store
            .entries_for_goal_window(1, 1, date(2), date(4))
            .await
            .unwrap()
            .into_vec()
            .iter()
            .map(|entry| entry.span())
            .collect();

        assert_eq!(goals.len(), 2);
        assert_eq!(goals[0].goal.name, "span");
        assert_eq!(goals[0].entries, expected);
        assert_eq!(goals[1].goal.name, "empty");
        assert!(goals[1].entries.is_empty());
    }
}
