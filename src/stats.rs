use log::{debug, info};

use crate::aggregate::{accumulate, total_seconds, with_percentages};
use crate::error::TrackerError;
use crate::store::{EntryStore, ProjectStore};
use crate::window::AggregationWindow;

/// 1プロジェクト分の統計。
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectStat {
    pub project_id: i64,
    pub project_name: String,
    pub seconds: f64,
    pub percent: f64,
}

/// 全プロジェクトの統計。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectsStat {
    pub total_seconds: f64,
    pub projects: Vec<ProjectStat>,
}

/// エントリー名1つ分の統計。
#[derive(Clone, Debug, PartialEq)]
pub struct EntryStat {
    pub name: String,
    pub seconds: f64,
    pub percent: f64,
}

/// 1プロジェクト内のエントリー名ごとの統計。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectEntriesStat {
    pub total_seconds: f64,
    pub entries: Vec<EntryStat>,
}

/// 集計区間内の作業時間をプロジェクトごと、エントリー名ごとに集計する。
///
/// 統計はエントリーを集計区間で切り詰めない。開始時刻が区間内にあれば全長を数える。
pub struct StatisticsAggregator<'a, P: ProjectStore, E: EntryStore> {
    project_store: &'a P,
    entry_store: &'a E,
}

impl<'a, P: ProjectStore, E: EntryStore> StatisticsAggregator<'a, P, E> {
    /// 新しい`StatisticsAggregator`を返す。
    ///
    /// # Arguments
    ///
    /// * `project_store` - プロジェクトを取得するためのストア
    /// * `entry_store` - タイムエントリーを取得するためのストア
    pub fn new(project_store: &'a P, entry_store: &'a E) -> Self {
        Self {
            project_store,
            entry_store,
        }
    }

    /// ユーザーの全プロジェクトについて作業時間と割合を集計する。
    ///
    /// 区間内にエントリーが1件もないプロジェクトは結果に含めない。
    /// 割合は全プロジェクトの合計が出てから計算する。
    ///
    /// # Arguments
    ///
    /// * `user_id` - 集計するユーザー
    /// * `window` - 集計区間
    pub async fn projects_stat(
        &self,
        user_id: i64,
        window: &AggregationWindow,
    ) -> Result<ProjectsStat, TrackerError> {
        window.validate()?;
        let projects = self
            .project_store
            .projects_for_user(user_id)
            .await
            .map_err(TrackerError::store)?
            .into_vec();
        info!("projects for user {}: {}", user_id, projects.len());

        let mut totals = Vec::with_capacity(projects.len());
        for project in projects {
            let entries = self
                .entry_store
                .entries_for_project_in_window(user_id, project.id, window)
                .await
                .map_err(TrackerError::store)?
                .into_vec();
            if entries.is_empty() {
                debug!("project {} has no entries in window", project.id);
                continue;
            }

            let seconds = total_seconds(entries.iter().map(|entry| entry.span()));
            totals.push(((project.id, project.name), seconds));
        }

        let (total_seconds, buckets) = with_percentages(totals);
        let projects = buckets
            .into_iter()
            .map(|bucket| ProjectStat {
                project_id: bucket.key.0,
                project_name: bucket.key.1,
                seconds: bucket.seconds,
                percent: bucket.percent,
            })
            .collect();

        Ok(ProjectsStat {
            total_seconds,
            projects,
        })
    }

    /// 1プロジェクトのエントリーを名前ごとに集計する。
    ///
    /// 名前は完全一致でまとめ、空の名前も1つの名前として扱う。
    pub async fn project_entries_stat(
        &self,
        user_id: i64,
        project_id: i64,
        window: &AggregationWindow,
    ) -> Result<ProjectEntriesStat, TrackerError> {
        window.validate()?;
        let entries = self
            .entry_store
            .entries_for_project_in_window(user_id, project_id, window)
            .await
            .map_err(TrackerError::store)?
            .into_vec();
        info!("entries for project {}: {}", project_id, entries.len());

        let totals = accumulate(entries.into_iter().map(|entry| {
            let span = entry.span();
            (entry.name, span)
        }));
        let (total_seconds, buckets) = with_percentages(totals);
        let entries = buckets
            .into_iter()
            .map(|bucket| EntryStat {
                name: bucket.key,
                seconds: bucket.seconds,
                percent: bucket.percent,
            })
            .collect();

        Ok(ProjectEntriesStat {
            total_seconds,
            entries,
        })
    }
}
