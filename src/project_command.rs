use anyhow::{Context, Result};
use log::info;

use crate::stats::{ProjectEntriesStat, StatisticsAggregator};
use crate::store::{EntryStore, ProjectStore};
use crate::window::WindowArgs;

/// 1プロジェクトのエントリー名ごとの統計を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ProjectArgs {
    #[clap(value_name = "PROJECT_ID", help = "Project to aggregate")]
    project_id: i64,

    #[clap(flatten)]
    window: WindowArgs,
}

pub struct ProjectCommand<'a, P: ProjectStore, E: EntryStore> {
    aggregator: StatisticsAggregator<'a, P, E>,
    user_id: i64,
}

impl<'a, P: ProjectStore, E: EntryStore> ProjectCommand<'a, P, E> {
    /// 新しい`ProjectCommand`を返す。
    pub fn new(project_store: &'a P, entry_store: &'a E, user_id: i64) -> Self {
        Self {
            aggregator: StatisticsAggregator::new(project_store, entry_store),
            user_id,
        }
    }

    /// `project`サブコマンドの処理を行う。
    pub async fn run(&self, args: ProjectArgs) -> Result<ProjectEntriesStat> {
        let window = args.window.window()?;
        info!(
            "Project: {}, Start at: {}, End at: {}",
            args.project_id, window.start(), window.end()
        );

        let stat = self
            .aggregator
            .project_entries_stat(self.user_id, args.project_id, &window)
            .await
            .with_context(|| {
                format!(
                    "Failed to aggregate entry statistics for project {}",
                    args.project_id
                )
            })?;

        Ok(stat)
    }
}
