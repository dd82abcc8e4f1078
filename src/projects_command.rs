use anyhow::{Context, Result};
use log::info;

use crate::stats::{ProjectsStat, StatisticsAggregator};
use crate::store::{EntryStore, ProjectStore};
use crate::window::WindowArgs;

/// 全プロジェクトの統計を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ProjectsArgs {
    #[clap(flatten)]
    window: WindowArgs,
}

pub struct ProjectsCommand<'a, P: ProjectStore, E: EntryStore> {
    aggregator: StatisticsAggregator<'a, P, E>,
    user_id: i64,
}

impl<'a, P: ProjectStore, E: EntryStore> ProjectsCommand<'a, P, E> {
    /// 新しい`ProjectsCommand`を返す。
    pub fn new(project_store: &'a P, entry_store: &'a E, user_id: i64) -> Self {
        Self {
            aggregator: StatisticsAggregator::new(project_store, entry_store),
            user_id,
        }
    }

    /// `projects`サブコマンドの処理を行う。
    ///
    /// 区間が指定されない場合はエポックから現在時刻までを集計する。
    pub async fn run(&self, args: ProjectsArgs) -> Result<ProjectsStat> {
        let window = args.window.window()?;
        info!("Start at: {}, End at: {}", window.start(), window.end());

        let stat = self
            .aggregator
            .projects_stat(self.user_id, &window)
            .await
            .context("Failed to aggregate project statistics")?;
        info!("Projects with activity: {}", stat.projects.len());

        Ok(stat)
    }
}
