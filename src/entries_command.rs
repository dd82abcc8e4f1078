use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;

use crate::datetime::parse_date;
use crate::store::{EntryStore, ProjectStore};
use crate::time_entry::TimeEntry;
use crate::window::{AggregationWindow, WindowArgs};

/// タイムエントリーを一覧表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct EntriesArgs {
    #[clap(
        short = 'd',
        long = "day",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
        conflicts_with_all = &["start", "end"],
    )]
    day: Option<NaiveDate>,

    #[clap(flatten)]
    window: WindowArgs,
}

/// プロジェクト名を添えたタイムエントリー。
#[derive(Clone, Debug, PartialEq)]
pub struct ListedEntry {
    pub entry: TimeEntry,
    pub project_name: String,
}

pub struct EntriesCommand<'a, E: EntryStore, P: ProjectStore> {
    entry_store: &'a E,
    project_store: &'a P,
    user_id: i64,
}

impl<'a, E: EntryStore, P: ProjectStore> EntriesCommand<'a, E, P> {
    /// 新しい`EntriesCommand`を返す。
    ///
    /// # Arguments
    /// * `entry_store` - タイムエントリーを取得するためのストア
    /// * `project_store` - プロジェクト名を取得するためのストア
    /// * `user_id` - 対象のユーザー
    pub fn new(entry_store: &'a E, project_store: &'a P, user_id: i64) -> Self {
        Self {
            entry_store,
            project_store,
            user_id,
        }
    }

    /// `entries`サブコマンドの処理を行う。
    ///
    /// 日付が指定された場合はLocalタイムゾーンでその日の00:00:00から始まる1日のタイムエントリーを取得する。
    /// 終了が指定されない場合は上限を設けず、開始時刻が未来のエントリーも一覧に含める。
    /// エントリーが1件もない場合はエラーとする。
    ///
    /// # Arguments
    ///
    /// * `args` - `entries`サブコマンドの引数
    pub async fn run(&self, args: EntriesArgs) -> Result<Vec<ListedEntry>> {
        let window = match args.day {
            Some(day) => AggregationWindow::local_day(day)?,
            None => AggregationWindow::from_bounds(
                args.window.start,
                Some(args.window.end.unwrap_or(DateTime::<Utc>::MAX_UTC)),
            )?,
        };
        info!("Start at: {}, End at: {}", window.start(), window.end());

        let entries = self
            .entry_store
            .entries_for_user_in_window(self.user_id, &window)
            .await
            .context("Failed to retrieve time entries")?
            .found("entries")?;
        info!("Time entries retrieved successfully.");

        let project_names: HashMap<i64, String> = self
            .project_store
            .projects_for_user(self.user_id)
            .await
            .context("Failed to retrieve projects")?
            .into_vec()
            .into_iter()
            .map(|project| (project.id, project.name))
            .collect();

        let listed = entries
            .into_iter()
            .map(|entry| ListedEntry {
                project_name: project_names
                    .get(&entry.project_id)
                    .cloned()
                    .unwrap_or_default(),
                entry,
            })
            .collect();

        Ok(listed)
    }
}
