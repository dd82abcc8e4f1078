use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;

use crate::datetime::{parse_date, parse_timestamp};
use crate::file_store::FileStore;

/// ローカルのデータファイルにレコードを追加するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct AddArgs {
    #[clap(subcommand)]
    target: AddTarget,
}

#[derive(Debug, clap::Subcommand)]
enum AddTarget {
    /// プロジェクトを追加する。
    Project {
        #[clap(long = "name", help = "Project name, unique per user")]
        name: String,
    },
    /// タイムエントリーを追加する。
    Entry {
        #[clap(long = "project", help = "Project id")]
        project_id: i64,
        #[clap(long = "name", default_value = "", help = "Entry name")]
        name: String,
        #[clap(long = "start", help = "Start in RFC3339 format", parse(try_from_str = parse_timestamp))]
        start: DateTime<Utc>,
        #[clap(long = "end", help = "End in RFC3339 format", parse(try_from_str = parse_timestamp))]
        end: DateTime<Utc>,
    },
    /// ゴールを追加する。
    Goal {
        #[clap(long = "project", help = "Project id")]
        project_id: i64,
        #[clap(long = "name", help = "Goal name")]
        name: String,
        #[clap(long = "target", help = "Target duration in seconds")]
        target_seconds: i64,
        #[clap(long = "from", help = "First day in the format YYYY-MM-DD", parse(try_from_str = parse_date))]
        window_start: NaiveDate,
        #[clap(long = "to", help = "Last day in the format YYYY-MM-DD", parse(try_from_str = parse_date))]
        window_end: NaiveDate,
    },
}

pub struct AddCommand<'a> {
    store: &'a mut FileStore,
    user_id: i64,
}

impl<'a> AddCommand<'a> {
    /// 新しい`AddCommand`を返す。
    pub fn new(store: &'a mut FileStore, user_id: i64) -> Self {
        Self { store, user_id }
    }

    /// `add`サブコマンドの処理を行い、追加したレコードのIDを返す。
    ///
    /// 追加後にデータファイルへ保存する。
    pub fn run(&mut self, args: AddArgs) -> Result<i64> {
        let id = match args.target {
            AddTarget::Project { name } => self
                .store
                .add_project(self.user_id, &name)
                .with_context(|| format!("Failed to add project {:?}", name))?,
            AddTarget::Entry {
                project_id,
                name,
                start,
                end,
            } => self
                .store
                .add_entry(self.user_id, project_id, &name, start, end)
                .context("Failed to add entry")?,
            AddTarget::Goal {
                project_id,
                name,
                target_seconds,
                window_start,
                window_end,
            } => self
                .store
                .add_goal(
                    self.user_id,
                    project_id,
                    &name,
                    target_seconds,
                    window_start,
                    window_end,
                )
                .with_context(|| format!("Failed to add goal {:?}", name))?,
        };
        self.store.save().context("Failed to save data file")?;
        info!("Added record {}", id);

        Ok(id)
    }
}
