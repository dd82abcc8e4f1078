use std::io;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

mod add_command;
mod aggregate;
mod config;
mod console;
mod datetime;
mod entries_command;
mod error;
mod file_store;
mod goal;
mod goals_command;
mod interval;
mod logger;
mod project_command;
mod projects_command;
mod stats;
mod store;
mod time_entry;
mod tracker_api;
mod window;

use add_command::{AddArgs, AddCommand};
use config::{Config, GlobalArgs, Source};
use console::{ConsoleMarkdownList, ConsolePresenter};
use entries_command::{EntriesArgs, EntriesCommand};
use file_store::FileStore;
use goals_command::{GoalsArgs, GoalsCommand};
use project_command::{ProjectArgs, ProjectCommand};
use projects_command::{ProjectsArgs, ProjectsCommand};
use store::{EntryStore, GoalStore, ProjectStore};
use tracker_api::TrackerClient;

/// 作業時間をプロジェクトごとに集計し、ゴールの進捗を表示するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- add project --name work
/// $ cargo run -- projects --start 2024-03-01T00:00:00Z
/// $ cargo run -- project 1
/// $ cargo run -- goals 1
/// $ cargo run -- entries --day 2024-03-01
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(flatten)]
    global: GlobalArgs,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Show time spent per project
    Projects(ProjectsArgs),
    /// Show time spent per entry name within a project
    Project(ProjectArgs),
    /// Show goal progress of a project
    Goals(GoalsArgs),
    /// List time entries
    Entries(EntriesArgs),
    /// Add a record to the local data file
    Add(AddArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logger::init(args.global.verbose)?;
    let config = Config::from_env(&args.global).context("Failed to load configuration")?;
    info!("User: {}, Source: {:?}", config.user_id, config.source);

    match config.source {
        Source::File(path) => {
            let mut store = FileStore::open(&path)?;
            match args.subcommand {
                SubCommands::Add(add) => {
                    let id = AddCommand::new(&mut store, config.user_id).run(add)?;
                    println!("{}", id);
                }
                subcommand => run_report(&store, config.user_id, subcommand).await?,
            }
        }
        Source::Remote { url, token } => {
            if let SubCommands::Add(_) = args.subcommand {
                bail!("Records can only be added to a local data file");
            }
            let client = TrackerClient::new(&url, token);
            run_report(&client, config.user_id, args.subcommand).await?;
        }
    }

    Ok(())
}

/// 集計系のサブコマンドを実行して標準出力へ表示する。
async fn run_report<S>(store: &S, user_id: i64, subcommand: SubCommands) -> Result<()>
where
    S: EntryStore + ProjectStore + GoalStore,
{
    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout);

    match subcommand {
        SubCommands::Projects(args) => {
            let stat = ProjectsCommand::new(store, store, user_id).run(args).await?;
            presenter.show_projects_stat(&stat)?;
        }
        SubCommands::Project(args) => {
            let stat = ProjectCommand::new(store, store, user_id).run(args).await?;
            presenter.show_project_entries_stat(&stat)?;
        }
        SubCommands::Goals(args) => {
            let goals = GoalsCommand::new(store, user_id).run(args).await?;
            presenter.show_goals(&goals)?;
        }
        SubCommands::Entries(args) => {
            let entries = EntriesCommand::new(store, store, user_id).run(args).await?;
            presenter.show_entries(&entries)?;
        }
        SubCommands::Add(_) => bail!("Unexpected add subcommand"),
    }

    Ok(())
}
