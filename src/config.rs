use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::file_store::FileStore;

/// 認証がない環境で利用するユーザー。
const DEFAULT_USER_ID: i64 = 1;

/// 全サブコマンドで共通のオプション。
#[derive(Debug, Default, clap::Args)]
pub struct GlobalArgs {
    #[clap(
        long = "user",
        global = true,
        help = "User to aggregate for [env: TIMETRACK_USER_ID]"
    )]
    user_id: Option<i64>,

    #[clap(
        long = "data-file",
        global = true,
        help = "Path to the local data file [env: TIMETRACK_DATA_FILE]"
    )]
    data_file: Option<PathBuf>,

    #[clap(
        long = "api-url",
        global = true,
        help = "Base URL of the Time Tracker API [env: TIMETRACK_API_URL]"
    )]
    api_url: Option<String>,

    #[clap(
        short = 'v',
        long = "verbose",
        global = true,
        parse(from_occurrences),
        help = "Increase log verbosity"
    )]
    pub verbose: u64,
}

/// データの取得元。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Remote { url: String, token: Option<String> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub user_id: i64,
    pub source: Source,
}

impl Config {
    /// コマンドライン引数と環境変数から設定を作る。
    pub fn from_env(args: &GlobalArgs) -> Result<Self> {
        Self::resolve(args, |key| env::var(key).ok())
    }

    /// コマンドライン引数を優先し、無いものは`lookup`で環境変数を参照する。
    ///
    /// APIのURLが指定されている場合はAPIを、そうでなければローカルのデータファイルを利用する。
    pub fn resolve<F>(args: &GlobalArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_id = match args.user_id {
            Some(user_id) => user_id,
            None => match lookup("TIMETRACK_USER_ID") {
                Some(value) => value
                    .parse()
                    .with_context(|| format!("TIMETRACK_USER_ID must be an integer: {}", value))?,
                None => DEFAULT_USER_ID,
            },
        };

        let api_url = args
            .api_url
            .clone()
            .or_else(|| lookup("TIMETRACK_API_URL"))
            .filter(|url| !url.is_empty());
        let source = match api_url {
            Some(url) => Source::Remote {
                url,
                token: lookup("TIMETRACK_API_TOKEN"),
            },
            None => {
                let path = match args
                    .data_file
                    .clone()
                    .or_else(|| lookup("TIMETRACK_DATA_FILE").map(PathBuf::from))
                {
                    Some(path) => path,
                    None => FileStore::default_path()?,
                };
                Source::File(path)
            }
        };

        Ok(Self { user_id, source })
    }
}
