use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;

use crate::entries_command::ListedEntry;
use crate::goal::GoalProgress;
use crate::stats::{ProjectEntriesStat, ProjectsStat};

/// Consoleに集計結果を表示するためのtrait。
pub trait ConsolePresenter {
    /// プロジェクトごとの統計を表示する。
    fn show_projects_stat(&mut self, stat: &ProjectsStat) -> Result<()>;

    /// エントリー名ごとの統計を表示する。
    fn show_project_entries_stat(&mut self, stat: &ProjectEntriesStat) -> Result<()>;

    /// ゴールの進捗を表示する。
    fn show_goals(&mut self, goals: &[GoalProgress]) -> Result<()>;

    /// タイムエントリーを表示する。
    fn show_entries(&mut self, entries: &[ListedEntry]) -> Result<()>;
}

/// 集計結果をMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

/// 秒を時間単位に変換する。
fn hours(seconds: f64) -> f64 {
    seconds / 3600.0
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    fn show_projects_stat(&mut self, stat: &ProjectsStat) -> Result<()> {
        writeln!(self.writer, "Total: {:.2}h", hours(stat.total_seconds))
            .context("Failed to write total")?;
        for project in &stat.projects {
            writeln!(
                self.writer,
                "- {}: {:.2}h ({:.2}%)",
                project.project_name,
                hours(project.seconds),
                project.percent
            )
            .with_context(|| format!("Failed to write project stat: {:?}", project))?;
        }

        Ok(())
    }

    fn show_project_entries_stat(&mut self, stat: &ProjectEntriesStat) -> Result<()> {
        writeln!(self.writer, "Total: {:.2}h", hours(stat.total_seconds))
            .context("Failed to write total")?;
        for entry in &stat.entries {
            writeln!(
                self.writer,
                "- {}: {:.2}h ({:.2}%)",
                entry.name,
                hours(entry.seconds),
                entry.percent
            )
            .with_context(|| format!("Failed to write entry stat: {:?}", entry))?;
        }

        Ok(())
    }

    fn show_goals(&mut self, goals: &[GoalProgress]) -> Result<()> {
        for progress in goals {
            let goal = &progress.goal;
            writeln!(
                self.writer,
                "- {} ({} ~ {}): {:.2}h / {:.2}h ({:.2}%)",
                goal.name,
                goal.window_start,
                goal.window_end,
                hours(progress.accumulated_seconds),
                hours(goal.target_seconds as f64),
                progress.percent
            )
            .with_context(|| format!("Failed to write goal: {:?}", goal))?;
        }

        Ok(())
    }

    // time entryを開始時刻順にlist形式で表示する。
    fn show_entries(&mut self, entries: &[ListedEntry]) -> Result<()> {
        let mut sorted_entries = entries.to_vec();
        sorted_entries.sort_by_key(|listed| listed.entry.start);

        for listed in sorted_entries {
            let start_str = listed
                .entry
                .start
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string();
            let end_str = listed
                .entry
                .end
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string();
            writeln!(
                self.writer,
                "- {} ~ {}: [{}] {}",
                start_str, end_str, listed.project_name, listed.entry.name
            )
            .with_context(|| format!("Failed to write time entry: {:?}", listed.entry))?;
        }

        Ok(())
    }
}
