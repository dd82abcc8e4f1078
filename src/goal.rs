use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::aggregate::{percent, total_seconds};
use crate::error::TrackerError;
use crate::interval::{clip_to_goal_window, Span};
use crate::store::GoalStore;

/// プロジェクトに対して期間内に`target_seconds`を費やすという目標。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_seconds: i64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

impl Goal {
    /// 目標時間と期間が妥当かを確認する。
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.target_seconds <= 0 {
            return Err(TrackerError::InvalidInput(format!(
                "goal {} has non-positive target_seconds {}",
                self.id, self.target_seconds
            )));
        }
        if self.window_end < self.window_start {
            return Err(TrackerError::InvalidInput(format!(
                "goal {} window ends {} before it starts {}",
                self.id, self.window_end, self.window_start
            )));
        }

        Ok(())
    }
}

/// ゴールと、その期間に掛かるタイムエントリーの区間。
#[derive(Clone, Debug, PartialEq)]
pub struct GoalWithEntries {
    pub goal: Goal,
    pub entries: Vec<Span>,
}

/// ゴールの進捗。
#[derive(Clone, Debug, PartialEq)]
pub struct GoalProgress {
    pub goal: Goal,
    pub accumulated_seconds: f64,
    /// 達成率。目標を超えた場合は100を超える。
    pub percent: f64,
}

/// ゴールの進捗を計算する。
///
/// 各エントリーをゴール期間に切り詰めた長さを合計し、目標時間に対する割合を求める。
/// 割合は100で頭打ちにしない。
pub fn evaluate(goal: &Goal, entries: &[Span]) -> Result<GoalProgress, TrackerError> {
    goal.validate()?;

    let accumulated_seconds = total_seconds(
        entries
            .iter()
            .filter_map(|span| clip_to_goal_window(span, goal.window_start, goal.window_end)),
    );

    Ok(GoalProgress {
        goal: goal.clone(),
        accumulated_seconds,
        percent: percent(accumulated_seconds, goal.target_seconds as f64),
    })
}

pub struct GoalProgressEvaluator<'a, G: GoalStore> {
    goal_store: &'a G,
}

impl<'a, G: GoalStore> GoalProgressEvaluator<'a, G> {
    /// 新しい`GoalProgressEvaluator`を返す。
    pub fn new(goal_store: &'a G) -> Self {
        Self { goal_store }
    }

    /// プロジェクトのゴールごとの進捗を、期間の開始日が早い順に返す。
    ///
    /// ゴールが1つもない場合は空のリストを返す。
    pub async fn goals_for_project(
        &self,
        user_id: i64,
        project_id: i64,
    ) -> Result<Vec<GoalProgress>, TrackerError> {
        let mut goals = self
            .goal_store
            .goals_for_project(user_id, project_id)
            .await
            .map_err(TrackerError::store)?
            .into_vec();
        info!("goals for project {}: {}", project_id, goals.len());

        goals.sort_by_key(|goal| goal.goal.window_start);

        goals
            .iter()
            .map(|goal| {
                evaluate(&goal.goal, &goal.entries).map(|progress| {
                    debug!(
                        "goal {}: {:.0}s of {}s",
                        goal.goal.id, progress.accumulated_seconds, goal.goal.target_seconds
                    );
                    progress
                })
            })
            .collect()
    }
}
