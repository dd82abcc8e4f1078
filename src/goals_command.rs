use anyhow::{Context, Result};
use log::info;

use crate::goal::{GoalProgress, GoalProgressEvaluator};
use crate::store::GoalStore;

/// プロジェクトのゴールの進捗を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct GoalsArgs {
    #[clap(value_name = "PROJECT_ID", help = "Project whose goals are shown")]
    project_id: i64,
}

pub struct GoalsCommand<'a, G: GoalStore> {
    evaluator: GoalProgressEvaluator<'a, G>,
    user_id: i64,
}

impl<'a, G: GoalStore> GoalsCommand<'a, G> {
    /// 新しい`GoalsCommand`を返す。
    pub fn new(goal_store: &'a G, user_id: i64) -> Self {
        Self {
            evaluator: GoalProgressEvaluator::new(goal_store),
            user_id,
        }
    }

    /// `goals`サブコマンドの処理を行う。
    pub async fn run(&self, args: GoalsArgs) -> Result<Vec<GoalProgress>> {
        let goals = self
            .evaluator
            .goals_for_project(self.user_id, args.project_id)
            .await
            .with_context(|| format!("Failed to evaluate goals for project {}", args.project_id))?;
        info!("Goals evaluated: {}", goals.len());

        Ok(goals)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use mockall::predicate::eq;

    use super::{GoalsArgs, GoalsCommand};
    use crate::error::{Rows, TrackerError};
    use crate::store::MockGoalStore;

    #[tokio::test]
    async fn test_goals_command_empty() {
        let mut goals = MockGoalStore::new();
        goals
            .expect_goals_for_project()
            .with(eq(1), eq(3))
            .times(1)
            .returning(|_, _| Ok(Rows::Empty));

        let command = GoalsCommand::new(&goals, 1);
        let result = command.run(GoalsArgs { project_id: 3 }).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_goals_command_store_failure() {
        let mut goals = MockGoalStore::new();
        goals
            .expect_goals_for_project()
            .returning(|_, _| Err(anyhow!("connection refused")));

        let command = GoalsCommand::new(&goals, 1);
        let err = command.run(GoalsArgs { project_id: 3 }).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::Store(_))
        ));
    }
}
