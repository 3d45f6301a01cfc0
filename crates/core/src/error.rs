use thiserror::Error;

use crate::model::{GoalError, QuizError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}
