mod goal;
mod ids;
mod quiz;

pub use goal::{Goal, GoalError, GoalPeriod};
pub use ids::{GoalId, ParseIdError};
pub use quiz::{
    POINTS_PER_CORRECT, QuizError, QuizOutcome, QuizQuestion, QuizVerdict, question_bank,
};
