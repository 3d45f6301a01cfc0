use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least two options")]
    TooFewOptions,

    #[error("correct answer index {index} is out of range for {options} options")]
    CorrectAnswerOutOfRange { index: usize, options: usize },
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// A multiple-choice financial-literacy question.
///
/// Consumed read-only by the quiz flow; the goals domain only sees the
/// reward derived from a completed quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    text: String,
    options: Vec<String>,
    correct_answer: usize,
}

impl QuizQuestion {
    /// Creates a question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the text is empty, fewer than two options are
    /// given, or the correct-answer index does not point at an option.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
    ) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyText);
        }
        if options.len() < 2 {
            return Err(QuizError::TooFewOptions);
        }
        if correct_answer >= options.len() {
            return Err(QuizError::CorrectAnswerOutOfRange {
                index: correct_answer,
                options: options.len(),
            });
        }

        Ok(Self {
            text: text.trim().to_owned(),
            options,
            correct_answer,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Answer options in display order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    /// Whether the selected option index is the correct one.
    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }
}

/// The static question bank the quiz screen ships with.
///
/// # Panics
///
/// Panics only if the built-in questions are malformed, which a unit test
/// guards against.
#[must_use]
pub fn question_bank() -> Vec<QuizQuestion> {
    let bank: [(&str, &[&str]); 5] = [
        (
            "Para atingir uma estabilidade financeira, quando você tem que ter economizado?",
            &[
                "Um mês do custo fixo do mês",
                "Dois mêses do custo fixo do mês",
                "Três mêses do custo fixo do mês",
                "Quatro mêses do custo fixo do mês",
                "Um ano do custo fixo do mês",
            ],
        ),
        (
            "Qual das opções é fundamental para evitar o endividamento excessivo?",
            &[
                "Planejar os gastos mensais",
                "Comprar por impulso",
                "Utilizar cartões de crédito sem controle",
                "Ignorar as despesas variáveis",
                "Adiar o pagamento de contas",
            ],
        ),
        (
            "Qual prática contribui para a formação de um fundo de emergência?",
            &[
                "Poupar uma porcentagem do salário regularmente",
                "Gastar todo o salário em necessidades imediatas",
                "Recorrer a empréstimos para emergências",
                "Não controlar os gastos mensais",
                "Utilizar o crédito para imprevistos",
            ],
        ),
        (
            "Qual é a vantagem de registrar todas as despesas diárias?",
            &[
                "Permite identificar padrões de gastos e ajustar o orçamento",
                "Incentiva o consumo desnecessário",
                "Não tem impacto na saúde financeira",
                "Aumenta a chance de gastos impulsivos",
                "Dificulta a visualização do fluxo financeiro",
            ],
        ),
        (
            "Como a educação financeira pode melhorar sua qualidade de vida?",
            &[
                "Promovendo escolhas conscientes e o planejamento para o futuro",
                "Incentivando o consumo sem controle",
                "Aumentando o endividamento e os riscos financeiros",
                "Focando apenas em investimentos de alto risco",
                "Ignorando a importância do orçamento mensal",
            ],
        ),
    ];

    bank.iter()
        .map(|(text, options)| {
            // The bank lists the correct option first.
            QuizQuestion::new(
                *text,
                options.iter().map(|s| (*s).to_owned()).collect(),
                0,
            )
            .expect("built-in question bank is valid")
        })
        .collect()
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Coarse verdict shown at the end of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizVerdict {
    /// At least 70% correct.
    Strong,
    /// At least 40% correct.
    Decent,
    /// Below 40% correct.
    KeepStudying,
}

/// Tally of a completed quiz run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    correct: usize,
    total: usize,
}

/// Points awarded per correct answer.
pub const POINTS_PER_CORRECT: u32 = 10;

impl QuizOutcome {
    /// Scores the selected option indices against the questions.
    ///
    /// Missing answers (shorter `answers` slice) count as wrong.
    #[must_use]
    pub fn tally(questions: &[QuizQuestion], answers: &[usize]) -> Self {
        let correct = questions
            .iter()
            .zip(answers)
            .filter(|(question, selected)| question.is_correct(**selected))
            .count();
        Self {
            correct,
            total: questions.len(),
        }
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Points the outcome is worth when fed into the points ledger.
    #[must_use]
    pub fn points(&self) -> u32 {
        u32::try_from(self.correct)
            .unwrap_or(u32::MAX)
            .saturating_mul(POINTS_PER_CORRECT)
    }

    #[must_use]
    pub fn verdict(&self) -> QuizVerdict {
        let correct = self.correct as f64;
        let total = self.total as f64;
        if correct >= total * 0.7 {
            QuizVerdict::Strong
        } else if correct >= total * 0.4 {
            QuizVerdict::Decent
        } else {
            QuizVerdict::KeepStudying
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_rejects_empty_text() {
        let err = QuizQuestion::new("  ", vec!["a".into(), "b".into()], 0).unwrap_err();
        assert_eq!(err, QuizError::EmptyText);
    }

    #[test]
    fn question_rejects_single_option() {
        let err = QuizQuestion::new("q", vec!["a".into()], 0).unwrap_err();
        assert_eq!(err, QuizError::TooFewOptions);
    }

    #[test]
    fn question_rejects_out_of_range_answer() {
        let err = QuizQuestion::new("q", vec!["a".into(), "b".into()], 2).unwrap_err();
        assert_eq!(
            err,
            QuizError::CorrectAnswerOutOfRange { index: 2, options: 2 }
        );
    }

    #[test]
    fn built_in_bank_is_valid() {
        let bank = question_bank();
        assert_eq!(bank.len(), 5);
        for question in &bank {
            assert_eq!(question.correct_answer(), 0);
            assert!(question.options().len() >= 2);
        }
    }

    #[test]
    fn tally_counts_correct_answers() {
        let bank = question_bank();
        let outcome = QuizOutcome::tally(&bank, &[0, 1, 0, 3, 0]);
        assert_eq!(outcome.correct(), 3);
        assert_eq!(outcome.total(), 5);
        assert_eq!(outcome.points(), 30);
    }

    #[test]
    fn tally_treats_missing_answers_as_wrong() {
        let bank = question_bank();
        let outcome = QuizOutcome::tally(&bank, &[0]);
        assert_eq!(outcome.correct(), 1);
        assert_eq!(outcome.total(), 5);
    }

    #[test]
    fn verdict_bands() {
        let strong = QuizOutcome { correct: 4, total: 5 };
        let decent = QuizOutcome { correct: 2, total: 5 };
        let weak = QuizOutcome { correct: 1, total: 5 };
        assert_eq!(strong.verdict(), QuizVerdict::Strong);
        assert_eq!(decent.verdict(), QuizVerdict::Decent);
        assert_eq!(weak.verdict(), QuizVerdict::KeepStudying);
    }
}
