//! One run of questions in a single mode and tier.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::difficulty::Difficulty;
use crate::error::EarError;
use crate::question::{GameMode, QuizEngine, QuizQuestion};
use crate::scoring::{calculate_accuracy, calculate_score};
use crate::stats::StatUpdate;

/// A correct answer moves on by itself after this long.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_answer: String,
    pub score: u32,
    pub stat_update: StatUpdate,
    /// When set, the caller should call `next_question` after this delay.
    pub auto_advance: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub score: u32,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub accuracy: u32,
    pub best_streak: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionStep {
    Question(QuizQuestion),
    Complete(SessionSummary),
}

pub struct QuizSession {
    quiz: QuizEngine,
    mode: GameMode,
    difficulty: Difficulty,
    questions_per_session: u32,
    current: QuizQuestion,
    question_index: u32,
    score: u32,
    total_questions: u32,
    correct_answers: u32,
    current_streak: u32,
    best_streak: u32,
    has_answered: bool,
    complete: bool,
}

impl QuizSession {
    pub fn start(
        mut quiz: QuizEngine,
        mode: GameMode,
        difficulty: Difficulty,
        questions_per_session: u32,
    ) -> Result<Self, EarError> {
        let current = quiz.generate_question(mode, difficulty)?;
        debug!("Starting {} {} session of {} questions", difficulty, mode, questions_per_session);
        Ok(QuizSession {
            quiz,
            mode,
            difficulty,
            questions_per_session: questions_per_session.max(1),
            current,
            question_index: 0,
            score: 0,
            total_questions: 0,
            correct_answers: 0,
            current_streak: 0,
            best_streak: 0,
            has_answered: false,
            complete: false,
        })
    }

    pub fn current_question(&self) -> &QuizQuestion {
        &self.current
    }

    pub fn question_index(&self) -> u32 {
        self.question_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn has_answered(&self) -> bool {
        self.has_answered
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn submit_answer(&mut self, answer: &str) -> Result<AnswerOutcome, EarError> {
        if self.complete {
            return Err(EarError::SessionComplete);
        }
        if self.has_answered {
            return Err(EarError::AlreadyAnswered);
        }

        let correct = self.current.is_correct(answer);
        self.has_answered = true;
        self.total_questions += 1;
        if correct {
            self.correct_answers += 1;
            self.current_streak += 1;
        } else {
            self.current_streak = 0;
        }
        self.best_streak = self.best_streak.max(self.current_streak);
        self.score = calculate_score(self.correct_answers, self.current_streak, self.difficulty);

        Ok(AnswerOutcome {
            correct,
            correct_answer: self.current.correct_answer.clone(),
            score: self.score,
            stat_update: StatUpdate {
                mode: self.mode,
                was_correct: correct,
                new_streak: self.current_streak,
            },
            auto_advance: correct.then_some(AUTO_ADVANCE_DELAY),
        })
    }

    /// Moves on, answered or not. The caller stops any playback first.
    pub fn next_question(&mut self) -> Result<SessionStep, EarError> {
        if self.complete {
            return Err(EarError::SessionComplete);
        }

        if self.total_questions >= self.questions_per_session {
            self.complete = true;
            self.has_answered = false;
            debug!("Session complete with score {}", self.score);
            return Ok(SessionStep::Complete(self.summary()));
        }

        self.current = self.quiz.generate_question(self.mode, self.difficulty)?;
        self.question_index += 1;
        self.has_answered = false;
        Ok(SessionStep::Question(self.current.clone()))
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            mode: self.mode,
            difficulty: self.difficulty,
            score: self.score,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            accuracy: calculate_accuracy(self.correct_answers, self.total_questions),
            best_streak: self.best_streak,
        }
    }
}
