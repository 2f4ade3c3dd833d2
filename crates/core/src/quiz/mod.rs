//! Quiz progress state and the values derived from it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{Category, Difficulty, QuestionCount},
    session::shuffle_array,
    store::{Derived, Store},
    Subscription,
};

/// A multiple choice question as returned by the trivia API.
///
/// Fields the application does not use are kept in `extra` and serialized
/// back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Question {
    /// Correct and incorrect answers together, in random order.
    pub fn shuffled_answers<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut answers = Vec::with_capacity(self.incorrect_answers.len() + 1);
        answers.push(self.correct_answer.clone());
        answers.extend(self.incorrect_answers.iter().cloned());
        shuffle_array(&answers, rng)
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizState {
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub score: u32,
    pub loading: bool,
    pub selected_category: Option<Category>,
    pub selected_difficulty: Option<Difficulty>,
    pub selected_question_count: Option<QuestionCount>,
    pub selected_answer: Option<String>,
    pub is_answer_correct: Option<bool>,
}

impl Default for QuizState {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            current_question_index: 0,
            score: 0,
            loading: true,
            selected_category: None,
            selected_difficulty: None,
            selected_question_count: None,
            selected_answer: None,
            is_answer_correct: None,
        }
    }
}

impl QuizState {
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    /// True once the last question is showing. A quiz without questions has
    /// not started and is therefore not complete.
    pub fn is_quiz_complete(&self) -> bool {
        !self.questions.is_empty() && self.current_question_index + 1 >= self.questions.len()
    }

    pub fn score_percentage(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        f64::from(self.score) / self.questions.len() as f64 * 100.0
    }

    pub fn can_start_quiz(&self) -> bool {
        self.selected_category.is_some()
            && self.selected_difficulty.is_some()
            && self.selected_question_count.is_some()
    }
}

/// Partial update merged into [`QuizState`] by [`QuizStore::update_quiz_state`].
///
/// `None` leaves a field untouched. Nullable fields use a nested option so a
/// patch can clear them with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizPatch {
    pub questions: Option<Vec<Question>>,
    pub current_question_index: Option<usize>,
    pub score: Option<u32>,
    pub loading: Option<bool>,
    pub selected_category: Option<Option<Category>>,
    pub selected_difficulty: Option<Option<Difficulty>>,
    pub selected_question_count: Option<Option<QuestionCount>>,
    pub selected_answer: Option<Option<String>>,
    pub is_answer_correct: Option<Option<bool>>,
}

impl QuizPatch {
    pub fn apply(self, state: &mut QuizState) {
        if let Some(questions) = self.questions {
            state.questions = questions;
        }
        if let Some(index) = self.current_question_index {
            state.current_question_index = index;
        }
        if let Some(score) = self.score {
            state.score = score;
        }
        if let Some(loading) = self.loading {
            state.loading = loading;
        }
        if let Some(category) = self.selected_category {
            state.selected_category = category;
        }
        if let Some(difficulty) = self.selected_difficulty {
            state.selected_difficulty = difficulty;
        }
        if let Some(count) = self.selected_question_count {
            state.selected_question_count = count;
        }
        if let Some(answer) = self.selected_answer {
            state.selected_answer = answer;
        }
        if let Some(correct) = self.is_answer_correct {
            state.is_answer_correct = correct;
        }
    }
}

/// Observable [`QuizState`] plus its derived values.
#[derive(Clone)]
pub struct QuizStore {
    state: Store<QuizState>,
    current_question: Derived<Option<Question>>,
    is_quiz_complete: Derived<bool>,
    score_percentage: Derived<f64>,
    can_start_quiz: Derived<bool>,
}

impl Default for QuizStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizStore {
    pub fn new() -> Self {
        Self::with_state(QuizState::default())
    }

    pub fn with_state(state: QuizState) -> Self {
        let state = Store::new(state);
        Self {
            current_question: state.derive(|s: &QuizState| s.current_question().cloned()),
            is_quiz_complete: state.derive(QuizState::is_quiz_complete),
            score_percentage: state.derive(QuizState::score_percentage),
            can_start_quiz: state.derive(QuizState::can_start_quiz),
            state,
        }
    }

    pub fn get(&self) -> QuizState {
        self.state.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&QuizState) -> R) -> R {
        self.state.with(f)
    }

    pub fn subscribe(&self, f: impl Fn(&QuizState) + Send + Sync + 'static) -> Subscription {
        self.state.subscribe(f)
    }

    /// Shallow merge, last write wins, no validation.
    pub fn update_quiz_state(&self, patch: QuizPatch) {
        self.state.update(|state| patch.apply(state));
    }

    /// Mutates the state in place; used where a patch would need a prior read.
    pub fn update(&self, f: impl FnOnce(&mut QuizState)) {
        self.state.update(f);
    }

    pub fn set_quiz_category(&self, category: Option<Category>) {
        self.update_quiz_state(QuizPatch {
            selected_category: Some(category),
            ..Default::default()
        });
    }

    pub fn reset_quiz(&self) {
        self.state.set(QuizState::default());
    }

    pub fn current_question(&self) -> Option<Question> {
        self.current_question.get()
    }

    pub fn is_quiz_complete(&self) -> bool {
        self.is_quiz_complete.get()
    }

    pub fn score_percentage(&self) -> f64 {
        self.score_percentage.get()
    }

    pub fn can_start_quiz(&self) -> bool {
        self.can_start_quiz.get()
    }
}

impl std::fmt::Debug for QuizStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizStore").field("state", &self.get()).finish()
    }
}

#[cfg(test)]
pub(crate) fn question(correct: &str, incorrect: &[&str]) -> Question {
    Question {
        category: "Geography".to_string(),
        question: Some(format!("Which one is {correct}?")),
        correct_answer: correct.to_string(),
        incorrect_answers: incorrect.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}
