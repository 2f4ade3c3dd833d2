//! Quiz orchestration: validating selections, loading questions and scoring
//! answers against the shared [`QuizStore`].

use std::fmt;

use futures::future::{join, BoxFuture};
use rand::Rng;

use crate::{
    api::TriviaApi,
    assets::{AssetFetcher, ImagePreloader},
    constants::{background_image_for, Category, Difficulty, QuestionCount},
    quiz::{QuizPatch, QuizStore, Question},
    routing::QuizRoute,
    Result, TriviaError,
};

const MISSING_SELECTION: &str =
    "Please select a category, difficulty level, and number of questions.";

/// Returns a shuffled copy of `items` (Fisher–Yates). The input is untouched.
pub fn shuffle_array<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for current in (1..shuffled.len()).rev() {
        let other = rng.gen_range(0..=current);
        shuffled.swap(current, other);
    }
    shuffled
}

/// Result of [`QuizSession::start_quiz`]: where to navigate, plus the work
/// that has to finish before the quiz screen can render.
pub struct QuizLaunch<'a> {
    pub path: String,
    pub route: QuizRoute,
    loading: BoxFuture<'a, Result<Vec<Question>>>,
}

impl<'a> QuizLaunch<'a> {
    /// Waits for the question fetch and the background preload, which run
    /// concurrently. Both always run to completion; the fetch error is
    /// reported first, then the preload error. Nothing is rolled back.
    pub async fn load(self) -> Result<Vec<Question>> {
        self.loading.await
    }
}

impl fmt::Debug for QuizLaunch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizLaunch")
            .field("path", &self.path)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

pub struct QuizSession<A, F> {
    store: QuizStore,
    api: A,
    images: ImagePreloader<F>,
}

impl<A: TriviaApi, F: AssetFetcher> QuizSession<A, F> {
    pub fn new(store: QuizStore, api: A, fetcher: F) -> Self {
        Self {
            store,
            api,
            images: ImagePreloader::new(fetcher),
        }
    }

    pub fn store(&self) -> &QuizStore {
        &self.store
    }

    pub fn images(&self) -> &ImagePreloader<F> {
        &self.images
    }

    /// Validates the raw selections and prepares the quiz.
    ///
    /// Fails before any request is made when a selection is missing or not
    /// one of the known values.
    pub fn start_quiz(
        &self,
        category: Option<&str>,
        difficulty: Option<&str>,
        question_count: Option<u32>,
    ) -> Result<QuizLaunch<'_>> {
        let (Some(category), Some(difficulty), Some(question_count)) = (
            category.filter(|s| !s.trim().is_empty()),
            difficulty.filter(|s| !s.trim().is_empty()),
            question_count.filter(|n| *n != 0),
        ) else {
            return Err(TriviaError::validation(MISSING_SELECTION));
        };

        let route = QuizRoute {
            category: category.parse::<Category>()?,
            difficulty: difficulty.parse::<Difficulty>()?,
            question_count: QuestionCount::try_from(question_count)?,
        };
        Ok(self.launch(route))
    }

    /// Prepares an already validated quiz, e.g. one parsed from a route.
    pub fn launch(&self, route: QuizRoute) -> QuizLaunch<'_> {
        self.store.update_quiz_state(QuizPatch {
            selected_category: Some(Some(route.category)),
            selected_difficulty: Some(Some(route.difficulty)),
            selected_question_count: Some(Some(route.question_count)),
            ..Default::default()
        });

        let path = route.path();
        tracing::info!(%path, category = %route.category, "starting quiz");

        let loading = Box::pin(async move {
            let (questions, image) = join(
                self.fetch_quiz_data(
                    route.category.id(),
                    route.difficulty,
                    route.question_count.get(),
                ),
                self.images.preload_image(route.category.background_image()),
            )
            .await;
            let questions = questions?;
            image?;
            Ok(questions)
        });

        QuizLaunch {
            path,
            route,
            loading,
        }
    }

    /// Fetches questions and stores them, replacing any previous quiz.
    pub async fn fetch_quiz_data(
        &self,
        category_id: u32,
        difficulty: Difficulty,
        count: u32,
    ) -> Result<Vec<Question>> {
        match self.api.fetch_questions(category_id, difficulty, count).await {
            Ok(questions) => {
                self.store.update_quiz_state(QuizPatch {
                    questions: Some(questions.clone()),
                    loading: Some(false),
                    ..Default::default()
                });
                Ok(questions)
            }
            Err(err) => {
                tracing::error!(%err, category_id, "failed to fetch questions");
                Err(err)
            }
        }
    }

    /// Scores `answer` against the current question. Does not advance.
    pub fn handle_answer(&self, answer: &str) -> bool {
        let mut is_correct = false;
        self.store.update(|state| {
            is_correct = state
                .current_question()
                .is_some_and(|question| question.is_correct(answer));
            if is_correct {
                state.score += 1;
            }
            state.selected_answer = Some(answer.to_string());
            state.is_answer_correct = Some(is_correct);
        });
        is_correct
    }

    /// Moves to the next question and clears the previous answer. Returns
    /// false when already on the last question.
    pub fn advance(&self) -> bool {
        let mut moved = false;
        self.store.update(|state| {
            if state.current_question_index + 1 < state.questions.len() {
                state.current_question_index += 1;
                state.selected_answer = None;
                state.is_answer_correct = None;
                moved = true;
            }
        });
        moved
    }

    pub fn reset_quiz(&self) {
        self.store.reset_quiz();
    }

    pub fn get_quiz_background_image(&self, category: Option<&str>) -> &'static str {
        background_image_for(category)
    }
}

impl<A, F> fmt::Debug for QuizSession<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
