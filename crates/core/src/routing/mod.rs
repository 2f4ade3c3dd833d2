//! Navigation paths shared with the front end.

use url::Url;

use crate::{
    constants::{Category, Difficulty, QuestionCount},
    Result, TriviaError,
};

/// Route of the quiz screen.
pub const QUIZ_ROUTE: &str = "/quiz";

/// Builds `/quiz?category=<id>&difficulty=<difficulty>&questions=<count>`.
pub fn quiz_path(category_id: u32, difficulty: Difficulty, count: QuestionCount) -> String {
    format!("{QUIZ_ROUTE}?category={category_id}&difficulty={difficulty}&questions={count}")
}

/// Parameters recovered from a quiz navigation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizRoute {
    pub category: Category,
    pub difficulty: Difficulty,
    pub question_count: QuestionCount,
}

impl QuizRoute {
    pub fn path(&self) -> String {
        quiz_path(self.category.id(), self.difficulty, self.question_count)
    }

    /// Parses a path produced by [`quiz_path`]. Absolute URLs are accepted too.
    pub fn parse(path: &str) -> Result<Self> {
        let url = parse_location(path)?;
        if url.path() != QUIZ_ROUTE {
            return Err(TriviaError::validation(format!(
                "`{path}` is not a quiz route"
            )));
        }

        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .ok_or_else(|| TriviaError::validation(format!("quiz route is missing `{name}`")))
        };

        let category_id: u32 = param("category")?
            .parse()
            .map_err(|_| TriviaError::validation("quiz route has a non-numeric category"))?;
        let category = Category::from_id(category_id).ok_or_else(|| {
            TriviaError::validation(format!("unknown category id {category_id}"))
        })?;

        Ok(Self {
            category,
            difficulty: param("difficulty")?.parse()?,
            question_count: param("questions")?.parse()?,
        })
    }
}

/// Page-load hook: the raw `category` query parameter of `location`, if any.
pub fn category_from_url(location: &str) -> Option<String> {
    let url = parse_location(location).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "category")
        .map(|(_, value)| value.into_owned())
}

fn parse_location(location: &str) -> Result<Url> {
    let base = Url::parse("http://localhost/").map_err(|err| TriviaError::msg(err.to_string()))?;
    base.join(location)
        .map_err(|err| TriviaError::validation(format!("invalid location `{location}`: {err}")))
}
