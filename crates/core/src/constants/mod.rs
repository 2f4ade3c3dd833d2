//! Static tables shared by the quiz and the front end.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Result, TriviaError};

/// How long the front end keeps a revealed answer on screen.
pub const ANSWER_DISPLAY_DURATION: Duration = Duration::from_millis(1000);

/// Background shown when no category is selected or the category is unknown.
pub const DEFAULT_BACKGROUND_IMAGE: &str = "/images/bkg_main.jpg";

/// Quiz categories offered by the application, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Film,
    Music,
    Sports,
    History,
    Vehicles,
    Geography,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Film,
        Category::Music,
        Category::Sports,
        Category::History,
        Category::Vehicles,
        Category::Geography,
    ];

    /// Lowercase key used by the category tables.
    pub fn key(self) -> &'static str {
        match self {
            Category::Film => "film",
            Category::Music => "music",
            Category::Sports => "sports",
            Category::History => "history",
            Category::Vehicles => "vehicles",
            Category::Geography => "geography",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Film => "Film",
            Category::Music => "Music",
            Category::Sports => "Sports",
            Category::History => "History",
            Category::Vehicles => "Vehicles",
            Category::Geography => "Geography",
        }
    }

    /// Numeric id of the category on the remote trivia API.
    pub fn id(self) -> u32 {
        match self {
            Category::Film => 11,
            Category::Music => 12,
            Category::Sports => 21,
            Category::Geography => 22,
            Category::History => 23,
            Category::Vehicles => 28,
        }
    }

    /// Reverse of [`Category::id`].
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.id() == id)
    }

    pub fn background_image(self) -> &'static str {
        match self {
            Category::Film => "/images/bkg_film.jpg",
            Category::Music => "/images/bkg_music.png",
            Category::Sports => "/images/bkg_sports.jpg",
            Category::Geography => "/images/bkg_geography.jpg",
            Category::History => "/images/bkg_history.jpg",
            Category::Vehicles => "/images/bkg_vehicles.jpg",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = TriviaError;

    /// Accepts either the label or the table key, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| TriviaError::validation(format!("unknown quiz category `{s}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Value sent to the remote API and written into navigation paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = TriviaError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| TriviaError::validation(format!("unknown difficulty `{s}`")))
    }
}

/// Number of questions per quiz. Only the sizes in [`QuestionCount::ALL`]
/// can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct QuestionCount(u32);

impl QuestionCount {
    pub const ALL: [QuestionCount; 3] = [QuestionCount(5), QuestionCount(10), QuestionCount(15)];

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for QuestionCount {
    type Error = TriviaError;

    fn try_from(value: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|count| count.0 == value)
            .ok_or_else(|| {
                TriviaError::validation(format!(
                    "unsupported question count {value}, expected one of 5, 10 or 15"
                ))
            })
    }
}

impl From<QuestionCount> for u32 {
    fn from(value: QuestionCount) -> Self {
        value.0
    }
}

impl fmt::Display for QuestionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuestionCount {
    type Err = TriviaError;

    fn from_str(s: &str) -> Result<Self> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| TriviaError::validation(format!("invalid question count `{s}`")))?;
        Self::try_from(value)
    }
}

/// Background image for a category key, falling back to the default image.
pub fn background_image_for(category: Option<&str>) -> &'static str {
    category
        .and_then(|name| name.parse::<Category>().ok())
        .map(Category::background_image)
        .unwrap_or(DEFAULT_BACKGROUND_IMAGE)
}
