//! Core library for the Trivia Quiz application.
//!
//! The crate holds everything except the presentation layer: quiz state and
//! its derived values, the orchestration that fetches questions from the
//! Open Trivia DB and scores answers, the sound effect cache, and the
//! persisted mute flag. State lives in explicit [`Store`] handles that the
//! front end owns and passes around; nothing is a module-level singleton.

pub mod api;
pub mod assets;
pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod mute;
pub mod quiz;
pub mod routing;
pub mod session;
pub mod storage;
pub mod store;

pub use api::{HttpTriviaClient, TriviaApi};
pub use assets::{AssetFetcher, HttpAssetFetcher, ImagePreloader};
pub use audio::{
    AudioBackend, AudioService, ContextState, PlaybackContext, SoundBuffer, SoundEffect,
    SoundState,
};
pub use config::{ApiConfig, AppConfig, AssetConfig, StorageConfig};
pub use constants::{Category, Difficulty, QuestionCount, ANSWER_DISPLAY_DURATION};
pub use error::{Result, TriviaError};
pub use mute::{MuteState, MuteStore};
pub use quiz::{Question, QuizPatch, QuizState, QuizStore};
pub use routing::{category_from_url, quiz_path, QuizRoute};
pub use session::{shuffle_array, QuizLaunch, QuizSession};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{Derived, Store, Subscription};
