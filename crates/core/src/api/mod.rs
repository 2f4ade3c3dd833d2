//! Client for the Open Trivia DB question endpoint.

use std::future::Future;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{config::ApiConfig, constants::Difficulty, quiz::Question, Result, TriviaError};

/// Source of quiz questions.
pub trait TriviaApi: Send + Sync {
    /// Fetches `amount` multiple choice questions for a category id.
    fn fetch_questions(
        &self,
        category_id: u32,
        difficulty: Difficulty,
        amount: u32,
    ) -> impl Future<Output = Result<Vec<Question>>> + Send;
}

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    #[serde(default)]
    response_code: Option<u32>,
    results: Vec<Question>,
}

/// [`TriviaApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTriviaClient {
    client: HttpClient,
    base_url: String,
}

impl HttpTriviaClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self::with_client(HttpClient::new(), config.base_url.clone())
    }

    pub fn with_client(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl TriviaApi for HttpTriviaClient {
    async fn fetch_questions(
        &self,
        category_id: u32,
        difficulty: Difficulty,
        amount: u32,
    ) -> Result<Vec<Question>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("amount", amount.to_string()),
                ("category", category_id.to_string()),
                ("difficulty", difficulty.as_str().to_string()),
                ("type", "multiple".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriviaError::network(format!(
                "trivia API responded with {status}"
            )));
        }

        let body = response.bytes().await?;
        let parsed: QuestionsResponse = serde_json::from_slice(&body)?;
        if let Some(code) = parsed.response_code.filter(|code| *code != 0) {
            tracing::warn!(
                code,
                returned = parsed.results.len(),
                "trivia API reported a non-zero response code"
            );
        }

        Ok(parsed.results)
    }
}
