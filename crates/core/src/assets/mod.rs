use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use reqwest::Client as HttpClient;

use crate::{config::AssetConfig, Result, TriviaError};

/// Fetches static assets (images, sounds) by path.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

impl<F: AssetFetcher> AssetFetcher for Arc<F> {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        (**self).fetch(path)
    }
}

/// [`AssetFetcher`] that resolves paths against the static asset server.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: HttpClient,
    base_url: String,
}

impl HttpAssetFetcher {
    pub fn new(config: &AssetConfig) -> Self {
        Self::with_client(HttpClient::new(), config.base_url.clone())
    }

    pub fn with_client(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriviaError::network(format!("{url} responded with {status}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Warms background images so the quiz screen can show them immediately.
#[derive(Debug)]
pub struct ImagePreloader<F> {
    fetcher: F,
    images: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl<F: AssetFetcher> ImagePreloader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            images: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the image at `path` unless it is already cached.
    pub async fn preload_image(&self, path: &str) -> Result<Arc<Vec<u8>>> {
        let cached = self.lock().get(path).cloned();
        if let Some(image) = cached {
            return Ok(image);
        }

        let bytes = Arc::new(self.fetcher.fetch(path).await?);
        self.lock().insert(path.to_string(), bytes.clone());
        tracing::debug!(path, bytes = bytes.len(), "preloaded image");
        Ok(bytes)
    }

    pub fn is_preloaded(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Vec<u8>>>> {
        self.images.lock().unwrap_or_else(PoisonError::into_inner)
    }
}


#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::testing::StaticFetcher;
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_paths() {
        let fetcher = HttpAssetFetcher::with_client(HttpClient::new(), "http://localhost:5173/");
        assert_eq!(
            fetcher.url_for("/images/bkg_film.jpg"),
            "http://localhost:5173/images/bkg_film.jpg"
        );
        assert_eq!(fetcher.url_for("https://cdn.test/a.mp3"), "https://cdn.test/a.mp3");
    }

    #[tokio::test]
    async fn fetches_bytes_over_http() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sounds/correct.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1_u8, 2, 3]))
            .mount(&mock_server)
            .await;

        let fetcher = HttpAssetFetcher::with_client(HttpClient::new(), mock_server.uri());
        assert_eq!(fetcher.fetch("/sounds/correct.mp3").await.unwrap(), vec![1, 2, 3]);

        let err = fetcher.fetch("/sounds/missing.mp3").await.unwrap_err();
        assert!(matches!(err, TriviaError::Network(_)));
    }

    #[tokio::test]
    async fn preloaded_images_are_cached() {
        let fetcher = StaticFetcher::default().with_file("/images/bkg_film.jpg", b"jpg");
        let preloader = ImagePreloader::new(Arc::new(fetcher));

        let first = preloader.preload_image("/images/bkg_film.jpg").await.unwrap();
        let second = preloader.preload_image("/images/bkg_film.jpg").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(preloader.is_preloaded("/images/bkg_film.jpg"));
        assert_eq!(preloader.fetcher.calls(), 1);
    }
}
