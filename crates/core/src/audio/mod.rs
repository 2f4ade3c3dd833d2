//! Sound effects: loading, decode caching and playback.
//!
//! [`AudioService`] owns one lazily created [`PlaybackContext`] and a cache of
//! decoded buffers keyed by the sound's base URL. Sound is best effort, so the
//! playing entry points log failures instead of returning them.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::future::join_all;

use crate::{assets::AssetFetcher, mute::MuteStore, Result, TriviaError};

/// File extensions tried, in order, for every sound.
pub const AUDIO_FORMATS: [&str; 2] = [".mp3", ".wav"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Correct,
    Incorrect,
    QuizEndScreen,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 3] = [
        SoundEffect::Correct,
        SoundEffect::Incorrect,
        SoundEffect::QuizEndScreen,
    ];

    /// File stem of the sound on the asset server.
    pub fn name(self) -> &'static str {
        match self {
            SoundEffect::Correct => "correct",
            SoundEffect::Incorrect => "incorrect",
            SoundEffect::QuizEndScreen => "quizendscreen",
        }
    }
}

impl fmt::Display for SoundEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded, ready to play sample data. Samples are interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundBuffer {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// Platform resource that routes decoded audio to the speakers.
pub trait PlaybackContext: Send + Sync {
    fn state(&self) -> ContextState;
    fn resume(&self) -> Result<()>;
    fn decode(&self, bytes: &[u8]) -> Result<SoundBuffer>;
    /// Starts a one-shot playback of `buffer` immediately without blocking.
    fn play(&self, buffer: Arc<SoundBuffer>) -> Result<()>;
}

/// Creates playback contexts. Called at most once per [`AudioService`].
pub trait AudioBackend: Send + Sync {
    type Context: PlaybackContext;

    fn create_context(&self) -> Result<Self::Context>;
}

/// Load state of a single sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundState {
    NotLoaded,
    Loading,
    Loaded,
    LoadFailed,
}

enum CacheEntry {
    Loading,
    Loaded(Arc<SoundBuffer>),
    Failed,
}

pub struct AudioService<F, B: AudioBackend> {
    fetcher: F,
    backend: B,
    mute: MuteStore,
    sounds_prefix: String,
    context: Mutex<Option<Arc<B::Context>>>,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl<F: AssetFetcher, B: AudioBackend> AudioService<F, B> {
    pub fn new(fetcher: F, backend: B, mute: MuteStore, sounds_prefix: impl Into<String>) -> Self {
        Self {
            fetcher,
            backend,
            mute,
            sounds_prefix: sounds_prefix.into().trim_end_matches('/').to_string(),
            context: Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn mute(&self) -> &MuteStore {
        &self.mute
    }

    /// Base URL of a sound, without extension.
    pub fn sound_url(&self, effect: SoundEffect) -> String {
        format!("{}/{}", self.sounds_prefix, effect.name())
    }

    pub fn sound_state(&self, base_url: &str) -> SoundState {
        match self.lock_cache().get(base_url) {
            None => SoundState::NotLoaded,
            Some(CacheEntry::Loading) => SoundState::Loading,
            Some(CacheEntry::Loaded(_)) => SoundState::Loaded,
            Some(CacheEntry::Failed) => SoundState::LoadFailed,
        }
    }

    pub fn has_context(&self) -> bool {
        self.lock_context().is_some()
    }

    /// Plays `effect` unless muted. Never fails; problems are logged.
    pub async fn play_sound_effect(&self, effect: SoundEffect) {
        if self.mute.is_muted() {
            return;
        }

        if let Err(err) = self.try_play(effect).await {
            tracing::error!(%err, sound = %effect, "error playing sound");
        }
    }

    async fn try_play(&self, effect: SoundEffect) -> Result<()> {
        self.ensure_context()?;
        let buffer = self.load_audio(&self.sound_url(effect)).await?;
        let context = self.ensure_context()?;
        context.play(buffer)
    }

    /// Loads every known sound concurrently. Failures are logged only.
    pub async fn preload_sounds(&self) {
        let urls: Vec<String> = SoundEffect::ALL
            .into_iter()
            .map(|effect| self.sound_url(effect))
            .collect();

        let results = join_all(urls.iter().map(|url| self.load_audio(url))).await;
        for (url, result) in urls.iter().zip(results) {
            if let Err(err) = result {
                tracing::warn!(%err, %url, "error preloading sound");
            }
        }
    }

    /// Returns the decoded buffer for `base_url`, trying each of
    /// [`AUDIO_FORMATS`] in turn on a cache miss.
    pub async fn load_audio(&self, base_url: &str) -> Result<Arc<SoundBuffer>> {
        {
            let mut cache = self.lock_cache();
            if let Some(CacheEntry::Loaded(buffer)) = cache.get(base_url) {
                tracing::debug!(url = base_url, "sound cache hit");
                return Ok(buffer.clone());
            }
            cache.insert(base_url.to_string(), CacheEntry::Loading);
        }

        let mut last_error = None;
        for format in AUDIO_FORMATS {
            let url = format!("{base_url}{format}");
            match self.fetch_and_decode(&url).await {
                Ok(buffer) => {
                    tracing::debug!(%url, "sound loaded");
                    return Ok(self.store_loaded(base_url, buffer));
                }
                Err(err) => {
                    tracing::debug!(%url, %err, "sound format unavailable");
                    last_error = Some(err);
                }
            }
        }

        {
            let mut cache = self.lock_cache();
            // An overlapping load of the same sound may have finished first.
            if let Some(CacheEntry::Loaded(buffer)) = cache.get(base_url) {
                return Ok(buffer.clone());
            }
            cache.insert(base_url.to_string(), CacheEntry::Failed);
        }
        Err(TriviaError::AudioLoad {
            url: base_url.to_string(),
            source: Box::new(
                last_error
                    .unwrap_or_else(|| TriviaError::msg("failed to load audio in any format")),
            ),
        })
    }

    /// Caches `buffer` unless a buffer is already cached, in which case the
    /// cached one is kept and returned.
    fn store_loaded(&self, base_url: &str, buffer: SoundBuffer) -> Arc<SoundBuffer> {
        let mut cache = self.lock_cache();
        if let Some(CacheEntry::Loaded(existing)) = cache.get(base_url) {
            return existing.clone();
        }
        let buffer = Arc::new(buffer);
        cache.insert(base_url.to_string(), CacheEntry::Loaded(buffer.clone()));
        buffer
    }

    async fn fetch_and_decode(&self, url: &str) -> Result<SoundBuffer> {
        let bytes = self.fetcher.fetch(url).await?;
        self.ensure_context()?.decode(&bytes)
    }

    /// Creates the shared context on first use and resumes it whenever it
    /// has been suspended.
    fn ensure_context(&self) -> Result<Arc<B::Context>> {
        let context = {
            let mut slot = self.lock_context();
            match slot.as_ref() {
                Some(context) => context.clone(),
                None => {
                    let context = Arc::new(self.backend.create_context()?);
                    tracing::debug!("created playback context");
                    *slot = Some(context.clone());
                    context
                }
            }
        };

        if context.state() == ContextState::Suspended {
            if let Err(err) = context.resume() {
                tracing::warn!(%err, "could not resume playback context");
            }
        }
        Ok(context)
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_context(&self) -> MutexGuard<'_, Option<Arc<B::Context>>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F, B: AudioBackend> fmt::Debug for AudioService<F, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioService")
            .field("sounds_prefix", &self.sounds_prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{assets::testing::StaticFetcher, storage::MemoryStore};

    #[derive(Debug, Default)]
    struct Counters {
        contexts: AtomicUsize,
        resumes: AtomicUsize,
        plays: AtomicUsize,
    }

    #[derive(Debug, Default, Clone)]
    struct FakeBackend {
        counters: Arc<Counters>,
    }

    struct FakeContext {
        counters: Arc<Counters>,
        state: Mutex<ContextState>,
    }

    impl PlaybackContext for FakeContext {
        fn state(&self) -> ContextState {
            *self.state.lock().unwrap()
        }

        fn resume(&self) -> Result<()> {
            self.counters.resumes.fetch_add(1, Ordering::SeqCst);
            *self.state.lock().unwrap() = ContextState::Running;
            Ok(())
        }

        fn decode(&self, bytes: &[u8]) -> Result<SoundBuffer> {
            if bytes == b"garbage" {
                return Err(TriviaError::msg("unsupported audio data"));
            }
            Ok(SoundBuffer {
                channels: 1,
                sample_rate: 8_000,
                samples: bytes.iter().map(|b| f32::from(*b) / 255.0).collect(),
            })
        }

        fn play(&self, _buffer: Arc<SoundBuffer>) -> Result<()> {
            self.counters.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl AudioBackend for FakeBackend {
        type Context = FakeContext;

        fn create_context(&self) -> Result<FakeContext> {
            self.counters.contexts.fetch_add(1, Ordering::SeqCst);
            Ok(FakeContext {
                counters: self.counters.clone(),
                state: Mutex::new(ContextState::Suspended),
            })
        }
    }

    fn service(
        fetcher: StaticFetcher,
        muted: bool,
    ) -> (AudioService<Arc<StaticFetcher>, FakeBackend>, Arc<StaticFetcher>, Arc<Counters>) {
        let storage = Arc::new(MemoryStore::new());
        let mute = MuteStore::load(storage);
        if muted {
            mute.toggle_mute().unwrap();
        }
        let fetcher = Arc::new(fetcher);
        let backend = FakeBackend::default();
        let counters = backend.counters.clone();
        let service = AudioService::new(fetcher.clone(), backend, mute, "/sounds");
        (service, fetcher, counters)
    }

    fn all_sounds() -> StaticFetcher {
        StaticFetcher::default()
            .with_file("/sounds/correct.mp3", b"ok")
            .with_file("/sounds/incorrect.mp3", b"no")
            .with_file("/sounds/quizendscreen.wav", b"end")
    }

    #[tokio::test]
    async fn second_load_hits_the_cache() {
        let (audio, fetcher, _) = service(all_sounds(), false);

        let first = audio.load_audio("/sounds/correct").await.unwrap();
        let second = audio.load_audio("/sounds/correct").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(audio.sound_state("/sounds/correct"), SoundState::Loaded);
    }

    #[tokio::test]
    async fn falls_back_to_the_next_format() {
        let (audio, fetcher, _) = service(all_sounds(), false);

        let buffer = audio.load_audio("/sounds/quizendscreen").await.unwrap();
        assert_eq!(buffer.samples.len(), 3);
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec!["/sounds/quizendscreen.mp3", "/sounds/quizendscreen.wav"]
        );
    }

    #[tokio::test]
    async fn undecodable_data_falls_back_too() {
        let fetcher = StaticFetcher::default()
            .with_file("/sounds/correct.mp3", b"garbage")
            .with_file("/sounds/correct.wav", b"fine");
        let (audio, _, _) = service(fetcher, false);

        let buffer = audio.load_audio("/sounds/correct").await.unwrap();
        assert_eq!(buffer.samples.len(), 4);
    }

    #[tokio::test]
    async fn exhausted_formats_report_the_last_error() {
        let (audio, fetcher, _) = service(StaticFetcher::default(), false);

        let err = audio.load_audio("/sounds/missing").await.unwrap_err();
        match err {
            TriviaError::AudioLoad { url, source } => {
                assert_eq!(url, "/sounds/missing");
                assert!(source.to_string().contains("missing.wav"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(audio.sound_state("/sounds/missing"), SoundState::LoadFailed);
    }

    #[tokio::test]
    async fn muted_service_does_nothing() {
        let (audio, fetcher, counters) = service(all_sounds(), true);

        audio.play_sound_effect(SoundEffect::Correct).await;

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(counters.contexts.load(Ordering::SeqCst), 0);
        assert!(!audio.has_context());
    }

    #[tokio::test]
    async fn plays_share_one_context_and_resume_it() {
        let (audio, fetcher, counters) = service(all_sounds(), false);

        audio.play_sound_effect(SoundEffect::Correct).await;
        audio.play_sound_effect(SoundEffect::Correct).await;

        assert_eq!(counters.contexts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.resumes.load(Ordering::SeqCst), 1);
        assert_eq!(counters.plays.load(Ordering::SeqCst), 2);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn playback_failures_are_swallowed() {
        let (audio, _, counters) = service(StaticFetcher::default(), false);

        audio.play_sound_effect(SoundEffect::Incorrect).await;

        assert_eq!(counters.plays.load(Ordering::SeqCst), 0);
        assert_eq!(audio.sound_state("/sounds/incorrect"), SoundState::LoadFailed);
    }

    #[tokio::test]
    async fn preload_is_best_effort() {
        let fetcher = StaticFetcher::default().with_file("/sounds/correct.wav", b"ok");
        let (audio, _, counters) = service(fetcher, false);

        audio.preload_sounds().await;

        assert_eq!(audio.sound_state("/sounds/correct"), SoundState::Loaded);
        assert_eq!(audio.sound_state("/sounds/incorrect"), SoundState::LoadFailed);
        assert_eq!(audio.sound_state("/sounds/quizendscreen"), SoundState::LoadFailed);
        assert_eq!(counters.plays.load(Ordering::SeqCst), 0);
    }

    /// Fetcher that answers each request with the next scripted response,
    /// optionally after a delay.
    struct ScriptedFetcher {
        responses: Mutex<Vec<(u64, Option<&'static [u8]>)>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(mut responses: Vec<(u64, Option<&'static [u8]>)>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AssetFetcher for ScriptedFetcher {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop();
            let (delay_ms, body) = next.unwrap_or((0, None));
            if delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }
            body.map(<[u8]>::to_vec)
                .ok_or_else(|| TriviaError::network(format!("{path} responded with 404 Not Found")))
        }
    }

    fn scripted(
        responses: Vec<(u64, Option<&'static [u8]>)>,
    ) -> AudioService<Arc<ScriptedFetcher>, FakeBackend> {
        let mute = MuteStore::load(Arc::new(MemoryStore::new()));
        let fetcher = Arc::new(ScriptedFetcher::new(responses));
        AudioService::new(fetcher, FakeBackend::default(), mute, "/sounds")
    }

    #[tokio::test]
    async fn slow_failure_does_not_evict_a_cached_buffer() {
        // slow mp3 fails, fast mp3 succeeds, slow wav fails
        let audio = scripted(vec![(20, None), (0, Some(&b"ok"[..])), (0, None)]);

        let (slow, fast) = futures::future::join(
            audio.load_audio("/sounds/correct"),
            audio.load_audio("/sounds/correct"),
        )
        .await;

        let fast = fast.unwrap();
        assert!(Arc::ptr_eq(&slow.unwrap(), &fast));
        assert_eq!(audio.sound_state("/sounds/correct"), SoundState::Loaded);

        let calls = audio.fetcher.calls.load(Ordering::SeqCst);
        let third = audio.load_audio("/sounds/correct").await.unwrap();
        assert!(Arc::ptr_eq(&third, &fast));
        assert_eq!(audio.fetcher.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn slow_success_keeps_the_first_cached_buffer() {
        let audio = scripted(vec![(20, Some(&b"slow"[..])), (0, Some(&b"fast"[..]))]);

        let (slow, fast) = futures::future::join(
            audio.load_audio("/sounds/incorrect"),
            audio.load_audio("/sounds/incorrect"),
        )
        .await;

        let fast = fast.unwrap();
        assert_eq!(fast.samples.len(), 4);
        assert!(Arc::ptr_eq(&slow.unwrap(), &fast));
        let cached = audio.load_audio("/sounds/incorrect").await.unwrap();
        assert!(Arc::ptr_eq(&cached, &fast));
    }
}
