//! Asynchronous sample loader.
//!
//! Loads single samples or whole lists of samples concurrently. Every
//! `load_buffer_list` call is tracked by its own [`DownloadQueue`]; the call
//! completes once each requested URL has either decoded or failed.

pub mod fetch;
pub mod queue;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;

use crate::decode::decode_audio;
use crate::descriptor::LoaderConfig;
use crate::dsp::buffer::AudioBuffer;
use crate::error::LoadError;

pub use fetch::{DataUrlFetcher, DefaultFetcher, Fetch, FileFetcher, HttpFetcher};
pub use queue::{BatchId, DownloadQueue, DownloadQueues, QueueStatus};

// ── Keys & URL lists ────────────────────────────────────────

/// Position of a buffer in a list: an index for sequential lists, a name
/// for keyed ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferKey {
    Index(usize),
    Name(String),
}

impl fmt::Display for BufferKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKey::Index(i) => write!(f, "{i}"),
            BufferKey::Name(name) => f.write_str(name),
        }
    }
}

/// URLs to load, either by position or by name.
#[derive(Debug, Clone, PartialEq)]
pub enum UrlList {
    Sequential(Vec<String>),
    /// Name/URL pairs; order is preserved in the resulting [`BufferList`].
    Keyed(Vec<(String, String)>),
}

impl UrlList {
    pub fn len(&self) -> usize {
        match self {
            UrlList::Sequential(urls) => urls.len(),
            UrlList::Keyed(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_entries(self) -> Vec<(BufferKey, String)> {
        match self {
            UrlList::Sequential(urls) => urls
                .into_iter()
                .enumerate()
                .map(|(i, url)| (BufferKey::Index(i), url))
                .collect(),
            UrlList::Keyed(pairs) => pairs
                .into_iter()
                .map(|(name, url)| (BufferKey::Name(name), url))
                .collect(),
        }
    }
}

impl From<Vec<String>> for UrlList {
    fn from(urls: Vec<String>) -> Self {
        UrlList::Sequential(urls)
    }
}

impl From<Vec<&str>> for UrlList {
    fn from(urls: Vec<&str>) -> Self {
        UrlList::Sequential(urls.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for UrlList {
    fn from(urls: [&str; N]) -> Self {
        UrlList::Sequential(urls.into_iter().map(String::from).collect())
    }
}

impl From<Vec<(String, String)>> for UrlList {
    fn from(pairs: Vec<(String, String)>) -> Self {
        UrlList::Keyed(pairs)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for UrlList {
    fn from(pairs: [(&str, &str); N]) -> Self {
        UrlList::Keyed(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for UrlList {
    fn from(map: BTreeMap<String, String>) -> Self {
        UrlList::Keyed(map.into_iter().collect())
    }
}

impl From<HashMap<String, String>> for UrlList {
    fn from(map: HashMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = map.into_iter().collect();
        pairs.sort();
        UrlList::Keyed(pairs)
    }
}

// ── Results ─────────────────────────────────────────────────

/// Reported once per URL as it resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub url: String,
    pub key: BufferKey,
    pub success: bool,
}

/// Buffers produced by one `load_buffer_list` call, in request order.
/// Failed entries hold `None`.
#[derive(Debug, Clone, Default)]
pub struct BufferList {
    slots: Vec<(BufferKey, Option<AudioBuffer>)>,
}

impl BufferList {
    fn with_keys(keys: impl IntoIterator<Item = BufferKey>) -> Self {
        BufferList {
            slots: keys.into_iter().map(|k| (k, None)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: &BufferKey) -> Option<&AudioBuffer> {
        self.slots
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, b)| b.as_ref())
    }

    /// Buffer at position `i` of a sequential list.
    pub fn index(&self, i: usize) -> Option<&AudioBuffer> {
        self.get(&BufferKey::Index(i))
    }

    /// Buffer stored under `name` in a keyed list.
    pub fn name(&self, name: &str) -> Option<&AudioBuffer> {
        self.slots
            .iter()
            .find(|(k, _)| matches!(k, BufferKey::Name(n) if n == name))
            .and_then(|(_, b)| b.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BufferKey, Option<&AudioBuffer>)> {
        self.slots.iter().map(|(k, b)| (k, b.as_ref()))
    }

    /// Number of entries that decoded successfully.
    pub fn loaded(&self) -> usize {
        self.slots.iter().filter(|(_, b)| b.is_some()).count()
    }

    /// Keys of entries that failed to fetch or decode.
    pub fn failed(&self) -> Vec<&BufferKey> {
        self.slots
            .iter()
            .filter(|(_, b)| b.is_none())
            .map(|(k, _)| k)
            .collect()
    }
}

// ── Loader ──────────────────────────────────────────────────

/// Loads and decodes audio samples through a [`Fetch`] implementation.
pub struct BufferLoader<F: Fetch> {
    fetcher: F,
    config: LoaderConfig,
    queues: Mutex<DownloadQueues>,
}

impl BufferLoader<DefaultFetcher> {
    /// Loader for HTTP(S), `file://`/plain paths and `data:` URLs.
    pub fn with_default_fetcher(config: LoaderConfig) -> Result<Self, LoadError> {
        let fetcher = DefaultFetcher::new(&config)?;
        Ok(BufferLoader::new(fetcher, config))
    }
}

impl<F: Fetch> BufferLoader<F> {
    pub fn new(fetcher: F, config: LoaderConfig) -> Self {
        BufferLoader {
            fetcher,
            config,
            queues: Mutex::new(DownloadQueues::default()),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Fetch and decode a single sample.
    pub async fn load_buffer(&self, url: &str) -> Result<AudioBuffer, LoadError> {
        let bytes = self.fetcher.fetch(url).await?;

        let owned = url.to_string();
        let decoded = tokio::task::spawn_blocking(move || decode_audio(&bytes))
            .await
            .map_err(|_| LoadError::Aborted { url: owned })?;

        match decoded {
            Ok(buffer) => {
                tracing::debug!(
                    url,
                    sample_rate = buffer.sample_rate,
                    channels = buffer.channels,
                    frames = buffer.frames(),
                    "Decoded sample"
                );
                Ok(buffer)
            }
            Err(source) => Err(LoadError::Decode {
                url: url.to_string(),
                source,
            }),
        }
    }

    /// Load every URL in `urls` concurrently.
    ///
    /// `on_load` runs once per URL as it resolves. The returned list holds
    /// `None` for entries that failed; a failure never aborts the batch.
    pub async fn load_buffer_list<C>(&self, urls: impl Into<UrlList>, mut on_load: C) -> BufferList
    where
        C: FnMut(&LoadResult),
    {
        let entries = urls.into().into_entries();
        let mut list = BufferList::with_keys(entries.iter().map(|(k, _)| k.clone()));
        let batch = self.lock_queues().open(entries.clone());
        // Removes the queue if this future is dropped or `on_load` panics
        let _guard = BatchGuard {
            queues: &self.queues,
            batch,
        };

        if entries.is_empty() {
            tracing::debug!(%batch, "Empty sample list");
            return list;
        }
        tracing::debug!(%batch, size = entries.len(), "Loading sample list");

        let mut results = std::pin::pin!(
            stream::iter(entries.into_iter().enumerate())
                .map(|(slot, (key, url))| async move {
                    let result = self.load_buffer(&url).await;
                    (slot, key, url, result)
                })
                .buffer_unordered(self.config.max_concurrent.max(1))
        );

        while let Some((slot, key, url, result)) = results.next().await {
            let success = result.is_ok();
            match result {
                Ok(buffer) => list.slots[slot].1 = Some(buffer),
                Err(e) => tracing::warn!(%batch, %key, error = %e, "Sample failed to load"),
            }

            on_load(&LoadResult { url, key, success });

            let status = self.lock_queues().record(batch);
            match status {
                QueueStatus::Finished { size } => {
                    tracing::info!(%batch, size, loaded = list.loaded(), "Finished loading samples");
                }
                QueueStatus::Pending { loaded, size } => {
                    tracing::trace!(%batch, loaded, size, "Sample list progress");
                }
                QueueStatus::Unknown => {}
            }
        }

        list
    }

    /// Callback-style [`BufferLoader::load_buffer_list`] on a spawned task.
    /// `on_finished` receives the completed list.
    pub fn spawn_buffer_list<C, D>(
        self: &Arc<Self>,
        urls: impl Into<UrlList>,
        on_finished: D,
        on_load: C,
    ) -> JoinHandle<()>
    where
        C: FnMut(&LoadResult) + Send + 'static,
        D: FnOnce(BufferList) + Send + 'static,
    {
        let loader = Arc::clone(self);
        let urls = urls.into();
        tokio::spawn(async move {
            let list = loader.load_buffer_list(urls, on_load).await;
            on_finished(list);
        })
    }

    /// Batches still waiting on at least one URL.
    pub fn pending_batches(&self) -> Vec<BatchId> {
        self.lock_queues().pending()
    }

    /// `(loaded, size)` of an in-flight batch.
    pub fn progress(&self, batch: BatchId) -> Option<(usize, usize)> {
        self.lock_queues().progress(batch)
    }

    fn lock_queues(&self) -> MutexGuard<'_, DownloadQueues> {
        lock(&self.queues)
    }
}

/// Closes a batch's queue when `load_buffer_list` exits, however it exits.
/// Finished batches are already gone, so closing them again is a no-op.
struct BatchGuard<'a> {
    queues: &'a Mutex<DownloadQueues>,
    batch: BatchId,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if let Some(queue) = lock(self.queues).close(self.batch) {
            if queue.loaded < queue.size {
                tracing::debug!(
                    batch = %self.batch,
                    loaded = queue.loaded,
                    size = queue.size,
                    "Sample list cancelled"
                );
            }
        }
    }
}

fn lock(queues: &Mutex<DownloadQueues>) -> MutexGuard<'_, DownloadQueues> {
    // Bookkeeping stays consistent even if a callback panicked mid-batch
    queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
