//! Background favicon fetching.
//!
//! A fixed pool of threads drains a shared job channel. Callers enqueue and
//! return immediately; each job is attempted once and a failure only leaves the
//! bookmark without an icon.

use crate::db::TreeStore;
use crate::error::Result;
use crate::favicon::{self, FaviconMode};
use crate::fetch::IconProvider;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

#[derive(Debug)]
struct EnrichJob {
    bookmark_id: usize,
    url: String,
}

#[derive(Debug, Default)]
struct Counters {
    updated: AtomicUsize,
    failed: AtomicUsize,
}

/// Outcome of the jobs processed so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    pub updated: usize,
    pub failed: usize,
}

pub struct IconEnricher {
    sender: Option<Sender<EnrichJob>>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

/// Fetch one icon and store it on the bookmark
pub fn fetch_and_store(
    store: &TreeStore,
    provider: &dyn IconProvider,
    bookmark_id: usize,
    url: &str,
    mode: FaviconMode,
) -> Result<()> {
    let icon = provider.fetch_icon(url)?;
    let encoded = favicon::encode(&icon.content_type, &icon.bytes, mode);
    store.update_bookmark_favicon(bookmark_id, &encoded)?;
    log::debug!(
        "Stored {} byte {} icon for bookmark {}",
        icon.bytes.len(),
        icon.content_type,
        bookmark_id
    );
    Ok(())
}

impl IconEnricher {
    pub fn start(
        store: Arc<TreeStore>,
        provider: Arc<dyn IconProvider>,
        workers: usize,
        mode: FaviconMode,
    ) -> Self {
        let (tx, rx) = channel::<EnrichJob>();
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());
        let workers = workers.max(1);
        log::debug!("Starting {} icon enrichment worker(s)", workers);

        let handles = (0..workers)
            .map(|_| {
                let rx = Arc::clone(&rx);
                let store = Arc::clone(&store);
                let provider = Arc::clone(&provider);
                let counters = Arc::clone(&counters);
                thread::spawn(move || worker_loop(&rx, &store, provider.as_ref(), &counters, mode))
            })
            .collect();

        Self {
            sender: Some(tx),
            workers: handles,
            counters,
        }
    }

    /// Queue a bookmark for icon fetching. Returns false once the pool is gone.
    pub fn enqueue(&self, bookmark_id: usize, url: &str) -> bool {
        let job = EnrichJob {
            bookmark_id,
            url: url.to_string(),
        };
        match &self.sender {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }

    /// Queue every bookmark that has no icon yet
    pub fn enqueue_missing(&self, store: &TreeStore) -> Result<usize> {
        let mut queued = 0;
        for bookmark in store.list_bookmarks_missing_favicon()? {
            if self.enqueue(bookmark.id, &bookmark.url) {
                queued += 1;
            }
        }
        log::info!("Queued {} bookmark(s) for icon enrichment", queued);
        Ok(queued)
    }

    pub fn report(&self) -> EnrichReport {
        EnrichReport {
            updated: self.counters.updated.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Close the queue and wait until every queued job has been attempted
    pub fn shutdown(mut self) -> EnrichReport {
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::warn!("Icon enrichment worker panicked");
            }
        }
        self.report()
    }
}

fn worker_loop(
    rx: &Mutex<Receiver<EnrichJob>>,
    store: &TreeStore,
    provider: &dyn IconProvider,
    counters: &Counters,
    mode: FaviconMode,
) {
    loop {
        let job = {
            let lock = rx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match lock.recv() {
                Ok(job) => job,
                Err(_) => break, // Channel closed and empty
            }
        };

        match fetch_and_store(store, provider, job.bookmark_id, &job.url, mode) {
            Ok(()) => {
                counters.updated.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                log::warn!(
                    "No icon for bookmark {} ({}): {}",
                    job.bookmark_id,
                    job.url,
                    e
                );
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BkmError;
    use crate::fetch::IconData;
    use std::collections::HashSet;

    /// Answers with a fixed icon, except for urls containing "broken"
    struct FakeProvider {
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl IconProvider for FakeProvider {
        fn fetch_icon(&self, url: &str) -> Result<IconData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("broken") {
                return Err(BkmError::Icon(format!("no icon for {}", url)));
            }
            Ok(IconData {
                content_type: "image/x-icon".to_string(),
                bytes: vec![0, 1, 2],
            })
        }
    }

    fn store() -> Arc<TreeStore> {
        Arc::new(TreeStore::init_in_memory().unwrap())
    }

    #[test]
    fn test_enqueue_updates_favicon() {
        let store = store();
        let id = store.create_bookmark("Go", "https://golang.org/", None).unwrap();
        let provider = Arc::new(FakeProvider::new());

        let enricher = IconEnricher::start(
            Arc::clone(&store),
            provider.clone(),
            2,
            FaviconMode::DataUri,
        );
        assert!(enricher.enqueue(id, "https://golang.org/"));
        let report = enricher.shutdown();

        assert_eq!(report, EnrichReport { updated: 1, failed: 0 });
        assert_eq!(
            store.get_bookmark(id).unwrap().unwrap().favicon,
            "data:image/x-icon;base64,AAEC"
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_legacy_mode_stores_bare_base64() {
        let store = store();
        let id = store.create_bookmark("Go", "https://golang.org/", None).unwrap();

        let enricher = IconEnricher::start(
            Arc::clone(&store),
            Arc::new(FakeProvider::new()),
            1,
            FaviconMode::Legacy,
        );
        enricher.enqueue(id, "https://golang.org/");
        enricher.shutdown();

        assert_eq!(store.get_bookmark(id).unwrap().unwrap().favicon, "AAEC");
    }

    #[test]
    fn test_failure_leaves_favicon_empty() {
        let store = store();
        let ok = store.create_bookmark("Ok", "https://ok.test", None).unwrap();
        let broken = store
            .create_bookmark("Broken", "https://broken.test", None)
            .unwrap();
        let provider = Arc::new(FakeProvider::new());

        let enricher = IconEnricher::start(Arc::clone(&store), provider.clone(), 1, FaviconMode::DataUri);
        enricher.enqueue(ok, "https://ok.test");
        enricher.enqueue(broken, "https://broken.test");
        let report = enricher.shutdown();

        assert_eq!(report, EnrichReport { updated: 1, failed: 1 });
        assert_eq!(store.get_bookmark(broken).unwrap().unwrap().favicon, "");
        // One attempt per job, no retry
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_deleted_bookmark_counts_as_failure() {
        let store = store();
        let id = store.create_bookmark("Gone", "https://gone.test", None).unwrap();
        store.delete_bookmark(id).unwrap();

        let enricher = IconEnricher::start(
            Arc::clone(&store),
            Arc::new(FakeProvider::new()),
            1,
            FaviconMode::DataUri,
        );
        enricher.enqueue(id, "https://gone.test");
        assert_eq!(enricher.shutdown(), EnrichReport { updated: 0, failed: 1 });
    }

    #[test]
    fn test_enqueue_missing_with_many_workers() {
        let store = store();
        let folder = store.create_folder("Sites", None).unwrap();
        let mut ids = HashSet::new();
        for i in 0..20 {
            ids.insert(
                store
                    .create_bookmark(&format!("Site {}", i), &format!("https://s{}.test", i), Some(folder))
                    .unwrap(),
            );
        }
        store
            .create_bookmark_with_favicon("Has icon", "https://icon.test", "AAEC", None)
            .unwrap();

        let provider = Arc::new(FakeProvider::new());
        let enricher = IconEnricher::start(Arc::clone(&store), provider.clone(), 4, FaviconMode::DataUri);
        assert_eq!(enricher.enqueue_missing(&store).unwrap(), 20);
        let report = enricher.shutdown();

        assert_eq!(report.updated, 20);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 20);
        assert!(store.list_bookmarks_missing_favicon().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_and_store_publishes_event() {
        let store = store();
        let id = store.create_bookmark("Go", "https://golang.org/", None).unwrap();
        let sub = store.events().subscribe();

        fetch_and_store(&store, &FakeProvider::new(), id, "https://golang.org/", FaviconMode::DataUri)
            .unwrap();

        assert_eq!(
            sub.events.try_recv().unwrap(),
            crate::events::StoreEvent::FaviconUpdated { id }
        );
    }
}
