#![allow(clippy::unwrap_used, clippy::panic)]

use std::io::Read;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use sitemapgen_core::{
    Error, FileStore, GeneratorConfig, LocalFileStore, MemoryFileStore, PingClient, PingResponse,
    Result, SearchEngine, SessionState, SitemapSession, size_delta_percent,
};
use tempfile::TempDir;

fn config(base_url: &str) -> GeneratorConfig {
    let mut config = GeneratorConfig::default();
    config.site.base_url = base_url.to_string();
    config
}

fn memory_session() -> SitemapSession<MemoryFileStore> {
    SitemapSession::with_store(&config("http://example.com"), MemoryFileStore::new()).unwrap()
}

fn text(store: &MemoryFileStore, name: &str) -> String {
    String::from_utf8(store.get(name).unwrap().to_vec()).unwrap()
}

/// Records every requested URL and answers with a fixed status.
struct RecordingPingClient {
    status: u16,
    requests: Mutex<Vec<String>>,
}

impl RecordingPingClient {
    fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PingClient for RecordingPingClient {
    async fn get(&self, url: &str) -> Result<PingResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(PingResponse {
            status: self.status,
            body: String::new(),
        })
    }
}

/// In-memory store whose writes to chosen names fail once with `disk full`.
struct FaultyStore {
    inner: MemoryFileStore,
    failing: Arc<Mutex<Vec<String>>>,
}

impl FaultyStore {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let failing = Arc::new(Mutex::new(Vec::new()));
        let store = Self {
            inner: MemoryFileStore::new(),
            failing: Arc::clone(&failing),
        };
        (store, failing)
    }
}

impl FileStore for FaultyStore {
    fn write(&mut self, name: &str, contents: &[u8]) -> Result<()> {
        let mut failing = self.failing.lock().unwrap();
        if let Some(pos) = failing.iter().position(|n| n == name) {
            failing.remove(pos);
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.inner.write(name, contents)
    }

    fn read_to_string(&self, name: &str) -> Result<String> {
        self.inner.read_to_string(name)
    }

    fn exists(&self, name: &str) -> bool {
        self.inner.exists(name)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        self.inner.file_size(name)
    }
}

fn faulty_session() -> (SitemapSession<FaultyStore>, Arc<Mutex<Vec<String>>>) {
    let (store, failing) = FaultyStore::new();
    let session = SitemapSession::with_store(&config("http://example.com"), store).unwrap();
    (session, failing)
}

fn fail_next_write(failing: &Mutex<Vec<String>>, name: &str) {
    failing.lock().unwrap().push(name.to_string());
}

mod sequencing {
    use super::*;

    fn is_disk_full(err: &Error) -> bool {
        matches!(err, Error::Io(e) if e.to_string() == "disk full")
    }

    #[test]
    fn failed_chunk_write_propagates_and_can_be_retried() {
        // Given one URL per chunk and a first chunk write that fails
        let (mut session, failing) = faulty_session();
        session.set_max_urls_per_sitemap(1).unwrap();
        session.add_url("/a", None, None, None).unwrap();
        fail_next_write(&failing, "sitemap1.xml");

        // When the second URL closes the first chunk
        let err = session.add_url("/b", None, None, None).unwrap_err();

        // Then the store error comes back unchanged and nothing was recorded
        assert!(is_disk_full(&err), "{err:?}");
        assert_eq!(session.state(), SessionState::Collecting);
        assert!(session.generated_files().is_empty());
        assert!(session.store().inner.is_empty());

        // And repeating the call writes each URL exactly once
        session.add_url("/b", None, None, None).unwrap();
        session.finalize().unwrap();

        let store = &session.store().inner;
        let names: Vec<_> = store.names().collect();
        assert_eq!(names, ["sitemap1.xml", "sitemap2.xml", "sitemap_index.xml"]);
        let first = text(store, "sitemap1.xml");
        let second = text(store, "sitemap2.xml");
        assert!(first.contains("<loc>http://example.com/a</loc>"));
        assert!(!first.contains("http://example.com/b"));
        assert!(second.contains("<loc>http://example.com/b</loc>"));
        assert!(!second.contains("http://example.com/a"));
        assert_eq!(text(store, "sitemap_index.xml").matches("<sitemap>").count(), 2);
    }

    #[test]
    fn failed_finalize_leaves_session_collecting() {
        let (mut session, failing) = faulty_session();
        session.add_url("/a", None, None, None).unwrap();

        fail_next_write(&failing, "sitemap.xml");
        let err = session.finalize().unwrap_err();
        assert!(is_disk_full(&err), "{err:?}");
        assert_eq!(session.state(), SessionState::Collecting);

        fail_next_write(&failing, "sitemap_index.xml");
        let err = session.finalize().unwrap_err();
        assert!(is_disk_full(&err), "{err:?}");
        assert_eq!(session.state(), SessionState::Collecting);

        session.finalize().unwrap();
        let store = &session.store().inner;
        let index = text(store, "sitemap_index.xml");
        assert_eq!(index.matches("<loc>http://example.com/sitemap.xml</loc>").count(), 1);
        assert!(text(store, "sitemap.xml").contains("<loc>http://example.com/a</loc>"));
    }

    #[test]
    fn failed_robots_write_propagates() {
        let (mut session, failing) = faulty_session();
        session.add_url("/", None, None, None).unwrap();
        session.finalize().unwrap();

        fail_next_write(&failing, "robots.txt");
        let err = session.update_robots().unwrap_err();

        assert!(is_disk_full(&err), "{err:?}");
        assert_eq!(
            session.state(),
            SessionState::Finalized { robots_updated: false, submitted: false }
        );

        session.update_robots().unwrap();
        assert!(text(&session.store().inner, "robots.txt").contains("Sitemap: "));
    }

    #[test]
    fn finalize_requires_at_least_one_url() {
        let mut session = memory_session();

        let err = session.finalize().unwrap_err();
        assert!(matches!(err, Error::IllegalState { operation: "finalize", .. }));

        session.add_url("/", None, None, None).unwrap();
        session.finalize().unwrap();
        assert!(matches!(session.state(), SessionState::Finalized { .. }));
    }

    #[test]
    fn robots_update_before_finalize_is_rejected_even_after_bad_input() {
        let mut session = memory_session();
        assert!(session.add_url("/a", None, Some("sometimes"), None).is_err());
        assert!(session.add_url("/a", None, None, Some(0.85.into())).is_err());

        let err = session.update_robots().unwrap_err();

        assert!(err.is_illegal_state());
        assert!(err.to_string().contains("called out of sequence"));
        assert!(!session.store().exists("robots.txt"));
        assert_eq!(session.state(), SessionState::Collecting);
    }

    #[tokio::test]
    async fn submit_before_finalize_is_rejected() {
        let client = RecordingPingClient::new(200);
        let mut session = memory_session().with_ping_client(client.clone());
        session.add_url("/", None, None, None).unwrap();

        let err = session.submit_sitemap().await.unwrap_err();

        assert!(err.is_illegal_state());
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn robots_and_submission_are_independent_and_repeatable() {
        let client = RecordingPingClient::new(200);
        let mut session = memory_session()
            .with_ping_client(client.clone())
            .with_search_engines(vec![SearchEngine::new("test", "http://ping.test/?sitemap=")]);
        session.add_url("/", None, None, None).unwrap();
        session.finalize().unwrap();

        session.submit_sitemap().await.unwrap();
        assert_eq!(
            session.state(),
            SessionState::Finalized { robots_updated: false, submitted: true }
        );

        session.update_robots().unwrap();
        session.update_robots().unwrap();
        session.submit_sitemap().await.unwrap();

        assert_eq!(
            session.state(),
            SessionState::Finalized { robots_updated: true, submitted: true }
        );
        assert_eq!(client.requests.lock().unwrap().len(), 2);
        let robots = text(session.store(), "robots.txt");
        assert_eq!(robots.matches("Sitemap:").count(), 1);
    }
}

mod chunking {
    use super::*;

    #[test]
    fn one_over_the_limit_yields_two_chunks() {
        // Given a limit of 3 URLs per chunk
        let mut session = memory_session();
        session.set_max_urls_per_sitemap(3).unwrap();

        // When 4 URLs are added
        for i in 0..4 {
            session.add_url(&format!("/page/{i}"), None, None, None).unwrap();
        }
        session.finalize().unwrap();

        // Then two numbered chunks are written: 3 URLs, then 1
        let store = session.store();
        let first = text(store, "sitemap1.xml");
        let second = text(store, "sitemap2.xml");
        assert_eq!(first.matches("<url>").count(), 3);
        assert_eq!(second.matches("<url>").count(), 1);
        assert!(second.contains("<loc>http://example.com/page/3</loc>"));
        assert!(!store.exists("sitemap.xml"));

        let index = text(store, "sitemap_index.xml");
        let pos1 = index.find("http://example.com/sitemap1.xml").unwrap();
        let pos2 = index.find("http://example.com/sitemap2.xml").unwrap();
        assert!(pos1 < pos2);
    }

    #[test]
    fn exactly_the_limit_yields_one_unnumbered_chunk() {
        let mut session = memory_session();
        session.set_max_urls_per_sitemap(3).unwrap();
        for i in 0..3 {
            session.add_url(&format!("/{i}"), None, None, None).unwrap();
        }
        session.finalize().unwrap();

        let names: Vec<_> = session.store().names().collect();
        assert_eq!(names, ["sitemap.xml", "sitemap_index.xml"]);
    }

    #[test]
    fn max_urls_out_of_range_and_after_flush() {
        let mut session = memory_session();

        for bad in [0, 50_001] {
            let err = session.set_max_urls_per_sitemap(bad).unwrap_err();
            assert!(matches!(err, Error::OutOfRange { name: "max_urls_per_sitemap", .. }));
        }
        session.set_max_urls_per_sitemap(50_000).unwrap();
        session.set_max_urls_per_sitemap(1).unwrap();

        session.add_url("/a", None, None, None).unwrap();
        session.add_url("/b", None, None, None).unwrap();
        let err = session.set_max_urls_per_sitemap(2).unwrap_err();
        assert!(err.is_illegal_state());
    }

    #[test]
    fn byte_limit_splits_chunks() {
        let mut session = memory_session();
        session.set_max_sitemap_bytes(400).unwrap();

        for i in 0..20 {
            session.add_url(&format!("/article/{i:04}"), None, None, None).unwrap();
        }
        session.finalize().unwrap();

        let chunks: Vec<_> = session
            .generated_files()
            .iter()
            .filter(|f| f.filename != "sitemap_index.xml")
            .collect();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.iter().map(|f| f.records).sum::<usize>(), 20);
        for chunk in chunks {
            assert!(chunk.uncompressed_bytes <= 400, "{chunk:?}");
        }
    }

    #[test]
    fn overlong_location_is_rejected() {
        let mut session = memory_session();
        let path = format!("/{}", "x".repeat(2048));

        let err = session.add_url(&path, None, None, None).unwrap_err();

        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}

mod compression {
    use super::*;

    fn gunzip(bytes: &[u8]) -> String {
        let mut out = String::new();
        GzDecoder::new(bytes).read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn enabled_before_adding_compresses_every_chunk() {
        let mut session = memory_session();
        session.enable_compression().unwrap();
        session.set_max_urls_per_sitemap(2).unwrap();
        for i in 0..3 {
            session.add_url(&format!("/{i}"), None, None, None).unwrap();
        }
        session.finalize().unwrap();

        let store = session.store();
        let chunk = gunzip(store.get("sitemap1.xml.gz").unwrap());
        assert!(chunk.contains("<loc>http://example.com/0</loc>"));
        assert!(store.exists("sitemap2.xml.gz"));

        let index = text(store, "sitemap_index.xml");
        assert!(index.contains("<loc>http://example.com/sitemap1.xml.gz</loc>"));
        assert!(index.contains("<loc>http://example.com/sitemap2.xml.gz</loc>"));
    }

    #[test]
    fn toggling_after_first_flush_leaves_written_chunks_alone() {
        let mut session = memory_session();
        session.set_max_urls_per_sitemap(1).unwrap();
        session.add_url("/a", None, None, None).unwrap();
        session.add_url("/b", None, None, None).unwrap(); // flushes sitemap1.xml

        session.enable_compression().unwrap();
        session.finalize().unwrap();

        let store = session.store();
        assert!(text(store, "sitemap1.xml").contains("http://example.com/a"));
        assert!(gunzip(store.get("sitemap2.xml.gz").unwrap()).contains("http://example.com/b"));
    }

    #[test]
    fn report_carries_size_delta_inputs() {
        let mut session = memory_session();
        session.enable_compression().unwrap();
        for i in 0..200 {
            session.add_url(&format!("/catalog/item/{i}"), None, Some("daily"), None).unwrap();
        }
        session.finalize().unwrap();

        let chunk = &session.generated_files()[0];
        assert!(chunk.compressed);
        let delta = size_delta_percent(chunk.uncompressed_bytes, chunk.written_bytes).unwrap();
        assert!(delta < 0.0, "repetitive markup should shrink, got {delta}");
    }

    #[test]
    fn size_delta_reference_values() {
        assert!((size_delta_percent(100, 90).unwrap() - -10.0).abs() < f64::EPSILON);
        assert!((size_delta_percent(100, 110).unwrap() - 10.0).abs() < f64::EPSILON);
    }
}

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn product_page_is_published_and_announced() {
        // Given a site rooted at example.com with files on disk
        let temp_dir = TempDir::new().unwrap();
        let mut config = config("http://example.com");
        config.site.output_dir = temp_dir.path().to_path_buf();

        let client = RecordingPingClient::new(200);
        let mut session = SitemapSession::new(&config)
            .unwrap()
            .with_ping_client(client.clone());

        // When one page is added and the session runs to completion
        session
            .add_url("/product/", None, Some("always"), Some(0.8.into()))
            .unwrap();
        session.finalize().unwrap();
        session.update_robots().unwrap();
        let outcomes = session.submit_sitemap().await.unwrap();

        // Then the chunk, index and robots file agree
        let store = LocalFileStore::new(temp_dir.path()).unwrap();
        let chunk = store.read_to_string("sitemap.xml").unwrap();
        assert!(chunk.contains(
            "<url><loc>http://example.com/product/</loc>\
             <changefreq>always</changefreq><priority>0.8</priority></url>"
        ));

        let index = store.read_to_string("sitemap_index.xml").unwrap();
        assert_eq!(index.matches("<sitemap>").count(), 1);
        assert!(index.contains("<loc>http://example.com/sitemap.xml</loc>"));

        let robots = store.read_to_string("robots.txt").unwrap();
        assert!(robots.contains("Sitemap: http://example.com/sitemap_index.xml"));

        // And every built-in engine was pinged with the encoded index URL
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.success));
        let requests = client.requests.lock().unwrap();
        assert!(requests[0].starts_with("https://www.google.com/ping?sitemap="));
        assert!(requests.iter().all(|url| url.ends_with("http%3A%2F%2Fexample.com%2Fsitemap_index.xml")));
    }

    #[tokio::test]
    async fn rejected_pings_are_reported_not_raised() {
        let client = RecordingPingClient::new(404);
        let mut session = memory_session().with_ping_client(client);
        session.add_url("/", None, None, None).unwrap();
        session.finalize().unwrap();

        let outcomes = session.submit_sitemap().await.unwrap();

        assert!(outcomes.iter().all(|o| !o.success && o.status == 404));
    }

    #[test]
    fn existing_robots_rules_survive() {
        let mut store = MemoryFileStore::new();
        store
            .write("robots.txt", b"User-agent: *\nDisallow: /admin\nSitemap: http://example.com/old.xml\n")
            .unwrap();
        let mut session = SitemapSession::with_store(&config("http://example.com"), store).unwrap();
        session.add_url("/", None, None, None).unwrap();
        session.finalize().unwrap();

        session.update_robots().unwrap();

        assert_eq!(
            text(session.store(), "robots.txt"),
            "User-agent: *\nDisallow: /admin\nSitemap: http://example.com/sitemap_index.xml\n"
        );
    }
}
