//! Shared fixtures for session tests.
#![allow(dead_code)]

use async_trait::async_trait;
use orderdesk_core::{ConfigDocument, ErrorReporter, KvStore};
use orderdesk_persistence::MemoryStore;
use orderdesk_session::SettingsSession;
use orderdesk_settings::{ParseError, ParseResult, SettingsParser, YamlParser};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Two networks, one orderbook and one deployment on each.
pub const TWO_NETWORKS: &str = r#"
networks:
  net1:
    rpc: https://rpc.example/net1
    chain-id: 137
  net2:
    rpc: https://rpc.example/net2
    chain-id: 1
subgraphs:
  sg1: https://subgraph.example/ob1
orderbooks:
  ob1:
    network: net1
    address: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
    subgraph: sg1
  ob2:
    network: net2
    address: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
orders:
  order1:
    network: net1
    orderbook: ob1
  order2:
    network: net2
    orderbook: ob2
deployments:
  dep1:
    order: order1
  dep2:
    order: order2
"#;

/// The same universe with net1 and everything under it removed.
pub const NET2_ONLY: &str = r#"
networks:
  net2:
    rpc: https://rpc.example/net2
    chain-id: 1
orderbooks:
  ob2:
    network: net2
    address: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
orders:
  order2:
    network: net2
    orderbook: ob2
deployments:
  dep2:
    order: order2
"#;

#[derive(Default)]
pub struct CountingReporter {
    count: AtomicUsize,
}

impl CountingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ErrorReporter for CountingReporter {
    fn report(&self, _message: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Store whose selection-key reads stall, like a cold file store.
#[derive(Default)]
pub struct SlowStore {
    inner: MemoryStore,
}

impl SlowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for SlowStore {
    fn read(&self, key: &str) -> Option<String> {
        if key != "settings" {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) {
        self.inner.write(key, value);
    }
}

/// Parser that rejects every input.
pub struct FailingParser;

#[async_trait]
impl SettingsParser for FailingParser {
    async fn parse(&self, _text: &str) -> ParseResult<ConfigDocument> {
        Err(ParseError::Unavailable("remote parser offline".into()))
    }
}

/// Build a session over `store` with `text` preloaded as settings text,
/// and wait for the first parse to settle.
pub async fn session_with_text(store: Arc<MemoryStore>, text: &str) -> SettingsSession {
    store.write("settings", text);
    let session = SettingsSession::new(store, Arc::new(YamlParser), CountingReporter::new());
    session.load_settings().await;
    session
}
