#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uptime_core::{
    ChatId, IncomingMessage, Notifier, ProbeFailure, ProbeResult, Prober, TransportError, Update,
    UpdateSource,
};

pub const TARGET: &str = "https://site.example/";
pub const ALERT_CHAT: ChatId = ChatId(207417689);

pub fn up() -> ProbeResult {
    ProbeResult::up(Duration::from_millis(12))
}

pub fn down() -> ProbeResult {
    ProbeResult::down(ProbeFailure::Status(503), Duration::from_millis(12))
}

/// Returns results in order, then keeps repeating the last one.
pub struct ScriptedProber {
    script: Mutex<VecDeque<ProbeResult>>,
    last: Mutex<ProbeResult>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new(results: Vec<ProbeResult>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            last: Mutex::new(up()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &str) -> ProbeResult {
        assert_eq!(target, TARGET);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: AtomicBool,
    attempts: AtomicUsize,
    sent: Mutex<Vec<(ChatId, String)>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        let n = Self::default();
        n.fail.store(true, Ordering::SeqCst);
        n
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Status(502));
        }
        self.sent.lock().unwrap().push((chat, text.to_string()));
        Ok(())
    }
}

/// Hands out pre-recorded batches, then idles like an empty long poll.
#[derive(Default)]
pub struct ScriptedSource {
    batches: Mutex<VecDeque<Result<Vec<Update>, TransportError>>>,
    offsets: Mutex<Vec<Option<i64>>>,
}

impl ScriptedSource {
    pub fn new(batches: Vec<Result<Vec<Update>, TransportError>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            offsets: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                // Nothing queued: behave like an idle long poll.
                tokio::time::sleep(poll_timeout).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn text_update(id: i64, chat: i64, text: &str) -> Update {
    Update {
        id,
        message: Some(IncomingMessage {
            chat: ChatId(chat),
            text: text.to_string(),
        }),
    }
}

pub fn empty_update(id: i64) -> Update {
    Update { id, message: None }
}

/// Panics on its first call, then defers to `inner`.
pub struct PanicOnceProber {
    inner: ScriptedProber,
    calls: AtomicUsize,
}

impl PanicOnceProber {
    pub fn new(results: Vec<ProbeResult>) -> Self {
        Self {
            inner: ScriptedProber::new(results),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for PanicOnceProber {
    async fn probe(&self, target: &str) -> ProbeResult {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("prober blew up");
        }
        self.inner.probe(target).await
    }
}

/// Panics on its first fetch, then defers to `inner`.
pub struct PanicOnceSource {
    inner: ScriptedSource,
    calls: AtomicUsize,
}

impl PanicOnceSource {
    pub fn new(batches: Vec<Result<Vec<Update>, TransportError>>) -> Self {
        Self {
            inner: ScriptedSource::new(batches),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_offsets(&self) -> Vec<Option<i64>> {
        self.inner.requested_offsets()
    }
}

#[async_trait]
impl UpdateSource for PanicOnceSource {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("update source blew up");
        }
        self.inner.fetch_updates(offset, poll_timeout).await
    }
}
