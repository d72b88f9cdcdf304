#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use bragi_core::{
    ByteSize, ImageLoader, LoaderConfig, TransportError,
    loader::BufferAllocator,
    memory::FixedMemoryProbe,
    transport::{ByteStream, Transport},
};
use tokio::sync::Notify;

pub const ART_URL: &str = "http://x/art.jpg";
pub const AMPLE_MEMORY: u64 = 1024 * 1024;

/// Deterministic body content so tests can check what was committed.
pub fn body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// One scripted HTTP response.
#[derive(Clone)]
pub struct Reply {
    status: u16,
    declared: Option<u64>,
    body: Vec<u8>,
    chunk_size: usize,
    refuse: bool,
    hold: Option<Arc<Notify>>,
}

impl Reply {
    /// 200 with a body of `len` bytes and a matching declared length.
    pub fn ok(len: usize) -> Self {
        Self {
            status: 200,
            declared: Some(len as u64),
            body: body(len),
            chunk_size: 512,
            refuse: false,
            hold: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok(16)
        }
    }

    /// The connection fails before any status arrives.
    pub fn refused() -> Self {
        Self {
            refuse: true,
            ..Self::ok(0)
        }
    }

    pub fn declared(mut self, declared: Option<u64>) -> Self {
        self.declared = declared;
        self
    }

    /// Disconnect after `len` body bytes, keeping the declared length.
    pub fn disconnect_after(mut self, len: usize) -> Self {
        self.body.truncate(len);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Block the first body poll until `hold` is notified.
    pub fn hold(mut self, hold: Arc<Notify>) -> Self {
        self.hold = Some(hold);
        self
    }
}

/// Transport that replays scripted replies and counts every call.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
    opened: Arc<Notify>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Notified each time a stream is opened.
    pub fn opened(&self) -> Arc<Notify> {
        Arc::clone(&self.opened)
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn open(
        &self,
        _url: &str,
        timeout: Duration,
    ) -> Result<Box<dyn ByteStream>, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Client("no scripted reply".into()))?;

        if reply.refuse {
            return Err(TransportError::Timeout { after: timeout });
        }

        self.opened.notify_one();
        Ok(Box::new(ScriptedStream {
            chunks: reply
                .body
                .chunks(reply.chunk_size.max(1))
                .map(<[u8]>::to_vec)
                .collect(),
            pending: Vec::new(),
            status: reply.status,
            declared: reply.declared,
            connected: true,
            hold: reply.hold,
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct ScriptedStream {
    chunks: VecDeque<Vec<u8>>,
    pending: Vec<u8>,
    status: u16,
    declared: Option<u64>,
    connected: bool,
    hold: Option<Arc<Notify>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ByteStream for ScriptedStream {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn declared_length(&self) -> Option<u64> {
        self.declared
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn available(&mut self) -> usize {
        if let Some(hold) = self.hold.take() {
            hold.notified().await;
        }
        if self.pending.is_empty() {
            match self.chunks.pop_front() {
                Some(chunk) => self.pending = chunk,
                None => self.connected = false,
            }
        }
        self.pending.len()
    }

    fn read(&mut self, dest: &mut [u8]) -> usize {
        let n = dest.len().min(self.pending.len());
        dest[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        n
    }

    fn close(&mut self) {
        self.connected = false;
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Heap allocator that records every request and can be told to fail.
#[derive(Default)]
pub struct CountingAllocator {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingAllocator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BufferAllocator for CountingAllocator {
    fn allocate(&self, len: usize) -> Option<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail { None } else { Some(vec![0; len]) }
    }
}

pub fn loader_with(
    transport: Arc<ScriptedTransport>,
    allocator: Arc<CountingAllocator>,
    free_memory: u64,
    config: LoaderConfig,
) -> ImageLoader {
    ImageLoader::builder(transport)
        .memory_probe(Arc::new(FixedMemoryProbe(ByteSize::from_bytes(
            free_memory,
        ))))
        .allocator(allocator)
        .config(config)
        .build()
}

pub fn loader(
    transport: Arc<ScriptedTransport>,
    allocator: Arc<CountingAllocator>,
) -> ImageLoader {
    loader_with(transport, allocator, AMPLE_MEMORY, LoaderConfig::default())
}
