//! Chunked copy from a [`ByteStream`] into a preallocated buffer.

use crate::transport::ByteStream;

/// Result of one [`StreamReader::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStep {
    /// More bytes may follow; yield before stepping again.
    Continue,
    /// Target reached or stream disconnected.
    Finished,
}

/// Resumable copy loop.
///
/// Each [`step`](Self::step) moves at most one chunk. [`drain`](Self::drain)
/// drives the steps and yields to the scheduler in between so a long
/// download never starves other tasks.
#[derive(Debug, Clone)]
pub struct StreamReader {
    copied: usize,
    target: usize,
}

impl StreamReader {
    pub fn new(target: usize) -> Self {
        Self { copied: 0, target }
    }

    pub fn copied(&self) -> usize {
        self.copied
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Copy one chunk into `dest[copied..]`.
    ///
    /// A `dest` shorter than `target` finishes the step once it is full.
    pub async fn step<S>(&mut self, stream: &mut S, dest: &mut [u8]) -> DrainStep
    where
        S: ByteStream + ?Sized,
    {
        let limit = self.target.min(dest.len());
        if self.copied >= limit || !stream.is_connected() {
            return DrainStep::Finished;
        }

        let available = stream.available().await;
        if available > 0 {
            let want = available.min(limit - self.copied);
            let window = &mut dest[self.copied..self.copied + want];
            self.copied += stream.read(window).min(want);
        }

        if self.copied >= limit {
            DrainStep::Finished
        } else {
            DrainStep::Continue
        }
    }

    /// Fill `dest` with up to `target` bytes; returns how many arrived.
    pub async fn drain<S>(stream: &mut S, dest: &mut [u8], target: usize) -> usize
    where
        S: ByteStream + ?Sized,
    {
        let target = target.min(dest.len());
        let mut reader = Self::new(target);

        while reader.step(stream, dest).await == DrainStep::Continue {
            tokio::task::yield_now().await;
        }

        reader.copied
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct Chunks {
        chunks: VecDeque<Vec<u8>>,
        pending: Vec<u8>,
        connected: bool,
        polls: usize,
    }

    impl Chunks {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                pending: Vec::new(),
                connected: true,
                polls: 0,
            }
        }
    }

    #[async_trait::async_trait]
    impl ByteStream for Chunks {
        fn status_code(&self) -> u16 {
            200
        }

        fn declared_length(&self) -> Option<u64> {
            None
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn available(&mut self) -> usize {
            self.polls += 1;
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
        }
    }

    #[tokio::test]
    async fn stops_at_target_even_if_more_is_buffered() {
        let mut stream = Chunks::new(&[b"abcd", b"efgh"]);
        let mut dest = vec![0u8; 6];

        let copied = StreamReader::drain(&mut stream, &mut dest, 6).await;

        assert_eq!(copied, 6);
        assert_eq!(&dest, b"abcdef");
        assert!(stream.is_connected());
    }

    #[tokio::test]
    async fn early_disconnect_returns_short_count() {
        let mut stream = Chunks::new(&[b"abc", b"de"]);
        let mut dest = vec![0u8; 10];

        let copied = StreamReader::drain(&mut stream, &mut dest, 10).await;

        assert_eq!(copied, 5);
        assert_eq!(&dest[..5], b"abcde");
    }

    #[tokio::test]
    async fn step_moves_one_chunk_at_a_time() {
        let mut stream = Chunks::new(&[b"ab", b"cd"]);
        let mut dest = vec![0u8; 4];
        let mut reader = StreamReader::new(4);

        assert_eq!(reader.step(&mut stream, &mut dest).await, DrainStep::Continue);
        assert_eq!(reader.copied(), 2);
        assert_eq!(reader.step(&mut stream, &mut dest).await, DrainStep::Finished);
        assert_eq!(reader.copied(), 4);
        assert_eq!(stream.polls, 2);
    }

    #[tokio::test]
    async fn disconnected_stream_is_never_polled() {
        let mut stream = Chunks::new(&[b"abc"]);
        stream.close();
        let mut dest = vec![0u8; 3];

        let copied = StreamReader::drain(&mut stream, &mut dest, 3).await;

        assert_eq!(copied, 0);
        assert_eq!(stream.polls, 0);
    }

    #[tokio::test]
    async fn zero_target_finishes_immediately() {
        let mut stream = Chunks::new(&[b"abc"]);
        let mut dest = Vec::new();

        assert_eq!(StreamReader::drain(&mut stream, &mut dest, 0).await, 0);
        assert_eq!(stream.polls, 0);
    }

    #[tokio::test]
    async fn step_stops_when_dest_is_shorter_than_target() {
        let mut stream = Chunks::new(&[b"abcd", b"efgh"]);
        let mut dest = vec![0u8; 3];
        let mut reader = StreamReader::new(8);

        assert_eq!(reader.step(&mut stream, &mut dest).await, DrainStep::Finished);
        assert_eq!(reader.copied(), 3);
        assert_eq!(&dest, b"abc");
        assert_eq!(reader.step(&mut stream, &mut dest).await, DrainStep::Finished);
        assert_eq!(reader.copied(), 3);
    }
}
