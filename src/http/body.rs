//! Response body conduit.
//!
//! A [`Body`] carries the payload of a response from the code that produces
//! it to the connection that writes it to the socket. It is an ordered
//! stream of byte chunks followed by a finish signal, which is distinct from
//! an empty chunk: the consumer knows the payload is complete only once the
//! producer calls [`finish`](BodySender::finish).
//!
//! ```
//! use rawhttp::Body;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let body = Body::new();
//! let sender = body.sender();
//! let mut receiver = body.receiver();
//!
//! tokio::spawn(async move {
//!     sender.write("Hello ").unwrap();
//!     sender.write(42).unwrap();
//!     sender.finish();
//! });
//!
//! let mut collected = Vec::new();
//! while let Some(chunk) = receiver.recv().await {
//!     collected.extend_from_slice(&chunk);
//! }
//! assert_eq!(collected, b"Hello 42");
//! # }
//! ```

use crossbeam::queue::SegQueue;
use std::{
    error, fmt,
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::Notify;

/// Returned when writing to a body that has already been finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyError {
    Closed,
}

impl error::Error for BodyError {}
impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("write on closed body"),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    chunks: SegQueue<Vec<u8>>,
    finished: AtomicBool,
    notify: Notify,
}

/// Single-producer, single-consumer stream of byte chunks.
///
/// Cloning a `Body` clones the handle; all clones refer to the same stream.
/// Chunks are delivered in the order they were sent. Once finished, further
/// writes fail with [`BodyError::Closed`] and the receiver yields `None`
/// after the remaining chunks are drained.
#[derive(Debug, Clone, Default)]
pub struct Body {
    shared: Arc<Shared>,
}

impl Body {
    /// Creates an empty, unfinished body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a finished body holding a single chunk.
    ///
    /// ```
    /// use rawhttp::Body;
    ///
    /// let body = Body::from_value("Hello world!");
    /// assert!(body.is_finished());
    /// assert!(body.write("more").is_err());
    /// ```
    pub fn from_value<T: WriteBuffer>(value: T) -> Self {
        let body = Self::new();
        let mut chunk = Vec::new();
        value.write_to(&mut chunk);
        body.shared.chunks.push(chunk);
        body.finish();
        body
    }

    /// Creates a finished body without any chunk.
    pub fn empty() -> Self {
        let body = Self::new();
        body.finish();
        body
    }

    /// Handle for the producing side.
    #[inline]
    pub fn sender(&self) -> BodySender {
        BodySender {
            shared: self.shared.clone(),
        }
    }

    /// Handle for the consuming side.
    #[inline]
    pub fn receiver(&self) -> BodyReceiver {
        BodyReceiver {
            shared: self.shared.clone(),
        }
    }

    /// Shorthand for `self.sender().write(value)`.
    #[inline]
    pub fn write<T: WriteBuffer>(&self, value: T) -> Result<usize, BodyError> {
        write_chunk(&self.shared, value)
    }

    /// Shorthand for `self.sender().finish()`.
    #[inline]
    pub fn finish(&self) {
        finish(&self.shared)
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }
}

fn write_chunk<T: WriteBuffer>(shared: &Shared, value: T) -> Result<usize, BodyError> {
    let mut chunk = Vec::new();
    value.write_to(&mut chunk);
    send_chunk(shared, chunk)
}

fn send_chunk(shared: &Shared, chunk: Vec<u8>) -> Result<usize, BodyError> {
    if shared.finished.load(Ordering::Acquire) {
        return Err(BodyError::Closed);
    }

    let len = chunk.len();
    shared.chunks.push(chunk);
    shared.notify.notify_one();
    Ok(len)
}

fn finish(shared: &Shared) {
    if !shared.finished.swap(true, Ordering::AcqRel) {
        shared.notify.notify_one();
    }
}

/// Producing side of a [`Body`].
#[derive(Debug, Clone)]
pub struct BodySender {
    shared: Arc<Shared>,
}

impl BodySender {
    /// Sends a chunk as is. Returns the number of bytes queued.
    ///
    /// An empty chunk is delivered like any other; it does not finish the body.
    #[inline]
    pub fn send(&self, chunk: Vec<u8>) -> Result<usize, BodyError> {
        send_chunk(&self.shared, chunk)
    }

    /// Serializes `value` into a new chunk and sends it.
    #[inline]
    pub fn write<T: WriteBuffer>(&self, value: T) -> Result<usize, BodyError> {
        write_chunk(&self.shared, value)
    }

    /// Marks the body as complete. Calling it again has no effect.
    #[inline]
    pub fn finish(&self) {
        finish(&self.shared)
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }
}

impl Write for BodySender {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.send(buf.to_vec())
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::BrokenPipe, err))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Consuming side of a [`Body`].
#[derive(Debug)]
pub struct BodyReceiver {
    shared: Arc<Shared>,
}

impl BodyReceiver {
    /// Waits for the next chunk.
    ///
    /// Returns `None` once the body is finished and every chunk sent before
    /// the finish has been received.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        loop {
            if let Some(chunk) = self.shared.chunks.pop() {
                return Some(chunk);
            }
            if self.shared.finished.load(Ordering::Acquire) {
                return self.shared.chunks.pop();
            }
            self.shared.notify.notified().await;
        }
    }

    /// Receives every remaining chunk and concatenates them.
    pub async fn collect(mut self) -> Vec<u8> {
        let mut result = Vec::new();
        while let Some(chunk) = self.recv().await {
            result.extend_from_slice(&chunk);
        }
        result
    }
}

/// Trait for writing values into a body chunk.
///
/// Implemented for strings, bytes, booleans, chars and integer types.
///
/// # Example
/// ```
/// use rawhttp::WriteBuffer;
///
/// struct Celsius(i32);
///
/// impl WriteBuffer for Celsius {
///     fn write_to(&self, buffer: &mut Vec<u8>) {
///         self.0.write_to(buffer);
///         buffer.extend_from_slice("°C".as_bytes());
///     }
/// }
/// ```
pub trait WriteBuffer {
    /// Appends the value's representation to the buffer.
    fn write_to(&self, buffer: &mut Vec<u8>);
}

macro_rules! impl_write_buffer {
    (bytes, $conv:expr => $($t:ty),*) => {
        $(impl WriteBuffer for $t {
            #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                let conv = $conv;
                conv(self, buffer);
            }
        })*
    };
    (display => $($t:ty),*) => {
        $(impl WriteBuffer for $t {
            #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                let _ = write!(buffer, "{}", self);
            }
        })*
    };
}

impl_write_buffer!(bytes, |s: &str, b: &mut Vec<u8>| b.extend_from_slice(s.as_bytes()) => str);
impl_write_buffer!(bytes, |s: &String, b: &mut Vec<u8>| b.extend_from_slice(s.as_bytes()) => String);
impl_write_buffer!(bytes, |s: &[u8], b: &mut Vec<u8>| b.extend_from_slice(s) => [u8]);
impl_write_buffer!(bytes, |s: &Vec<u8>, b: &mut Vec<u8>| b.extend_from_slice(s) => Vec<u8>);
impl_write_buffer!(display => u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char);

impl<T: WriteBuffer + ?Sized> WriteBuffer for &T {
    #[inline]
    fn write_to(&self, buffer: &mut Vec<u8>) {
        (**self).write_to(buffer)
    }
}

impl<const N: usize> WriteBuffer for [u8; N] {
    #[inline]
    fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(self)
    }
}
