//! Newline-delimited JSON over stdio.
//!
//! One envelope per line; empty lines are ignored; frames must not contain
//! embedded newlines because the newline is the delimiter. The transport
//! can sit on the current process's stdin/stdout, on a spawned child's
//! pipes, or on any pair of raw async streams (which is how tests wire two
//! endpoints together with [`tokio::io::duplex`]).
//!
//! Locking discipline: lifecycle state lives behind a `std::sync::Mutex`
//! and is never held across an await; the writer and the receive channel
//! live behind `tokio::sync::Mutex` because they are held across I/O.

use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::process::Child;
use tokio::sync::{Mutex as TokioMutex, mpsc};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, trace, warn};

use crate::{Transport, TransportError, TransportResult, TransportState};

type BoxedRead = Pin<Box<dyn AsyncRead + Send + 'static>>;
type BoxedWrite = Pin<Box<dyn AsyncWrite + Send + 'static>>;
type FrameReader = FramedRead<BufReader<BoxedRead>, LinesCodec>;
type FrameWriter = FramedWrite<BoxedWrite, LinesCodec>;

/// Stdio transport configuration
#[derive(Debug, Clone)]
pub struct StdioConfig {
    /// Reject inbound lines longer than this many bytes
    pub max_frame_bytes: usize,
    /// Capacity of the inbound frame queue
    pub channel_capacity: usize,
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 8 * 1024 * 1024,
            channel_capacity: 256,
        }
    }
}

/// Where the byte streams come from
enum StreamSource {
    /// The current process's stdin/stdout
    ProcessStdio,
    /// Caller-provided raw streams, consumed on `start`
    Raw {
        reader: Option<BoxedRead>,
        writer: Option<BoxedWrite>,
    },
}

/// Newline-delimited JSON transport over a byte stream pair
pub struct StdioTransport {
    config: StdioConfig,
    state: StdMutex<TransportState>,
    source: TokioMutex<StreamSource>,
    writer: TokioMutex<Option<FrameWriter>>,
    inbound: TokioMutex<Option<mpsc::Receiver<String>>>,
    reader_task: StdMutex<Option<tokio::task::JoinHandle<()>>>,
}

impl std::fmt::Debug for StdioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioTransport")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl StdioTransport {
    /// Transport over the current process's stdin/stdout
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(StreamSource::ProcessStdio, StdioConfig::default())
    }

    /// Transport over a spawned child process's pipes.
    ///
    /// The child must have been spawned with `stdin(Stdio::piped())` and
    /// `stdout(Stdio::piped())`.
    pub fn from_child(child: &mut Child) -> TransportResult<Self> {
        let stdin = child.stdin.take().ok_or_else(|| {
            TransportError::Configuration("child stdin was not piped".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            TransportError::Configuration("child stdout was not piped".to_string())
        })?;
        Ok(Self::from_raw(stdout, stdin))
    }

    /// Transport over arbitrary raw streams.
    ///
    /// `reader` is what inbound frames arrive on, `writer` is where
    /// outbound frames go.
    pub fn from_raw<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + 'static,
        W: AsyncWrite + Send + 'static,
    {
        Self::with_source(
            StreamSource::Raw {
                reader: Some(Box::pin(reader)),
                writer: Some(Box::pin(writer)),
            },
            StdioConfig::default(),
        )
    }

    /// Override the default configuration
    #[must_use]
    pub fn with_config(mut self, config: StdioConfig) -> Self {
        self.config = config;
        self
    }

    fn with_source(source: StreamSource, config: StdioConfig) -> Self {
        Self {
            config,
            state: StdMutex::new(TransportState::Idle),
            source: TokioMutex::new(source),
            writer: TokioMutex::new(None),
            inbound: TokioMutex::new(None),
            reader_task: StdMutex::new(None),
        }
    }

    fn state(&self) -> TransportState {
        *self.state.lock().expect("state mutex poisoned")
    }

    fn set_state(&self, next: TransportState) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if *state != next {
            trace!("stdio transport state: {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    async fn take_streams(&self) -> TransportResult<(FrameReader, FrameWriter)> {
        let codec = || LinesCodec::new_with_max_length(self.config.max_frame_bytes);
        let mut source = self.source.lock().await;
        match &mut *source {
            StreamSource::ProcessStdio => {
                let stdin: BoxedRead = Box::pin(tokio::io::stdin());
                let stdout: BoxedWrite = Box::pin(tokio::io::stdout());
                Ok((
                    FramedRead::new(BufReader::new(stdin), codec()),
                    FramedWrite::new(stdout, codec()),
                ))
            }
            StreamSource::Raw { reader, writer } => {
                let reader = reader.take().ok_or_else(|| {
                    TransportError::Configuration("raw reader already consumed".to_string())
                })?;
                let writer = writer.take().ok_or_else(|| {
                    TransportError::Configuration("raw writer already consumed".to_string())
                })?;
                Ok((
                    FramedRead::new(BufReader::new(reader), codec()),
                    FramedWrite::new(writer, codec()),
                ))
            }
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    fn endpoint(&self) -> String {
        "stdio://".to_string()
    }

    async fn start(&self) -> TransportResult<()> {
        if self.state() == TransportState::Started {
            return Ok(());
        }
        if self.state() == TransportState::Closed {
            return Err(TransportError::Closed("transport already closed".to_string()));
        }

        let (mut reader, writer) = self.take_streams().await?;
        *self.writer.lock().await = Some(writer);

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        *self.inbound.lock().await = Some(rx);

        let task = tokio::spawn(async move {
            while let Some(result) = reader.next().await {
                match result {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        trace!(bytes = line.len(), "stdio frame received");
                        if tx.send(line).await.is_err() {
                            debug!("inbound channel closed, stopping stdio reader");
                            break;
                        }
                    }
                    Err(e) => {
                        // Oversized or malformed framing: skip the frame and
                        // keep the connection alive.
                        warn!("stdio framing error, skipping frame: {e}");
                    }
                }
            }
            debug!("stdio reader task finished");
        });
        *self.reader_task.lock().expect("task mutex poisoned") = Some(task);

        self.set_state(TransportState::Started);
        debug!("stdio transport started");
        Ok(())
    }

    async fn close(&self) -> TransportResult<()> {
        if self.state() == TransportState::Closed {
            return Ok(());
        }
        self.set_state(TransportState::Closed);

        if let Some(task) = self.reader_task.lock().expect("task mutex poisoned").take() {
            task.abort();
        }
        *self.writer.lock().await = None;
        *self.inbound.lock().await = None;
        debug!("stdio transport closed");
        Ok(())
    }

    async fn send(&self, frame: String) -> TransportResult<()> {
        match self.state() {
            TransportState::Started => {}
            TransportState::Idle => {
                return Err(TransportError::NotStarted("stdio transport".to_string()));
            }
            TransportState::Closed => {
                return Err(TransportError::Closed("stdio transport".to_string()));
            }
        }

        // The newline is the frame delimiter; an embedded one would split
        // the envelope into two bogus frames on the peer.
        if frame.contains('\n') || frame.contains('\r') {
            return Err(TransportError::Framing(
                "frame contains embedded newline".to_string(),
            ));
        }

        let mut writer = self.writer.lock().await;
        let writer = writer
            .as_mut()
            .ok_or_else(|| TransportError::SendFailed("writer unavailable".to_string()))?;
        let bytes = frame.len();
        writer
            .send(frame)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        SinkExt::<String>::flush(writer)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        trace!(bytes, "stdio frame sent");
        Ok(())
    }

    async fn receive(&self) -> TransportResult<Option<String>> {
        if self.state() == TransportState::Idle {
            return Err(TransportError::NotStarted("stdio transport".to_string()));
        }
        let mut inbound = self.inbound.lock().await;
        match inbound.as_mut() {
            Some(rx) => Ok(rx.recv().await),
            // Closed: report end-of-stream rather than an error.
            None => Ok(None),
        }
    }
}
