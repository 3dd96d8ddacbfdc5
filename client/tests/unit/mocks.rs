//! In-memory deploy stream halves

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use deployctl::deploy::stream::{DeploySink, ProgressSource};
use deployctl::errors::ClientError;
use deployctl::models::deploy::{DeployRequest, ServerMessage};

/// What a [`MockSink`] observed, shared with the test body
#[derive(Default)]
pub struct SinkLog {
    pub frames: Mutex<Vec<DeployRequest>>,
    pub closes: AtomicUsize,
    pub finished: AtomicBool,
}

impl SinkLog {
    pub fn frames(&self) -> Vec<DeployRequest> {
        self.frames.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Concatenated payload of every `File` frame
    pub fn uploaded(&self) -> Vec<u8> {
        self.frames()
            .into_iter()
            .filter_map(|f| match f {
                DeployRequest::File { chunk } => Some(chunk),
                DeployRequest::Info(_) => None,
            })
            .flatten()
            .collect()
    }
}

pub struct MockSink {
    log: Arc<SinkLog>,
    fail_on_send: Option<usize>,
    fail_close: bool,
    send_delay: Option<Duration>,
}

impl MockSink {
    pub fn new() -> (Self, Arc<SinkLog>) {
        let log = Arc::new(SinkLog::default());
        let sink = Self {
            log: log.clone(),
            fail_on_send: None,
            fail_close: false,
            send_delay: None,
        };
        (sink, log)
    }

    /// Fail the `n`th send (zero-based)
    pub fn failing_on_send(mut self, n: usize) -> Self {
        self.fail_on_send = Some(n);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }
}

#[async_trait]
impl DeploySink for MockSink {
    async fn send(&mut self, request: DeployRequest) -> Result<(), ClientError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        let mut frames = self.log.frames.lock().unwrap();
        if self.fail_on_send == Some(frames.len()) {
            return Err(ClientError::Transport("send failed".to_string()));
        }
        frames.push(request);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        self.log.finished.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(ClientError::Transport("close failed".to_string()));
        }
        Ok(())
    }
}

/// Replays a fixed script of receive results, then reports end of stream
pub struct ScriptedSource {
    script: VecDeque<Result<ServerMessage, ClientError>>,
    delay: Option<Duration>,
    pub finished: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            script: texts
                .iter()
                .map(|t| Ok(ServerMessage { text: t.to_string() }))
                .collect(),
            delay: None,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn then_fail(mut self, error: ClientError) -> Self {
        self.script.push_back(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ProgressSource for ScriptedSource {
    async fn recv(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.script.pop_front() {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => {
                self.finished.store(true, Ordering::SeqCst);
                Err(e)
            }
            None => {
                self.finished.store(true, Ordering::SeqCst);
                Ok(None)
            }
        }
    }
}

/// A reader that yields `good` bytes and then fails
pub struct FailingReader {
    good: Vec<u8>,
}

impl FailingReader {
    pub fn new(good: Vec<u8>) -> Self {
        Self { good }
    }
}

impl tokio::io::AsyncRead for FailingReader {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        if self.good.is_empty() {
            return std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk went away",
            )));
        }
        let n = self.good.len().min(buf.remaining());
        buf.put_slice(&self.good[..n]);
        self.good.drain(..n);
        std::task::Poll::Ready(Ok(()))
    }
}

/// Output writer whose contents stay readable after it is moved into a task
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl tokio::io::AsyncWrite for SharedOutput {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        std::task::Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }
}
