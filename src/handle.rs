//! Handle to a dispatched request.

use http::Method;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::Notify;

use crate::{Error, RawResponse, Result};

/// Lifecycle of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Created, not yet sent.
    Unsent,
    /// Sent, waiting for the response.
    Opened,
    /// Terminal: a response arrived or the transport gave up.
    Done,
}

impl ReadyState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Unsent,
            1 => ReadyState::Opened,
            _ => ReadyState::Done,
        }
    }
}

/// A cheap-to-clone handle to one dispatched request.
///
/// Returned by every dispatch call and passed to every callback. Status and
/// response are only meaningful once [`ReadyState::Done`] is reached;
/// [`RequestHandle::wait`] resolves after the completion callbacks ran.
#[derive(Clone)]
pub struct RequestHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    method: Method,
    url: String,
    ready_state: AtomicU8,
    status: AtomicU16,
    response: OnceLock<RawResponse>,
    transport_error: Mutex<Option<Error>>,
    decode_error: Mutex<Option<Error>>,
    completion_claimed: AtomicBool,
    finished: AtomicBool,
    notify: Notify,
}

impl RequestHandle {
    pub(crate) fn new(method: Method, url: String) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                method,
                url,
                ready_state: AtomicU8::new(ReadyState::Unsent as u8),
                status: AtomicU16::new(0),
                response: OnceLock::new(),
                transport_error: Mutex::new(None),
                decode_error: Mutex::new(None),
                completion_claimed: AtomicBool::new(false),
                finished: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// The final URL, including cache-buster and query payload.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.inner.ready_state.load(Ordering::Acquire))
    }

    /// The response status, or `0` before completion or after a transport failure.
    pub fn status(&self) -> u16 {
        self.inner.status.load(Ordering::Acquire)
    }

    /// The raw response, once one arrived.
    pub fn response(&self) -> Option<&RawResponse> {
        self.inner.response.get()
    }

    /// The raw response body, once a response arrived.
    pub fn response_text(&self) -> Option<&str> {
        self.response().map(|r| r.body.as_str())
    }

    /// Takes the transport error that ended this request, if any.
    pub fn take_transport_error(&self) -> Option<Error> {
        lock(&self.inner.transport_error).take()
    }

    /// Returns `true` once completion handling has finished.
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    /// Waits until completion handling has finished and returns the status.
    ///
    /// # Errors
    ///
    /// If the response body failed to decode, the first call returns that
    /// error. Later calls return the status.
    pub async fn wait(&self) -> Result<u16> {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_finished() {
                break;
            }
            notified.await;
        }
        match lock(&self.inner.decode_error).take() {
            Some(e) => Err(e),
            None => Ok(self.status()),
        }
    }

    pub(crate) fn mark_opened(&self) {
        self.inner
            .ready_state
            .store(ReadyState::Opened as u8, Ordering::Release);
    }

    /// Records a terminal response and moves to `Done`.
    pub(crate) fn resolve(&self, response: RawResponse) {
        self.inner
            .status
            .store(response.status.as_u16(), Ordering::Release);
        let _ = self.inner.response.set(response);
        self.mark_done();
    }

    /// Records a transport failure and moves to `Done` with status `0`.
    pub(crate) fn reject(&self, error: Error) {
        *lock(&self.inner.transport_error) = Some(error);
        self.mark_done();
    }

    fn mark_done(&self) {
        self.inner
            .ready_state
            .store(ReadyState::Done as u8, Ordering::Release);
    }

    /// Claims the right to run completion handling.
    ///
    /// Returns `true` exactly once, and only after the request reached `Done`.
    pub(crate) fn claim_completion(&self) -> bool {
        self.ready_state() == ReadyState::Done
            && !self.inner.completion_claimed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn set_decode_error(&self, error: Error) {
        *lock(&self.inner.decode_error) = Some(error);
    }

    pub(crate) fn finish(&self) {
        self.inner.finished.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("method", &self.inner.method)
            .field("url", &self.inner.url)
            .field("ready_state", &self.ready_state())
            .field("status", &self.status())
            .finish()
    }
}
