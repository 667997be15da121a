//! Callback types invoked when a request completes.
//!
//! Each callback receives the [`Settings`] of its request as context. A
//! callback runs at most once, after the request reached its terminal state.

use crate::{RequestHandle, ResponseBody, Settings};

/// Called with the decoded body, the status, and the handle on success.
pub type SuccessCallback = Box<dyn FnOnce(&Settings, ResponseBody, u16, &RequestHandle) + Send>;

/// Called with the handle and the status when the request failed.
pub type ErrorCallback = Box<dyn FnOnce(&Settings, &RequestHandle, u16) + Send>;

/// Called with the handle and the status after success or error handling.
pub type CompleteCallback = Box<dyn FnOnce(&Settings, &RequestHandle, u16) + Send>;
