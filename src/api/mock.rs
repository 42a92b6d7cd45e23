use super::Transport;
use crate::error::TransportError;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request seen by [`MockTransport`]. `params` holds the headers of a
/// GET or the form fields of a POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A scripted transport used in tests and when no network is available.
/// Replies are handed out in FIFO order regardless of method or URL; every
/// call is recorded. Running out of replies is a transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: RefCell<VecDeque<Result<Value, TransportError>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, body: Value) -> Self {
        self.replies.borrow_mut().push_back(Ok(body));
        self
    }

    pub fn fail(self, err: TransportError) -> Self {
        self.replies.borrow_mut().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, method: Method) -> usize {
        self.calls.borrow().iter().filter(|c| c.method == method).count()
    }

    pub fn pending(&self) -> usize {
        self.replies.borrow().len()
    }

    fn next(&self, method: Method, url: &str, params: &[(&str, &str)]) -> Result<Value, TransportError> {
        info!("MockTransport: {:?} {}", method, url);
        self.calls.borrow_mut().push(RecordedCall {
            method,
            url: url.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other(format!("no scripted reply for {}", url))))
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, TransportError> {
        self.next(Method::Get, url, headers)
    }

    fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Value, TransportError> {
        self.next(Method::Post, url, fields)
    }
}
