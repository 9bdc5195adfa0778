//! Mock backend for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

/// A mock backend with canned responses, an echo mode and a failing mode.
/// No network, no keys.
#[derive(Debug)]
pub struct MockProvider {
    name: String,
    /// Canned responses (cycles through them); empty = echo the prompt
    responses: Vec<String>,
    index: AtomicUsize,
    fail: bool,
    latency_ms: u64,
}

impl MockProvider {
    pub fn new(name: &str, responses: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            responses,
            index: AtomicUsize::new(0),
            fail: false,
            latency_ms: 0,
        }
    }

    /// Always return the same response.
    pub fn constant(response: &str) -> Self {
        Self::new("mock", vec![response.to_string()])
    }

    /// Cycle through the given responses in order.
    pub fn scripted(responses: Vec<String>) -> Self {
        Self::new("mock", responses)
    }

    /// Echo the prompt back. Lets a test inspect exactly what prompt a
    /// caller built (e.g. the blending synthesis request).
    pub fn echo() -> Self {
        Self::new("mock-echo", Vec::new())
    }

    /// Fail every completion with `LlmError::RequestFailed`.
    pub fn failing() -> Self {
        Self {
            name: "mock-failing".to_string(),
            responses: Vec::new(),
            index: AtomicUsize::new(0),
            fail: true,
            latency_ms: 0,
        }
    }

    /// Simulate slow completions (for timeout tests).
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();

        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        let idx = self.index.fetch_add(1, Ordering::Relaxed);

        if self.fail {
            return Err(LlmError::RequestFailed("mock failure".to_string()));
        }

        let content = if self.responses.is_empty() {
            request.prompt.clone()
        } else {
            self.responses[idx % self.responses.len()].clone()
        };

        Ok(LlmResponse {
            content,
            model: self.name.clone(),
            tokens_used: Some((request.prompt.len() / 4) as u32),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
