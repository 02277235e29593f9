//! Scriptable remover for testing without network access

use super::{classify_failure, BackgroundRemover};
use crate::encoding::EncodedImage;
use crate::error::{RemovalError, Result};
use crate::intake::UploadedFile;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Scripted outcome of one call
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// 2xx with this body
    Success(Vec<u8>),
    /// Non-success HTTP status with an empty body
    Status(u16),
    /// No response at all
    Connectivity,
}

impl MockResponse {
    fn into_result(self) -> Result<EncodedImage> {
        match self {
            Self::Success(bytes) => Ok(EncodedImage::png(&bytes)),
            Self::Status(code) => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Err(classify_failure(status, b""))
            },
            Self::Connectivity => Err(RemovalError::connectivity("mock: connection refused")),
        }
    }
}

/// Mock remover answering from a queue of scripted responses
///
/// Calls that would reach the network are recorded; calls refused by the
/// image-type precondition are not.
#[derive(Debug)]
pub struct MockRemover {
    responses: Mutex<VecDeque<MockResponse>>,
    fallback: MockResponse,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl MockRemover {
    /// Remover that answers every call with `response`
    #[must_use]
    pub fn always(response: MockResponse) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: response,
            calls: Mutex::new(Vec::new()),
            delay: None,
            gate: None,
        }
    }

    /// Remover answering with `responses` in order, then `Status(500)`
    #[must_use]
    pub fn scripted<I: IntoIterator<Item = MockResponse>>(responses: I) -> Self {
        let mut remover = Self::always(MockResponse::Status(500));
        remover.responses = Mutex::new(responses.into_iter().collect());
        remover
    }

    /// Simulate network latency before answering
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold every call until `release` is invoked
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `count` held calls proceed
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Names of the files that reached the (simulated) network
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls that reached the (simulated) network
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove_background(&self, file: &UploadedFile) -> Result<EncodedImage> {
        if !file.declares_image() {
            return Err(RemovalError::InvalidInput {
                mime: file.mime().to_string(),
            });
        }

        // Pick the scripted answer at call time so concurrent calls keep their order
        let response = self.next_response();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(file.name().to_string());

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        response.into_result()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
