//! Scripted text generator for testing

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::traits::*;

/// Replays a queue of scripted replies; once the queue is drained it keeps
/// returning the fallback
#[derive(Debug, Clone)]
pub struct MockGenerator {
    script: Arc<Mutex<VecDeque<Result<String, GenerationError>>>>,
    fallback: Result<String, GenerationError>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    /// Always answer with `reply`
    pub fn new(reply: impl Into<String>) -> Self {
        Self::with_fallback(Ok(reply.into()))
    }

    /// Always fail with `error`
    pub fn failing(error: GenerationError) -> Self {
        Self::with_fallback(Err(error))
    }

    fn with_fallback(fallback: Result<String, GenerationError>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply to be returned before the fallback
    pub fn then(self, reply: Result<String, GenerationError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.prompt.clone());

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}
