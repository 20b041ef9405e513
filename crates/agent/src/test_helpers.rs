//! Scripted collaborators for facade tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use folio_core::error::{ProviderError, RetrievalError};
use folio_core::message::Message;
use folio_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use folio_core::retriever::{Passage, Retriever};

/// A provider that replays scripted replies and records every request.
///
/// Panics if called more often than replies were scripted.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn failing(err: ProviderError) -> Self {
        Self::new(vec![Err(err)])
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more replies");

        reply.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A retriever returning the same passages for every query.
pub struct StaticRetriever {
    passages: Vec<Passage>,
    queries: Mutex<Vec<String>>,
}

impl StaticRetriever {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            passages: texts
                .iter()
                .enumerate()
                .map(|(i, t)| Passage::new(*t, format!("doc{i}.txt"), 1.0))
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, RetrievalError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.passages.clone())
    }
}

/// A retriever that always fails with the given error.
pub struct FailingRetriever(pub RetrievalError);

#[async_trait::async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Passage>, RetrievalError> {
        Err(self.0.clone())
    }
}
