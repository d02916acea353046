//! Scripted evaluator for dry runs and tests.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::errors::EvaluatorError;
use crate::domain::ports::Evaluator;

/// One canned evaluator reply.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Raw response text handed back verbatim.
    Reply(String),
    /// Simulated backend failure.
    Failure(String),
}

impl ScriptedResponse {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

/// Evaluator that answers from a fixed queue, in order.
///
/// When `repeat_last` is set the final reply is served forever instead of
/// running out; otherwise an empty queue yields [`EvaluatorError::Exhausted`].
#[derive(Debug, Default)]
pub struct ScriptedEvaluator {
    queue: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<String>>,
    repeat_last: bool,
}

impl ScriptedEvaluator {
    pub fn new(responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self {
            queue: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Evaluator that gives the same reply to every request.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            repeat_last: true,
            ..Self::new([ScriptedResponse::reply(text)])
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

/// Lock a std mutex, recovering the data from a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn evaluate(&self, request: &str) -> Result<String, EvaluatorError> {
        lock(&self.requests).push(request.to_string());

        let next = {
            let mut queue = lock(&self.queue);
            if self.repeat_last && queue.len() == 1 {
                queue.front().cloned()
            } else {
                queue.pop_front()
            }
        };

        match next {
            Some(ScriptedResponse::Reply(text)) => Ok(text),
            Some(ScriptedResponse::Failure(message)) => Err(EvaluatorError::Request(message)),
            None => Err(EvaluatorError::Exhausted),
        }
    }
}
