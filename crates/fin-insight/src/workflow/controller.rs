use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use super::kind::FormKind;
use super::result::ResultState;
use crate::forms::{FormError, FormState};
use crate::inference::InferenceService;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("a {form} request is already in flight")]
    AlreadyPending { form: &'static str },
}

/// Copy of a controller's state at one instant.
#[derive(Debug, Clone)]
pub struct FormSnapshot<R> {
    pub form: FormState,
    pub result: ResultState<R>,
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    id: u64,
    revision: u64,
}

#[derive(Debug)]
struct ControllerState<R> {
    form: FormState,
    result: ResultState<R>,
    revision: u64,
    pending: Option<Ticket>,
    issued: u64,
}

impl<R: Clone> ControllerState<R> {
    fn snapshot(&self) -> FormSnapshot<R> {
        FormSnapshot {
            form: self.form.clone(),
            result: self.result.clone(),
            revision: self.revision,
        }
    }
}

/// Owns one form instance and the result of its latest submission.
///
/// At most one request is outstanding. Responses that land after the form
/// was edited or reset are dropped instead of overwriting newer state.
pub struct FormController<K: FormKind> {
    service: Arc<dyn InferenceService>,
    state: Arc<Mutex<ControllerState<K::Response>>>,
}

impl<K: FormKind> FormController<K> {
    pub fn new(service: Arc<dyn InferenceService>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(ControllerState {
                form: K::blank_form(),
                result: ResultState::Absent,
                revision: 0,
                pending: None,
                issued: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> FormSnapshot<K::Response> {
        lock(&self.state).snapshot()
    }

    pub fn edit(&self, field: &str, raw: &str) -> Result<FormSnapshot<K::Response>, FormError> {
        let mut state = lock(&self.state);
        state.form.set(field, raw)?;
        state.revision += 1;
        if state.result.is_resolved() {
            state.result = ResultState::Absent;
        }
        Ok(state.snapshot())
    }

    pub fn reset(&self) -> FormSnapshot<K::Response> {
        let mut state = lock(&self.state);
        state.form = K::blank_form();
        state.result = ResultState::Absent;
        state.revision += 1;
        if state.pending.take().is_some() {
            debug!(form = K::NAME, "reset while a request was in flight");
        }
        state.snapshot()
    }

    /// Adapts the form, calls the remote model and records the outcome.
    ///
    /// Validation failures become an `Error` result without a network call.
    pub async fn submit(&self) -> Result<FormSnapshot<K::Response>, SubmissionError> {
        let (ticket, payload) = {
            let mut state = lock(&self.state);
            if state.pending.is_some() {
                warn!(form = K::NAME, "duplicate submission rejected");
                return Err(SubmissionError::AlreadyPending { form: K::NAME });
            }
            let payload = match K::adapt(&state.form) {
                Ok(payload) => payload,
                Err(err) => {
                    state.result = ResultState::Error(err.to_string());
                    return Ok(state.snapshot());
                }
            };
            state.issued += 1;
            let ticket = Ticket {
                id: state.issued,
                revision: state.revision,
            };
            state.pending = Some(ticket);
            state.result = ResultState::Loading;
            (ticket, payload)
        };

        info!(form = K::NAME, ticket = ticket.id, "submission started");

        // Detached so a dropped caller cannot leave the form stuck in Loading.
        let service = Arc::clone(&self.service);
        let shared = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let outcome = K::dispatch(service.as_ref(), &payload).await;
            let mut state = lock(&shared);
            if state.pending != Some(ticket) {
                debug!(form = K::NAME, ticket = ticket.id, "superseded response discarded");
                return state.snapshot();
            }
            state.pending = None;
            if state.revision != ticket.revision {
                debug!(form = K::NAME, ticket = ticket.id, "stale response discarded");
                state.result = ResultState::Absent;
                return state.snapshot();
            }
            state.result = match outcome {
                Ok(response) => ResultState::Success(response),
                Err(err) => ResultState::Error(err.to_string()),
            };
            state.snapshot()
        });

        match task.await {
            Ok(snapshot) => Ok(snapshot),
            Err(join_error) => {
                error!(form = K::NAME, error = %join_error, "submission task failed");
                let mut state = lock(&self.state);
                if state.pending == Some(ticket) {
                    state.pending = None;
                    state.result =
                        ResultState::Error("An unexpected error occurred. Please try again.".into());
                }
                Ok(state.snapshot())
            }
        }
    }
}

fn lock<R>(state: &Mutex<ControllerState<R>>) -> MutexGuard<'_, ControllerState<R>> {
    state.lock().expect("form controller mutex poisoned")
}
