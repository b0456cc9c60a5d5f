use serde::Serialize;

/// What the result area of a form shows. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ResultState<T> {
    Absent,
    Loading,
    Success(T),
    Error(String),
}

impl<T> Default for ResultState<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> ResultState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResultState::Loading)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResultState::Success(_) | ResultState::Error(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            ResultState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ResultState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResultState<U> {
        match self {
            ResultState::Absent => ResultState::Absent,
            ResultState::Loading => ResultState::Loading,
            ResultState::Success(value) => ResultState::Success(f(value)),
            ResultState::Error(message) => ResultState::Error(message),
        }
    }
}
