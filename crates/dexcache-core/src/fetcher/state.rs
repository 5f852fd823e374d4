use super::LoadError;

/// Lifecycle of a single load request: `Pending` until it either
/// resolves or fails. There is no way back to `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    Pending,
    Resolved(T),
    Failed(LoadError),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Pending
    }
}

impl<T> From<Result<T, LoadError>> for LoadState<T> {
    fn from(result: Result<T, LoadError>) -> Self {
        match result {
            Ok(value) => LoadState::Resolved(value),
            Err(e) => LoadState::Failed(e),
        }
    }
}
