use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {context}")]
    StorageUnavailable {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub(crate) fn unavailable(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StoreError::StorageUnavailable {
            context: context.into(),
            source: source.into(),
        }
    }
}
