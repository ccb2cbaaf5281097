use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostError {
    /// Bad input shape or content. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// A referenced post or taxonomy does not exist. Nothing was written.
    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    /// The query filter was malformed and the whole query was abandoned.
    #[error("query rejected: {0}")]
    FilterRejected(String),
}

impl PostError {
    pub fn validation(msg: &str) -> Self {
        PostError::Validation(msg.to_string())
    }

    pub fn not_found(msg: &str) -> Self {
        PostError::NotFound(msg.to_string())
    }

    pub fn rejected(msg: &str) -> Self {
        PostError::FilterRejected(msg.to_string())
    }
}

impl From<rusqlite::Error> for PostError {
    fn from(value: rusqlite::Error) -> Self {
        PostError::Storage(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(PostError::validation("title required").to_string(), "title required");
        assert_eq!(PostError::not_found("post not found").to_string(), "post not found");
        assert_eq!(PostError::rejected("mm out of range").to_string(), "query rejected: mm out of range");
    }

    #[test]
    fn test_from_sqlite() {
        let err: PostError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, PostError::Storage(_)));
    }
}
