//! Error types for the conversational engine.

use edgar_core::error::EdgarError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("model error: {0}")]
    Model(String),
    #[error("stream error: {0}")]
    Stream(String),
}

impl From<EdgarError> for ChatError {
    fn from(err: EdgarError) -> Self {
        ChatError::Model(err.to_string())
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::Stream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::Model("python not found".to_string()).to_string(),
            "model error: python not found"
        );
        assert_eq!(
            ChatError::Stream("broken pipe".to_string()).to_string(),
            "stream error: broken pipe"
        );
    }

    #[test]
    fn test_from_edgar_error() {
        let err: ChatError = EdgarError::ModelNotFound("python".to_string()).into();
        assert!(matches!(err, ChatError::Model(_)));
        assert!(err.to_string().contains("python"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: ChatError = io.into();
        assert!(matches!(err, ChatError::Stream(_)));
        assert!(err.to_string().contains("pipe closed"));
    }
}
