use thiserror::Error;

/// Everything that can go wrong between a button press and the server's answer.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// The request never produced a response.
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with an empty body.
    #[error("empty response from server")]
    EmptyResponse,

    /// The body was not the JSON we expected.
    #[error("invalid JSON from server: {0}")]
    Parse(#[from] serde_json::Error),

    /// `success: false` with the server's message.
    #[error("{0}")]
    Rejected(String),

    /// Caught before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("could not decode image data: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ShelfError>;

impl ShelfError {
    /// Text shown in the toast for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) | Self::EmptyResponse | Self::Parse(_) => {
                "Could not reach the server. Please try again.".to_owned()
            }
            Self::Rejected(msg) | Self::Validation(msg) => msg.clone(),
            Self::Image(err) => format!("Image could not be processed: {err}"),
            Self::Decode(msg) => format!("Image could not be decoded: {msg}"),
        }
    }
}

impl From<base64::DecodeError> for ShelfError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_messages_are_shown_verbatim() {
        let err = ShelfError::Rejected("Title already exists".to_owned());
        assert_eq!(err.user_message(), "Title already exists");
    }

    #[test]
    fn transport_failures_get_a_generic_banner() {
        assert_eq!(
            ShelfError::EmptyResponse.user_message(),
            "Could not reach the server. Please try again."
        );
        let parse = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert_eq!(
            ShelfError::from(parse).user_message(),
            ShelfError::EmptyResponse.user_message()
        );
    }
}
