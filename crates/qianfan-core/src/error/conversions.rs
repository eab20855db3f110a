//! Conversions from library errors into QianfanError

use super::types::QianfanError;

impl From<reqwest::Error> for QianfanError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string());
        if err.is_decode() {
            return QianfanError::json(err.to_string());
        }
        QianfanError::Transport {
            message: err.to_string(),
            url,
            timeout: err.is_timeout(),
        }
    }
}

impl From<serde_json::Error> for QianfanError {
    fn from(err: serde_json::Error) -> Self {
        QianfanError::json(err.to_string())
    }
}
