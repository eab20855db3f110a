//! API capabilities offered by the platform

use crate::error::QianfanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Family of endpoints a model is served under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Chat,
    Completions,
    Embeddings,
    Reranker,
    Text2Image,
    Image2Text,
    Plugin,
    /// Management API on the console host
    Console,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Self::Chat,
        Self::Completions,
        Self::Embeddings,
        Self::Reranker,
        Self::Text2Image,
        Self::Image2Text,
        Self::Plugin,
        Self::Console,
    ];

    /// Name used as `apiType` by the service catalog
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Completions => "completions",
            Self::Embeddings => "embeddings",
            Self::Reranker => "reranker",
            Self::Text2Image => "text2image",
            Self::Image2Text => "image2text",
            Self::Plugin => "plugin",
            Self::Console => "console",
        }
    }

    /// Whether model endpoints of this capability are listed by the catalog
    pub fn is_model_api(self) -> bool {
        !matches!(self, Self::Console)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = QianfanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|cap| cap.as_str() == lower)
            .ok_or_else(|| QianfanError::validation_field(format!("unknown capability '{}'", s), "capability"))
    }
}
