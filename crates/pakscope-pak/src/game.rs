//! Game descriptors supplied by the host's family configuration.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Engine tag selecting the decoder family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Engine {
    Danae,
    Void,
    Bullfrog,
    GoldSrc,
    Source,
    Source2,
    Quake,
    Origin,
    Zip,
    Other(String),
}

impl From<String> for Engine {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

impl From<&str> for Engine {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "danae" => Engine::Danae,
            "void" => Engine::Void,
            "bullfrog" => Engine::Bullfrog,
            "goldsrc" => Engine::GoldSrc,
            "source" | "valve" => Engine::Source,
            "source2" => Engine::Source2,
            "quake" | "id" => Engine::Quake,
            "origin" => Engine::Origin,
            "zip" => Engine::Zip,
            _ => Engine::Other(value.to_string()),
        }
    }
}

impl From<Engine> for String {
    fn from(value: Engine) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Engine::Danae => "Danae",
            Engine::Void => "Void",
            Engine::Bullfrog => "Bullfrog",
            Engine::GoldSrc => "GoldSrc",
            Engine::Source => "Source",
            Engine::Source2 => "Source2",
            Engine::Quake => "Quake",
            Engine::Origin => "Origin",
            Engine::Zip => "Zip",
            Engine::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// XOR key, given either as text or as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameKey {
    Text(String),
    Bytes(Vec<u8>),
}

impl GameKey {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            GameKey::Text(text) => text.as_bytes(),
            GameKey::Bytes(bytes) => bytes,
        }
    }
}

/// Read-only description of the game an archive belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDescriptor {
    pub id: String,
    pub engine: Engine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<GameKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

impl GameDescriptor {
    pub fn new(id: impl Into<String>, engine: impl Into<Engine>) -> Self {
        Self {
            id: id.into(),
            engine: engine.into(),
            key: None,
            paths: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: GameKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Raw key bytes, if the game has a key.
    pub fn key_bytes(&self) -> Option<&[u8]> {
        self.key.as_ref().map(GameKey::as_bytes).filter(|k| !k.is_empty())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
