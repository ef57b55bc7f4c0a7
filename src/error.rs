use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("engine failed to load: {0}")]
    EngineLoad(String),

    #[error("{name} value {value} is outside valid range [0, 200]")]
    InvalidParameter { name: &'static str, value: i64 },

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
