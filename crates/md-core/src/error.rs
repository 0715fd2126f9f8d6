use thiserror::Error;

#[derive(Debug, Error)]
pub enum MdError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("mismatch: {0}")]
    Mismatch(String),
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<MdError>,
    },
}

pub type MdResult<T> = Result<T, MdError>;

impl MdError {
    /// Innermost error once every `Context` layer is peeled off.
    pub fn root(&self) -> &MdError {
        match self {
            MdError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_missing_capability(&self) -> bool {
        matches!(self.root(), MdError::Unsupported(_))
    }
}

pub trait ResultExt<T> {
    fn context(self, context: &str) -> MdResult<T>;
}

impl<T> ResultExt<T> for MdResult<T> {
    fn context(self, context: &str) -> MdResult<T> {
        self.map_err(|err| MdError::Context {
            context: context.to_string(),
            source: Box::new(err),
        })
    }
}
