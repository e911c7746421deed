use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemandSignalError>;

#[derive(Error, Debug)]
pub enum DemandSignalError {
    /// A record reached the engine without the fields every post must carry.
    #[error("Data contract violation: {0}")]
    DataContract(String),

    /// A parameter or vocabulary entry the engine cannot run with.
    #[error("Configuration error: {0}")]
    Configuration(String),
}
