use thiserror::Error;

#[derive(Error, Debug)]
pub enum QapBenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in '{file}': {message}")]
    Parse { file: String, message: String },

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),
}
