use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Engine error (what={what}, extra={extra})")]
    Engine { what: i32, extra: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
