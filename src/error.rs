use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Marker document is not valid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("No marker labeled {0:?}")]
    NotFound(String),

    #[error("Marker label cannot be empty")]
    EmptyLabel,
}

pub type Result<T> = std::result::Result<T, MarkerError>;
