use thiserror::Error;

/// Errors raised while parsing a job-results document or extracting
/// reservation records from it. All of these abort the whole
/// extraction; there is no per-recipe recovery.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("<{element} id={id}>: missing required attribute '{attr}'")]
    MissingAttribute {
        element: String,
        id: String,
        attr: String,
    },
    #[error("<{element}>: attribute 'id' is not numeric: '{value}'")]
    MalformedId { element: String, value: String },
}
