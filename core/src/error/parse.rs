use thiserror::Error;

/// Operator-facing report for parameter text that no leniency pass could
/// turn into JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "JSON PARSE ERROR:\n\
     - Message: {message}\n\
     - Location: Char {position}\n\
     - Context: \"{context}\"\n\
     - Hex codes: {hex_dump}\n\
     - Document start: {document_start}..."
)]
pub struct ParseError {
    pub message: String,
    /// Character offset into the text of the last attempted pass.
    pub position: usize,
    pub context: String,
    pub hex_dump: String,
    pub document_start: String,
    /// Name of the leniency pass whose failure is reported.
    pub pass: &'static str,
}
