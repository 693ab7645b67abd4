#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A field that must contain base-16 digits held something else.
    #[error("{field} is not a hexadecimal string: {value:?}")]
    InvalidHex { field: &'static str, value: String },

    /// The raw sensor reading carries fewer hex characters than the
    /// firmware encoding requires. Never a partial parse.
    #[error("reading too short: need at least {min} hex characters, got {got}")]
    ReadingTooShort { min: usize, got: usize },
}
