use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(tsctl::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(tsctl::config::invalid))]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    #[diagnostic(code(tsctl::config::missing_field))]
    MissingField { field: String },

    #[error("Space {space_number} is configured more than once (line {line})")]
    #[diagnostic(
        code(tsctl::config::duplicate_space),
        help("Each space number may appear only once in the `spaces` block")
    )]
    DuplicateSpace { space_number: u32, line: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
