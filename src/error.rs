use thiserror::Error;

/// Errors surfaced by the safe Rust API.
///
/// The C entry points never produce these; they return FLANN's status
/// codes (or a null handle) unchanged.
#[derive(Debug, Error)]
pub enum FlannError {
    #[error("FLANN failed to build the index")]
    BuildFailed,

    #[error("FLANN search failed with status {code}")]
    Search { code: i32 },

    #[error("cannot build an index over an empty dataset")]
    EmptyDataset,

    #[error("buffer holds {len} floats, not a multiple of {cols} columns")]
    ShapeMismatch { len: usize, cols: usize },

    #[error("query has {got} columns but the index was built with {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("neighbours requested must be positive")]
    InvalidNeighbors,

    #[error("requested {requested} neighbours but the index holds only {rows} rows")]
    TooManyNeighbors { requested: usize, rows: usize },

    #[error("output buffer holds {got} entries, {needed} required")]
    OutputTooSmall { needed: usize, got: usize },

    #[error("{what} of {value} exceeds the C int range")]
    TooLarge { what: &'static str, value: usize },

    #[error("{what} of {value} does not fit in 32 bits")]
    OutOfRange { what: &'static str, value: i64 },

    #[error("unknown {kind} value {value}")]
    UnknownEnum { kind: &'static str, value: i64 },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlannError>;
