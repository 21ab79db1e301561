pub mod memory;
pub mod save;
pub mod state;
pub mod sym;
pub mod text;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("index {index} out of range for field {name} (count: {count})")]
    IndexOutOfRange { name: String, index: usize, count: usize },

    #[error("field at {start:#x}+{len} out of bounds of {save_len} byte save")]
    OutOfBounds { start: usize, len: usize, save_len: usize },

    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("missing state block: {0}")]
    MissingBlock(String),

    #[error("truncated state block {name} at {offset:#x}")]
    TruncatedBlock { name: String, offset: usize },

    #[error("missing symbol: {0}")]
    MissingSymbol(String),

    #[error("field {name} does not fit inside block {block}")]
    FieldOutsideBlock { name: String, block: String },

    #[error("address {addr:#06x} in bank {bank} is not in work ram")]
    NotWorkRam { bank: u8, addr: u16 },

    #[error("invalid symbol file line {line}: {text:?}")]
    InvalidSymbolLine { line: usize, text: String },

    #[error("cannot encode character {0:?}")]
    UnencodableChar(char),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
