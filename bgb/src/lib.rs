//! The emulator boundary: run a save state until a breakpoint, optionally with scripted input, and collect the state
//! the emulator wrote on halting.

pub mod breakpoint;
pub mod process;

pub use breakpoint::{Breakpoint, Condition};
pub use process::Bgb;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to start emulator: {0}")]
    Spawn(std::io::Error),

    #[error("emulator timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("emulator exited with {0}")]
    Exited(std::process::ExitStatus),

    #[error("no breakpoint reached: {} was not written", .0.display())]
    BreakpointNotReached(std::path::PathBuf),

    #[error("invalid emulator arguments: {0}")]
    InvalidArgs(#[from] shell_words::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Video capture of a run, forwarded to the emulator untouched.
#[derive(Clone, Debug)]
pub struct Capture {
    pub output_path: std::path::PathBuf,
}

pub struct RunRequest<'a> {
    pub input_save: &'a std::path::Path,
    pub output_save: &'a std::path::Path,
    pub breakpoints: &'a [Breakpoint],
    pub demo: Option<&'a std::path::Path>,
    pub capture: Option<&'a Capture>,
    pub timeout: Option<std::time::Duration>,
}

pub trait Emulator {
    /// Runs until the first matching breakpoint and writes the halted state to `req.output_save`. Blocks until the
    /// emulator exits.
    fn run(&self, req: &RunRequest) -> Result<(), Error>;
}
