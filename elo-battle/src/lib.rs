//! Automated trainer battles: probe the game's own AI for both sides' decisions and feed them back as controller
//! input.

pub mod battle;
pub mod breakpoint;
pub mod demo;
pub mod probe;
pub mod record;
pub mod setup;
pub mod workspace;

#[cfg(test)]
mod testing;

use elo_dataview::{memory, save, state, sym};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("save: {0}")]
    Dataview(#[from] elo_dataview::Error),

    #[error("gamedb: {0}")]
    GameDb(#[from] elo_gamedb::Error),

    #[error("emulator: {0}")]
    Emulator(#[from] bgb::Error),

    #[error("unrecognized program counter: {0:04x}")]
    UnrecognizedAddress(u16),

    #[error("breakpoint address {addr:04x} is shared by {first} and {second}")]
    AmbiguousBreakpoint { addr: u16, first: String, second: String },

    #[error("item {0:#04x} is not in the item pool")]
    ItemNotInPool(u8),

    #[error("switch index {0} does not name a party slot")]
    InvalidSwitchIndex(u8),

    #[error("move slot {0} out of range")]
    MoveSlotOutOfRange(u8),

    #[error("run directory already exists: {}", .0.display())]
    RunExists(std::path::PathBuf),

    #[error("record: {0}")]
    Record(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Saves every battle and probe starts from.
#[derive(Clone, Debug)]
pub struct Templates {
    /// Overworld save standing next to the trainer the battle is started against.
    pub base: std::path::PathBuf,
    /// Battle-menu save the AI move/item/switch decision is probed from.
    pub ai: std::path::PathBuf,
    /// Party-menu save the AI's forced switch is probed from.
    pub switch: std::path::PathBuf,
}

/// Read-only tables shared by every battle of a process.
pub struct Context {
    pub db: elo_gamedb::GameDb,
    pub memory: memory::MemoryMap,
    pub breakpoints: breakpoint::BreakpointTable,
    pub templates: Templates,
}

impl Context {
    /// The state layout is read from the base template, which shares it with every save the emulator produces.
    pub fn new(db: elo_gamedb::GameDb, symbols: &sym::Symbols, templates: Templates) -> Result<Self, Error> {
        let base = save::Save::load(&templates.base)?;
        let layout = state::Layout::parse(base.as_slice())?;
        Ok(Self {
            db,
            memory: memory::MemoryMap::crystal(symbols, &layout)?,
            breakpoints: breakpoint::BreakpointTable::resolve(symbols)?,
            templates,
        })
    }
}

/// Everything one run needs to drive the emulator.
pub struct Session<'a> {
    pub ctx: &'a Context,
    pub emulator: &'a dyn bgb::Emulator,
    pub workspace: &'a workspace::Workspace,
    pub timeout: Option<std::time::Duration>,
    /// Capture video of battle segments.
    pub record: bool,
}

impl<'a> Session<'a> {
    /// Runs the emulator and loads the save it halted with.
    pub fn run(
        &self,
        input_save: &std::path::Path,
        output_save: &std::path::Path,
        breakpoints: &[bgb::Breakpoint],
        demo: Option<&std::path::Path>,
        capture: Option<&bgb::Capture>,
    ) -> Result<save::Save, Error> {
        self.emulator.run(&bgb::RunRequest {
            input_save,
            output_save,
            breakpoints,
            demo,
            capture,
            timeout: self.timeout,
        })?;
        Ok(save::Save::load(output_save)?)
    }
}
