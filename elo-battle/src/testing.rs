//! A scripted emulator and a throwaway run environment.

use elo_dataview::memory::{self, MemoryMap};
use elo_dataview::save::{self, Save};
use elo_dataview::sym;

/// A ROM address that no breakpoint table knows about.
pub const ELSEWHERE: &str = "Elsewhere";

pub fn symbols() -> sym::Symbols {
    let mut symbols = memory::fixtures::symbols();
    let labels = [
        crate::breakpoint::WIN,
        crate::breakpoint::LOSE,
        crate::breakpoint::PARTY_MENU,
        crate::breakpoint::BATTLE_MENU,
        crate::breakpoint::TRAINER_INFO,
        crate::breakpoint::PROBE_LOAD,
        crate::breakpoint::PROBE_SWITCH,
        ELSEWHERE,
    ]
    .into_iter()
    .chain(crate::breakpoint::PROBE_MOVE.iter().copied())
    .chain(crate::breakpoint::PROBE_ITEMS.iter().map(|(label, _)| *label));
    for (i, label) in labels.enumerate() {
        symbols.insert(label, 1, 0x4000 + 0x10 * i as u16);
    }
    symbols
}

pub fn db() -> elo_gamedb::GameDb {
    let trainer = |class, instance, gender| elo_gamedb::Trainer {
        class,
        instance,
        gender,
    };
    let move_ = |id, name: &str, pp| elo_gamedb::Move {
        id,
        name: name.to_string(),
        pp,
    };
    elo_gamedb::GameDb::new(
        vec![
            trainer(35, 1, elo_gamedb::Gender::Male),
            trainer(14, 1, elo_gamedb::Gender::Enby),
            trainer(9, 2, elo_gamedb::Gender::Female),
        ],
        vec![
            move_(1, "POUND", 35),
            move_(2, "SKY ATTACK", 5),
            move_(3, "DOUBLESLAP", 10),
            move_(4, "TACKLE", 35),
        ],
        vec!["BULBASAUR".to_string(), "IVYSAUR".to_string(), "VENUSAUR".to_string()],
    )
    .unwrap()
}

#[derive(Clone, Debug)]
pub struct Call {
    pub input: Vec<u8>,
    pub demo: Option<Vec<u8>>,
    pub breakpoints: String,
}

type Patch = Box<dyn Fn(&mut Save, &MemoryMap)>;

/// Halts each run at the next scripted label: the output is the input with the program counter moved there, the
/// clock advanced, and the step's patch applied.
pub struct FakeEmulator {
    symbols: sym::Symbols,
    map: MemoryMap,
    script: std::cell::RefCell<std::collections::VecDeque<(&'static str, Patch)>>,
    calls: std::cell::RefCell<Vec<Call>>,
}

impl FakeEmulator {
    pub fn new(symbols: sym::Symbols, map: MemoryMap) -> Self {
        Self {
            symbols,
            map,
            script: Default::default(),
            calls: Default::default(),
        }
    }

    pub fn push(&self, label: &'static str, patch: impl Fn(&mut Save, &MemoryMap) + 'static) {
        self.script.borrow_mut().push_back((label, Box::new(patch)));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl bgb::Emulator for FakeEmulator {
    fn run(&self, req: &bgb::RunRequest) -> Result<(), bgb::Error> {
        let input = std::fs::read(req.input_save)?;
        let demo = req.demo.map(std::fs::read).transpose()?;
        self.calls.borrow_mut().push(Call {
            input: input.clone(),
            demo,
            breakpoints: bgb::breakpoint::join(req.breakpoints),
        });

        let Some((label, patch)) = self.script.borrow_mut().pop_front() else {
            return Err(bgb::Error::BreakpointNotReached(req.output_save.to_path_buf()));
        };

        let mut save = Save::from_vec(input);
        let pc = self.symbols.get(label).unwrap().addr;
        save.set(self.map.field(memory::PROGRAM_COUNTER).unwrap(), &pc.to_le_bytes())
            .unwrap();
        let clocks = save::total_clocks(&save, &self.map).unwrap() + 0x1000;
        save.set(self.map.field(memory::TOTAL_CLOCKS).unwrap(), &clocks.to_le_bytes())
            .unwrap();
        patch(&mut save, &self.map);

        std::fs::write(req.output_save, save.as_slice())?;
        Ok(())
    }
}

pub struct Env {
    pub ctx: crate::Context,
    pub workspace: crate::workspace::Workspace,
    pub emulator: FakeEmulator,
    _dir: tempfile::TempDir,
}

impl Env {
    pub fn new(run_id: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name);

        for name in ["base.sna", "ai.sna", "switch.sna"] {
            std::fs::write(path(name), memory::fixtures::state()).unwrap();
        }
        std::fs::write(path("pokecrystal.gbc"), b"rom").unwrap();
        std::fs::write(path("pokecrystal.sym"), b"").unwrap();

        let ctx = crate::Context::new(
            db(),
            &symbols(),
            crate::Templates {
                base: path("base.sna"),
                ai: path("ai.sna"),
                switch: path("switch.sna"),
            },
        )
        .unwrap();
        let workspace = crate::workspace::Workspace::create(
            &path("scratch"),
            &path("output"),
            run_id,
            &path("pokecrystal.gbc"),
            &path("pokecrystal.sym"),
            None,
        )
        .unwrap();
        let emulator = FakeEmulator::new(symbols(), ctx.memory.clone());

        Self {
            ctx,
            workspace,
            emulator,
            _dir: dir,
        }
    }

    pub fn session(&self) -> crate::Session<'_> {
        crate::Session {
            ctx: &self.ctx,
            emulator: &self.emulator,
            workspace: &self.workspace,
            timeout: None,
            record: false,
        }
    }
}
