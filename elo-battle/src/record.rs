//! Append-only battle log, keyed by the seed a battle was run with.

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnKind {
    ForceSwitch,
    Item,
    Switch,
    Move,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Player,
    Enemy,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainerId {
    pub class: u8,
    pub instance: u8,
}

impl From<&elo_gamedb::Trainer> for TrainerId {
    fn from(trainer: &elo_gamedb::Trainer) -> Self {
        Self {
            class: trainer.class,
            instance: trainer.instance,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Mon {
    pub species: u8,
    pub hp: u16,
    pub max_hp: u16,
    pub party_index: u8,
}

impl From<elo_dataview::save::Snapshot> for Mon {
    fn from(snapshot: elo_dataview::save::Snapshot) -> Self {
        Self {
            species: snapshot.species,
            hp: snapshot.hp,
            max_hp: snapshot.max_hp,
            party_index: snapshot.party_index,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    Start {
        seed: u64,
        player: TrainerId,
        enemy: TrainerId,
    },
    Turn {
        seed: u64,
        kind: TurnKind,
        /// Party index for switches, item id for items, move id for moves.
        detail: u8,
        player: Mon,
        enemy: Mon,
    },
    Finish {
        seed: u64,
        outcome: Outcome,
    },
}

/// Returned by [`Recorder::start`] and passed back for every later event of the same battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle {
    pub seed: u64,
}

pub trait Recorder {
    fn append(&mut self, event: Event) -> Result<(), crate::Error>;

    fn start(&mut self, seed: u64, player: TrainerId, enemy: TrainerId) -> Result<Handle, crate::Error> {
        self.append(Event::Start { seed, player, enemy })?;
        Ok(Handle { seed })
    }

    fn record_turn(
        &mut self,
        handle: &Handle,
        kind: TurnKind,
        detail: u8,
        player: Mon,
        enemy: Mon,
    ) -> Result<(), crate::Error> {
        self.append(Event::Turn {
            seed: handle.seed,
            kind,
            detail,
            player,
            enemy,
        })
    }

    fn finish(&mut self, handle: Handle, outcome: Outcome) -> Result<(), crate::Error> {
        self.append(Event::Finish {
            seed: handle.seed,
            outcome,
        })
    }
}

/// One JSON object per line, appended to a file shared by every battle of a batch.
pub struct JsonLinesRecorder {
    f: std::fs::File,
}

impl JsonLinesRecorder {
    pub fn open(path: &std::path::Path) -> Result<Self, crate::Error> {
        let f = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { f })
    }
}

impl Recorder for JsonLinesRecorder {
    fn append(&mut self, event: Event) -> Result<(), crate::Error> {
        use std::io::Write;
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        self.f.write_all(&line)?;
        self.f.flush()?;
        Ok(())
    }
}

#[derive(Default, Debug)]
pub struct MemoryRecorder {
    pub events: Vec<Event>,
}

impl Recorder for MemoryRecorder {
    fn append(&mut self, event: Event) -> Result<(), crate::Error> {
        self.events.push(event);
        Ok(())
    }
}
