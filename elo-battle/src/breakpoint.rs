//! The routines the harness halts on, and classification of a halted program counter.

use elo_dataview::{memory, sym};

pub const WIN: &str = "WinTrainerBattle";
pub const LOSE: &str = "LostBattle";
pub const PARTY_MENU: &str = "SetUpBattlePartyMenu";
pub const BATTLE_MENU: &str = "BattleMenu";

/// Reached once the other trainer's party and name have been loaded.
pub const TRAINER_INFO: &str = "PlaceCommandCharacter";

pub const PROBE_LOAD: &str = "LoadEnemyMon";
pub const PROBE_MOVE: &[&str] = &[
    "PlayerTurn_EndOpponentProtectEndureDestinyBond",
    "EnemyTurn_EndOpponentProtectEndureDestinyBond",
];
pub const PROBE_SWITCH: &str = "AI_Switch";
pub const PROBE_ITEMS: &[(&str, u8)] = &[
    ("EnemyUsedFullHeal", elo_gamedb::FULL_HEAL),
    ("EnemyUsedMaxPotion", elo_gamedb::MAX_POTION),
    ("EnemyUsedFullRestore", elo_gamedb::FULL_RESTORE),
    ("EnemyUsedPotion", elo_gamedb::POTION),
    ("EnemyUsedSuperPotion", elo_gamedb::SUPER_POTION),
    ("EnemyUsedHyperPotion", elo_gamedb::HYPER_POTION),
    ("EnemyUsedXAccuracy", elo_gamedb::X_ACCURACY),
    ("EnemyUsedGuardSpec", elo_gamedb::GUARD_SPEC),
    ("EnemyUsedDireHit", elo_gamedb::DIRE_HIT),
    ("EnemyUsedXAttack", elo_gamedb::X_ATTACK),
    ("EnemyUsedXDefend", elo_gamedb::X_DEFEND),
    ("EnemyUsedXSpeed", elo_gamedb::X_SPEED),
    ("EnemyUsedXSpecial", elo_gamedb::X_SPECIAL),
];

const BATTLE_LABELS: &[(&str, BattleHalt)] = &[
    (BATTLE_MENU, BattleHalt::BattleMenu),
    (PARTY_MENU, BattleHalt::PartyMenu),
    (WIN, BattleHalt::Win),
    (LOSE, BattleHalt::Lose),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BattleHalt {
    Win,
    Lose,
    PartyMenu,
    BattleMenu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbeHalt {
    Move,
    Load,
    Switch,
    Item(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Halt {
    Battle(BattleHalt),
    Probe(ProbeHalt),
}

fn probe_labels() -> impl Iterator<Item = (&'static str, ProbeHalt)> {
    std::iter::once((PROBE_LOAD, ProbeHalt::Load))
        .chain(PROBE_MOVE.iter().map(|label| (*label, ProbeHalt::Move)))
        .chain(std::iter::once((PROBE_SWITCH, ProbeHalt::Switch)))
        .chain(PROBE_ITEMS.iter().map(|(label, item)| (*label, ProbeHalt::Item(*item))))
}

/// Breakpoint addresses resolved against the ROM's symbol file.
#[derive(Clone, Debug)]
pub struct BreakpointTable {
    halts: std::collections::HashMap<u16, Halt>,
}

impl BreakpointTable {
    pub fn resolve(symbols: &sym::Symbols) -> Result<Self, crate::Error> {
        let mut halts = std::collections::HashMap::new();
        let mut labels: std::collections::HashMap<u16, &str> = std::collections::HashMap::new();

        let entries = BATTLE_LABELS
            .iter()
            .map(|(label, halt)| (*label, Halt::Battle(*halt)))
            .chain(probe_labels().map(|(label, halt)| (label, Halt::Probe(halt))));

        for (label, halt) in entries {
            let addr = symbols.get(label)?.addr;
            match halts.get(&addr) {
                Some(existing) if *existing != halt => {
                    return Err(crate::Error::AmbiguousBreakpoint {
                        addr,
                        first: labels[&addr].to_string(),
                        second: label.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    halts.insert(addr, halt);
                    labels.insert(addr, label);
                }
            }
        }

        Ok(Self { halts })
    }

    pub fn classify_battle(&self, pc: u16) -> Result<BattleHalt, crate::Error> {
        match self.halts.get(&pc) {
            Some(Halt::Battle(halt)) => Ok(*halt),
            _ => Err(crate::Error::UnrecognizedAddress(pc)),
        }
    }

    pub fn classify_probe(&self, pc: u16) -> Result<ProbeHalt, crate::Error> {
        match self.halts.get(&pc) {
            Some(Halt::Probe(halt)) => Ok(*halt),
            _ => Err(crate::Error::UnrecognizedAddress(pc)),
        }
    }
}

/// Breakpoints for advancing the battle. Gated on the clock so the save's own halting address does not trip them
/// again immediately.
pub fn battle_breakpoints(total_clocks: u64) -> Vec<bgb::Breakpoint> {
    BATTLE_LABELS
        .iter()
        .map(|(label, _)| bgb::Breakpoint::new(label).unless_equal(memory::TOTAL_CLOCKS, total_clocks))
        .collect()
}

pub fn probe_breakpoints() -> Vec<bgb::Breakpoint> {
    probe_labels().map(|(label, _)| bgb::Breakpoint::new(label)).collect()
}

pub fn trainer_info_breakpoints() -> Vec<bgb::Breakpoint> {
    vec![bgb::Breakpoint::new(TRAINER_INFO)]
}
