//! Named fields of a Crystal battle save.
//!
//! Fields are declared against either an emulator state block (registers) or a pokecrystal work RAM label, and
//! resolved once into absolute save offsets.

use crate::{state, sym};

pub const PROGRAM_COUNTER: &str = "PC";
pub const TOTAL_CLOCKS: &str = "TOTALCLKS";
pub const DIVIDER_REGISTER: &str = "DIV";

pub const OTHER_TRAINER_CLASS: &str = "wOtherTrainerClass";
pub const OTHER_TRAINER_ID: &str = "wOtherTrainerID";
pub const TRAINER_CLASS: &str = "wTrainerClass";

pub const PLAYER_PARTY: &str = "wPlayerParty";
pub const PARTY_MONS: &str = "wPartyMons";
pub const PARTY_MON_OTS: &str = "wPartyMonOTs";
pub const PARTY_MON_NICKNAMES: &str = "wPartyMonNicknames";
pub const OT_PARTY: &str = "wOTParty";
pub const OT_PARTY_COUNT: &str = "wOTPartyCount";
pub const OT_PARTY_MONS: &str = "wOTPartyMons";

pub const BATTLE_MON: &str = "wBattleMon";
pub const BATTLE_MON_SPECIES: &str = "wBattleMonSpecies";
pub const BATTLE_MON_MOVES: &str = "wBattleMonMoves";
pub const BATTLE_MON_PP: &str = "wBattleMonPP";
pub const BATTLE_MON_HP: &str = "wBattleMonHP";
pub const BATTLE_MON_MAX_HP: &str = "wBattleMonMaxHP";
pub const BATTLE_MON_NICKNAME: &str = "wBattleMonNickname";
pub const ENEMY_MON: &str = "wEnemyMon";
pub const ENEMY_MON_SPECIES: &str = "wEnemyMonSpecies";
pub const ENEMY_MON_MOVES: &str = "wEnemyMonMoves";
pub const ENEMY_MON_PP: &str = "wEnemyMonPP";
pub const ENEMY_MON_HP: &str = "wEnemyMonHP";
pub const ENEMY_MON_MAX_HP: &str = "wEnemyMonMaxHP";
pub const ENEMY_MON_NICKNAME: &str = "wEnemyMonNickname";

pub const CUR_PARTY_MON: &str = "wCurPartyMon";
pub const CUR_BATTLE_MON: &str = "wCurBattleMon";
pub const CUR_OT_MON: &str = "wCurOTMon";
pub const CUR_MOVE_NUM: &str = "wCurMoveNum";
pub const CUR_ENEMY_MOVE_NUM: &str = "wCurEnemyMoveNum";
pub const ENEMY_SWITCH_MON_INDEX: &str = "wEnemySwitchMonIndex";

pub const PLAYER_SUB_STATUS: &str = "wPlayerSubStatus";
pub const ENEMY_SUB_STATUS: &str = "wEnemySubStatus";
pub const PLAYER_STAT_LEVELS: &str = "wPlayerStatLevels";
pub const ENEMY_STAT_LEVELS: &str = "wEnemyStatLevels";
pub const PLAYER_STATS: &str = "wPlayerStats";
pub const ENEMY_STATS: &str = "wEnemyStats";
pub const PLAYER_SCREENS: &str = "wPlayerScreens";
pub const ENEMY_SCREENS: &str = "wEnemyScreens";
pub const PLAYER_TOXIC_COUNT: &str = "wPlayerToxicCount";
pub const ENEMY_TOXIC_COUNT: &str = "wEnemyToxicCount";
pub const PLAYER_DISABLE_COUNT: &str = "wPlayerDisableCount";
pub const ENEMY_DISABLE_COUNT: &str = "wEnemyDisableCount";
pub const PLAYER_MOVE_STRUCT: &str = "wPlayerMoveStruct";
pub const ENEMY_MOVE_STRUCT: &str = "wEnemyMoveStruct";
pub const PLAYER_TURNS_TAKEN: &str = "wPlayerTurnsTaken";
pub const ENEMY_TURNS_TAKEN: &str = "wEnemyTurnsTaken";

pub const PLAYER_USED_MOVES: &str = "wPlayerUsedMoves";
pub const ENEMY_TRAINER_ITEMS: &str = "wEnemyTrainerItems";
pub const NUM_ITEMS: &str = "wNumItems";
pub const ITEMS: &str = "wItems";
pub const PLAYER_NAME: &str = "wPlayerName";
pub const PLAYER_NAME_END: &str = "wPlayerNameEnd";
pub const PLAYER_GENDER: &str = "wPlayerGender";
pub const STRING_BUFFER_1: &str = "wStringBuffer1";
pub const TEXTBOX_FRAME: &str = "wTextboxFrame";

pub const NAME_LENGTH: usize = 11;
pub const PARTY_LENGTH: usize = 6;
pub const PARTY_MON_LENGTH: usize = 0x30;
pub const BATTLE_STRUCT_LENGTH: usize = 0x20;
pub const NUM_MOVES: usize = 4;

// Count, species list with terminator, six mon structs, six OT names, six nicknames.
const PARTY_SPECIES_OFFSET: usize = 1;
const PARTY_MONS_OFFSET: usize = PARTY_SPECIES_OFFSET + PARTY_LENGTH + 1;
const PARTY_OTS_OFFSET: usize = PARTY_MONS_OFFSET + PARTY_LENGTH * PARTY_MON_LENGTH;
const PARTY_NICKNAMES_OFFSET: usize = PARTY_OTS_OFFSET + PARTY_LENGTH * NAME_LENGTH;
pub const PARTY_BLOCK_LENGTH: usize = PARTY_NICKNAMES_OFFSET + PARTY_LENGTH * NAME_LENGTH;

// battle_struct offsets.
const BATTLE_MOVES_OFFSET: usize = 0x02;
const BATTLE_PP_OFFSET: usize = 0x08;
const BATTLE_HP_OFFSET: usize = 0x10;
const BATTLE_MAX_HP_OFFSET: usize = 0x12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Offset into an emulator state block.
    Block(&'static str, usize),
    /// Offset from a work RAM label.
    Symbol(&'static str, usize),
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub location: Location,
    pub len: usize,
    pub count: usize,
    pub stride: usize,
}

const fn field(name: &'static str, location: Location, len: usize) -> FieldSpec {
    FieldSpec {
        name,
        location,
        len,
        count: 1,
        stride: len,
    }
}

const fn indexed(name: &'static str, location: Location, len: usize, count: usize, stride: usize) -> FieldSpec {
    FieldSpec {
        name,
        location,
        len,
        count,
        stride,
    }
}

const fn sym(label: &'static str, offset: usize) -> Location {
    Location::Symbol(label, offset)
}

pub const FIELDS: &[FieldSpec] = &[
    field(PROGRAM_COUNTER, Location::Block("PC", 0), 2),
    field(TOTAL_CLOCKS, Location::Block("TOTALCLKS", 0), 8),
    field(DIVIDER_REGISTER, Location::Block("DIV", 0), 1),
    field(OTHER_TRAINER_CLASS, sym("wOtherTrainerClass", 0), 1),
    field(OTHER_TRAINER_ID, sym("wOtherTrainerID", 0), 1),
    field(TRAINER_CLASS, sym("wTrainerClass", 0), 1),
    field(PLAYER_PARTY, sym("wPartyCount", 0), PARTY_BLOCK_LENGTH),
    indexed(
        PARTY_MONS,
        sym("wPartyCount", PARTY_MONS_OFFSET),
        PARTY_MON_LENGTH,
        PARTY_LENGTH,
        PARTY_MON_LENGTH,
    ),
    indexed(
        PARTY_MON_OTS,
        sym("wPartyCount", PARTY_OTS_OFFSET),
        NAME_LENGTH,
        PARTY_LENGTH,
        NAME_LENGTH,
    ),
    indexed(
        PARTY_MON_NICKNAMES,
        sym("wPartyCount", PARTY_NICKNAMES_OFFSET),
        NAME_LENGTH,
        PARTY_LENGTH,
        NAME_LENGTH,
    ),
    field(OT_PARTY, sym("wOTPartyCount", 0), PARTY_BLOCK_LENGTH),
    field(OT_PARTY_COUNT, sym("wOTPartyCount", 0), 1),
    indexed(
        OT_PARTY_MONS,
        sym("wOTPartyCount", PARTY_MONS_OFFSET),
        PARTY_MON_LENGTH,
        PARTY_LENGTH,
        PARTY_MON_LENGTH,
    ),
    field(BATTLE_MON, sym("wBattleMon", 0), BATTLE_STRUCT_LENGTH),
    field(BATTLE_MON_SPECIES, sym("wBattleMon", 0), 1),
    field(BATTLE_MON_MOVES, sym("wBattleMon", BATTLE_MOVES_OFFSET), NUM_MOVES),
    field(BATTLE_MON_PP, sym("wBattleMon", BATTLE_PP_OFFSET), NUM_MOVES),
    field(BATTLE_MON_HP, sym("wBattleMon", BATTLE_HP_OFFSET), 2),
    field(BATTLE_MON_MAX_HP, sym("wBattleMon", BATTLE_MAX_HP_OFFSET), 2),
    field(BATTLE_MON_NICKNAME, sym("wBattleMonNickname", 0), NAME_LENGTH),
    field(ENEMY_MON, sym("wEnemyMon", 0), BATTLE_STRUCT_LENGTH),
    field(ENEMY_MON_SPECIES, sym("wEnemyMon", 0), 1),
    field(ENEMY_MON_MOVES, sym("wEnemyMon", BATTLE_MOVES_OFFSET), NUM_MOVES),
    field(ENEMY_MON_PP, sym("wEnemyMon", BATTLE_PP_OFFSET), NUM_MOVES),
    field(ENEMY_MON_HP, sym("wEnemyMon", BATTLE_HP_OFFSET), 2),
    field(ENEMY_MON_MAX_HP, sym("wEnemyMon", BATTLE_MAX_HP_OFFSET), 2),
    field(ENEMY_MON_NICKNAME, sym("wEnemyMonNickname", 0), NAME_LENGTH),
    field(CUR_PARTY_MON, sym("wCurPartyMon", 0), 1),
    field(CUR_BATTLE_MON, sym("wCurBattleMon", 0), 1),
    field(CUR_OT_MON, sym("wCurOTMon", 0), 1),
    field(CUR_MOVE_NUM, sym("wCurMoveNum", 0), 1),
    field(CUR_ENEMY_MOVE_NUM, sym("wCurEnemyMoveNum", 0), 1),
    field(ENEMY_SWITCH_MON_INDEX, sym("wEnemySwitchMonIndex", 0), 1),
    field(PLAYER_SUB_STATUS, sym("wPlayerSubStatus1", 0), 5),
    field(ENEMY_SUB_STATUS, sym("wEnemySubStatus1", 0), 5),
    field(PLAYER_STAT_LEVELS, sym("wPlayerStatLevels", 0), 8),
    field(ENEMY_STAT_LEVELS, sym("wEnemyStatLevels", 0), 8),
    field(PLAYER_STATS, sym("wPlayerStats", 0), 10),
    field(ENEMY_STATS, sym("wEnemyStats", 0), 10),
    field(PLAYER_SCREENS, sym("wPlayerScreens", 0), 1),
    field(ENEMY_SCREENS, sym("wEnemyScreens", 0), 1),
    field(PLAYER_TOXIC_COUNT, sym("wPlayerToxicCount", 0), 1),
    field(ENEMY_TOXIC_COUNT, sym("wEnemyToxicCount", 0), 1),
    field(PLAYER_DISABLE_COUNT, sym("wPlayerDisableCount", 0), 1),
    field(ENEMY_DISABLE_COUNT, sym("wEnemyDisableCount", 0), 1),
    field(PLAYER_MOVE_STRUCT, sym("wPlayerMoveStruct", 0), 7),
    field(ENEMY_MOVE_STRUCT, sym("wEnemyMoveStruct", 0), 7),
    field(PLAYER_TURNS_TAKEN, sym("wPlayerTurnsTaken", 0), 1),
    field(ENEMY_TURNS_TAKEN, sym("wEnemyTurnsTaken", 0), 1),
    field(PLAYER_USED_MOVES, sym("wPlayerUsedMoves", 0), NUM_MOVES),
    field(ENEMY_TRAINER_ITEMS, sym("wEnemyTrainerItem1", 0), 2),
    field(NUM_ITEMS, sym("wNumItems", 0), 1),
    field(ITEMS, sym("wItems", 0), 3),
    field(PLAYER_NAME, sym("wPlayerName", 0), NAME_LENGTH),
    field(PLAYER_NAME_END, sym("wPlayerName", NAME_LENGTH - 1), 1),
    field(PLAYER_GENDER, sym("wPlayerGender", 0), 1),
    field(STRING_BUFFER_1, sym("wStringBuffer1", 0), NAME_LENGTH),
    field(TEXTBOX_FRAME, sym("wTextboxFrame", 0), 1),
];

/// (player, enemy) fields exchanged when a save is relabeled for the AI probe.
pub const PAIRS: &[(&str, &str)] = &[
    (PLAYER_PARTY, OT_PARTY),
    (BATTLE_MON, ENEMY_MON),
    (BATTLE_MON_NICKNAME, ENEMY_MON_NICKNAME),
    (CUR_BATTLE_MON, CUR_OT_MON),
    (PLAYER_SUB_STATUS, ENEMY_SUB_STATUS),
    (PLAYER_STAT_LEVELS, ENEMY_STAT_LEVELS),
    (PLAYER_STATS, ENEMY_STATS),
    (PLAYER_SCREENS, ENEMY_SCREENS),
    (PLAYER_TOXIC_COUNT, ENEMY_TOXIC_COUNT),
    (PLAYER_DISABLE_COUNT, ENEMY_DISABLE_COUNT),
    (PLAYER_MOVE_STRUCT, ENEMY_MOVE_STRUCT),
    (PLAYER_TURNS_TAKEN, ENEMY_TURNS_TAKEN),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub start: usize,
    pub len: usize,
}

impl Field {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    first: Field,
    count: usize,
    stride: usize,
}

#[derive(Clone, Debug)]
pub struct MemoryMap {
    entries: std::collections::HashMap<&'static str, Entry>,
    pairs: Vec<(&'static str, &'static str)>,
}

impl MemoryMap {
    /// Resolves the Crystal field and pair tables.
    pub fn crystal(symbols: &sym::Symbols, layout: &state::Layout) -> Result<Self, crate::Error> {
        Self::resolve(FIELDS, PAIRS, symbols, layout)
    }

    pub fn resolve(
        specs: &[FieldSpec],
        pairs: &[(&'static str, &'static str)],
        symbols: &sym::Symbols,
        layout: &state::Layout,
    ) -> Result<Self, crate::Error> {
        let mut entries = std::collections::HashMap::new();
        for spec in specs {
            let (block_name, block, offset) = match spec.location {
                Location::Block(name, offset) => (name, layout.block(name)?, offset),
                Location::Symbol(label, offset) => {
                    let symbol = symbols.get(label)?;
                    (
                        state::WRAM_BLOCK,
                        layout.block(state::WRAM_BLOCK)?,
                        state::wram_offset(symbol.bank, symbol.addr)? + offset,
                    )
                }
            };
            let extent = offset + spec.stride * (spec.count - 1) + spec.len;
            if extent > block.len {
                return Err(crate::Error::FieldOutsideBlock {
                    name: spec.name.to_string(),
                    block: block_name.to_string(),
                });
            }
            entries.insert(
                spec.name,
                Entry {
                    first: Field {
                        start: block.offset + offset,
                        len: spec.len,
                    },
                    count: spec.count,
                    stride: spec.stride,
                },
            );
        }

        let map = Self {
            entries,
            pairs: pairs.to_vec(),
        };
        for (player, enemy) in map.pairs.iter() {
            let (player, enemy) = (map.field(player)?, map.field(enemy)?);
            if player.len != enemy.len {
                return Err(crate::Error::LengthMismatch {
                    expected: player.len,
                    actual: enemy.len,
                });
            }
        }
        Ok(map)
    }

    fn entry(&self, name: &str) -> Result<&Entry, crate::Error> {
        self.entries
            .get(name)
            .ok_or_else(|| crate::Error::UnknownField(name.to_string()))
    }

    /// The field itself, or the first element of an indexed field.
    pub fn field(&self, name: &str) -> Result<Field, crate::Error> {
        Ok(self.entry(name)?.first)
    }

    pub fn indexed(&self, name: &str, index: usize) -> Result<Field, crate::Error> {
        let entry = self.entry(name)?;
        if index >= entry.count {
            return Err(crate::Error::IndexOutOfRange {
                name: name.to_string(),
                index,
                count: entry.count,
            });
        }
        Ok(Field {
            start: entry.first.start + entry.stride * index,
            len: entry.first.len,
        })
    }

    pub fn field_offset(&self, name: &str) -> Result<(usize, usize), crate::Error> {
        let field = self.field(name)?;
        Ok((field.start, field.len))
    }

    pub fn is_paired(&self, name: &str) -> Result<Option<(Field, Field)>, crate::Error> {
        self.entry(name)?;
        self.pairs
            .iter()
            .find(|(player, enemy)| *player == name || *enemy == name)
            .map(|(player, enemy)| -> Result<_, crate::Error> { Ok((self.field(player)?, self.field(enemy)?)) })
            .transpose()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (Field, Field)> + '_ {
        self.pairs
            .iter()
            .map(|(player, enemy)| (self.entries[player].first, self.entries[enemy].first))
    }

    /// Every concrete field, indexed fields expanded.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Field)> + '_ {
        self.entries.iter().flat_map(|(name, entry)| {
            (0..entry.count).map(move |i| {
                (
                    *name,
                    Field {
                        start: entry.first.start + entry.stride * i,
                        len: entry.first.len,
                    },
                )
            })
        })
    }
}

/// Synthetic symbols and state buffers laid out like the real ones, for exercising the map without a ROM.
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures {
    use super::*;

    pub const WRAM_SIZE: usize = 8 * state::WRAM_BANK_SIZE;

    /// Places every label the field table references back to back from `C000`.
    pub fn symbols() -> sym::Symbols {
        let mut extents: Vec<(&'static str, usize)> = vec![];
        for spec in FIELDS {
            if let Location::Symbol(label, offset) = spec.location {
                let extent = offset + spec.stride * (spec.count - 1) + spec.len;
                match extents.iter_mut().find(|(l, _)| *l == label) {
                    Some((_, e)) => *e = std::cmp::max(*e, extent),
                    None => extents.push((label, extent)),
                }
            }
        }

        let mut symbols = sym::Symbols::default();
        let mut addr = 0xc000u16;
        for (label, extent) in extents {
            symbols.insert(label, 0, addr);
            addr += extent as u16;
        }
        symbols
    }

    pub fn state() -> Vec<u8> {
        state::Builder::new()
            .block("PC", &[0, 0])
            .block("TOTALCLKS", &[0; 8])
            .block("DIV", &[0])
            .block(state::WRAM_BLOCK, &vec![0u8; WRAM_SIZE])
            .build()
    }

    pub fn memory_map() -> MemoryMap {
        let layout = state::Layout::parse(&state()).unwrap();
        MemoryMap::crystal(&symbols(), &layout).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_offsets() {
        let buf = fixtures::state();
        let layout = state::Layout::parse(&buf).unwrap();
        let symbols = fixtures::symbols();
        let map = MemoryMap::crystal(&symbols, &layout).unwrap();

        let wram = layout.block(state::WRAM_BLOCK).unwrap().offset;
        let battle_mon = symbols.get("wBattleMon").unwrap().addr as usize - 0xc000;
        assert_eq!(
            map.field_offset(BATTLE_MON_HP).unwrap(),
            (wram + battle_mon + 0x10, 2)
        );
        assert_eq!(map.field_offset(PROGRAM_COUNTER).unwrap(), (layout.block("PC").unwrap().offset, 2));
    }

    #[test]
    fn test_unknown_field() {
        let map = fixtures::memory_map();
        assert!(matches!(map.field("wNope"), Err(crate::Error::UnknownField(_))));
        assert!(matches!(map.is_paired("wNope"), Err(crate::Error::UnknownField(_))));
    }

    #[test]
    fn test_indexed() {
        let map = fixtures::memory_map();
        let first = map.indexed(PARTY_MON_NICKNAMES, 0).unwrap();
        let third = map.indexed(PARTY_MON_NICKNAMES, 2).unwrap();
        assert_eq!(third.start - first.start, 2 * NAME_LENGTH);
        assert_eq!(third.len, NAME_LENGTH);
        assert_eq!(map.indexed(PARTY_MON_NICKNAMES, 5).unwrap().end(), map.field(PLAYER_PARTY).unwrap().end());
        assert!(matches!(
            map.indexed(PARTY_MON_NICKNAMES, 6),
            Err(crate::Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_is_paired() {
        let map = fixtures::memory_map();
        let (player, enemy) = map.is_paired(ENEMY_MON).unwrap().unwrap();
        assert_eq!(player, map.field(BATTLE_MON).unwrap());
        assert_eq!(enemy, map.field(ENEMY_MON).unwrap());
        assert!(map.is_paired(TEXTBOX_FRAME).unwrap().is_none());
    }

    #[test]
    fn test_missing_symbol() {
        let layout = state::Layout::parse(&fixtures::state()).unwrap();
        assert!(matches!(
            MemoryMap::crystal(&sym::Symbols::default(), &layout),
            Err(crate::Error::MissingSymbol(_))
        ));
    }

    #[test]
    fn test_field_outside_block() {
        let buf = state::Builder::new()
            .block("PC", &[0])
            .block("TOTALCLKS", &[0; 8])
            .block("DIV", &[0])
            .block(state::WRAM_BLOCK, &vec![0u8; fixtures::WRAM_SIZE])
            .build();
        let layout = state::Layout::parse(&buf).unwrap();
        assert!(matches!(
            MemoryMap::crystal(&fixtures::symbols(), &layout),
            Err(crate::Error::FieldOutsideBlock { .. })
        ));
    }
}
