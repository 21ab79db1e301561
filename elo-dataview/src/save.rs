use byteorder::ByteOrder;

use crate::memory::{self, Field, MemoryMap};

/// A save state blob. Cloning makes an independent copy; nothing is shared between two saves.
#[derive(Clone, PartialEq, Eq)]
pub struct Save {
    buf: Vec<u8>,
}

impl std::fmt::Debug for Save {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Save").field("len", &self.buf.len()).finish()
    }
}

/// (species, current HP, max HP, party index) of one side's active battle mon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub species: u8,
    pub hp: u16,
    pub max_hp: u16,
    pub party_index: u8,
}

impl Save {
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn load(path: &std::path::Path) -> Result<Self, crate::Error> {
        Ok(Self {
            buf: std::fs::read(path)?,
        })
    }

    pub fn write(&self, path: &std::path::Path) -> Result<(), crate::Error> {
        std::fs::write(path, &self.buf)?;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn check_bounds(&self, field: Field) -> Result<std::ops::Range<usize>, crate::Error> {
        if field.end() > self.buf.len() {
            return Err(crate::Error::OutOfBounds {
                start: field.start,
                len: field.len,
                save_len: self.buf.len(),
            });
        }
        Ok(field.start..field.end())
    }

    pub fn get(&self, field: Field) -> Result<&[u8], crate::Error> {
        Ok(&self.buf[self.check_bounds(field)?])
    }

    pub fn get_u8(&self, field: Field) -> Result<u8, crate::Error> {
        let buf = self.get(field)?;
        if buf.len() != 1 {
            return Err(crate::Error::LengthMismatch {
                expected: 1,
                actual: buf.len(),
            });
        }
        Ok(buf[0])
    }

    pub fn set(&mut self, field: Field, bytes: &[u8]) -> Result<(), crate::Error> {
        if bytes.len() != field.len {
            return Err(crate::Error::LengthMismatch {
                expected: field.len,
                actual: bytes.len(),
            });
        }
        let range = self.check_bounds(field)?;
        self.buf[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Copies between two fields of this save. The fields may overlap.
    pub fn copy_within(&mut self, src_field: Field, dst_field: Field) -> Result<(), crate::Error> {
        if src_field.len != dst_field.len {
            return Err(crate::Error::LengthMismatch {
                expected: dst_field.len,
                actual: src_field.len,
            });
        }
        let src = self.check_bounds(src_field)?;
        self.check_bounds(dst_field)?;
        self.buf.copy_within(src, dst_field.start);
        Ok(())
    }
}

/// Copies `src_field` of `src` into `dst_field` of `dst`. Use [`Save::copy_within`] when both are the same save.
pub fn copy(src: &Save, src_field: Field, dst: &mut Save, dst_field: Field) -> Result<(), crate::Error> {
    dst.set(dst_field, src.get(src_field)?)
}

/// HP and max HP are stored big-endian by the game.
pub fn decode_stat(bytes: &[u8]) -> Result<u16, crate::Error> {
    if bytes.len() != 2 {
        return Err(crate::Error::LengthMismatch {
            expected: 2,
            actual: bytes.len(),
        });
    }
    Ok(byteorder::BigEndian::read_u16(bytes))
}

pub fn encode_stat(value: u16) -> [u8; 2] {
    let mut buf = [0u8; 2];
    byteorder::BigEndian::write_u16(&mut buf, value);
    buf
}

/// Emulator registers are little-endian, unlike game data.
pub fn program_counter(save: &Save, map: &MemoryMap) -> Result<u16, crate::Error> {
    Ok(byteorder::LittleEndian::read_u16(
        save.get(map.field(memory::PROGRAM_COUNTER)?)?,
    ))
}

pub fn total_clocks(save: &Save, map: &MemoryMap) -> Result<u64, crate::Error> {
    Ok(byteorder::LittleEndian::read_u64(save.get(map.field(memory::TOTAL_CLOCKS)?)?))
}

/// The game seeds its RNG from the divider register, so the harness owns it to keep AI behavior reproducible.
pub fn randomize_divider_register(save: &mut Save, map: &MemoryMap, rng: &mut impl rand::Rng) -> Result<(), crate::Error> {
    let value = rng.gen::<u8>();
    log::debug!("divider register: {:02x}", value);
    save.set(map.field(memory::DIVIDER_REGISTER)?, &[value])
}

pub fn current_pokemon_index(save: &Save, map: &MemoryMap) -> Result<u8, crate::Error> {
    save.get_u8(map.field(memory::CUR_BATTLE_MON)?)
}

pub fn battle_mons(save: &Save, map: &MemoryMap) -> Result<(Snapshot, Snapshot), crate::Error> {
    Ok((
        Snapshot {
            species: save.get_u8(map.field(memory::BATTLE_MON_SPECIES)?)?,
            hp: decode_stat(save.get(map.field(memory::BATTLE_MON_HP)?)?)?,
            max_hp: decode_stat(save.get(map.field(memory::BATTLE_MON_MAX_HP)?)?)?,
            party_index: save.get_u8(map.field(memory::CUR_PARTY_MON)?)?,
        },
        Snapshot {
            species: save.get_u8(map.field(memory::ENEMY_MON_SPECIES)?)?,
            hp: decode_stat(save.get(map.field(memory::ENEMY_MON_HP)?)?)?,
            max_hp: decode_stat(save.get(map.field(memory::ENEMY_MON_MAX_HP)?)?)?,
            party_index: save.get_u8(map.field(memory::CUR_OT_MON)?)?,
        },
    ))
}

/// Writes `src`'s player side into `dst`'s enemy side and vice versa, for every declared pair.
pub fn swap_pairings(src: &Save, dst: &mut Save, map: &MemoryMap) -> Result<(), crate::Error> {
    for (player, enemy) in map.pairs() {
        copy(src, player, dst, enemy)?;
        copy(src, enemy, dst, player)?;
    }
    Ok(())
}
