//! Block layout of a BGB save state.
//!
//! A state file is a flat run of blocks, each laid out as a NUL-terminated name, a little-endian `u32` payload length
//! and the payload itself. Every state written by the same emulator build has the same layout, so a [`Layout`] read
//! from one save can address fields in all of them.

use byteorder::ByteOrder;

pub const WRAM_BLOCK: &str = "WRAM";
pub const WRAM_BANK_SIZE: usize = 0x1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub offset: usize,
    pub len: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Layout {
    blocks: std::collections::HashMap<String, Block>,
}

impl Layout {
    pub fn parse(buf: &[u8]) -> Result<Self, crate::Error> {
        let mut blocks = std::collections::HashMap::new();
        let mut pos = 0;
        while pos < buf.len() {
            let name_len = buf[pos..].iter().position(|b| *b == 0).ok_or_else(|| crate::Error::TruncatedBlock {
                name: String::from_utf8_lossy(&buf[pos..]).into_owned(),
                offset: pos,
            })?;
            let name = String::from_utf8_lossy(&buf[pos..pos + name_len]).into_owned();
            let len_offset = pos + name_len + 1;
            let len = buf
                .get(len_offset..len_offset + 4)
                .map(byteorder::LittleEndian::read_u32)
                .ok_or_else(|| crate::Error::TruncatedBlock {
                    name: name.clone(),
                    offset: pos,
                })? as usize;
            let offset = len_offset + 4;
            if offset + len > buf.len() {
                return Err(crate::Error::TruncatedBlock { name, offset: pos });
            }
            log::trace!("state block {} at {:#x} ({} bytes)", name, offset, len);
            blocks.insert(name, Block { offset, len });
            pos = offset + len;
        }
        Ok(Self { blocks })
    }

    pub fn block(&self, name: &str) -> Result<Block, crate::Error> {
        self.blocks
            .get(name)
            .copied()
            .ok_or_else(|| crate::Error::MissingBlock(name.to_string()))
    }
}

/// Maps a work RAM address to its offset inside the `WRAM` block.
///
/// Bank 0 is fixed at `C000-CFFF`; `D000-DFFF` is the switchable bank, where a symbol bank of 0 means bank 1.
pub fn wram_offset(bank: u8, addr: u16) -> Result<usize, crate::Error> {
    match addr {
        0xc000..=0xcfff => Ok((addr - 0xc000) as usize),
        0xd000..=0xdfff => Ok(WRAM_BANK_SIZE * std::cmp::max(bank, 1) as usize + (addr - 0xd000) as usize),
        _ => Err(crate::Error::NotWorkRam { bank, addr }),
    }
}

/// Assembles a state file out of named blocks.
#[derive(Default)]
pub struct Builder {
    buf: Vec<u8>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, name: &str, payload: &[u8]) -> Self {
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(0);
        let mut len = [0u8; 4];
        byteorder::LittleEndian::write_u32(&mut len, payload.len() as u32);
        self.buf.extend_from_slice(&len);
        self.buf.extend_from_slice(payload);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
