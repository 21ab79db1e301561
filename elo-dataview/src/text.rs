//! Crystal's character encoding, for the names the harness writes into a save.

pub const TERMINATOR: u8 = 0x50;

fn encode_char(c: char) -> Option<u8> {
    Some(match c {
        'A'..='Z' => 0x80 + (c as u8 - b'A'),
        'a'..='z' => 0xa0 + (c as u8 - b'a'),
        '0'..='9' => 0xf6 + (c as u8 - b'0'),
        ' ' => 0x7f,
        '(' => 0x9a,
        ')' => 0x9b,
        ':' => 0x9c,
        ';' => 0x9d,
        '[' => 0x9e,
        ']' => 0x9f,
        '\'' => 0xe0,
        '-' => 0xe3,
        '?' => 0xe6,
        '!' => 0xe7,
        '.' => 0xe8,
        '&' => 0xe9,
        'é' => 0xea,
        '♂' => 0xef,
        '×' => 0xf1,
        '/' => 0xf3,
        ',' => 0xf4,
        '♀' => 0xf5,
        _ => return None,
    })
}

/// Encodes `name` into exactly `len` bytes, terminator padded. Names longer than `len - 1` are truncated so the
/// terminator always fits.
pub fn encode_name(name: &str, len: usize) -> Result<Vec<u8>, crate::Error> {
    let mut buf = name
        .chars()
        .take(len.saturating_sub(1))
        .map(|c| encode_char(c).ok_or(crate::Error::UnencodableChar(c)))
        .collect::<Result<Vec<_>, _>>()?;
    buf.resize(len, TERMINATOR);
    Ok(buf)
}
