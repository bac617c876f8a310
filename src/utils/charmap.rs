//! Character classification table.
//!
//! Every code point in U+0000..U+00FF maps either to a short lower-case ASCII
//! fragment (a word constituent) or to nothing (a word boundary). Latin-1
//! letters are transliterated so that `Été` and `ete` index as the same word.
//! Code points above U+00FF are always boundaries.

use std::sync::LazyLock;

/// Number of entries in the classification table.
pub const CHARMAP_SIZE: usize = 256;

const WORD_CHARS: &str = "0123456789_abcdefghijklmnopqrstuvwxyz";

static CHARMAP: LazyLock<[Option<&'static str>; CHARMAP_SIZE]> = LazyLock::new(|| {
    let mut table = [None; CHARMAP_SIZE];
    for (unit, slot) in table.iter_mut().enumerate() {
        *slot = fragment_for(unit as u8);
    }
    table
});

/// Classify a single code point.
///
/// Returns the normalized fragment for word constituents, `None` for
/// boundaries.
#[inline]
pub fn classify(c: char) -> Option<&'static str> {
    let unit = c as u32;
    if unit < CHARMAP_SIZE as u32 {
        CHARMAP[unit as usize]
    } else {
        None
    }
}

/// Classify a raw byte as a Latin-1 code unit.
#[inline]
pub fn classify_byte(b: u8) -> Option<&'static str> {
    CHARMAP[b as usize]
}

/// Fragment for an ASCII word character, sliced out of [`WORD_CHARS`].
fn word_char(c: u8) -> Option<&'static str> {
    let idx = WORD_CHARS.bytes().position(|w| w == c)?;
    WORD_CHARS.get(idx..idx + 1)
}

fn fragment_for(unit: u8) -> Option<&'static str> {
    let fragment = match unit {
        b'a'..=b'z' | b'0'..=b'9' | b'_' => return word_char(unit),
        b'A'..=b'Z' => return word_char(unit.to_ascii_lowercase()),

        // Symbols with a readable spelling
        0xA9 => "c",   // ©
        0xAA => "a",   // ª
        0xAE => "r",   // ®
        0xB0 => "deg", // °
        0xB2 => "2",   // ²
        0xB3 => "3",   // ³
        0xB5 => "u",   // µ
        0xB9 => "1",   // ¹
        0xBA => "o",   // º

        // Latin-1 letters
        0xC0..=0xC5 | 0xE0..=0xE5 => "a",
        0xC6 | 0xE6 => "ae",
        0xC7 | 0xE7 => "c",
        0xC8..=0xCB | 0xE8..=0xEB => "e",
        0xCC..=0xCF | 0xEC..=0xEF => "i",
        0xD0 | 0xF0 => "d",
        0xD1 | 0xF1 => "n",
        0xD2..=0xD6 | 0xD8 | 0xF2..=0xF6 | 0xF8 => "o",
        0xD7 => "x", // ×
        0xD9..=0xDC | 0xF9..=0xFC => "u",
        0xDD | 0xFD | 0xFF => "y",
        0xDE | 0xFE => "th",
        0xDF => "ss",

        _ => return None,
    };
    Some(fragment)
}
