//! Packing of signed 8-bit lanes into 32-bit words.
//!
//! Lane 0 occupies the least significant byte.

use arrayvec::ArrayVec;

/// Number of lanes in a word.
pub const LANES: usize = 4;

/// Packs four signed lanes into one word.
pub fn pack4(lanes: [i8; LANES]) -> u32 { u32::from_le_bytes(lanes.map(|lane| lane as u8)) }

/// Unpacks one word into four signed lanes.
pub fn unpack4(word: u32) -> [i8; LANES] { word.to_le_bytes().map(|byte| byte as i8) }

/// Packs a sequence of lanes into words. A trailing partial word is padded with zero lanes.
pub fn pack_words(values: &[i8]) -> Vec<u32> {
    values
        .chunks(LANES)
        .map(|chunk| {
            let mut lanes = [0; LANES];
            lanes[..chunk.len()].copy_from_slice(chunk);
            pack4(lanes)
        })
        .collect()
}

/// Unpacks `WORDS` words into their `LANES * WORDS` lanes, in word order.
///
/// `CAP` must be at least `LANES * WORDS`; this is checked at compile time.
pub fn unpack_words<const WORDS: usize, const CAP: usize>(words: &[u32; WORDS]) -> ArrayVec<i8, CAP> {
    const { assert!(CAP >= LANES * WORDS, "capacity too small for the unpacked lanes") };
    words.iter().flat_map(|word| unpack4(*word)).collect()
}

/// Interprets the low `bits` bits of `value` as a two's-complement number.
///
/// `bits` must be in `1..=32`.
pub fn sign_extend(value: u32, bits: u32) -> i32 {
    debug_assert!((1..=32).contains(&bits));
    let unused = 32 - bits;
    ((value << unused) as i32) >> unused
}
