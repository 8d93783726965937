//! XOR key-stream cipher over bit sequences, and text <-> bit conversion.
//!
//! Confidentiality holds only as far as the key stream stays secret and is
//! never reused for a second message.

use sha2::{Digest, Sha256};

use crate::error::{Bb84Error, Result};

/// Encodes text as 8 bits per byte, most significant bit first.
///
/// Bytes are UTF-8 bytes, not characters: `"é"` encodes to 16 bits, and the
/// key length a message needs is counted the same way.
pub fn text_to_bits(text: &str) -> Vec<bool> {
    text.as_bytes()
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| byte & (1 << i) != 0))
        .collect()
}

/// Decodes 8-bit groups back into text. A trailing group shorter than 8 bits
/// is dropped; byte sequences that are not valid UTF-8 are decoded lossily.
pub fn bits_to_text(bits: &[bool]) -> String {
    let bytes: Vec<u8> = bits.chunks_exact(8).map(pack_byte).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Renders bits as a `0`/`1` string.
pub fn bits_to_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

fn pack_byte(chunk: &[bool]) -> u8 {
    chunk
        .iter()
        .fold(0u8, |acc, &bit| (acc << 1) | bit as u8)
}

/// Packs bits MSB-first, zero-padding the final byte.
fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| pack_byte(chunk) << (8 - chunk.len()))
        .collect()
}

/// Repeats `key` end to end and truncates to exactly `len` bits.
pub fn tile_key(key: &[bool], len: usize) -> Result<Vec<bool>> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if key.is_empty() {
        return Err(Bb84Error::EmptySiftedKey);
    }
    Ok(key.iter().copied().cycle().take(len).collect())
}

/// Bitwise XOR of two equal-length sequences.
pub fn xor_bits(data: &[bool], key: &[bool]) -> Result<Vec<bool>> {
    Bb84Error::check_len("key stream", data.len(), key.len())?;
    Ok(data.iter().zip(key).map(|(&d, &k)| d ^ k).collect())
}

/// XORs `message` with `key`, tiling the key first if it is shorter than the
/// message. The output always has the message's length.
pub fn encrypt(message: &[bool], key: &[bool]) -> Result<Vec<bool>> {
    let stream = tile_key(key, message.len())?;
    xor_bits(message, &stream)
}

/// Inverse of [`encrypt`]; XOR is its own inverse.
pub fn decrypt(ciphertext: &[bool], key: &[bool]) -> Result<Vec<bool>> {
    encrypt(ciphertext, key)
}

/// SHA-256 fingerprint (hex) of a key stream, prefixed by its bit length so
/// that keys differing only in trailing zero padding do not collide.
pub fn key_fingerprint(key: &[bool]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((key.len() as u64).to_be_bytes());
    hasher.update(bits_to_bytes(key));
    hex::encode(hasher.finalize())
}
