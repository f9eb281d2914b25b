//! Domain-separated BLAKE3 hashing for the beacon oracle.
//!
//! Every identifier in the oracle is a 32-byte BLAKE3 digest. Signed
//! digests are additionally domain separated through BLAKE3's key
//! derivation mode so that a signature produced for one message layout can
//! never be replayed against another.
//!
//! ## Modes
//!
//! - [`hash`] - Pure hashing: feed, template and alias identifiers
//! - [`derive_key`] - Context-bound digests: the messages reporters sign
//!
//! ## Framing
//!
//! Inputs made of several variable-length fields are framed with
//! [`encode_multi_field`] before hashing, so that field boundaries are part
//! of the digest.

/// Registered BLAKE3 context strings.
/// Using an unregistered context string is a protocol violation.
pub mod contexts {
    pub const SIGNED_OBSERVATION: &str = "beacon v1 signed-observation";
    pub const SIGNED_PARAMETERIZED: &str = "beacon v1 signed-parameterized";

    /// All registered context strings. Used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[SIGNED_OBSERVATION, SIGNED_PARAMETERIZED];
}

/// Compute the BLAKE3 hash of the input data.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Compute the BLAKE3 hash of several byte slices fed back to back.
///
/// Equivalent to hashing their concatenation without allocating it.
pub fn hash_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = ::blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Derive a digest using BLAKE3's built-in key derivation mode.
///
/// # Arguments
///
/// * `context` - One of the strings in [`contexts::ALL_CONTEXTS`]
/// * `key_material` - The input material
///
/// Debug builds assert that `context` is registered.
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    debug_assert!(
        is_registered_context(context),
        "unregistered BLAKE3 context: {context}"
    );
    let mut out = [0u8; 32];
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    let hash = hasher.finalize();
    out.copy_from_slice(hash.as_bytes());
    out
}

/// Verify that a context string is registered.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

/// Encode multiple dynamic fields using length-prefixed encoding.
///
/// `LE32(len(field1)) || field1 || LE32(len(field2)) || field2 || ...`
pub fn encode_multi_field(fields: &[&[u8]]) -> Vec<u8> {
    let total_len: usize = fields.iter().map(|f| 4 + f.len()).sum();
    let mut output = Vec::with_capacity(total_len);
    for field in fields {
        output.extend_from_slice(&(field.len() as u32).to_le_bytes());
        output.extend_from_slice(field);
    }
    output
}

/// Encode a sequence of 32-byte words as a counted, length-prefixed list.
///
/// `LE32(count) || encode_multi_field(words)`. The count prefix keeps a
/// list of N words distinct from any other framing of the same bytes.
pub fn encode_word_list(words: &[[u8; 32]]) -> Vec<u8> {
    let mut output = Vec::with_capacity(4 + words.len() * 36);
    output.extend_from_slice(&(words.len() as u32).to_le_bytes());
    for word in words {
        output.extend_from_slice(&32u32.to_le_bytes());
        output.extend_from_slice(word);
    }
    output
}
