//! Object key handling
//!
//! Keys arrive in notifications form-encoded (`+` for space, `%XX` for
//! everything else) and are mapped to their target name by swapping the
//! file extension.

use crate::error::{HandlerError, Result};

/// Decode a notification object key.
///
/// `+` becomes a space and every `%XX` escape becomes its byte; the decoded
/// bytes must be valid UTF-8. A `%` that is not followed by two hex digits
/// is rejected rather than passed through.
pub fn decode_key(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            let valid = escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(HandlerError::Decode {
                    key: raw.to_string(),
                    reason: format!("malformed escape at byte {}", i),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    // `+` has to be rewritten first so that an escaped `%2B` survives as a literal plus
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| HandlerError::Decode {
            key: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Map a decoded source key to its target key.
///
/// Only a trailing `source_suffix` is replaced; occurrences elsewhere in the
/// path are left alone. A key without the suffix is an error, since shipping
/// it under its own name would overwrite the source object.
pub fn target_key(key: &str, source_suffix: &str, target_suffix: &str) -> Result<String> {
    key.strip_suffix(source_suffix)
        .map(|stem| format!("{}{}", stem, target_suffix))
        .ok_or_else(|| HandlerError::UnexpectedSuffix {
            key: key.to_string(),
            expected: source_suffix.to_string(),
        })
}
