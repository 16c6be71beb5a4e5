//! Meta-name alphabet validation (§3, §6).
//!
//! Valid characters: letters, digits, `.`, `-`, `_`. Everything else —
//! including the explicit invalid-character set from the spec — is rejected.

/// Characters the spec explicitly calls out as invalid, kept around for
/// documentation purposes; `is_valid_meta_name_char` is the actual predicate.
#[allow(dead_code)]
const INVALID_CHARS: &str = "~`!@#$%^&+={[}]|\\;\"'<,>?/ ";

fn is_valid_meta_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'
}

/// `is_valid_meta_name(s)` from §6: non-empty and every character valid.
pub fn is_valid_meta_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_valid_meta_name_char)
}

/// `ensure_valid_meta_name(s, hint)` from §6.
///
/// Replaces every invalid character with `hint` (or drops it if `hint` is
/// `None`). Fails if `hint` itself is not a valid meta-name character, or if
/// the result is empty or still invalid.
pub fn ensure_valid_meta_name(s: &str, hint: Option<char>) -> Option<String> {
    if let Some(h) = hint {
        if !is_valid_meta_name_char(h) {
            return None;
        }
    }

    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if is_valid_meta_name_char(c) {
            out.push(c);
        } else if let Some(h) = hint {
            out.push(h);
        }
        // hint == None: drop the character
    }

    if is_valid_meta_name(&out) { Some(out) } else { None }
}
