//! Define shared string semantics (policy + pure helpers).
//!
//! Script strings are sequences of UTF-16 code units. The runtime stores them as Rust `String`s and uses the
//! helpers here whenever an operation is defined in terms of code-unit positions (`length`, indexing,
//! `slice`, `indexOf`).
//!
//! ## Notes
//! - **Indexing model**: UTF-16 code units. Slicing through the middle of a surrogate pair yields U+FFFD for the
//!   orphaned half, matching what a learner sees when printing such a string.
//! - **Negative indices**: helpers take already-resolved `usize` positions; callers apply `slice`/`substring`
//!   clamping rules via [`relative_index`].

/// Return the length of `s` in UTF-16 code units.
///
/// ## Examples
/// ```rust
/// use proctor_core::strings::utf16_len;
///
/// assert_eq!(utf16_len("abc"), 3);
/// assert_eq!(utf16_len("😀"), 2);
/// ```
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Return the substring between UTF-16 positions `start` and `end` (clamped, `start <= end` enforced).
pub fn utf16_slice(s: &str, start: usize, end: usize) -> String {
    if s.is_ascii() {
        let end = end.min(s.len());
        let start = start.min(end);
        return s[start..end].to_string();
    }
    let units: Vec<u16> = s.encode_utf16().collect();
    let end = end.min(units.len());
    let start = start.min(end);
    String::from_utf16_lossy(&units[start..end])
}

/// Return the code unit at `index` as a one-unit string, or `None` when out of range.
pub fn utf16_char_at(s: &str, index: usize) -> Option<String> {
    if index >= utf16_len(s) {
        return None;
    }
    Some(utf16_slice(s, index, index + 1))
}

/// Return the numeric value of the code unit at `index`.
pub fn utf16_code_at(s: &str, index: usize) -> Option<u16> {
    s.encode_utf16().nth(index)
}

/// Find `needle` in `haystack` at or after UTF-16 position `from`; returns a UTF-16 position.
///
/// ## Examples
/// ```rust
/// use proctor_core::strings::utf16_index_of;
///
/// assert_eq!(utf16_index_of("hello", "l", 0), Some(2));
/// assert_eq!(utf16_index_of("hello", "l", 3), Some(3));
/// assert_eq!(utf16_index_of("hello", "z", 0), None);
/// ```
pub fn utf16_index_of(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay: Vec<u16> = haystack.encode_utf16().collect();
    let pin: Vec<u16> = needle.encode_utf16().collect();
    if from > hay.len() {
        return if pin.is_empty() { Some(hay.len()) } else { None };
    }
    if pin.is_empty() {
        return Some(from);
    }
    (from..=hay.len().saturating_sub(pin.len()))
        .find(|&i| i + pin.len() <= hay.len() && hay[i..i + pin.len()] == pin[..])
}

/// Find the last occurrence of `needle` in `haystack`; returns a UTF-16 position.
pub fn utf16_last_index_of(haystack: &str, needle: &str) -> Option<usize> {
    let hay: Vec<u16> = haystack.encode_utf16().collect();
    let pin: Vec<u16> = needle.encode_utf16().collect();
    if pin.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pin.len()).rev().find(|&i| hay[i..i + pin.len()] == pin[..])
}

/// Resolve a possibly-negative relative index against `len` (the `slice` convention).
///
/// ## Examples
/// ```rust
/// use proctor_core::strings::relative_index;
///
/// assert_eq!(relative_index(-2.0, 5), 3);
/// assert_eq!(relative_index(10.0, 5), 5);
/// assert_eq!(relative_index(f64::NAN, 5), 0);
/// ```
pub fn relative_index(n: f64, len: usize) -> usize {
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        let from_end = len as f64 + n;
        if from_end < 0.0 { 0 } else { from_end as usize }
    } else if n > len as f64 {
        len
    } else {
        n as usize
    }
}

/// Clamp an index into `[0, len]` without negative wrap-around (the `substring` convention).
pub fn clamp_index(n: f64, len: usize) -> usize {
    if n.is_nan() || n <= 0.0 {
        0
    } else if n >= len as f64 {
        len
    } else {
        n.trunc() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_ascii_and_unicode() {
        assert_eq!(utf16_slice("onClick", 2, 7), "Click");
        assert_eq!(utf16_slice("héllo", 1, 3), "él");
        assert_eq!(utf16_slice("abc", 2, 1), "");
        assert_eq!(utf16_slice("abc", 1, 99), "bc");
    }

    #[test]
    fn test_char_at() {
        assert_eq!(utf16_char_at("abc", 1).as_deref(), Some("b"));
        assert_eq!(utf16_char_at("abc", 3), None);
        assert_eq!(utf16_code_at("A", 0), Some(65));
    }

    #[test]
    fn test_last_index_of() {
        assert_eq!(utf16_last_index_of("a-b-c", "-"), Some(3));
        assert_eq!(utf16_last_index_of("abc", "abcd"), None);
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(-3.0, 4), 0);
        assert_eq!(clamp_index(2.7, 4), 2);
        assert_eq!(clamp_index(9.0, 4), 4);
    }
}
