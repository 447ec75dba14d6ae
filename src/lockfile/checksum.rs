//! Content fingerprints for change detection.
//!
//! The lockfile stores a 32-bit FNV-1a hash of each root template's most
//! recent render instead of the rendered text itself. This keeps the lockfile
//! small and its diffs quiet in version control.

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Computes the 32-bit FNV-1a fingerprint of `text`'s UTF-8 bytes.
///
/// # Examples
///
/// ```rust
/// use etch::lockfile::fingerprint;
///
/// assert_eq!(fingerprint("Hello, World!"), 1_525_479_220);
/// ```
#[must_use]
pub fn fingerprint(text: &str) -> u32 {
    text.as_bytes()
        .iter()
        .fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_golden_values() {
        assert_eq!(fingerprint(""), 2_166_136_261);
        assert_eq!(fingerprint("a"), 3_826_002_220);
        assert_eq!(fingerprint("Hello, World!"), 1_525_479_220);
        assert_eq!(fingerprint("Hello, Goodbye!"), 2_995_186_821);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let text = "name: {{ name }}\n";
        assert_eq!(fingerprint(text), fingerprint(text));
    }

    #[test]
    fn test_fingerprint_distinguishes_single_byte_change() {
        assert_ne!(fingerprint("Hello, World!"), fingerprint("Hello, World?"));
    }

    #[test]
    fn test_fingerprint_hashes_utf8_bytes() {
        // "é" is two bytes, so it must not hash like any single byte string
        assert_ne!(fingerprint("é"), fingerprint("e"));
        assert_eq!(fingerprint("é"), fingerprint("\u{e9}"));
    }
}
