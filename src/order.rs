//! Canonical map key ordering (RFC 7049 §3.9 for text keys).
//!
//! A key sorts before another when its encoded form is shorter; keys whose encodings have the
//! same length compare byte-wise. For text keys the header bytes are equal once the encoded
//! lengths are equal, so the comparison reduces to the UTF-8 payloads.

use core::cmp::Ordering;

use crate::header::header_len;

/// Length of the canonical encoding of a text string with an `n`-byte payload.
#[inline]
#[must_use]
pub const fn encoded_text_len(n: usize) -> usize {
    header_len(n as u64).saturating_add(n)
}

/// Compare two text keys by canonical key order.
#[inline]
#[must_use]
pub fn cmp_text_keys(a: &str, b: &str) -> Ordering {
    encoded_text_len(a.len())
        .cmp(&encoded_text_len(b.len()))
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Returns `true` iff `prev` sorts strictly before `curr`.
#[inline]
#[must_use]
pub fn is_strictly_increasing(prev: &str, curr: &str) -> bool {
    cmp_text_keys(prev, curr) == Ordering::Less
}

/// Sort keys into canonical order in place.
pub fn sort_keys<K: AsRef<str>>(keys: &mut [K]) {
    keys.sort_by(|a, b| cmp_text_keys(a.as_ref(), b.as_ref()));
}

/// Indices of `names` in canonical key order.
///
/// Used to compute a record's map emission order once from its full field-name set.
#[must_use]
pub fn canonical_permutation<K: AsRef<str>>(names: &[K]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..names.len()).collect();
    idx.sort_by(|&a, &b| cmp_text_keys(names[a].as_ref(), names[b].as_ref()));
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_keys_sort_first() {
        let mut keys = ["ab", "b", "longerkey", "a"];
        sort_keys(&mut keys);
        assert_eq!(keys, ["a", "b", "ab", "longerkey"]);
    }

    #[test]
    fn header_width_counts_toward_length() {
        let short = "x".repeat(23);
        let long = "a".repeat(24);
        assert_eq!(encoded_text_len(23), 24);
        assert_eq!(encoded_text_len(24), 26);
        assert_eq!(cmp_text_keys(&short, &long), Ordering::Less);
    }

    #[test]
    fn permutation_points_at_sorted_names() {
        assert_eq!(canonical_permutation(&["ab", "b", "a"]), vec![2, 1, 0]);
    }
}
