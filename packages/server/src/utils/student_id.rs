//! Student identifier helpers.
//!
//! Student IDs have the shape `YYYY-NNNN`: a 4-digit admission year, a dash,
//! and a 4-digit zero-padded sequence unique within that year. IDs are
//! generated server-side and immutable once assigned.

/// Whether `id` matches `^[0-9]{4}-[0-9]{4}$`.
pub fn is_valid(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 9
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// Format an ID from its parts. Sequences above 9999 widen rather than wrap;
/// the check constraint rejects them at insert time.
pub fn format_id(year: i32, sequence: i32) -> String {
    format!("{year:04}-{sequence:04}")
}

/// The year part of a well-formed ID.
pub fn year_part(id: &str) -> Option<i32> {
    if !is_valid(id) {
        return None;
    }
    id[..4].parse().ok()
}

/// The sequence part of a well-formed ID.
pub fn sequence_part(id: &str) -> Option<i32> {
    if !is_valid(id) {
        return None;
    }
    id[5..].parse().ok()
}

/// Next ID for a year given the highest existing sequence (None when the year
/// has no students yet).
pub fn next_id(year: i32, max_sequence: Option<i32>) -> String {
    format_id(year, max_sequence.unwrap_or(0) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_valid_accepts_well_formed_ids() {
        assert!(is_valid("2025-0001"));
        assert!(is_valid("2021-9999"));
        assert!(is_valid("0001-0000"));
    }

    #[test]
    fn is_valid_rejects_malformed_ids() {
        assert!(!is_valid(""));
        assert!(!is_valid("20250001"));
        assert!(!is_valid("2025_0001"));
        assert!(!is_valid("2025-001"));
        assert!(!is_valid("2025-00012"));
        assert!(!is_valid("202X-0001"));
        assert!(!is_valid("2025-00a1"));
        // multi-byte input must not panic the byte checks
        assert!(!is_valid("２０２５-0001"));
    }

    #[test]
    fn next_id_starts_at_one_for_empty_year() {
        assert_eq!(next_id(2025, None), "2025-0001");
    }

    #[test]
    fn next_id_increments_highest_sequence() {
        assert_eq!(next_id(2025, Some(1)), "2025-0002");
        assert_eq!(next_id(2021, Some(70)), "2021-0071");
        assert_eq!(next_id(2023, Some(345)), "2023-0346");
    }

    #[test]
    fn parts_round_trip() {
        let id = format_id(2024, 76);
        assert_eq!(id, "2024-0076");
        assert_eq!(year_part(&id), Some(2024));
        assert_eq!(sequence_part(&id), Some(76));
        assert_eq!(year_part("garbage"), None);
        assert_eq!(sequence_part("garbage"), None);
    }
}
