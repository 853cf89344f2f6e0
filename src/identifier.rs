//! Student identifier codec
//!
//! An identifier (the record's `account`) packs three parts:
//!
//! ```text
//! tku  bm   1760
//! ^^^  ^^   ^^^^
//! |    |    seat code (last 4)
//! |    department code (everything in between)
//! school code (first 3)
//! ```

/// Number of characters in the school code prefix
pub const SCHOOL_CODE_LEN: usize = 3;

/// Number of characters in the seat code suffix
pub const SEAT_CODE_LEN: usize = 4;

/// Shortest well-formed identifier
pub const MIN_IDENTIFIER_LEN: usize = SCHOOL_CODE_LEN + SEAT_CODE_LEN;

/// The parts of an identifier, borrowed from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentId<'a> {
    pub school_code: &'a str,
    pub department_code: &'a str,
    pub seat_code: &'a str,
}

/// Split an identifier into its parts.
///
/// Positions are counted in characters. Inputs shorter than
/// [`MIN_IDENTIFIER_LEN`] are still split: the school code takes at most the
/// first 3 characters, the seat code at most the last 4 (so the two may
/// overlap), and the department code is whatever lies strictly between them.
pub fn parse(identifier: &str) -> StudentId<'_> {
    let len = identifier.chars().count();

    let school_end = byte_offset(identifier, len.min(SCHOOL_CODE_LEN));
    let seat_start = byte_offset(identifier, len.saturating_sub(SEAT_CODE_LEN));

    let department_code = if seat_start > school_end {
        &identifier[school_end..seat_start]
    } else {
        ""
    };

    StudentId {
        school_code: &identifier[..school_end],
        department_code,
        seat_code: &identifier[seat_start..],
    }
}

/// Byte offset of the `n`th character (or the end of the string)
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let id = parse("tkubm1760");
        assert_eq!(id.school_code, "tku");
        assert_eq!(id.department_code, "bm");
        assert_eq!(id.seat_code, "1760");
    }

    #[test]
    fn test_parse_minimum_length_has_empty_department() {
        let id = parse("tku0787");
        assert_eq!(id.school_code, "tku");
        assert_eq!(id.department_code, "");
        assert_eq!(id.seat_code, "0787");
    }

    #[test]
    fn test_parse_long_department() {
        let id = parse("tkucsie0042");
        assert_eq!(id.department_code, "csie");
        assert_eq!(id.seat_code, "0042");
    }

    #[test]
    fn test_parse_short_input_does_not_panic() {
        let id = parse("ab1234");
        assert_eq!(id.school_code, "ab1");
        assert_eq!(id.department_code, "");
        assert_eq!(id.seat_code, "1234");

        let empty = parse("");
        assert_eq!(empty.school_code, "");
        assert_eq!(empty.seat_code, "");
    }

    #[test]
    fn test_parse_counts_characters_not_bytes() {
        let id = parse("淡江大學資工1234");
        assert_eq!(id.school_code, "淡江大");
        assert_eq!(id.department_code, "學資工");
        assert_eq!(id.seat_code, "1234");
    }
}
