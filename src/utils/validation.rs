//! Centralized field validation and numeric helpers.

use crate::core::block::AlignmentBlock;

/// Minimum number of tab-separated columns in a SAM alignment line
pub const SAM_MANDATORY_FIELDS: usize = 11;

/// Number of `:`-separated fields in an MRF block tuple
pub const MRF_BLOCK_FIELDS: usize = 6;

/// Parse an integer the way C's `atoi` does.
///
/// Leading whitespace is skipped, an optional sign and the longest run of
/// digits that follows are used, and everything after is ignored. Input
/// with no digits, or a value that does not fit in `T`, yields zero.
///
/// This leniency hides corrupt input; it exists for historical files that
/// relied on it.
///
/// # Examples
///
/// ```
/// use mrf_tools::utils::validation::lenient_int;
///
/// assert_eq!(lenient_int::<i64>("42"), 42);
/// assert_eq!(lenient_int::<i64>("-17xyz"), -17);
/// assert_eq!(lenient_int::<i64>("abc"), 0);
/// assert_eq!(lenient_int::<u8>("300"), 0);
/// ```
#[must_use]
pub fn lenient_int<T>(s: &str) -> T
where
    T: TryFrom<i64> + Default,
{
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());

    let magnitude = digits[..end].bytes().try_fold(0_i64, |acc, b| {
        acc.checked_mul(10)?.checked_add(i64::from(b - b'0'))
    });

    match magnitude {
        Some(value) => T::try_from(if negative { -value } else { value }).unwrap_or_default(),
        None => T::default(),
    }
}

/// Check a block for inverted coordinates or a zero start.
///
/// Returns a description of the first problem found, or None if the block is valid.
#[must_use]
pub fn check_block(block: &AlignmentBlock) -> Option<String> {
    if block.target_start == 0 || block.query_start == 0 {
        return Some("coordinates are 1-based, found 0".to_string());
    }
    if block.target_start > block.target_end {
        return Some(format!(
            "target start {} is after target end {}",
            block.target_start, block.target_end
        ));
    }
    if block.query_start > block.query_end {
        return Some(format!(
            "query start {} is after query end {}",
            block.query_start, block.query_end
        ));
    }
    None
}

/// True if the value is the `*` placeholder used for absent SAM fields
#[must_use]
pub fn is_missing(value: &str) -> bool {
    value == "*"
}
