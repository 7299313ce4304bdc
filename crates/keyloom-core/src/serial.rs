//! Serial identifier allocation for dependent keys.
//!
//! Item keys (`ENG-42`) and the tracker's other numbered families
//! (`SPRINT-3`, `M-7`) are allocated the same way: scan the keys carrying
//! the literal prefix, take the highest strictly-decimal suffix, add one.

/// Next serial number under `prefix`.
///
/// `prefix` is the literal text before the dash. Keys that do not start
/// with `{prefix}-`, or whose remainder is not purely decimal, are ignored
/// rather than rejected; the store may legitimately hold foreign prefixes
/// in the same table. Returns 1 when nothing matches.
pub fn next_serial<'a>(existing: impl IntoIterator<Item = &'a str>, prefix: &str) -> u64 {
    let mut max = 0u64;

    for key in existing {
        let Some(digits) = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
        else {
            continue;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Ok(number) = digits.parse::<u64>() {
            max = max.max(number);
        }
    }

    max.saturating_add(1)
}

///
/// TESTS
///
