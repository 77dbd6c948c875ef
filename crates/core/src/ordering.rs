//! Numeric-aware string ordering for question ids.
//!
//! Deterministic sampling sorts pools by id so that `"q2"` comes before
//! `"q10"`: digit runs compare as integers, everything else compares
//! case-insensitively with a raw-byte tiebreak.

use std::cmp::Ordering;

/// Compare two strings treating embedded digit runs as numbers.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(lc), Some(rc)) => {
                if lc.is_ascii_digit() && rc.is_ascii_digit() {
                    let ln = take_digits(&mut left);
                    let rn = take_digits(&mut right);
                    match compare_digit_runs(&ln, &rn) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                } else {
                    left.next();
                    right.next();
                    let folded = lc
                        .to_ascii_lowercase()
                        .cmp(&rc.to_ascii_lowercase())
                        .then_with(|| lc.cmp(&rc));
                    if folded != Ordering::Equal {
                        return folded;
                    }
                }
            }
        }
    }

    Ordering::Equal
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare digit runs of arbitrary length without parsing to an integer:
/// strip leading zeros, then longer run wins, then lexicographic.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_runs_compare_numerically() {
        assert_eq!(natural_cmp("q2", "q10"), Ordering::Less);
        assert_eq!(natural_cmp("q10", "q2"), Ordering::Greater);
        assert_eq!(natural_cmp("q10", "q10"), Ordering::Equal);
    }

    #[test]
    fn leading_zeros_do_not_change_value() {
        assert_eq!(natural_cmp("q007", "q7"), Ordering::Equal);
        assert_eq!(natural_cmp("q007", "q8"), Ordering::Less);
    }

    #[test]
    fn case_folds_before_raw_compare() {
        assert_eq!(natural_cmp("Q2", "q10"), Ordering::Less);
        assert_eq!(natural_cmp("geo-2", "GEO-10"), Ordering::Less);
    }

    #[test]
    fn sorts_mixed_pool_in_expected_order() {
        let mut pool = vec!["q2", "q10", "q1"];
        pool.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(pool, vec!["q1", "q2", "q10"]);
    }

    #[test]
    fn huge_digit_runs_do_not_overflow() {
        assert_eq!(
            natural_cmp("q99999999999999999999998", "q99999999999999999999999"),
            Ordering::Less
        );
    }
}
