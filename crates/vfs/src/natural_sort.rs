// SPDX-License-Identifier: Apache-2.0

//! Locale-independent natural-order path comparison (spec §4.2 `list`,
//! Open Question 3). Runs of ASCII digits compare numerically; everything
//! else compares byte-wise. Deliberately not delegated to a locale-aware
//! collation crate: compiler output must sort identically on every machine
//! regardless of the host locale.

use std::cmp::Ordering;

/// Compares two strings the way a human expects filenames with embedded
/// numbers to sort: `"s2"` before `"s10"`.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek(), b.peek()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let na = take_digit_run(&mut a);
                    let nb = take_digit_run(&mut b);
                    match compare_digit_runs(&na, &nb) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                } else {
                    match ca.cmp(cb) {
                        Ordering::Equal => {
                            a.next();
                            b.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_digit_run(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Vec<char> {
    let mut run = Vec::new();
    while let Some(c) = it.peek() {
        if c.is_ascii_digit() {
            run.push(*c);
            it.next();
        } else {
            break;
        }
    }
    run
}

/// Compares two runs of ASCII digits numerically, ignoring leading zeros,
/// falling back to lexical comparison of the zero-stripped run only to
/// break ties when the numeric values are equal but lengths differ
/// (e.g. `"007"` vs `"7"` sort equal numerically; shorter wins the tie).
fn compare_digit_runs(a: &[char], b: &[char]) -> Ordering {
    let a_trim = strip_leading_zeros(a);
    let b_trim = strip_leading_zeros(b);
    match a_trim.len().cmp(&b_trim.len()) {
        Ordering::Equal => match a_trim.cmp(&b_trim) {
            Ordering::Equal => a.len().cmp(&b.len()),
            other => other,
        },
        other => other,
    }
}

fn strip_leading_zeros(run: &[char]) -> &[char] {
    let first_nonzero = run.iter().position(|c| *c != '0').unwrap_or(run.len().saturating_sub(1));
    &run[first_nonzero.min(run.len().saturating_sub(1))..]
}

/// Sorts `paths` in place using [`natural_cmp`].
pub fn natural_sort(paths: &mut [String]) {
    paths.sort_by(|a, b| natural_cmp(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_runs_compare_numerically() {
        let mut files = vec!["s10.tif".to_string(), "s2.tif".to_string(), "s1.tif".to_string()];
        natural_sort(&mut files);
        assert_eq!(files, vec!["s1.tif", "s2.tif", "s10.tif"]);
    }

    #[test]
    fn plain_alpha_sorts_lexically() {
        let mut files = vec!["b.tif".to_string(), "a.tif".to_string()];
        natural_sort(&mut files);
        assert_eq!(files, vec!["a.tif", "b.tif"]);
    }

    #[test]
    fn leading_zeros_compare_equal_then_break_tie_by_length() {
        assert_eq!(natural_cmp("s007", "s7"), Ordering::Greater);
        assert_eq!(natural_cmp("s7", "s007"), Ordering::Less);
    }

    #[test]
    fn mixed_well_site_channel_names_sort_naturally() {
        let mut files = vec![
            "A1_s2_w1.tif".to_string(),
            "A1_s10_w1.tif".to_string(),
            "A1_s1_w1.tif".to_string(),
            "A10_s1_w1.tif".to_string(),
            "A2_s1_w1.tif".to_string(),
        ];
        natural_sort(&mut files);
        assert_eq!(
            files,
            vec![
                "A1_s1_w1.tif",
                "A1_s2_w1.tif",
                "A1_s10_w1.tif",
                "A2_s1_w1.tif",
                "A10_s1_w1.tif",
            ]
        );
    }
}
