//! Debian version ordering
//!
//! Native implementation of the ordering used by `dpkg --compare-versions`.
//! Strings are compared as alternating non-digit and digit runs:
//! - non-digit runs compare character by character, where `~` sorts before
//!   the end of the run, which sorts before letters, which sort before any
//!   other character
//! - digit runs compare numerically (leading zeros ignored, any length)
//!
//! The comparison covers the whole version string, so the packaging revision
//! participates in the order. An optional `epoch:` prefix is compared first.

use std::cmp::Ordering;
use std::fmt;

/// Compare two Debian package versions
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (epoch_a, rest_a) = split_epoch(a);
    let (epoch_b, rest_b) = split_epoch(b);

    epoch_a
        .cmp(&epoch_b)
        .then_with(|| verrevcmp(rest_a.as_bytes(), rest_b.as_bytes()))
}

/// Split a leading `N:` epoch. Versions without one have epoch 0.
fn split_epoch(version: &str) -> (u64, &str) {
    version
        .split_once(':')
        .and_then(|(epoch, rest)| {
            if epoch.is_empty() || !epoch.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            epoch.parse().ok().map(|epoch| (epoch, rest))
        })
        .unwrap_or((0, version))
}

/// Sort weight of a character inside a non-digit run
fn order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(b'~') => -1,
        Some(c) => i32::from(c) + 256,
    }
}

fn is_digit_at(s: &[u8], i: usize) -> bool {
    s.get(i).is_some_and(u8::is_ascii_digit)
}

fn verrevcmp(a: &[u8], b: &[u8]) -> Ordering {
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        // Non-digit run. A side at a digit or at the end weighs 0, which never
        // equals the weight of a real non-digit, so neither index overruns.
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit()) {
            let ac = order(a.get(i).copied());
            let bc = order(b.get(j).copied());
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        // Digit run
        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while is_digit_at(a, i) && is_digit_at(b, j) {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }

        // The longer run is the larger number
        if is_digit_at(a, i) {
            return Ordering::Greater;
        }
        if is_digit_at(b, j) {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }

    Ordering::Equal
}

/// Raw Debian version string ordered by [`compare_versions`]
///
/// Equality follows the ordering, so `1.01` and `1.1` are equal.
#[derive(Debug, Clone)]
pub struct DebianVersion(String);

impl DebianVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for DebianVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DebianVersion {}

impl PartialOrd for DebianVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DebianVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.0, &other.0)
    }
}

impl fmt::Display for DebianVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
