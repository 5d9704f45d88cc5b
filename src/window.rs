//! Search window sizing.
//!
//! Enumerating every `k`-subset of all remaining events is exponential, so
//! each round only searches a leading window of the remaining events. The
//! window is the widest one whose subset count stays under a ceiling.

/// Binomial coefficient `C(n, k)`, saturating at `u128::MAX`.
pub fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (n - i) / (i + 1) is exact at every step
        let num = (n - i) as u128;
        let den = (i + 1) as u128;
        acc = match acc.checked_mul(num) {
            Some(v) => v / den,
            None => {
                let g = gcd(acc, den);
                match (acc / g).checked_mul(num / (den / g)) {
                    Some(v) => v,
                    None => return u128::MAX,
                }
            }
        };
    }
    acc
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Width of the leading slice to search for `group_size`-subsets.
///
/// Grows the window from `group_size + 1` while `C(window, group_size)`
/// stays below `combination_ceiling`, and returns the largest window under
/// the ceiling. The result is never smaller than `group_size` (so at least
/// one candidate exists) and never larger than `universe_size`.
///
/// ```
/// use pmu_partition::estimate_window;
/// // C(8, 4) = 70 < 100, C(9, 4) = 126
/// assert_eq!(estimate_window(1_000, 4, 100), 8);
/// assert_eq!(estimate_window(5, 4, 100), 5);
/// ```
pub fn estimate_window(universe_size: usize, group_size: usize, combination_ceiling: u64) -> usize {
    if group_size == 0 {
        return 0;
    }
    let ceiling = u128::from(combination_ceiling);
    let mut window = group_size + 1;
    let mut combinations = window as u128;
    while combinations < ceiling && window <= universe_size {
        window += 1;
        combinations = binomial(window, group_size);
    }
    (window - 1).min(universe_size)
}
