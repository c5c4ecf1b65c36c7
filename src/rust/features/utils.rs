/// Shannon entropy (base 2) of the character distribution of `s`.
///
/// Returns 0.0 for an empty string. Terms are summed in first-occurrence
/// order so the result is bit-for-bit reproducible.
pub fn shannon_entropy(s: &str) -> f64 {
    let mut counts: Vec<(char, usize)> = Vec::new();
    let mut total = 0usize;
    for c in s.chars() {
        match counts.iter_mut().find(|(seen, _)| *seen == c) {
            Some((_, count)) => *count += 1,
            None => counts.push((c, 1)),
        }
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let entropy = counts
        .iter()
        .map(|&(_, count)| {
            let p = count as f64 / total;
            p * p.log2()
        })
        .sum::<f64>();
    // A single repeated character yields -0.0
    (-entropy).max(0.0)
}

pub(crate) fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_edge_cases() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert!((shannon_entropy("ab") - 1.0).abs() < 1e-12);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_maximized_by_distinct_characters() {
        let distinct = shannon_entropy("abcdefgh");
        for other in ["aabbccdd", "abcdefga", "aaaaaaab"] {
            assert!(shannon_entropy(other) < distinct, "{} should be below {}", other, distinct);
        }
        assert!((distinct - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_is_reproducible() {
        let host = "secure-login.bank.example.tk";
        let first = shannon_entropy(host).to_bits();
        for _ in 0..1000 {
            assert_eq!(shannon_entropy(host).to_bits(), first);
        }
    }
}
