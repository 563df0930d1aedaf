//! A small, unoptimized full-match regex engine for the concrete
//! interpreter's `Seq.MatchesRegex`.
//!
//! Regex derivative construction and AST minimisation are explicitly out of
//! scope for this system; this module exists only to make concrete
//! evaluation correct, not fast. It computes, for each prefix length of the
//! candidate string, whether some path through the pattern consumes
//! exactly that many characters, then checks whether the full string length
//! is reachable.

use std::collections::HashSet;

use symlogic_expr::RegexExpr;

/// Returns `true` if `s` is fully matched by `regex`.
pub fn matches_full(s: &str, regex: &RegexExpr) -> bool {
    let chars: Vec<char> = s.chars().collect();
    reachable_lengths(&chars, regex).contains(&chars.len())
}

/// The set of prefix lengths of `chars` that `regex` can consume starting
/// from position 0.
fn reachable_lengths(chars: &[char], regex: &RegexExpr) -> HashSet<usize> {
    match regex {
        RegexExpr::Literal(lit) => {
            let lit_chars: Vec<char> = lit.chars().collect();
            if chars.len() >= lit_chars.len() && chars[..lit_chars.len()] == lit_chars[..] {
                HashSet::from([lit_chars.len()])
            } else {
                HashSet::new()
            }
        }
        RegexExpr::Range(lo, hi) => {
            if chars.first().is_some_and(|c| (*lo..=*hi).contains(c)) {
                HashSet::from([1])
            } else {
                HashSet::new()
            }
        }
        RegexExpr::Union(a, b) => {
            let mut lengths = reachable_lengths(chars, a);
            lengths.extend(reachable_lengths(chars, b));
            lengths
        }
        RegexExpr::Intersect(a, b) => {
            let left = reachable_lengths(chars, a);
            let right = reachable_lengths(chars, b);
            left.intersection(&right).copied().collect()
        }
        RegexExpr::Concat(a, b) => {
            let mut result = HashSet::new();
            for prefix_len in reachable_lengths(chars, a) {
                for suffix_len in reachable_lengths(&chars[prefix_len..], b) {
                    result.insert(prefix_len + suffix_len);
                }
            }
            result
        }
        RegexExpr::Star(inner) => {
            let mut reached: HashSet<usize> = HashSet::from([0]);
            let mut frontier: Vec<usize> = vec![0];
            while let Some(len) = frontier.pop() {
                for step in reachable_lengths(&chars[len..], inner) {
                    if step == 0 {
                        continue;
                    }
                    let next = len + step;
                    if reached.insert(next) {
                        frontier.push(next);
                    }
                }
            }
            reached
        }
        RegexExpr::Negate(inner) => {
            let excluded = reachable_lengths(chars, inner);
            (0..=chars.len()).filter(|len| !excluded.contains(len)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_exactly() {
        assert!(matches_full("abc", &RegexExpr::Literal("abc".to_string())));
        assert!(!matches_full("abcd", &RegexExpr::Literal("abc".to_string())));
    }

    #[test]
    fn star_matches_repetition() {
        let digit = RegexExpr::Range('0', '9');
        let digits = RegexExpr::Star(Box::new(digit));
        assert!(matches_full("", &digits));
        assert!(matches_full("1234", &digits));
        assert!(!matches_full("12a4", &digits));
    }

    #[test]
    fn union_matches_either_branch() {
        let pattern = RegexExpr::Union(
            Box::new(RegexExpr::Literal("cat".to_string())),
            Box::new(RegexExpr::Literal("dog".to_string())),
        );
        assert!(matches_full("cat", &pattern));
        assert!(matches_full("dog", &pattern));
        assert!(!matches_full("bird", &pattern));
    }

    #[test]
    fn concat_chains_consumption() {
        let pattern = RegexExpr::Concat(
            Box::new(RegexExpr::Literal("ab".to_string())),
            Box::new(RegexExpr::Star(Box::new(RegexExpr::Range('0', '9')))),
        );
        assert!(matches_full("ab123", &pattern));
        assert!(matches_full("ab", &pattern));
        assert!(!matches_full("ab12x", &pattern));
    }

    #[test]
    fn negate_excludes_inner_language() {
        let not_empty = RegexExpr::Negate(Box::new(RegexExpr::Literal(String::new())));
        assert!(!matches_full("", &not_empty));
        assert!(matches_full("x", &not_empty));
    }
}
