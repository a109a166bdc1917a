//! Glob Pattern Matching for SCAN
//!
//! Supported patterns:
//! - `*` matches any run of bytes, including none
//! - `?` matches exactly one byte
//! - `[abc]`, `[a-z]`, `[^a]` character classes
//! - `\x` matches `x` literally
//!
//! Matching is done on raw key bytes, so binary keys work too.

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: Vec<u8>,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.as_bytes().to_vec(),
        }
    }

    /// True if the pattern matches everything (`*`).
    pub fn is_match_all(&self) -> bool {
        self.pattern == b"*"
    }

    pub fn matches(&self, text: &[u8]) -> bool {
        self.is_match_all() || match_from(&self.pattern, text)
    }
}

/// Iterative matcher. On a mismatch it resumes from the most recent `*`,
/// letting that star absorb one more byte, so the cost stays within
/// `O(pattern * text)`.
fn match_from(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Pattern index after the last star and the text index it resumes from
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            if pattern[p] == b'*' {
                p += 1;
                star = Some((p, t));
                continue;
            }
            if let Some(used) = match_token(&pattern[p..], text[t]) {
                p += used;
                t += 1;
                continue;
            }
        }

        match star {
            Some((after_star, resume)) => {
                p = after_star;
                t = resume + 1;
                star = Some((after_star, t));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

/// Matches one byte against the token at the start of `pattern`.
///
/// Returns the number of pattern bytes the token used.
fn match_token(pattern: &[u8], byte: u8) -> Option<usize> {
    match pattern[0] {
        b'?' => Some(1),
        b'[' => match match_class(&pattern[1..], byte) {
            Some((true, used)) => Some(1 + used),
            Some((false, _)) => None,
            // Unterminated class: treat '[' literally
            None => (byte == b'[').then_some(1),
        },
        b'\\' if pattern.len() > 1 => (pattern[1] == byte).then_some(2),
        c => (c == byte).then_some(1),
    }
}

/// Matches `byte` against the class body following `[`.
///
/// Returns whether it matched and how many pattern bytes the class used,
/// including the closing `]`.
fn match_class(class: &[u8], byte: u8) -> Option<(bool, usize)> {
    let mut i = 0;
    let negate = class.first() == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < class.len() {
        match class[i] {
            b']' => return Some((matched != negate, i + 1)),
            b'\\' if i + 1 < class.len() => {
                if class[i + 1] == byte {
                    matched = true;
                }
                i += 2;
            }
            lo if i + 2 < class.len() && class[i + 1] == b'-' && class[i + 2] != b']' => {
                let hi = class[i + 2];
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                if byte >= lo && byte <= hi {
                    matched = true;
                }
                i += 3;
            }
            c => {
                if c == byte {
                    matched = true;
                }
                i += 1;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pattern: &str, text: &str) -> bool {
        GlobPattern::new(pattern).matches(text.as_bytes())
    }

    #[test]
    fn test_glob_pattern() {
        assert!(m("*", "anything"));
        assert!(m("*", ""));
        assert!(m("h*llo", "hello"));
        assert!(m("h*llo", "hllo"));
        assert!(m("h?llo", "hallo"));
        assert!(!m("h?llo", "hllo"));
        assert!(m("h[ae]llo", "hello"));
        assert!(!m("h[ae]llo", "hillo"));
        assert!(m("h[^e]llo", "hallo"));
        assert!(!m("h[^e]llo", "hello"));
        assert!(m("key:[0-9]", "key:7"));
        assert!(!m("key:[0-9]", "key:x"));
        assert!(m("user:*:name", "user:42:name"));
        assert!(!m("user:*:name", "user:42:age"));
    }

    #[test]
    fn test_escapes_and_literals() {
        assert!(m("a\\*b", "a*b"));
        assert!(!m("a\\*b", "axb"));
        assert!(m("[", "["));
        assert!(m("a**b", "ab"));
        assert!(m("a\\", "a\\"));
        assert!(!m("abc", "ab"));
        assert!(!m("ab", "abc"));
    }

    #[test]
    fn test_many_stars_stay_linear() {
        let key = [b'a'; 4096];
        let pattern = GlobPattern::new("*a*a*a*a*a*a*a*a*a*a*a*a*b");
        let started = std::time::Instant::now();
        assert!(!pattern.matches(&key));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));

        assert!(GlobPattern::new("*a*a*a*a*a*a*a*a*a*a*a*a*").matches(&key));
        assert!(m("*x*y*z", "__x__y__z"));
        assert!(!m("*x*y*z", "__x__z__y"));
    }

    #[test]
    fn test_binary_keys() {
        let pattern = GlobPattern::new("k*");
        assert!(pattern.matches(&[b'k', 0xff, 0x00]));
        assert!(!pattern.matches(&[0xff]));
    }
}
