/// Common leading whitespace of a pasted selection, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct IndentProfile(pub usize);

impl IndentProfile {
    /// Minimum offset of the first non-whitespace character over every
    /// line that has one. Zero when no such line exists.
    pub fn from_plain_text(text: &str) -> Self {
        let min = text
            .split('\n')
            .filter_map(|line| line.chars().position(|c| !c.is_whitespace()))
            .min()
            .unwrap_or(0);
        Self(min)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Drop up to `count` leading characters
pub fn strip_chars(s: &str, count: usize) -> String {
    s.chars().skip(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_indent_is_detected() {
        assert_eq!(IndentProfile::from_plain_text("    a\n    b"), IndentProfile(4));
    }

    #[test]
    fn mixed_indent_takes_minimum() {
        assert_eq!(IndentProfile::from_plain_text("  a\n    b\nc"), IndentProfile(0));
        assert_eq!(IndentProfile::from_plain_text("  foo\n    bar"), IndentProfile(2));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(
            IndentProfile::from_plain_text("    a\n\n  \n      b\r\n"),
            IndentProfile(4)
        );
    }

    #[test]
    fn all_blank_is_zero() {
        assert!(IndentProfile::from_plain_text("   \n\t\n").is_zero());
        assert!(IndentProfile::from_plain_text("").is_zero());
    }

    #[test]
    fn tabs_count_as_single_characters() {
        assert_eq!(IndentProfile::from_plain_text("\t\tx\n\ty"), IndentProfile(1));
    }

    #[test]
    fn strip_chars_handles_short_input() {
        assert_eq!(strip_chars("  ab", 2), "ab");
        assert_eq!(strip_chars(" ", 4), "");
        assert_eq!(strip_chars("ééx", 1), "éx");
    }
}
