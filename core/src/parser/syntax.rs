use core::ops::Range;

/// Byte range in the parsed source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self(start..end)
    }

    pub fn combine(a: &Span, b: &Span) -> Span {
        Span::new(a.0.start, b.0.end)
    }

    pub fn str_of<'a>(&self, source: &'a str) -> &'a str {
        &source[self.0.start..self.0.end]
    }
}

impl From<pest::Span<'_>> for Span {
    fn from(s: pest::Span<'_>) -> Self {
        Self(s.start()..s.end())
    }
}

/// Whether the text between two tokens contains an empty line.
///
/// A line holding only a comment does not count as empty.
pub(crate) fn has_blank_line(gap: &str) -> bool {
    let lines: Vec<&str> = gap.split('\n').collect();
    lines.len() > 2
        && lines[1..lines.len() - 1]
            .iter()
            .any(|line| line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_detection() {
        assert!(!has_blank_line(" "));
        assert!(!has_blank_line("\n    "));
        assert!(has_blank_line("\n\n    "));
        assert!(has_blank_line("\n  \n    "));
        assert!(!has_blank_line("\n    // note\n    "));
    }
}
