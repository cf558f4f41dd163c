use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `..` between two segments: any number of segments, none included.
    Many,
    /// One name segment, `*` standing for any run of characters.
    Glob(Arc<str>),
}

/// A dotted type name with wildcards: `org.apache.http.HttpHost`,
/// `*..StringUtils`, `org.apache..*..HttpClientBuilder`, `*Utils`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePattern {
    segments: Vec<Segment>,
}

impl TypePattern {
    /// Parses a pattern. `None` when it is malformed.
    pub fn new(text: &str) -> Option<TypePattern> {
        let parts: Vec<&str> = text.split("..").collect();
        let mut segments = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                segments.push(Segment::Many);
            }
            let edge = i == 0 || i == parts.len() - 1;
            if part.is_empty() && edge && parts.len() > 1 {
                continue;
            }
            for segment in part.split('.') {
                if !valid_segment(segment) {
                    return None;
                }
                segments.push(Segment::Glob(Arc::from(segment)));
            }
        }
        Some(TypePattern { segments })
    }

    /// A single segment such as a method name. No dots allowed.
    pub fn segment(text: &str) -> Option<TypePattern> {
        valid_segment(text).then(|| TypePattern::literal(text))
    }

    /// Matches `text` exactly, no wildcard interpretation of dots.
    pub fn literal(text: &str) -> TypePattern {
        TypePattern {
            segments: vec![Segment::Glob(Arc::from(text))],
        }
    }

    pub fn is_exactly(&self, text: &str) -> bool {
        matches!(self.segments.as_slice(), [Segment::Glob(g)] if &**g == text)
    }

    pub fn matches(&self, name: &str) -> bool {
        if let [Segment::Glob(g)] = self.segments.as_slice()
            && !g.contains('*')
        {
            return &**g == name;
        }
        let names: Vec<&str> = name.split('.').collect();
        match_segments(&self.segments, &names)
    }
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '*'))
}

fn match_segments(patterns: &[Segment], names: &[&str]) -> bool {
    match patterns.split_first() {
        None => names.is_empty(),
        Some((Segment::Many, rest)) => {
            (0..=names.len()).any(|skip| match_segments(rest, &names[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match names.split_first() {
            Some((name, remaining)) => glob_match(glob.as_bytes(), name.as_bytes()) && match_segments(rest, remaining),
            None => false,
        },
    }
}

fn glob_match(glob: &[u8], text: &[u8]) -> bool {
    match glob.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| glob_match(rest, &text[skip..])),
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}
