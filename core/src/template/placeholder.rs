//! Placeholder syntax inside template code.

use std::sync::Arc;

use crate::errors::TemplateError;
use crate::tree::JavaType;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlotKind {
    /// Filled with a tree. `None` takes the type of the argument.
    Tree(Option<JavaType>),
    /// `#{}`: filled with text before parsing.
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slot {
    pub name: Option<Arc<str>>,
    pub kind: SlotKind,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Piece {
    Text(String),
    Slot(usize),
}

/// Template code split at its placeholders.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Placeholders {
    pub pieces: Vec<Piece>,
    pub slots: Vec<Slot>,
}

impl Placeholders {
    /// Splits `code`. Slots are numbered in order of first appearance;
    /// `#{name}` refers back to the slot declared as `#{name:any(..)}`.
    pub fn scan(code: &str) -> Result<Placeholders, TemplateError> {
        let mut scanned = Placeholders::default();
        let mut rest = code;
        while let Some(start) = rest.find("#{") {
            if start > 0 {
                scanned.pieces.push(Piece::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = closing_brace(after)
                .ok_or_else(|| TemplateError::InvalidPlaceholder(rest[start..].to_string()))?;
            let body = after[..end].trim();
            let index = scanned.slot_for(body)?;
            scanned.pieces.push(Piece::Slot(index));
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            scanned.pieces.push(Piece::Text(rest.to_string()));
        }
        Ok(scanned)
    }

    fn slot_for(&mut self, body: &str) -> Result<usize, TemplateError> {
        let invalid = || TemplateError::InvalidPlaceholder(format!("#{{{}}}", body));
        if body.is_empty() {
            return Ok(self.declare(None, SlotKind::Raw));
        }
        let (name, spec) = match body.split_once(':') {
            Some((name, spec)) => (Some(name.trim()), spec.trim()),
            None if is_identifier(body) && body != "any" => {
                if let Some(index) = self.named(body) {
                    return Ok(index);
                }
                return Ok(self.declare(Some(body), SlotKind::Tree(None)));
            }
            None => (None, body),
        };
        if let Some(name) = name
            && (!is_identifier(name) || self.named(name).is_some())
        {
            return Err(invalid());
        }
        let ty = spec
            .strip_prefix("any(")
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(invalid)?
            .trim();
        let ty = match ty {
            "" => None,
            ty => Some(parse_type(ty).ok_or_else(invalid)?),
        };
        Ok(self.declare(name, SlotKind::Tree(ty)))
    }

    fn named(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.name.as_deref() == Some(name))
    }

    fn declare(&mut self, name: Option<&str>, kind: SlotKind) -> usize {
        self.slots.push(Slot {
            name: name.map(Arc::from),
            kind,
        });
        self.slots.len() - 1
    }

    /// How many times slot `index` appears in the code.
    pub fn occurrences(&self, index: usize) -> usize {
        self.pieces
            .iter()
            .filter(|p| matches!(p, Piece::Slot(i) if *i == index))
            .count()
    }
}

/// Index of the `}` closing a placeholder, skipping nested `()` and `<>`.
fn closing_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => depth = depth.saturating_sub(1),
            '}' if depth == 0 => return Some(i),
            '{' | '\n' => return None,
            _ => {}
        }
    }
    None
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A slot type: primitive, `java.lang` simple name or qualified name, with
/// optional array dimensions. Generic arguments are dropped.
fn parse_type(text: &str) -> Option<JavaType> {
    let erased: String = match text.find('<') {
        Some(open) => {
            let close = text.rfind('>')?;
            format!("{}{}", &text[..open], &text[close + 1..])
        }
        None => text.to_string(),
    };
    let valid = erased
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '[' | ']'));
    (valid && !erased.is_empty()).then(|| JavaType::parse(&erased.replace('$', ".")))
}
