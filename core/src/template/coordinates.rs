use std::sync::Arc;

use crate::errors::TemplateError;
use crate::parser::FragmentKind;
use crate::tree::{Block, Comment, Expr, NodeId, Statement, Tree};

/// Where a template's output goes.
#[derive(Debug, Clone)]
pub enum Coordinates {
    /// Replace an expression or a statement. Yields a tree of the same kind.
    Replace(Tree),
    /// Replace the argument list of a call or `new` expression. Yields the
    /// call, rebound to the new arguments.
    ReplaceArguments(Arc<Expr>),
    /// Insert statements in front of `anchor`. Yields the block.
    Before { block: Arc<Block>, anchor: NodeId },
    /// Insert statements after `anchor`. Yields the block.
    After { block: Arc<Block>, anchor: NodeId },
    /// Insert statements at the top of the block. Yields the block.
    FirstStatement(Arc<Block>),
}

impl Coordinates {
    pub fn replace(expr: &Arc<Expr>) -> Coordinates {
        Coordinates::Replace(Tree::Expr(expr.clone()))
    }

    pub fn replace_statement(statement: &Arc<Statement>) -> Coordinates {
        Coordinates::Replace(Tree::Statement(statement.clone()))
    }

    pub fn before(block: &Arc<Block>, anchor: &Statement) -> Coordinates {
        Coordinates::Before {
            block: block.clone(),
            anchor: anchor.id,
        }
    }

    pub fn after(block: &Arc<Block>, anchor: &Statement) -> Coordinates {
        Coordinates::After {
            block: block.clone(),
            anchor: anchor.id,
        }
    }

    pub(crate) fn fragment_kind(&self) -> Result<FragmentKind, TemplateError> {
        Ok(match self {
            Coordinates::Replace(Tree::Expr(_)) => FragmentKind::Expression,
            Coordinates::Replace(Tree::Statement(_)) => FragmentKind::Statements,
            Coordinates::Replace(_) => {
                return Err(TemplateError::Coordinates(
                    "only expressions and statements can be replaced",
                ));
            }
            Coordinates::ReplaceArguments(_) => FragmentKind::Arguments,
            Coordinates::Before { .. }
            | Coordinates::After { .. }
            | Coordinates::FirstStatement(_) => FragmentKind::Statements,
        })
    }
}

/// Splices `inserted` into `block`. `flag` goes on the first inserted
/// statement.
pub(crate) fn insert(
    coordinates: &Coordinates,
    inserted: Vec<Arc<Statement>>,
    flag: Option<Comment>,
) -> Result<Arc<Block>, TemplateError> {
    let (block, index, blank_line) = match coordinates {
        Coordinates::FirstStatement(block) => (block, 0, false),
        Coordinates::Before { block, anchor } | Coordinates::After { block, anchor } => {
            let position = block
                .statements
                .iter()
                .position(|s| s.id == *anchor)
                .ok_or(TemplateError::Coordinates("anchor statement is not in the block"))?;
            let blank_line = block.statements[position].blank_line_before;
            match coordinates {
                Coordinates::Before { .. } => (block, position, blank_line),
                _ => (block, position + 1, blank_line),
            }
        }
        _ => return Err(TemplateError::Coordinates("not an insertion point")),
    };

    let mut statements = Vec::with_capacity(block.statements.len() + inserted.len());
    statements.extend(block.statements[..index].iter().cloned());
    for (i, statement) in inserted.into_iter().enumerate() {
        if i > 0 {
            statements.push(statement);
            continue;
        }
        let mut first = statement.with_blank_line_before(blank_line);
        first.comments.extend(flag.clone());
        statements.push(Arc::new(first));
    }
    for (i, statement) in block.statements[index..].iter().enumerate() {
        // The anchor's blank line now precedes the inserted statements.
        if i == 0 && matches!(coordinates, Coordinates::Before { .. }) && statement.blank_line_before {
            statements.push(Arc::new(statement.with_blank_line_before(false)));
        } else {
            statements.push(statement.clone());
        }
    }
    Ok(Arc::new(block.with_statements(statements)))
}
