use core::any::Any;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::tree::{Block, ClassDecl, JavaType, MethodDecl, Statement, StatementKind, Tree};

struct Frame {
    tree: Tree,
    messages: HashMap<&'static str, Box<dyn Any>>,
}

/// The path from the compilation unit down to the node being visited.
///
/// Every frame holds the node as it was before this traversal touched it,
/// plus a message map visitors use to pass state between a node and its
/// descendants.
#[derive(Default)]
pub struct Cursor {
    frames: Vec<Frame>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, tree: Tree) {
        self.frames.push(Frame {
            tree,
            messages: HashMap::new(),
        });
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The node currently visited.
    pub fn value(&self) -> Option<&Tree> {
        self.frames.last().map(|f| &f.tree)
    }

    pub fn parent(&self) -> Option<&Tree> {
        self.ancestors().nth(1)
    }

    /// Current node first, then its ancestors up to the compilation unit.
    pub fn ancestors(&self) -> impl Iterator<Item = &Tree> {
        self.frames.iter().rev().map(|f| &f.tree)
    }

    /// Stores a message on the current frame. It lives until the visit of
    /// the current node returns.
    pub fn put_message<T: Any>(&mut self, key: &'static str, value: T) {
        if let Some(frame) = self.frames.last_mut() {
            frame.messages.insert(key, Box::new(value));
        }
    }

    pub fn get_nearest_message<T: Any>(&self, key: &'static str) -> Option<&T> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.messages.get(key))
            .and_then(|m| m.downcast_ref())
    }

    pub fn get_nearest_message_mut<T: Any>(&mut self, key: &'static str) -> Option<&mut T> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|f| f.messages.get_mut(key))
            .and_then(|m| m.downcast_mut())
    }

    /// Removes and returns the message stored closest to the current node.
    pub fn poll_nearest_message<T: Any>(&mut self, key: &'static str) -> Option<T> {
        let frame = self
            .frames
            .iter_mut()
            .rev()
            .find(|f| f.messages.contains_key(key))?;
        let message = frame.messages.remove(key)?;
        message.downcast().ok().map(|boxed| *boxed)
    }

    pub fn first_enclosing_class(&self) -> Option<&Arc<ClassDecl>> {
        self.ancestors().find_map(Tree::as_class)
    }

    pub fn first_enclosing_method(&self) -> Option<&Arc<MethodDecl>> {
        self.ancestors().find_map(Tree::as_method)
    }

    pub fn first_enclosing_block(&self) -> Option<&Arc<Block>> {
        self.ancestors().skip(1).find_map(Tree::as_block)
    }

    /// The innermost statement containing the current node.
    pub fn enclosing_statement(&self) -> Option<&Arc<Statement>> {
        self.ancestors().find_map(Tree::as_statement)
    }

    /// Fully qualified names of the enclosing classes, outermost first.
    pub fn enclosing_class_names(&self) -> Vec<Arc<str>> {
        self.frames
            .iter()
            .filter_map(|f| f.tree.as_class())
            .filter_map(|c| c.ty.fqn().map(Arc::from))
            .collect()
    }

    /// Local variables and parameters in scope at the current node.
    ///
    /// A block contributes the declarations of the statements before the
    /// one on the path; a method its parameters.
    pub fn visible_locals(&self) -> Vec<(Arc<str>, JavaType)> {
        let mut locals = Vec::new();
        for (i, frame) in self.frames.iter().enumerate() {
            match &frame.tree {
                Tree::Method(method) => {
                    for param in &method.params {
                        locals.extend(param.vars.iter().map(|v| (v.name.clone(), v.ty.clone())));
                    }
                }
                // Class bodies hold fields, which resolve as members.
                Tree::Block(_) if i > 0 && self.frames[i - 1].tree.as_class().is_some() => {}
                Tree::Block(block) => {
                    let next = self.frames.get(i + 1).and_then(|f| f.tree.as_statement());
                    for statement in &block.statements {
                        if next.is_some_and(|n| n.id == statement.id) {
                            break;
                        }
                        if let StatementKind::VarDecls(vd) = &statement.kind {
                            locals.extend(vd.vars.iter().map(|v| (v.name.clone(), v.ty.clone())));
                        }
                    }
                }
                _ => {}
            }
        }
        locals
    }
}

impl core::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("depth", &self.frames.len())
            .finish()
    }
}
