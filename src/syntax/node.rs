//! The arena-based match tree: nodes are indices, not owning pointers.
//!
//! Grounded on Design Notes §9 ("avoid reference-counted graph structures";
//! "implement as indices into an arena of nodes owned by the command
//! tree") and on `original_source/src/ocli_core.c`'s `node_t`, trimmed to
//! the structural kinds that survive compilation (`OPT_HEAD`/`OPT_END`
//! persist; `OPT_ANY`/`ALT_HEAD`/`ALT_OR`/`ALT_END` are compile-time-only
//! and fold into sibling `alt_order`/`alt_head_backref` wiring instead).

use crate::lexicon::{LexKindId, NumericRange};
use crate::view::DirectedViewMask;
use std::sync::Arc;

/// An index into a [`SyntaxArena`]. Never valid across different arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// An application-supplied dynamic completion function for a `VAR` node:
/// `(partial_text, limit) -> suggestions`.
pub type ArgHelper = Arc<dyn Fn(&str, usize) -> Vec<String> + Send + Sync>;

/// Maximum children of a single node (branch-slot overflow past this).
pub const MAX_BRANCHES: usize = 80;
/// Maximum alternatives in one `{ A | B | ... }` group.
pub const MAX_ALT_SLOTS: usize = 16;
/// Maximum elements in one `[ ... ]` / `[ * ... ]` group.
pub const MAX_OPTION_SLOTS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Matches a literal token, case-sensitive, by prefix.
    Keyword(String),
    /// Matches a typed value, optionally range-checked.
    Var { lex_type: LexKindId, range: Option<NumericRange> },
    /// Terminal: command complete here. Always childless.
    Leaf,
    /// Structural: start of an optional (or wildcard-optional) group.
    /// `end` is filled in once the matching `]` closes the group; always
    /// `Some` by the time a compiled tree is used for matching.
    OptHead { any_order: bool, end: Option<NodeId> },
    /// Structural: end of an optional group, back-referencing its head.
    OptEnd { head: NodeId },
}

impl NodeKind {
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Leaf)
    }

    pub fn is_opt_head(&self) -> bool {
        matches!(self, NodeKind::OptHead { .. })
    }

    pub fn is_opt_end(&self) -> bool {
        matches!(self, NodeKind::OptEnd { .. })
    }

    pub fn keyword_literal(&self) -> Option<&str> {
        match self {
            NodeKind::Keyword(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub views: DirectedViewMask,
    pub arg_label: Option<String>,
    pub help_text: Option<String>,
    pub depth: u32,
    pub branches: Vec<NodeId>,
    /// Set on every node created inside an (as yet unclosed, or now closed)
    /// option body, including its `OptEnd`: the enclosing `OptHead`.
    pub opt_head_backref: Option<NodeId>,
    /// `>= 1` for ALT siblings sharing a parent, `0` otherwise. The eldest
    /// (order 1) owns no special state beyond being the back-reference
    /// target; younger siblings point to it via `alt_head_backref`.
    pub alt_order: u32,
    pub alt_head_backref: Option<NodeId>,
    pub arg_helper: Option<ArgHelper>,
}

impl Node {
    fn new(kind: NodeKind, depth: u32) -> Self {
        Node {
            kind,
            views: DirectedViewMask::new(),
            arg_label: None,
            help_text: None,
            depth,
            branches: Vec::new(),
            opt_head_backref: None,
            alt_order: 0,
            alt_head_backref: None,
            arg_helper: None,
        }
    }

    pub fn is_alt_member(&self) -> bool {
        self.alt_order >= 1
    }
}

/// Owns every node of one command tree. Indices are stable for the life of
/// the arena; nodes are never removed, only appended (prefix sharing reuses
/// existing indices rather than creating duplicates).
#[derive(Clone, Default)]
pub struct SyntaxArena {
    nodes: Vec<Node>,
}

impl SyntaxArena {
    pub fn new() -> Self {
        SyntaxArena { nodes: Vec::new() }
    }

    pub fn push(&mut self, kind: NodeKind, depth: u32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, depth));
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Install `helper` on every `Var` node carrying `arg_label`, across
    /// every pattern compiled into this arena so far. Returns how many nodes
    /// were touched, so a caller can tell an unknown label apart from a real
    /// install.
    pub fn set_arg_helper_by_label(&mut self, arg_label: &str, helper: ArgHelper) -> usize {
        let mut touched = 0;
        for node in &mut self.nodes {
            if node.arg_label.as_deref() == Some(arg_label) {
                node.arg_helper = Some(helper.clone());
                touched += 1;
            }
        }
        touched
    }
}
