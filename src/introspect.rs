//! Grammar introspection: a serializable dump of every registered command's
//! syntax tree, for generating completions, manpages, or feeding an agent
//! that needs to discover what the engine can do.
//!
//! Grounded on the teacher's `kernel/grammar.rs` (`GrammarModel`'s
//! noun/verb/argument tree, schema version, `dump_json`/`dump_yaml`), adapted
//! from a clap `Command` walk to a [`crate::syntax::SyntaxArena`] walk since
//! this engine has no clap tree to extract from.

use crate::format::OutputFormat;
use crate::registry::CommandRegistry;
use crate::syntax::{NodeId, NodeKind, SyntaxArena};
use crate::view::{Direction, DirectedViewMask};
use serde::Serialize;

pub const GRAMMAR_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    Keyword,
    Variable,
    OptionalGroup,
    EndOfCommand,
}

/// One reachable branch from a node, dumped as a flat tree rather than
/// re-exposing the arena's pseudo `OptHead`/`OptEnd` bookkeeping nodes.
#[derive(Debug, Clone, Serialize)]
pub struct BranchDump {
    pub kind: BranchKind,
    pub token: Option<String>,
    pub arg_label: Option<String>,
    pub help: Option<String>,
    pub do_view_mask: u32,
    pub undo_view_mask: u32,
    pub children: Vec<BranchDump>,
}

fn dump_node(arena: &SyntaxArena, id: NodeId, seen: &mut std::collections::HashSet<u32>) -> Option<BranchDump> {
    if !seen.insert(id.0) {
        return None;
    }
    let node = arena.get(id);
    let (kind, token) = match &node.kind {
        NodeKind::Keyword(lit) => (BranchKind::Keyword, Some(lit.clone())),
        NodeKind::Var { .. } => (BranchKind::Variable, node.arg_label.clone()),
        NodeKind::Leaf => (BranchKind::EndOfCommand, None),
        NodeKind::OptHead { .. } | NodeKind::OptEnd { .. } => (BranchKind::OptionalGroup, None),
    };
    let DirectedViewMask { do_mask, undo_mask } = node.views;
    let children = node
        .branches
        .iter()
        .filter_map(|&child| dump_node(arena, child, seen))
        .collect();
    Some(BranchDump {
        kind,
        token,
        arg_label: node.arg_label.clone(),
        help: node.help_text.clone(),
        do_view_mask: do_mask,
        undo_view_mask: undo_mask,
        children,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandDump {
    pub name: String,
    pub manual_lines: Vec<String>,
    pub root: Option<BranchDump>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrammarDump {
    pub schema_version: String,
    pub commands: Vec<CommandDump>,
}

impl GrammarDump {
    /// Walk every tree in `registry` into a serializable snapshot.
    pub fn extract(registry: &CommandRegistry) -> Self {
        let commands = registry
            .iter()
            .map(|(name, tree)| {
                let mut seen = std::collections::HashSet::new();
                CommandDump {
                    name: name.to_string(),
                    manual_lines: tree.manual_lines().to_vec(),
                    root: dump_node(tree.arena(), tree.root(), &mut seen),
                }
            })
            .collect();
        GrammarDump { schema_version: GRAMMAR_SCHEMA_VERSION.to_string(), commands }
    }

    /// Commands reachable at all under `direction`/`view`, in registry order.
    pub fn extract_for_view(registry: &CommandRegistry, direction: Direction, view: u32) -> Self {
        let mut dump = Self::extract(registry);
        dump.commands.retain(|c| match registry.get(&c.name) {
            Some(tree) => tree.admits(direction, view),
            None => false,
        });
        dump
    }
}

/// Render `registry`'s full grammar in `format`.
pub fn dump(registry: &CommandRegistry, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    format.format(&GrammarDump::extract(registry))
}
