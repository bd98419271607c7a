//! Command registry: the named catalog of compiled command trees.
//!
//! Grounded on the original's `create_cmd_tree`/`get_cmd_tree` (prefix/view/
//! direction filtering with an exact-match short-circuit) and on the teacher
//! `registry.rs`'s builder-pattern, ordered-catalog texture, reworked onto a
//! `BTreeMap<String, CommandTree>` so lexicographic command order falls out
//! of the map itself instead of a separate sort step.
//!
//! There is no separate tree for the `no`/undo counterpart of a command: a
//! pattern registered under `Direction::Undo` grows into the *same* arena as
//! its `Direction::Do` sibling (`view.rs`'s `DirectedViewMask` carries one
//! mask per direction on every node), so `no <command> <its own args...>`
//! walks the identical tree `<command> <its own args...>` does. `Engine`
//! is what detects the undo keyword and picks the direction; the registry
//! itself never synthesizes anything.

use crate::context::AppContext;
use crate::error::{EngineError, Result};
use crate::symbol::SymbolTable;
use crate::syntax::{add_syntax, sprout_cmd_syntax, format_manual_line, ArgHelper, NodeId, NodeKind, SyntaxArena};
use crate::view::Direction;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An application-supplied command callback: the bindings a successful parse
/// produced, and the engine's shared [`AppContext`]. Boxed and `Send + Sync`
/// so a registry can be shared the way the rest of the engine is.
pub type CommandCallback =
    Arc<dyn Fn(&[crate::matcher::Binding], &AppContext) -> Result<()> + Send + Sync>;

/// One registered command: its compiled syntax forest, declared vocabulary,
/// manual lines, and callback.
pub struct CommandTree {
    name: String,
    arena: SyntaxArena,
    root: NodeId,
    symbols: SymbolTable,
    manual_lines: Vec<String>,
    callback: Option<CommandCallback>,
}

impl CommandTree {
    fn new(name: impl Into<String>, symbols: SymbolTable) -> Self {
        let name = name.into();
        let mut arena = SyntaxArena::new();
        let root = arena.push(NodeKind::Keyword(name.clone()), 0);
        CommandTree { name, arena, root, symbols, manual_lines: Vec::new(), callback: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arena(&self) -> &SyntaxArena {
        &self.arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn manual_lines(&self) -> &[String] {
        &self.manual_lines
    }

    pub fn callback(&self) -> Option<&CommandCallback> {
        self.callback.as_ref()
    }

    pub fn set_callback(&mut self, callback: CommandCallback) {
        self.callback = Some(callback);
    }

    /// Whether this tree carries any registration reachable under
    /// `direction`/`view` at all — the root node's mask covers every
    /// pattern ever compiled into it, since `add_syntax` always ORs the view
    /// into the root first.
    pub fn admits(&self, direction: Direction, view: u32) -> bool {
        self.arena.get(self.root).views.admits(direction, view)
    }

    /// Compile `pattern` for each of `directions`, merging with whatever has
    /// already been grown onto this tree.
    pub fn add_syntax(
        &mut self,
        pattern: &str,
        view_mask: u32,
        directions: &[Direction],
    ) -> std::result::Result<(), crate::error::CompileError> {
        add_syntax(&mut self.arena, self.root, &self.symbols, pattern, view_mask, directions)
    }

    /// Like [`Self::add_syntax`], additionally formatting and recording the
    /// manual line for `pattern`.
    pub fn add_syntax_and_manual(
        &mut self,
        pattern: &str,
        view_mask: u32,
        directions: &[Direction],
    ) -> std::result::Result<(), crate::error::CompileError> {
        self.add_syntax(pattern, view_mask, directions)?;
        let has_do = directions.contains(&Direction::Do);
        let has_undo = directions.contains(&Direction::Undo);
        self.manual_lines.push(format_manual_line(pattern, has_do, has_undo));
        Ok(())
    }

    /// Graft `pattern_tail` under every leaf admitting `view_mask` in
    /// `direction` — extends already-compiled commands without restating
    /// their full pattern.
    pub fn graft_syntax(
        &mut self,
        pattern_tail: &str,
        view_mask: u32,
        direction: Direction,
    ) -> std::result::Result<(), crate::error::CompileError> {
        sprout_cmd_syntax(&mut self.arena, self.root, &self.symbols, pattern_tail, view_mask, direction)
    }

    pub fn declare_symbol(&mut self, symbol: crate::symbol::Symbol) {
        self.symbols.declare(symbol);
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Install a dynamic completion helper on every compiled `Var` node
    /// carrying `arg_label`, across every pattern grown into this tree so
    /// far (both `Do` and `Undo` share the node, so one install covers both
    /// directions). Returns how many nodes were touched.
    pub fn set_completion_helper(&mut self, arg_label: &str, helper: ArgHelper) -> usize {
        self.arena.set_arg_helper_by_label(arg_label, helper)
    }
}

/// Central catalog of every command a running [`crate::engine::Engine`]
/// knows about, ordered lexicographically by name.
#[derive(Default)]
pub struct CommandRegistry {
    trees: BTreeMap<String, CommandTree>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        CommandRegistry { trees: BTreeMap::new() }
    }

    /// Create a new command tree, or return the existing one of the same
    /// name unchanged — idempotent on duplicate registration, mirroring the
    /// original's `create_cmd_tree`.
    pub fn create_command(&mut self, name: impl Into<String>, symbols: SymbolTable) -> &mut CommandTree {
        let name = name.into();
        self.trees.entry(name.clone()).or_insert_with(|| CommandTree::new(name, symbols))
    }

    pub fn get(&self, name: &str) -> Option<&CommandTree> {
        self.trees.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CommandTree> {
        self.trees.get_mut(name)
    }

    pub fn require(&self, name: &str) -> Result<&CommandTree> {
        self.get(name).ok_or_else(|| EngineError::UnknownCommand(name.to_string()))
    }

    pub fn require_mut(&mut self, name: &str) -> Result<&mut CommandTree> {
        self.trees.get_mut(name).ok_or_else(|| EngineError::UnknownCommand(name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.trees.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandTree)> {
        self.trees.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every tree whose name starts with `prefix` and admits `direction`/
    /// `view`, in lexicographic order, with an exact-name match returned
    /// alone — implements `get_cmd_tree`'s filtering/short-circuit.
    pub fn lookup_prefix(&self, prefix: &str, direction: Direction, view: u32) -> Vec<&CommandTree> {
        if let Some(exact) = self.trees.get(prefix) {
            if exact.admits(direction, view) {
                return vec![exact];
            }
        }
        self.trees
            .values()
            .filter(|t| t.name.starts_with(prefix) && t.admits(direction, view))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::kinds::BuiltinKind;
    use crate::symbol::Symbol;
    use crate::view::{BASIC_VIEW, CONFIG_VIEW};

    fn symbols_for(name: &str) -> SymbolTable {
        let mut t = SymbolTable::new();
        t.declare(Symbol::keyword(name));
        t.declare(Symbol::variable("HOST", BuiltinKind::HostName.id()));
        t
    }

    #[test]
    fn create_command_is_idempotent_on_duplicate_name() {
        let mut reg = CommandRegistry::new();
        reg.create_command("ping", symbols_for("ping"));
        reg.get_mut("ping").unwrap().add_syntax("ping HOST", BASIC_VIEW, &[Direction::Do]).unwrap();
        reg.create_command("ping", SymbolTable::new());
        assert_eq!(reg.len(), 1);
        assert!(reg.get("ping").unwrap().admits(Direction::Do, BASIC_VIEW));
    }

    #[test]
    fn lookup_prefix_exact_match_short_circuits() {
        let mut reg = CommandRegistry::new();
        reg.create_command("show", symbols_for("show"));
        reg.create_command("showall", symbols_for("showall"));
        reg.get_mut("show").unwrap().add_syntax("show HOST", BASIC_VIEW, &[Direction::Do]).unwrap();
        reg.get_mut("showall").unwrap().add_syntax("showall HOST", BASIC_VIEW, &[Direction::Do]).unwrap();

        let hits = reg.lookup_prefix("show", Direction::Do, BASIC_VIEW);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "show");
    }

    #[test]
    fn lookup_prefix_filters_by_view() {
        let mut reg = CommandRegistry::new();
        reg.create_command("ping", symbols_for("ping"));
        reg.get_mut("ping").unwrap().add_syntax("ping HOST", CONFIG_VIEW, &[Direction::Do]).unwrap();

        assert!(reg.lookup_prefix("ping", Direction::Do, BASIC_VIEW).is_empty());
        assert_eq!(reg.lookup_prefix("ping", Direction::Do, CONFIG_VIEW).len(), 1);
    }

    #[test]
    fn a_pattern_registered_for_both_directions_dispatches_undo_with_its_own_arguments() {
        let mut reg = CommandRegistry::new();
        reg.create_command("route", symbols_for("route"));
        reg.get_mut("route")
            .unwrap()
            .add_syntax("route HOST", CONFIG_VIEW, &[Direction::Do, Direction::Undo])
            .unwrap();

        let route = reg.require("route").unwrap();
        assert!(route.admits(Direction::Undo, CONFIG_VIEW));
        let lex = crate::lexicon::LexRegistry::new();
        let tokens = crate::tokenizer::tokenize("route 10.0.0.0");
        let status = crate::matcher::match_tokens(
            route.arena(),
            &lex,
            route.root(),
            &tokens,
            CONFIG_VIEW,
            Direction::Undo,
        );
        assert!(status.outcome.is_ok(), "{:?}", status.outcome);
        assert_eq!(status.bindings[0].value, "10.0.0.0");
    }

    #[test]
    fn set_completion_helper_installs_on_every_node_sharing_the_arg_label() {
        let mut reg = CommandRegistry::new();
        reg.create_command("ping", symbols_for("ping"));
        reg.get_mut("ping").unwrap().add_syntax("ping HOST", BASIC_VIEW, &[Direction::Do]).unwrap();

        let helper: ArgHelper = Arc::new(|partial: &str, _limit: usize| vec![format!("{partial}x")]);
        let touched = reg.get_mut("ping").unwrap().set_completion_helper("HOST", helper);
        assert_eq!(touched, 1, "HOST has no explicit arg_label, so its node falls back to its own name");

        let miss = reg
            .get_mut("ping")
            .unwrap()
            .set_completion_helper("NO_SUCH_LABEL", Arc::new(|_: &str, _: usize| Vec::new()));
        assert_eq!(miss, 0);
    }
}
