//! Incremental matcher: walks a compiled [`crate::syntax::SyntaxArena`]
//! against tokenized input with partial-prefix matching, option/alt
//! backtracking, and completion/help side outputs.
//!
//! Grounded on spec §4.F and `original_source/src/ocli_core.c`'s
//! `check_cmd_syntax` / `get_next_node` / `get_node_next_matches` /
//! `get_node_next_help`. The five-value error taxonomy (`MatchOutcome`) is
//! a plain data value returned by the parse, never a Rust `Error` — a
//! failed parse is an expected, common outcome, not exceptional.

use crate::lexicon::LexRegistry;
use crate::syntax::{NodeId, NodeKind, SyntaxArena};
use crate::tokenizer::Token;
use crate::view::Direction;
use std::collections::HashSet;
use tracing::trace;

/// The five-value error taxonomy from spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Ok,
    NoMatch,
    Ambiguous,
    Incomplete,
    TooManyArgs,
}

impl MatchOutcome {
    pub fn is_ok(self) -> bool {
        matches!(self, MatchOutcome::Ok)
    }
}

/// An `(arg_label, token_value)` pair bound by a matched variable node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub arg_label: String,
    pub value: String,
}

/// The ephemeral record produced by one parse.
#[derive(Debug, Clone)]
pub struct ParseStatus {
    pub direction: Direction,
    pub outcome: MatchOutcome,
    pub last_token_index: usize,
    pub last_token_offset: usize,
    pub last_matched_node: Option<NodeId>,
    pub failing_token_index: Option<usize>,
    pub failing_token_offset: Option<usize>,
    pub bindings: Vec<Binding>,
}

impl ParseStatus {
    fn new(direction: Direction) -> Self {
        ParseStatus {
            direction,
            outcome: MatchOutcome::Ok,
            last_token_index: 0,
            last_token_offset: 0,
            last_matched_node: None,
            failing_token_index: None,
            failing_token_offset: None,
            bindings: Vec::new(),
        }
    }

    fn fail(mut self, outcome: MatchOutcome, token_index: usize, offset: usize) -> Self {
        self.outcome = outcome;
        self.failing_token_index = Some(token_index);
        self.failing_token_offset = Some(offset);
        self
    }
}

/// Scratch state for one in-flight parse: which `OptHead` branches have
/// already been consumed. Rebuilt fresh for every call; nothing survives
/// between parses (spec §5's single-in-flight-parse rule, realized without
/// a tree-wide lock).
#[derive(Default)]
pub struct MatchState {
    used: HashSet<NodeId>,
}

impl MatchState {
    pub fn new() -> Self {
        MatchState::default()
    }

    fn is_used(&self, id: NodeId) -> bool {
        self.used.contains(&id)
    }

    fn mark_used(&mut self, id: NodeId) {
        self.used.insert(id);
    }
}

/// Expand pseudo nodes (`OptHead`, `OptEnd`) transitively into the real
/// nodes they lead to. `OptHead` expands into both its body (enter) and its
/// `end`'s continuation (skip entirely, since the group is optional);
/// `OptEnd` expands into its own continuation only.
fn flatten(arena: &SyntaxArena, ids: &[NodeId], out: &mut Vec<NodeId>, guard: &mut HashSet<NodeId>) {
    for &id in ids {
        if !guard.insert(id) {
            continue;
        }
        let node = arena.get(id);
        match &node.kind {
            NodeKind::OptHead { end, .. } => {
                flatten(arena, &node.branches, out, guard);
                if let Some(end_id) = end {
                    flatten(arena, std::slice::from_ref(end_id), out, guard);
                }
            }
            NodeKind::OptEnd { .. } => {
                flatten(arena, &node.branches, out, guard);
            }
            _ => out.push(id),
        }
    }
}

fn flatten_all(arena: &SyntaxArena, ids: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut guard = HashSet::new();
    flatten(arena, ids, &mut out, &mut guard);
    out.sort_by_key(|id| id.0);
    out.dedup();
    out
}

/// Candidate next-nodes reachable from `n`, per spec §4.F's "reachability"
/// definition: `n`'s own (flattened) branches, plus — when `n` lies inside
/// an open option group — the option's other not-yet-used elements and the
/// nodes that follow the option's close.
///
/// ALT members each keep their own independent branch list (the compiler
/// grows a full subtree per alternative rather than sharing one through the
/// eldest), so no redirection is needed here: `alt_order`/`alt_head_backref`
/// are bookkeeping for the compiler, not for traversal.
pub fn reachable_from(arena: &SyntaxArena, state: &MatchState, n: NodeId) -> Vec<NodeId> {
    let node = arena.get(n);
    let mut set = flatten_all(arena, &node.branches);

    // Only a chain's own terminal node (nothing else grown past it) is a
    // decision point for "continue within the option or leave it" — an
    // interior node of a multi-token sequential element (e.g. `COUNT` still
    // has `-c` behind it, not ahead) always has real branches of its own and
    // must not offer the early-exit shortcut past its own continuation.
    if node.branches.is_empty() {
        if let Some(head_id) = node.opt_head_backref {
            let head = arena.get(head_id);
            let unused: Vec<NodeId> =
                head.branches.iter().copied().filter(|&b| !state.is_used(b)).collect();
            set.extend(flatten_all(arena, &unused));
            if let NodeKind::OptHead { end: Some(end_id), .. } = &head.kind {
                set.extend(flatten_all(arena, std::slice::from_ref(end_id)));
            }
        }
    }

    set.sort_by_key(|id| id.0);
    set.dedup();
    set
}

fn reachable_leaf(arena: &SyntaxArena, state: &MatchState, n: NodeId) -> bool {
    reachable_from(arena, state, n).iter().any(|&c| arena.get(c).kind.is_leaf())
}

/// A keyword's full literal equality is its own category: it always wins
/// outright, the same way a registry lookup short-circuits on an exact
/// command name. A keyword prefix and a variable classification are both
/// merely "viable" — if more than one candidate is viable for the same
/// token, that's genuine ambiguity, not something the Keyword/Var type
/// difference should let one silently win.
enum Verdict {
    NoMatch,
    Viable,
    KeywordExact,
}

fn test_candidate(arena: &SyntaxArena, lex: &LexRegistry, candidate: NodeId, token: &str) -> Verdict {
    match &arena.get(candidate).kind {
        NodeKind::Keyword(lit) => {
            if lit == token {
                Verdict::KeywordExact
            } else if lit.starts_with(token) {
                Verdict::Viable
            } else {
                Verdict::NoMatch
            }
        }
        NodeKind::Var { lex_type, range } => {
            if lex.classify(*lex_type, token, *range) {
                Verdict::Viable
            } else {
                Verdict::NoMatch
            }
        }
        _ => Verdict::NoMatch,
    }
}

/// Walk `tokens[1..]` (the first token having already resolved to `root`)
/// against `arena` starting at `root`, under `view`/`direction`.
pub fn match_tokens(
    arena: &SyntaxArena,
    lex: &LexRegistry,
    root: NodeId,
    tokens: &[Token],
    view: u32,
    direction: Direction,
) -> ParseStatus {
    let mut status = ParseStatus::new(direction);
    let mut state = MatchState::new();
    let mut current = root;

    if let Some(label) = arena.get(root).arg_label.clone() {
        status.bindings.push(Binding { arg_label: label, value: tokens[0].text.clone() });
    }
    status.last_matched_node = Some(root);
    status.last_token_index = 0;
    status.last_token_offset = tokens[0].offset;

    for (idx, tok) in tokens.iter().enumerate().skip(1) {
        let candidates: Vec<NodeId> = reachable_from(arena, &state, current)
            .into_iter()
            .filter(|&c| arena.get(c).views.admits(direction, view))
            .collect();
        trace!(token = %tok.text, candidate_count = candidates.len(), "resolving next token against candidates");

        let mut keyword_exact: Option<NodeId> = None;
        let mut viable: Vec<NodeId> = Vec::new();
        for &c in &candidates {
            match test_candidate(arena, lex, c, &tok.text) {
                Verdict::KeywordExact => keyword_exact = Some(c),
                Verdict::Viable => viable.push(c),
                Verdict::NoMatch => {}
            }
        }

        let chosen = if let Some(c) = keyword_exact {
            Some(c)
        } else if viable.len() == 1 {
            Some(viable[0])
        } else if viable.len() >= 2 {
            return status.fail(MatchOutcome::Ambiguous, idx, tok.offset);
        } else {
            None
        };

        let chosen = match chosen {
            Some(c) => c,
            None => {
                // A leaf among this position's candidates means the command
                // was already complete; an unrecognized extra token here is
                // surplus input, not a malformed one.
                let leaf_reachable_here = candidates.iter().any(|&c| arena.get(c).kind.is_leaf());
                let outcome =
                    if leaf_reachable_here { MatchOutcome::TooManyArgs } else { MatchOutcome::NoMatch };
                return status.fail(outcome, idx, tok.offset);
            }
        };

        state.mark_used(chosen);

        let value = match &arena.get(chosen).kind {
            NodeKind::Keyword(lit) => lit.clone(),
            NodeKind::Var { .. } => tok.text.clone(),
            _ => tok.text.clone(),
        };
        if let Some(label) = arena.get(chosen).arg_label.clone() {
            status.bindings.push(Binding { arg_label: label, value });
        }

        current = chosen;
        status.last_matched_node = Some(current);
        status.last_token_index = idx;
        status.last_token_offset = tok.offset;
    }

    if !reachable_leaf(arena, &state, current) && !arena.get(current).kind.is_leaf() {
        trace!("match incomplete, no reachable leaf from final position");
        return status.fail(MatchOutcome::Incomplete, tokens.len(), 0);
    }

    status.outcome = MatchOutcome::Ok;
    trace!(bindings = status.bindings.len(), "match resolved ok");
    status
}

/// Cap on how many suggestions an application-supplied [`crate::syntax::ArgHelper`]
/// is asked to produce for one completion request.
pub const ARG_HELPER_SUGGESTION_LIMIT: usize = 50;

/// One suggestion produced by [`complete_from`]: the text to insert, and
/// whether it's a "continue typing" marker (`^prefix`) rather than an
/// immediately-accepted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub continuation: bool,
}

/// The completion set for a partial `text` at the current tree position.
pub fn complete_from(
    arena: &SyntaxArena,
    lex: &LexRegistry,
    state: &MatchState,
    current: NodeId,
    text: &str,
    view: u32,
    direction: Direction,
) -> Vec<Suggestion> {
    let candidates: Vec<NodeId> = reachable_from(arena, state, current)
        .into_iter()
        .filter(|&c| arena.get(c).views.admits(direction, view))
        .collect();

    let mut out = Vec::new();
    for c in candidates {
        let node = arena.get(c);
        match &node.kind {
            NodeKind::Keyword(lit) => {
                if lit.starts_with(text) {
                    out.push(Suggestion { text: lit.clone(), continuation: false });
                }
            }
            NodeKind::Var { lex_type, .. } => {
                if let Some(helper) = &node.arg_helper {
                    out.extend(
                        helper(text, ARG_HELPER_SUGGESTION_LIMIT)
                            .into_iter()
                            .map(|text| Suggestion { text, continuation: false }),
                    );
                    continue;
                }
                if let Some(entry) = lex.get(*lex_type) {
                    if let Some(prefix) = &entry.prefix {
                        if prefix.starts_with(text) {
                            out.push(Suggestion { text: format!("^{}", prefix), continuation: true });
                            continue;
                        }
                    }
                    if entry.classify(text) {
                        out.push(Suggestion { text: text.to_string(), continuation: false });
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// One rendered help line: `  <token>   - <help_text>`, or the special
/// end-of-command line for a reachable leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpLine {
    pub token: String,
    pub help: String,
}

pub fn help_from(
    arena: &SyntaxArena,
    state: &MatchState,
    current: NodeId,
    view: u32,
    direction: Direction,
) -> Vec<HelpLine> {
    let candidates: Vec<NodeId> = reachable_from(arena, state, current)
        .into_iter()
        .filter(|&c| arena.get(c).views.admits(direction, view))
        .collect();

    let mut out = Vec::new();
    for c in candidates {
        let node = arena.get(c);
        if node.kind.is_leaf() {
            out.push(HelpLine { token: "<Enter>".to_string(), help: "End of command".to_string() });
            continue;
        }
        let token = match &node.kind {
            NodeKind::Keyword(lit) => lit.clone(),
            NodeKind::Var { .. } => node.arg_label.clone().unwrap_or_default(),
            _ => continue,
        };
        let help = node.help_text.clone().unwrap_or_default();
        out.push(HelpLine { token, help });
    }
    out
}
