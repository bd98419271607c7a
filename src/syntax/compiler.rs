//! Compiles a whitespace-separated pattern string into the arena, merging
//! with whatever has already been grown for the same command tree.
//!
//! Grounded on spec's compilation algorithm (§4.D) and
//! `original_source/src/ocli_core.c`'s `add_cmd_syntax`: a single forward
//! pass over tokens maintaining a growth frontier, with `[`/`]`/`*` and
//! `{`/`|`/`}` opening and closing pseudo-node scaffolding. All nesting
//! state (`CompileState`) is local to one call and dropped at its end,
//! resolving the shared/stale-state hazard spec.md §9 calls out in
//! `track_syntax_char`.

use super::node::{
    ArgHelper, NodeId, NodeKind, SyntaxArena, MAX_ALT_SLOTS, MAX_BRANCHES, MAX_OPTION_SLOTS,
};
use crate::error::CompileError;
use crate::symbol::{Symbol, SymbolKind, SymbolTable};
use crate::view::Direction;
use std::collections::HashMap;
use tracing::{debug, warn};

/// What the next whitespace-separated token designates, resolved against a
/// [`SymbolTable`].
enum TokenKind<'a> {
    Keyword(&'a str),
    Var(&'a Symbol),
    OptOpen,
    OptAny,
    OptClose,
    AltOpen,
    AltPipe,
    AltClose,
}

fn classify_token<'a>(tok: &'a str, symbols: &'a SymbolTable) -> Result<TokenKind<'a>, CompileError> {
    match tok {
        "[" => return Ok(TokenKind::OptOpen),
        "*" => return Ok(TokenKind::OptAny),
        "]" => return Ok(TokenKind::OptClose),
        "{" => return Ok(TokenKind::AltOpen),
        "|" => return Ok(TokenKind::AltPipe),
        "}" => return Ok(TokenKind::AltClose),
        _ => {}
    }
    match symbols.lookup(tok) {
        Some(sym) => match &sym.kind {
            SymbolKind::Keyword => Ok(TokenKind::Keyword(&sym.name)),
            SymbolKind::Variable(..) => Ok(TokenKind::Var(sym)),
            SymbolKind::Reserved(_) => Err(CompileError::UnknownSymbol(tok.to_string())),
        },
        None => Err(CompileError::UnknownSymbol(tok.to_string())),
    }
}

/// An open option group: `frontier`/`body_tail` pair every live node with
/// the head it descends from, so `opt_head_backref` can be set exactly
/// without any structural guessing, no matter how deep the body chain runs.
struct OptionFrame {
    heads: Vec<NodeId>,
    any_order: bool,
    frontier: Vec<(NodeId, NodeId)>,
    body_tail: Vec<(NodeId, NodeId)>,
    saw_element: bool,
}

struct AltFrame {
    bases: Vec<NodeId>,
    eldest: HashMap<NodeId, NodeId>,
    next_order: HashMap<NodeId, u32>,
    members: Vec<NodeId>,
    expect_element: bool,
}

enum Group {
    Option(OptionFrame),
    Alt(AltFrame),
}

/// Per-`add_syntax`-call state. Constructed fresh every call; never
/// persisted, so a pattern that errors mid-group can never poison the next
/// pattern compiled against the same tree.
struct CompileState {
    group: Option<Group>,
}

impl CompileState {
    fn new() -> Self {
        CompileState { group: None }
    }

    fn ensure_clean_entry(&self) -> Result<(), CompileError> {
        if self.group.is_some() {
            return Err(CompileError::DirtyState);
        }
        Ok(())
    }
}

/// Grow (or reuse) one child of `base` matching `kind`/label, OR the view
/// mask for `direction` into it, and return its id.
fn grow_child(
    arena: &mut SyntaxArena,
    base: NodeId,
    new_kind: NodeKind,
    arg_label: Option<String>,
    help_text: Option<String>,
    arg_helper: Option<ArgHelper>,
    view_mask: u32,
    direction: Direction,
) -> Result<NodeId, CompileError> {
    let existing = arena
        .get(base)
        .branches
        .iter()
        .copied()
        .find(|&c| nodes_match(&arena.get(c).kind, &new_kind));

    let id = if let Some(id) = existing {
        id
    } else {
        if arena.get(base).branches.len() >= MAX_BRANCHES {
            return Err(CompileError::BranchOverflow { max: MAX_BRANCHES });
        }
        let depth = arena.get(base).depth + 1;
        let id = arena.push(new_kind, depth);
        if arg_label.is_some() {
            arena.get_mut(id).arg_label = arg_label;
        }
        if help_text.is_some() {
            arena.get_mut(id).help_text = help_text;
        }
        if arg_helper.is_some() {
            arena.get_mut(id).arg_helper = arg_helper;
        }
        arena.get_mut(base).branches.push(id);
        id
    };

    arena.get_mut(id).views.union_in(direction, view_mask);
    Ok(id)
}

fn nodes_match(a: &NodeKind, b: &NodeKind) -> bool {
    match (a, b) {
        (NodeKind::Keyword(x), NodeKind::Keyword(y)) => x == y,
        (NodeKind::Var { lex_type: lx, range: rx }, NodeKind::Var { lex_type: ly, range: ry }) => {
            lx == ly && rx == ry
        }
        (NodeKind::Leaf, NodeKind::Leaf) => true,
        // Pseudo nodes are never reused across groups; each `[`/`{` grows a
        // fresh head.
        _ => false,
    }
}

fn kind_for_symbol(sym: &Symbol) -> Result<NodeKind, CompileError> {
    match &sym.kind {
        SymbolKind::Keyword => Ok(NodeKind::Keyword(sym.name.clone())),
        SymbolKind::Variable(lex_type, range) => {
            Ok(NodeKind::Var { lex_type: *lex_type, range: *range })
        }
        SymbolKind::Reserved(_) => Err(CompileError::UnknownSymbol(sym.name.clone())),
    }
}

/// Grow one child of every base in `bases`, in order, without deduping —
/// callers that need positional correspondence with `bases` (option/alt
/// bookkeeping) rely on this; general top-level frontier merging dedups
/// separately.
fn grow_symbol_positional(
    arena: &mut SyntaxArena,
    bases: &[NodeId],
    sym: &Symbol,
    view_mask: u32,
    direction: Direction,
) -> Result<Vec<NodeId>, CompileError> {
    let mut out = Vec::with_capacity(bases.len());
    for &base in bases {
        let kind = kind_for_symbol(sym)?;
        let id = grow_child(
            arena,
            base,
            kind,
            sym.effective_arg_label().map(|s| s.to_string()),
            sym.help.clone(),
            None,
            view_mask,
            direction,
        )?;
        out.push(id);
    }
    Ok(out)
}

fn dedup_sorted(mut v: Vec<NodeId>) -> Vec<NodeId> {
    v.sort_by_key(|id| id.0);
    v.dedup();
    v
}

/// Compile `pattern` against `tree_root`, merging into whatever is already
/// grown, for each of `directions`. `pattern`'s first token must name the
/// tree's own root keyword.
pub fn add_syntax(
    arena: &mut SyntaxArena,
    tree_root: NodeId,
    symbols: &SymbolTable,
    pattern: &str,
    view_mask: u32,
    directions: &[Direction],
) -> Result<(), CompileError> {
    debug!(pattern, view_mask, ?directions, "compiling syntax pattern");
    for &direction in directions {
        if let Err(err) = add_syntax_one_direction(arena, tree_root, symbols, pattern, view_mask, direction) {
            warn!(pattern, ?direction, %err, "rejected syntax pattern, registry left unchanged for this call");
            return Err(err);
        }
    }
    Ok(())
}

fn add_syntax_one_direction(
    arena: &mut SyntaxArena,
    tree_root: NodeId,
    symbols: &SymbolTable,
    pattern: &str,
    view_mask: u32,
    direction: Direction,
) -> Result<(), CompileError> {
    let mut tokens = pattern.split_whitespace();

    let first = tokens.next().ok_or(CompileError::UnknownSymbol(String::new()))?;
    if arena.get(tree_root).kind.keyword_literal() != Some(first) {
        return Err(CompileError::UnknownSymbol(first.to_string()));
    }
    arena.get_mut(tree_root).views.union_in(direction, view_mask);

    let mut frontier = vec![tree_root];
    let mut state = CompileState::new();

    for tok in tokens {
        let kind = classify_token(tok, symbols)?;
        frontier = step(arena, &mut state, frontier, kind, view_mask, direction)?;
    }

    if state.group.is_some() {
        return Err(CompileError::DirtyState);
    }

    for base in frontier {
        grow_child(arena, base, NodeKind::Leaf, None, None, None, view_mask, direction)?;
    }

    Ok(())
}

fn step(
    arena: &mut SyntaxArena,
    state: &mut CompileState,
    frontier: Vec<NodeId>,
    tok: TokenKind<'_>,
    view_mask: u32,
    direction: Direction,
) -> Result<Vec<NodeId>, CompileError> {
    match tok {
        TokenKind::OptOpen => {
            state.ensure_clean_entry()?;
            let mut heads = Vec::with_capacity(frontier.len());
            for &base in &frontier {
                let id = grow_child(
                    arena,
                    base,
                    NodeKind::OptHead { any_order: false, end: None },
                    None,
                    None,
                    None,
                    view_mask,
                    direction,
                )?;
                heads.push(id);
            }
            let frontier_pairs: Vec<(NodeId, NodeId)> = heads.iter().map(|&h| (h, h)).collect();
            state.group = Some(Group::Option(OptionFrame {
                heads,
                any_order: false,
                frontier: frontier_pairs,
                body_tail: Vec::new(),
                saw_element: false,
            }));
            Ok(Vec::new())
        }
        TokenKind::OptAny => match &mut state.group {
            Some(Group::Option(opt)) if !opt.saw_element => {
                opt.any_order = true;
                for &h in &opt.heads {
                    if let NodeKind::OptHead { any_order, .. } = &mut arena.get_mut(h).kind {
                        *any_order = true;
                    }
                }
                Ok(Vec::new())
            }
            _ => Err(CompileError::StarOutsideOption),
        },
        TokenKind::OptClose => {
            let opt = match state.group.take() {
                Some(Group::Option(opt)) => opt,
                other => {
                    state.group = other;
                    return Err(CompileError::MisplacedPipe);
                }
            };
            if !opt.saw_element {
                return Err(CompileError::EmptyOption);
            }
            let tail = if opt.any_order { opt.body_tail } else { opt.frontier };

            let mut ends_by_head = HashMap::new();
            for &head in &opt.heads {
                let end_id = arena.push(NodeKind::OptEnd { head }, arena.get(head).depth + 1);
                arena.get_mut(end_id).opt_head_backref = Some(head);
                if let NodeKind::OptHead { end, .. } = &mut arena.get_mut(head).kind {
                    *end = Some(end_id);
                }
                ends_by_head.insert(head, end_id);
            }

            let post_frontier: Vec<NodeId> =
                tail.into_iter().filter_map(|(_, head)| ends_by_head.get(&head).copied()).collect();
            Ok(dedup_sorted(post_frontier))
        }
        TokenKind::AltOpen => {
            state.ensure_clean_entry()?;
            state.group = Some(Group::Alt(AltFrame {
                bases: frontier,
                eldest: HashMap::new(),
                next_order: HashMap::new(),
                members: Vec::new(),
                expect_element: true,
            }));
            Ok(Vec::new())
        }
        TokenKind::AltPipe => match &mut state.group {
            Some(Group::Alt(alt)) if !alt.expect_element => {
                alt.expect_element = true;
                Ok(Vec::new())
            }
            _ => Err(CompileError::MisplacedPipe),
        },
        TokenKind::AltClose => {
            let alt = match state.group.take() {
                Some(Group::Alt(alt)) => alt,
                other => {
                    state.group = other;
                    return Err(CompileError::MisplacedPipe);
                }
            };
            if alt.members.is_empty() {
                return Err(CompileError::EmptyAlternation);
            }
            if alt.expect_element {
                return Err(CompileError::MissingPipe);
            }
            Ok(alt.members)
        }
        TokenKind::Keyword(name) => grow_element(arena, state, &frontier, &Symbol::keyword(name), view_mask, direction),
        TokenKind::Var(sym) => {
            let sym = sym.clone();
            grow_element(arena, state, &frontier, &sym, view_mask, direction)
        }
    }
}

fn grow_element(
    arena: &mut SyntaxArena,
    state: &mut CompileState,
    frontier: &[NodeId],
    sym: &Symbol,
    view_mask: u32,
    direction: Direction,
) -> Result<Vec<NodeId>, CompileError> {
    match &mut state.group {
        None => {
            let created = grow_symbol_positional(arena, frontier, sym, view_mask, direction)?;
            Ok(dedup_sorted(created))
        }
        Some(Group::Option(opt)) => {
            if opt.body_tail.len() >= MAX_OPTION_SLOTS || opt.frontier.len() > MAX_OPTION_SLOTS {
                return Err(CompileError::OptionOverflow { max: MAX_OPTION_SLOTS });
            }
            if opt.any_order {
                let bases: Vec<NodeId> = opt.heads.clone();
                let created = grow_symbol_positional(arena, &bases, sym, view_mask, direction)?;
                for (&id, &head) in created.iter().zip(bases.iter()) {
                    arena.get_mut(id).opt_head_backref = Some(head);
                }
                opt.body_tail.extend(created.into_iter().zip(bases.into_iter()));
            } else {
                let bases: Vec<NodeId> = opt.frontier.iter().map(|p| p.0).collect();
                let heads: Vec<NodeId> = opt.frontier.iter().map(|p| p.1).collect();
                let created = grow_symbol_positional(arena, &bases, sym, view_mask, direction)?;
                for (&id, &head) in created.iter().zip(heads.iter()) {
                    arena.get_mut(id).opt_head_backref = Some(head);
                }
                opt.frontier = created.into_iter().zip(heads.into_iter()).collect();
            }
            opt.saw_element = true;
            Ok(Vec::new())
        }
        Some(Group::Alt(alt)) => {
            if !alt.expect_element {
                return Err(CompileError::MissingPipe);
            }
            if alt.members.len() >= MAX_ALT_SLOTS {
                return Err(CompileError::AltOverflow { max: MAX_ALT_SLOTS });
            }
            let bases = alt.bases.clone();
            let created = grow_symbol_positional(arena, &bases, sym, view_mask, direction)?;
            for (&id, &base) in created.iter().zip(bases.iter()) {
                let order = *alt.next_order.get(&base).unwrap_or(&1);
                arena.get_mut(id).alt_order = order;
                if order == 1 {
                    alt.eldest.insert(base, id);
                } else {
                    arena.get_mut(id).alt_head_backref = alt.eldest.get(&base).copied();
                }
                alt.next_order.insert(base, order + 1);
            }
            alt.members.extend(created);
            alt.expect_element = false;
            Ok(Vec::new())
        }
    }
}

/// Graft a new pattern tail under every leaf whose view mask admits
/// `view_mask` in `direction` — spec's `sprout_cmd_syntax` extension point.
pub fn sprout_cmd_syntax(
    arena: &mut SyntaxArena,
    tree_root: NodeId,
    symbols: &SymbolTable,
    pattern_tail: &str,
    view_mask: u32,
    direction: Direction,
) -> Result<(), CompileError> {
    debug!(pattern_tail, view_mask, ?direction, "grafting syntax onto existing leaves");
    let leaves = collect_admitting_leaves(arena, tree_root, view_mask, direction);
    let mut state = CompileState::new();
    let mut frontier = leaves;

    for tok in pattern_tail.split_whitespace() {
        let kind = match classify_token(tok, symbols) {
            Ok(kind) => kind,
            Err(err) => {
                warn!(pattern_tail, %err, "rejected grafted syntax pattern");
                return Err(err);
            }
        };
        frontier = match step(arena, &mut state, frontier, kind, view_mask, direction) {
            Ok(next) => next,
            Err(err) => {
                warn!(pattern_tail, %err, "rejected grafted syntax pattern");
                return Err(err);
            }
        };
    }
    if state.group.is_some() {
        warn!(pattern_tail, "rejected grafted syntax pattern: dirty compiler state");
        return Err(CompileError::DirtyState);
    }
    for base in frontier {
        grow_child(arena, base, NodeKind::Leaf, None, None, None, view_mask, direction)?;
    }
    Ok(())
}

fn collect_admitting_leaves(
    arena: &SyntaxArena,
    node: NodeId,
    view_mask: u32,
    direction: Direction,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    let mut seen = std::collections::HashSet::new();
    while let Some(n) = stack.pop() {
        if !seen.insert(n) {
            continue;
        }
        let data = arena.get(n);
        if data.kind.is_leaf() && data.views.admits(direction, view_mask) {
            out.push(n);
        }
        stack.extend(data.branches.iter().copied());
    }
    out
}

/// Format the manual line for a compiled pattern: collapse whitespace runs,
/// drop spaces just inside `[`/`{` and before `]`/`}`/around `|`, and
/// prepend the direction marker.
pub fn format_manual_line(pattern: &str, has_do: bool, has_undo: bool) -> String {
    let collapsed: Vec<&str> = pattern.split_whitespace().collect();
    let mut out = String::new();
    for (i, tok) in collapsed.iter().enumerate() {
        let is_close = matches!(*tok, "]" | "}" | "|");
        let prev_is_open = i > 0 && matches!(collapsed[i - 1], "[" | "{" | "|");
        if i > 0 && !is_close && !prev_is_open {
            out.push(' ');
        }
        out.push_str(tok);
    }
    match (has_do, has_undo) {
        (true, true) => format!("[UNDO] {}", out),
        (false, true) => format!("UNDO {}", out),
        _ => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::kinds::BuiltinKind;
    use crate::lexicon::NumericRange;
    use crate::view::ALL_VIEW_MASK;

    fn symbols_for_ping() -> SymbolTable {
        let mut t = SymbolTable::new();
        t.declare(Symbol::keyword("ping"));
        t.declare(Symbol::keyword("-c"));
        t.declare(Symbol::keyword("-s"));
        t.declare(Symbol::keyword("from"));
        t.declare(
            Symbol::variable("COUNT", BuiltinKind::Int.id())
                .with_range(NumericRange::new(1.0, 100.0)),
        );
        t.declare(Symbol::variable("HOST", BuiltinKind::HostName.id()));
        t.declare(Symbol::variable("HOST_IP", BuiltinKind::IpAddr.id()));
        t.declare(Symbol::variable("IFADDR", BuiltinKind::IpAddr.id()));
        t
    }

    #[test]
    fn plain_option_chain_threads_opt_head_backref_through_every_depth() {
        let symbols = symbols_for_ping();
        let mut arena = SyntaxArena::new();
        let root = arena.push(NodeKind::Keyword("ping".into()), 0);

        add_syntax(&mut arena, root, &symbols, "ping [ -c COUNT ]", ALL_VIEW_MASK, &[Direction::Do])
            .unwrap();

        assert_eq!(arena.get(root).branches.len(), 1);
        let head = arena.get(root).branches[0];
        assert!(arena.get(head).kind.is_opt_head());

        let dash_c = arena.get(head).branches[0];
        assert_eq!(arena.get(dash_c).opt_head_backref, Some(head));

        let count = arena.get(dash_c).branches[0];
        assert_eq!(arena.get(count).opt_head_backref, Some(head), "depth-2 node must still carry the head backref");

        let end = arena.get(count).branches[0];
        assert!(arena.get(end).kind.is_opt_end());
        if let NodeKind::OptHead { end: head_end, .. } = &arena.get(head).kind {
            assert_eq!(*head_end, Some(end));
        } else {
            panic!("expected OptHead");
        }
    }

    #[test]
    fn wildcard_option_each_element_points_directly_at_head() {
        let mut symbols = SymbolTable::new();
        symbols.declare(Symbol::keyword("cmd"));
        symbols.declare(Symbol::keyword("a"));
        symbols.declare(Symbol::keyword("b"));
        symbols.declare(Symbol::keyword("c"));

        let mut arena = SyntaxArena::new();
        let root = arena.push(NodeKind::Keyword("cmd".into()), 0);
        add_syntax(&mut arena, root, &symbols, "cmd [ * a b c ]", ALL_VIEW_MASK, &[Direction::Do])
            .unwrap();

        let head = arena.get(root).branches[0];
        assert_eq!(arena.get(head).branches.len(), 3);
        for &child in &arena.get(head).branches.clone() {
            assert_eq!(arena.get(child).opt_head_backref, Some(head));
        }
    }

    #[test]
    fn alt_group_wires_eldest_and_younger_siblings() {
        let mut symbols = SymbolTable::new();
        symbols.declare(Symbol::keyword("show"));
        symbols.declare(Symbol::keyword("arp"));
        symbols.declare(Symbol::keyword("route"));

        let mut arena = SyntaxArena::new();
        let root = arena.push(NodeKind::Keyword("show".into()), 0);
        add_syntax(&mut arena, root, &symbols, "show { arp | route }", ALL_VIEW_MASK, &[Direction::Do])
            .unwrap();

        assert_eq!(arena.get(root).branches.len(), 2);
        let a = arena.get(root).branches[0];
        let b = arena.get(root).branches[1];
        assert_eq!(arena.get(a).alt_order, 1);
        assert_eq!(arena.get(b).alt_order, 2);
        assert_eq!(arena.get(b).alt_head_backref, Some(a));
    }

    #[test]
    fn empty_option_is_rejected() {
        let symbols = symbols_for_ping();
        let mut arena = SyntaxArena::new();
        let root = arena.push(NodeKind::Keyword("ping".into()), 0);
        let err = add_syntax(&mut arena, root, &symbols, "ping [ ]", ALL_VIEW_MASK, &[Direction::Do]);
        assert_eq!(err, Err(CompileError::EmptyOption));
    }

    #[test]
    fn star_outside_option_is_rejected() {
        let symbols = symbols_for_ping();
        let mut arena = SyntaxArena::new();
        let root = arena.push(NodeKind::Keyword("ping".into()), 0);
        let err = add_syntax(&mut arena, root, &symbols, "ping *", ALL_VIEW_MASK, &[Direction::Do]);
        assert_eq!(err, Err(CompileError::StarOutsideOption));
    }

    #[test]
    fn manual_line_formatting_collapses_and_marks_undo() {
        let line = format_manual_line("route  DST_NET   DST_MASK GW_ADDR", true, true);
        assert_eq!(line, "[UNDO] route DST_NET DST_MASK GW_ADDR");
    }

    #[test]
    fn manual_line_formatting_tightens_brackets_and_pipes() {
        let line = format_manual_line("show { arp | route }", true, false);
        assert_eq!(line, "show {arp|route}");
    }

    #[test]
    fn prefix_sharing_reuses_the_common_chain() {
        let mut symbols = SymbolTable::new();
        symbols.declare(Symbol::keyword("route"));
        symbols.declare(Symbol::variable("DST_NET", BuiltinKind::IpAddr.id()));
        symbols.declare(Symbol::variable("DST_MASK", BuiltinKind::IpMask.id()));
        symbols.declare(Symbol::variable("GW_ADDR", BuiltinKind::IpAddr.id()));

        let mut arena = SyntaxArena::new();
        let root = arena.push(NodeKind::Keyword("route".into()), 0);
        add_syntax(&mut arena, root, &symbols, "route DST_NET DST_MASK GW_ADDR", ALL_VIEW_MASK, &[Direction::Do])
            .unwrap();
        add_syntax(&mut arena, root, &symbols, "route DST_NET DST_MASK GW_ADDR", ALL_VIEW_MASK, &[Direction::Undo])
            .unwrap();

        assert_eq!(arena.get(root).branches.len(), 1, "both patterns must share the same chain");
    }
}
