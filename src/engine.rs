//! Engine: the value type that owns a running grammar — lexicon, command
//! registry, and configuration — and exposes the external interface setup
//! code and REPL hosts drive it through.
//!
//! Grounded on spec §5/§6's concurrency model: setup operations
//! (`create_command`, `add_syntax`, ...) take `&mut Engine`, while the
//! runtime parsing operations (`parse_and_execute`, `complete`, `help`) take
//! `&Engine` and build a fresh [`crate::matcher::MatchState`] per call, so no
//! lock is needed for the read side — mirroring the teacher's preference for
//! ownership-based soundness over a mutex wrapped around shared state.

use crate::context::AppContext;
use crate::error::{EngineError, Result};
use crate::lexicon::LexRegistry;
use crate::matcher::{self, HelpLine, MatchOutcome, MatchState, Suggestion};
use crate::registry::{CommandCallback, CommandRegistry, CommandTree};
use crate::repl::{LineSource, ReplDriver, ReplOutcome};
use crate::symbol::{Symbol, SymbolTable};
use crate::syntax::ArgHelper;
use crate::tokenizer::{tokenize, Token};
use crate::view::{Direction, ALL_VIEW_MASK, BASIC_VIEW, DEFAULT_UNDO_VIEW_MASK, EXT_ENABLE_VIEW};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Engine-wide knobs, separate from any one command's own configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Keyword that introduces the synthesized negation command (`"no"` in
    /// the original, configurable since embedders rename it).
    pub undo_cmd: String,
    /// Keyword that introduces the built-in manual/help command.
    pub manual_cmd: String,
    pub idle_timeout_secs: u64,
    pub default_view: u32,
    /// Convenience default a host can pass to `add_syntax`/
    /// `add_syntax_and_manual` as the view mask for a pattern's
    /// `Direction::Undo` registration — not applied automatically.
    pub undo_view_mask: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            undo_cmd: "no".to_string(),
            manual_cmd: "man".to_string(),
            idle_timeout_secs: 300,
            default_view: BASIC_VIEW,
            undo_view_mask: DEFAULT_UNDO_VIEW_MASK,
        }
    }
}

/// A running grammar: lexicon, every registered command, and engine-wide
/// configuration, plus the REPL driver's own view/prompt state.
pub struct Engine {
    lex: LexRegistry,
    registry: CommandRegistry,
    config: EngineConfig,
    repl: ReplDriver,
    context: AppContext,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let repl = ReplDriver::new(config.default_view, config.idle_timeout_secs);
        Engine {
            lex: LexRegistry::new(),
            registry: CommandRegistry::new(),
            config,
            repl,
            context: AppContext::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &LexRegistry {
        &self.lex
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// The type-erased application state bag threaded into every command
    /// callback. Insert values into it during setup (`ctx.insert(...)`);
    /// `AppContext`'s own methods take `&self`, so this accessor needs no
    /// `&mut`.
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    // --- setup: lexicon -----------------------------------------------

    pub fn register_custom_lex(
        &mut self,
        id: crate::lexicon::LexKindId,
        name: impl Into<String>,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        help: impl Into<String>,
        prefix: Option<String>,
    ) -> Result<()> {
        self.lex.register_custom(id, name, predicate, help, prefix)
    }

    // --- setup: commands -------------------------------------------------

    pub fn create_command(&mut self, name: impl Into<String>, symbols: SymbolTable) -> &mut CommandTree {
        self.registry.create_command(name, symbols)
    }

    pub fn add_syntax(
        &mut self,
        command: &str,
        pattern: &str,
        view_mask: u32,
        directions: &[Direction],
    ) -> Result<()> {
        let tree = self.registry.require_mut(command)?;
        tree.add_syntax(pattern, view_mask, directions)
            .map_err(|source| EngineError::Compile { command: command.to_string(), source })
    }

    pub fn add_syntax_and_manual(
        &mut self,
        command: &str,
        pattern: &str,
        view_mask: u32,
        directions: &[Direction],
    ) -> Result<()> {
        let tree = self.registry.require_mut(command)?;
        tree.add_syntax_and_manual(pattern, view_mask, directions)
            .map_err(|source| EngineError::Compile { command: command.to_string(), source })
    }

    pub fn graft_syntax(
        &mut self,
        command: &str,
        pattern_tail: &str,
        view_mask: u32,
        direction: Direction,
    ) -> Result<()> {
        let tree = self.registry.require_mut(command)?;
        tree.graft_syntax(pattern_tail, view_mask, direction)
            .map_err(|source| EngineError::Compile { command: command.to_string(), source })
    }

    pub fn add_symbol(&mut self, command: &str, symbol: Symbol) -> Result<()> {
        let tree = self.registry.require_mut(command)?;
        tree.declare_symbol(symbol);
        Ok(())
    }

    pub fn set_callback(&mut self, command: &str, callback: CommandCallback) -> Result<()> {
        let tree = self.registry.require_mut(command)?;
        tree.set_callback(callback);
        Ok(())
    }

    /// Install a dynamic completion helper on `command`'s `arg_label` node.
    /// Since a pattern registered under both `Direction::Do` and
    /// `Direction::Undo` shares one node, installing once covers both.
    pub fn set_completion_helper(&mut self, command: &str, arg_label: &str, helper: ArgHelper) -> Result<()> {
        let tree = self.registry.require_mut(command)?;
        tree.set_completion_helper(arg_label, helper);
        Ok(())
    }

    // --- runtime: parse/execute ------------------------------------------

    /// Tokenize `line` and resolve it against the registry under `view`,
    /// deriving direction from the input itself: the first token is checked
    /// against the configured undo keyword (e.g. `"no"`), and only if it
    /// doesn't match is the line resolved as a `Direction::Do` command. A
    /// recognized undo keyword switches to `Direction::Undo` and resolves
    /// the *rest* of the line — command name plus its own arguments —
    /// against that command's own tree, the same tree its `Do` form lives
    /// in. On a successful match, the command's callback is invoked with
    /// the bound arguments and the engine's [`AppContext`].
    pub fn parse_and_execute(&self, line: &str, view: u32) -> Result<MatchOutcome> {
        trace!(line, view, "parsing line");
        let tokens = tokenize(line);
        let Some(first) = tokens.first() else {
            return Ok(MatchOutcome::NoMatch);
        };

        if self.is_undo_keyword(&first.text) {
            let Some(target) = tokens.get(1) else {
                return Ok(MatchOutcome::Incomplete);
            };
            let candidates = self.registry.lookup_prefix(&target.text, Direction::Undo, view);
            let tree = match candidates.as_slice() {
                [] => return Ok(MatchOutcome::NoMatch),
                [one] => *one,
                _ => {
                    warn!(prefix = %target.text, "ambiguous command prefix under undo");
                    return Ok(MatchOutcome::Ambiguous);
                }
            };
            return self.dispatch(tree, &tokens[1..], view, Direction::Undo);
        }

        let candidates = self.registry.lookup_prefix(&first.text, Direction::Do, view);
        let tree = match candidates.as_slice() {
            [] => return Ok(MatchOutcome::NoMatch),
            [one] => *one,
            _ => {
                warn!(prefix = %first.text, "ambiguous command prefix");
                return Ok(MatchOutcome::Ambiguous);
            }
        };
        self.dispatch(tree, &tokens, view, Direction::Do)
    }

    /// Whether `prefix` (the first token of an input line) names the
    /// configured undo keyword, exactly or by unambiguous prefix — mirrors
    /// the prefix matching every other command name gets via
    /// `CommandRegistry::lookup_prefix`.
    fn is_undo_keyword(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.config.undo_cmd.starts_with(prefix)
    }

    fn dispatch(&self, tree: &CommandTree, tokens: &[Token], view: u32, direction: Direction) -> Result<MatchOutcome> {
        let status = matcher::match_tokens(tree.arena(), &self.lex, tree.root(), tokens, view, direction);
        if status.outcome.is_ok() {
            if let Some(callback) = tree.callback() {
                callback(&status.bindings, &self.context)?;
            }
        } else {
            debug!(command = tree.name(), outcome = ?status.outcome, "parse did not resolve to a dispatch");
        }
        Ok(status.outcome)
    }

    /// Completion candidates for `line` truncated at `cursor` bytes. Derives
    /// direction the same way [`Self::parse_and_execute`] does.
    pub fn complete(&self, line: &str, cursor: usize, view: u32) -> Vec<Suggestion> {
        let truncated = &line[..cursor.min(line.len())];
        let tokens = tokenize(truncated);
        let Some(first) = tokens.first() else {
            return self.top_level_suggestions(view, "");
        };

        if tokens.len() == 1 && !truncated.ends_with(' ') {
            return self.top_level_suggestions(view, &first.text);
        }

        if self.is_undo_keyword(&first.text) {
            return self.complete_within(&tokens[1..], truncated.ends_with(' '), Direction::Undo, view);
        }
        self.complete_within(&tokens, truncated.ends_with(' '), Direction::Do, view)
    }

    /// Top-level suggestions for an as-yet-uncommitted first word: every
    /// `Do`-admitted command name starting with `prefix`, plus the undo
    /// keyword itself when it also starts with `prefix` — `no` occupies the
    /// same top-level slot a command name does.
    fn top_level_suggestions(&self, view: u32, prefix: &str) -> Vec<Suggestion> {
        let mut out: Vec<Suggestion> = self
            .registry
            .iter()
            .filter(|(name, t)| name.starts_with(prefix) && t.admits(Direction::Do, view))
            .map(|(name, _)| Suggestion { text: name.to_string(), continuation: false })
            .collect();
        if self.config.undo_cmd.starts_with(prefix) {
            out.push(Suggestion { text: self.config.undo_cmd.clone(), continuation: false });
        }
        out
    }

    /// Completion within a single command's tree, `tokens` already stripped
    /// of any undo keyword. An empty `tokens` under `Direction::Undo` is the
    /// "just typed `no `" case: list every command name reachable in that
    /// direction, per spec's special-cased undo completion rule.
    fn complete_within(&self, tokens: &[Token], ends_with_space: bool, direction: Direction, view: u32) -> Vec<Suggestion> {
        let Some(first) = tokens.first() else {
            return self
                .registry
                .iter()
                .filter(|(_, t)| t.admits(direction, view))
                .map(|(name, _)| Suggestion { text: name.to_string(), continuation: false })
                .collect();
        };

        if tokens.len() == 1 && !ends_with_space {
            return self
                .registry
                .iter()
                .filter(|(name, t)| name.starts_with(&first.text) && t.admits(direction, view))
                .map(|(name, _)| Suggestion { text: name.to_string(), continuation: false })
                .collect();
        }

        let candidates = self.registry.lookup_prefix(&first.text, direction, view);
        let Some(tree) = candidates.first() else {
            return self
                .registry
                .iter()
                .filter(|(name, t)| name.starts_with(&first.text) && t.admits(direction, view))
                .map(|(name, _)| Suggestion { text: name.to_string(), continuation: false })
                .collect();
        };

        let (committed, partial) = split_trailing_partial(tokens, ends_with_space);
        let state = MatchState::new();
        let current = if committed.len() <= 1 {
            tree.root()
        } else {
            let status = matcher::match_tokens(tree.arena(), &self.lex, tree.root(), &committed, view, direction);
            status.last_matched_node.unwrap_or_else(|| tree.root())
        };
        matcher::complete_from(tree.arena(), &self.lex, &state, current, partial, view, direction)
    }

    /// Rendered help lines for `line` truncated at `cursor` bytes. Derives
    /// direction the same way [`Self::parse_and_execute`] does.
    pub fn help(&self, line: &str, cursor: usize, view: u32) -> Vec<HelpLine> {
        let truncated = &line[..cursor.min(line.len())];
        let tokens = tokenize(truncated);
        let Some(first) = tokens.first() else {
            return self.top_level_help(view);
        };

        if self.is_undo_keyword(&first.text) {
            return self.help_within(&tokens[1..], truncated.ends_with(' '), Direction::Undo, view);
        }
        self.help_within(&tokens, truncated.ends_with(' '), Direction::Do, view)
    }

    fn top_level_help(&self, view: u32) -> Vec<HelpLine> {
        let mut out: Vec<HelpLine> = self
            .registry
            .iter()
            .filter(|(_, t)| t.admits(Direction::Do, view))
            .map(|(name, _)| HelpLine { token: name.to_string(), help: String::new() })
            .collect();
        out.push(HelpLine { token: self.config.undo_cmd.clone(), help: String::new() });
        out
    }

    fn help_within(&self, tokens: &[Token], ends_with_space: bool, direction: Direction, view: u32) -> Vec<HelpLine> {
        let Some(first) = tokens.first() else {
            return self
                .registry
                .iter()
                .filter(|(_, t)| t.admits(direction, view))
                .map(|(name, _)| HelpLine { token: name.to_string(), help: String::new() })
                .collect();
        };

        let candidates = self.registry.lookup_prefix(&first.text, direction, view);
        let Some(tree) = candidates.first() else { return Vec::new() };

        let (committed, _) = split_trailing_partial(tokens, ends_with_space);
        let state = MatchState::new();
        let current = if committed.len() <= 1 {
            tree.root()
        } else {
            let status = matcher::match_tokens(tree.arena(), &self.lex, tree.root(), &committed, view, direction);
            status.last_matched_node.unwrap_or_else(|| tree.root())
        };
        matcher::help_from(tree.arena(), &state, current, view, direction)
    }

    /// The recorded manual lines for `command`, joined with newlines.
    pub fn manual(&self, command: &str) -> Result<String> {
        let tree = self.registry.require(command)?;
        Ok(tree.manual_lines().join("\n"))
    }

    // --- REPL -------------------------------------------------------------

    pub fn view(&self) -> u32 {
        self.repl.view()
    }

    pub fn set_view(&mut self, view: u32) {
        self.repl.set_view(view);
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.repl.set_prompt(prompt);
    }

    pub fn set_idle_timeout(&mut self, secs: u64) {
        self.repl.set_idle_timeout(secs);
    }

    pub fn set_eof_command(&mut self, command: Option<String>) {
        self.repl.set_eof_command(command);
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.repl.set_echo(echo);
    }

    /// One REPL turn: wait up to the configured idle timeout for a line from
    /// `rx`, dispatch it if one arrives, or report idle/EOF.
    fn step<S: LineSource>(&self, source: &mut S, rx: &mpsc::Receiver<()>) -> ReplOutcome {
        let timeout = Duration::from_secs(self.repl.idle_timeout_secs().max(1));
        match rx.recv_timeout(timeout) {
            Ok(()) => match source.next_line() {
                Some(line) => {
                    let outcome =
                        self.parse_and_execute(&line, self.repl.view()).unwrap_or(MatchOutcome::NoMatch);
                    ReplOutcome::Dispatched(outcome)
                }
                None => ReplOutcome::Eof,
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {
                debug!(timeout_secs = self.repl.idle_timeout_secs(), "repl idle timeout elapsed");
                ReplOutcome::Idle
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => ReplOutcome::Eof,
        }
    }

    /// Drive `source` until EOF or the host-supplied `should_stop` returns
    /// true, dispatching each line and yielding every turn's outcome through
    /// `on_outcome`. The polling `notify` channel lets a host signal "a line
    /// is ready" from another thread without this loop blocking forever on a
    /// dead input source; a host reading synchronously can simply send a
    /// notification immediately before each call.
    pub fn run_repl<S: LineSource>(
        &self,
        source: &mut S,
        notify: &mpsc::Receiver<()>,
        mut on_outcome: impl FnMut(&ReplOutcome),
    ) {
        loop {
            let outcome = self.step(source, notify);
            on_outcome(&outcome);
            if matches!(outcome, ReplOutcome::Eof) {
                break;
            }
        }
    }
}

/// Split a tokenized, possibly-partial line into the tokens already fully
/// typed (including the root keyword) and the trailing partial word still
/// being completed. When the line ends in whitespace there is no partial
/// word: every token is committed and completion starts fresh.
fn split_trailing_partial(tokens: &[crate::tokenizer::Token], ends_with_space: bool) -> (Vec<crate::tokenizer::Token>, &str) {
    if ends_with_space || tokens.is_empty() {
        (tokens.to_vec(), "")
    } else {
        let partial = tokens.last().map(|t| t.text.as_str()).unwrap_or("");
        (tokens[..tokens.len() - 1].to_vec(), partial)
    }
}

/// Masks that are reasonable defaults for a three-tier CLI (basic / enable /
/// config), kept here since several worked examples in tests reference them.
pub const DEFAULT_VIEW_MASK: u32 = ALL_VIEW_MASK;
pub const DEFAULT_PRIVILEGED_MASK: u32 = EXT_ENABLE_VIEW;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::kinds::BuiltinKind;
    use crate::view::ALL_VIEW_MASK;
    use std::sync::{Arc, Mutex};

    fn ping_symbols() -> SymbolTable {
        let mut t = SymbolTable::new();
        t.declare(Symbol::keyword("ping"));
        t.declare(Symbol::variable("HOST", BuiltinKind::HostName.id()).with_arg_label("DST_HOST"));
        t
    }

    #[test]
    fn parse_and_execute_invokes_callback_with_bindings() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.create_command("ping", ping_symbols());
        engine.add_syntax("ping", "ping HOST", ALL_VIEW_MASK, &[Direction::Do]).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        engine
            .set_callback(
                "ping",
                Arc::new(move |bindings, _ctx| {
                    seen2.lock().unwrap().extend_from_slice(bindings);
                    Ok(())
                }),
            )
            .unwrap();

        let outcome = engine.parse_and_execute("ping example.com", ALL_VIEW_MASK).unwrap();
        assert!(outcome.is_ok());
        let bound = seen.lock().unwrap();
        assert_eq!(bound[0].value, "example.com");
    }

    #[test]
    fn unknown_command_is_no_match_not_an_error() {
        let engine = Engine::new(EngineConfig::default());
        let outcome = engine.parse_and_execute("bogus", ALL_VIEW_MASK).unwrap();
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[test]
    fn no_ping_dispatches_through_pings_own_tree_when_registered_for_undo() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.create_command("ping", ping_symbols());
        engine
            .add_syntax("ping", "ping HOST", ALL_VIEW_MASK, &[Direction::Do, Direction::Undo])
            .unwrap();

        let outcome = engine.parse_and_execute("no ping example.com", ALL_VIEW_MASK).unwrap();
        assert!(outcome.is_ok(), "{:?}", outcome);
    }

    #[test]
    fn no_ping_is_no_match_when_ping_was_never_registered_for_undo() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.create_command("ping", ping_symbols());
        engine.add_syntax("ping", "ping HOST", ALL_VIEW_MASK, &[Direction::Do]).unwrap();

        let outcome = engine.parse_and_execute("no ping example.com", ALL_VIEW_MASK).unwrap();
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[test]
    fn callback_receives_the_engines_app_context() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.create_command("ping", ping_symbols());
        engine.add_syntax("ping", "ping HOST", ALL_VIEW_MASK, &[Direction::Do]).unwrap();
        engine.context().insert(42_i32).unwrap();

        let seen = Arc::new(Mutex::new(None));
        let seen2 = seen.clone();
        engine
            .set_callback(
                "ping",
                Arc::new(move |_bindings, ctx| {
                    *seen2.lock().unwrap() = Some(ctx.get::<i32>()?);
                    Ok(())
                }),
            )
            .unwrap();

        engine.parse_and_execute("ping example.com", ALL_VIEW_MASK).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(42));
    }

    #[test]
    fn set_completion_helper_is_consulted_by_complete() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.create_command("ping", ping_symbols());
        engine.add_syntax("ping", "ping HOST", ALL_VIEW_MASK, &[Direction::Do]).unwrap();
        engine
            .set_completion_helper("ping", "DST_HOST", Arc::new(|partial, _limit| vec![format!("{partial}.lan")]))
            .unwrap();

        let suggestions = engine.complete("ping db", 7, ALL_VIEW_MASK);
        assert!(suggestions.iter().any(|s| s.text == "db.lan"));
    }

    #[test]
    fn top_level_completion_lists_registered_commands() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.create_command("ping", ping_symbols());
        engine.add_syntax("ping", "ping HOST", ALL_VIEW_MASK, &[Direction::Do]).unwrap();

        let suggestions = engine.complete("pi", 2, ALL_VIEW_MASK);
        assert!(suggestions.iter().any(|s| s.text == "ping"));
    }
}
