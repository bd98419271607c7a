//! A hierarchical command-grammar engine for line-oriented CLIs in the
//! Cisco/Huawei style: typed lexical tokens, `[optional]`/`{alternate}`
//! syntax groups, per-view reachability, and a `no`/undo counterpart for
//! any command registered for it — dispatched through that command's own
//! tree rather than a separate one.
//!
//! # Overview
//!
//! An embedding application declares a vocabulary of [`symbol::Symbol`]s,
//! compiles one or more syntax patterns against it into a
//! [`registry::CommandTree`], and registers that tree with a
//! [`registry::CommandRegistry`]. An [`engine::Engine`] owns the registry
//! plus a [`lexicon::LexRegistry`] of typed value recognizers and drives
//! parsing, completion, help, and an interactive REPL loop against them.
//!
//! ```rust,ignore
//! use your_crate::engine::{Engine, EngineConfig};
//! use your_crate::symbol::{Symbol, SymbolTable};
//! use your_crate::lexicon::kinds::BuiltinKind;
//! use your_crate::view::{Direction, ALL_VIEW_MASK};
//!
//! let mut engine = Engine::new(EngineConfig::default());
//!
//! let mut symbols = SymbolTable::new();
//! symbols.declare(Symbol::keyword("ping"));
//! symbols.declare(Symbol::variable("HOST", BuiltinKind::HostName.id()));
//!
//! engine.create_command("ping", symbols);
//! engine.add_syntax("ping", "ping HOST", ALL_VIEW_MASK, &[Direction::Do, Direction::Undo])?;
//!
//! let outcome = engine.parse_and_execute("ping example.com", ALL_VIEW_MASK)?;
//! let undone = engine.parse_and_execute("no ping example.com", ALL_VIEW_MASK)?;
//! # Ok::<(), your_crate::error::EngineError>(())
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod format;
pub mod introspect;
pub mod lexicon;
pub mod matcher;
pub mod pager;
pub mod registry;
pub mod repl;
pub mod symbol;
pub mod syntax;
pub mod tokenizer;
pub mod view;

pub use engine::{Engine, EngineConfig};
pub use error::{CompileError, EngineError, Result};
pub use matcher::MatchOutcome;
pub use registry::{CommandRegistry, CommandTree};
pub use view::Direction;
