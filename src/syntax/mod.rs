//! The syntax tree: an arena of match nodes plus the compiler that grows it
//! from pattern strings.

pub mod compiler;
pub mod node;

pub use compiler::{add_syntax, format_manual_line, sprout_cmd_syntax};
pub use node::{ArgHelper, Node, NodeId, NodeKind, SyntaxArena};
