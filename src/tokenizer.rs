//! Line tokenizer.
//!
//! A direct port of `original_source/src/utils.c`'s `get_argv` quote state
//! machine (`in_space` / `in_quota` with states 0/1/2), with the same caps
//! (truncate silently rather than error) and per-token byte offsets for
//! cursor-relative error reporting in the matcher.

pub const MAX_WORD_LEN: usize = 32;
pub const MAX_TEXT_LEN: usize = 128;
pub const MAX_LINE_LEN: usize = 512;
pub const MAX_ARG_NUM: usize = 50;

/// One token and the byte offset of its first character in the source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub offset: usize,
}

#[derive(PartialEq, Eq)]
enum Quota {
    None,
    Open,
    JustClosed,
}

/// Split `line` into tokens honoring `"..."` quoted runs. Oversized
/// tokens/lines/arg counts are truncated silently, matching the original.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    if line.is_empty() {
        return tokens;
    }

    let mut tok = String::new();
    let mut tok_offset = 0usize;
    let mut in_space = true;
    let mut in_quota = Quota::None;

    for (byte_pos, ch) in line.char_indices() {
        if byte_pos >= MAX_LINE_LEN || tokens.len() >= MAX_ARG_NUM {
            break;
        }

        match in_quota {
            Quota::Open => {
                if ch != '"' {
                    if tok.is_empty() {
                        tok_offset = byte_pos;
                    }
                    if tok.len() < MAX_TEXT_LEN - 1 {
                        tok.push(ch);
                    }
                } else {
                    in_quota = Quota::JustClosed;
                }
            }
            Quota::JustClosed => {
                in_quota = Quota::None;
                if ch.is_whitespace() {
                    in_space = true;
                    tokens.push(Token { text: std::mem::take(&mut tok), offset: tok_offset });
                    tok_offset = 0;
                } else {
                    in_space = false;
                }
            }
            Quota::None if in_space => {
                if ch == '"' {
                    in_quota = Quota::Open;
                } else if !ch.is_whitespace() {
                    in_space = false;
                    if tok.is_empty() {
                        tok_offset = byte_pos;
                    }
                    if tok.len() < MAX_TEXT_LEN - 1 {
                        tok.push(ch);
                    }
                }
            }
            Quota::None => {
                if !ch.is_whitespace() {
                    in_space = false;
                    if tok.len() < MAX_TEXT_LEN - 1 {
                        tok.push(ch);
                    }
                } else {
                    in_space = true;
                    tokens.push(Token { text: std::mem::take(&mut tok), offset: tok_offset });
                    tok_offset = 0;
                }
            }
        }
    }

    if !tok.is_empty() {
        tokens.push(Token { text: tok, offset: tok_offset });
    }

    tokens
}
