//! Shell-like command tokenization without a shell.
//!
//! Agent-generated command strings look like shell input (`python -c
//! "print(42)"`) but must never reach a shell: a single interpolated
//! `$`, `;`, or backtick would change what runs inside the container.
//! This module splits a command string into an argument vector under
//! minimal quoting rules (single quotes, double quotes, whitespace) and
//! refuses anything that would require real shell semantics to evaluate.
//!
//! The supported subset is deliberately small. Do not extend it with
//! escapes, substitution, or operators: the argv built here goes straight
//! to `execve`, and every piece of shell grammar supported is injection
//! surface reopened.

/// Shell metacharacters that are never allowed outside quotes.
///
/// Each of these changes command semantics when a shell interprets it,
/// so an unquoted occurrence means the string cannot be represented as a
/// plain argument vector.
const METACHARACTERS: &[char] = &[';', '|', '&', '$', '`', '>', '<', '\n'];

/// A command string was rejected because it cannot be tokenized safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShellSyntaxError {
    /// The string contains a shell metacharacter outside of quotes.
    #[error("contains unsupported shell syntax: unquoted `{0}`")]
    UnsupportedMetacharacter(char),

    /// A single or double quote was opened but never closed.
    #[error("contains unsupported shell syntax: unterminated {0} quote")]
    UnterminatedQuote(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

/// Splits a command string into an argument vector.
///
/// Tokens are separated by runs of unquoted spaces and tabs, the POSIX
/// field separators; Unicode whitespace such as a non-breaking space is
/// an ordinary character, as a shell would treat it. Matched
/// single-quote and double-quote spans join into the surrounding token
/// with the quotes stripped; their contents are taken literally, with no
/// escape processing and no substitution of any kind. An empty quoted
/// span (`''` or `""`) yields an empty token, as a POSIX shell would.
///
/// Any unquoted occurrence of `;`, `|`, `&`, `$`, `` ` ``, `>`, `<`, or a
/// newline is rejected, as is an unterminated quote. Rejection is a hard
/// failure: callers must not fall back to handing the string to a shell.
///
/// An empty or all-whitespace input yields an empty vector.
///
/// # Errors
///
/// Returns [`ShellSyntaxError`] when the string contains an unquoted
/// metacharacter or an unbalanced quote.
pub fn split(command: &str) -> Result<Vec<String>, ShellSyntaxError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Tracks whether `current` belongs to a token, so `''` produces an
    // empty token while a bare separator produces none.
    let mut in_token = false;
    let mut state = State::Unquoted;

    for c in command.chars() {
        match state {
            State::Unquoted => {
                if c == '\'' {
                    state = State::SingleQuoted;
                    in_token = true;
                } else if c == '"' {
                    state = State::DoubleQuoted;
                    in_token = true;
                } else if METACHARACTERS.contains(&c) {
                    return Err(ShellSyntaxError::UnsupportedMetacharacter(c));
                } else if c == ' ' || c == '\t' {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else {
                    current.push(c);
                    in_token = true;
                }
            }
            State::SingleQuoted => {
                if c == '\'' {
                    state = State::Unquoted;
                } else {
                    current.push(c);
                }
            }
            State::DoubleQuoted => {
                if c == '"' {
                    state = State::Unquoted;
                } else {
                    current.push(c);
                }
            }
        }
    }

    match state {
        State::SingleQuoted => return Err(ShellSyntaxError::UnterminatedQuote('\'')),
        State::DoubleQuoted => return Err(ShellSyntaxError::UnterminatedQuote('"')),
        State::Unquoted => {}
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}
