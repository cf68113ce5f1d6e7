use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Errors raised while loading a grammar definition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
  #[error("line {line}: expected `LHS -> RHS1 | RHS2 | ...`, got `{text}`")]
  MalformedRule { line: usize, text: String },

  #[error("line {line}: %start directive needs a symbol")]
  MissingStartSymbol { line: usize },

  #[error("line {line}: empty alternative in `{text}`")]
  EmptyAlternative { line: usize, text: String },

  #[error("grammar has no productions")]
  EmptyGrammar,
}

/// Wraps a surface word in quotes, the way terminals are spelled in a grammar.
///
/// ```
/// assert_eq!(ckyparse::utils::quote("dog"), "\"dog\"");
/// ```
pub fn quote(word: &str) -> String {
  format!("\"{}\"", word)
}

/// Strips one pair of surrounding quotes, if present.
///
/// ```
/// use ckyparse::utils::unquote;
///
/// assert_eq!(unquote("\"dog\""), "dog");
/// assert_eq!(unquote("NP"), "NP");
/// ```
pub fn unquote(symbol: &str) -> &str {
  symbol
    .strip_prefix('"')
    .and_then(|s| s.strip_suffix('"'))
    .unwrap_or(symbol)
}
