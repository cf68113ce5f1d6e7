/// Line-oriented parsing of grammar definitions
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::grammar::Grammar;
use crate::rules::Production;
use crate::utils::{Err, FormatError};

pub const START_DIRECTIVE: &str = "%start";
pub const ARROW: &str = "->";

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Parses a grammar definition, one rule per line:
///
/// ```text
/// %start S
/// # comment
/// S -> NP VP
/// VP -> V NP | "barks"
/// ```
///
/// Without a `%start` line, the left-hand side of the first rule is the start symbol.
impl FromStr for Grammar {
  type Err = FormatError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut start = None;
    let mut productions = Vec::new();

    for (idx, line) in s.lines().enumerate() {
      let line_no = idx + 1;
      let mut words = line.split_whitespace();
      let first = match words.next() {
        Some(w) => w,
        None => continue,
      };

      if first.starts_with('#') {
        continue;
      } else if first == START_DIRECTIVE {
        match words.next() {
          Some(symbol) => start = Some(symbol.to_string()),
          None => return Err(FormatError::MissingStartSymbol { line: line_no }),
        }
      } else {
        productions.extend(parse_rule(line, line_no)?);
      }
    }

    let start = match start.or_else(|| productions.first().map(|p: &Production| p.lhs.clone())) {
      Some(start) => start,
      None => return Err(FormatError::EmptyGrammar),
    };

    debug!(%start, productions = productions.len(), "loaded grammar definition");
    Grammar::new(start, productions)
  }
}

/// Parses `LHS -> RHS1 | RHS2 | ...` into one production per alternative
fn parse_rule(line: &str, line_no: usize) -> Result<Vec<Production>, FormatError> {
  regex_static!(RULE, r"^\s*(\S+)\s+->\s+(\S.*?)\s*$");

  let malformed = || FormatError::MalformedRule {
    line: line_no,
    text: line.trim().to_string(),
  };

  let caps = RULE.captures(line).ok_or_else(malformed)?;
  let lhs = &caps[1];
  let alternatives = &caps[2];

  alternatives
    .split('|')
    .map(|alt| {
      let rhs = alt.split_whitespace().map(str::to_string).collect::<Vec<_>>();
      if rhs.is_empty() {
        Err(FormatError::EmptyAlternative {
          line: line_no,
          text: line.trim().to_string(),
        })
      } else if rhs.iter().any(|s| s == ARROW) {
        Err(malformed())
      } else {
        Ok(Production::new(lhs, rhs))
      }
    })
    .collect()
}

impl Grammar {
  /// Reads and parses a grammar definition file
  pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Err> {
    let text = fs::read_to_string(path)?;
    Ok(text.parse()?)
  }
}
