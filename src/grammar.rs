use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::rules::Production;
use crate::utils::FormatError;

/// A context-free grammar, with its productions indexed by both sides.
///
/// Productions keep their insertion order, which fixes the order in which
/// ambiguous parses are reported. A `Grammar` is never modified after
/// construction; transformations such as [`Grammar::to_weak_cnf`] build a new one.
#[derive(Debug, Clone)]
pub struct Grammar {
  start: String,
  productions: Vec<Rc<Production>>,
  by_lhs: HashMap<String, Vec<Rc<Production>>>,
  /// keyed by the space-joined right-hand side
  by_rhs: HashMap<String, Vec<Rc<Production>>>,
  terminals: HashSet<String>,
  nonterminals: HashSet<String>,
  symbols: HashSet<String>,
}

/// Joins a right-hand side into the key used by the rhs index.
///
/// ```
/// assert_eq!(ckyparse::grammar::rhs_key(&["NP", "VP"]), "NP VP");
/// ```
pub fn rhs_key<S: AsRef<str>>(rhs: &[S]) -> String {
  let mut key = String::new();
  for (idx, s) in rhs.iter().enumerate() {
    if idx > 0 {
      key.push(' ');
    }
    key.push_str(s.as_ref());
  }
  key
}

impl Grammar {
  /// Builds a grammar from a start symbol and productions. Duplicate productions
  /// are dropped, keeping the first occurrence.
  pub fn new<I>(start: impl Into<String>, productions: I) -> Result<Self, FormatError>
  where
    I: IntoIterator<Item = Production>,
  {
    let g = Self::from_productions(start, productions);
    if g.is_empty() {
      Err(FormatError::EmptyGrammar)
    } else {
      Ok(g)
    }
  }

  /// Like [`Grammar::new`], for callers that already know `productions` is non-empty
  pub(crate) fn from_productions<I>(start: impl Into<String>, productions: I) -> Self
  where
    I: IntoIterator<Item = Production>,
  {
    let start = start.into();

    let mut seen = HashSet::new();
    let productions = productions
      .into_iter()
      .filter(|p| seen.insert(p.clone()))
      .map(Rc::new)
      .collect::<Vec<_>>();

    let mut by_lhs: HashMap<String, Vec<Rc<Production>>> = HashMap::new();
    let mut by_rhs: HashMap<String, Vec<Rc<Production>>> = HashMap::new();
    for p in productions.iter() {
      by_lhs.entry(p.lhs.clone()).or_default().push(p.clone());
      by_rhs.entry(rhs_key(&p.rhs)).or_default().push(p.clone());
    }

    let nonterminals = by_lhs.keys().cloned().collect::<HashSet<_>>();
    let terminals = productions
      .iter()
      .flat_map(|p| p.rhs.iter())
      .filter(|s| !nonterminals.contains(*s))
      .cloned()
      .collect::<HashSet<_>>();
    let symbols = terminals.union(&nonterminals).cloned().collect();

    if !nonterminals.contains(&start) {
      warn!(%start, "start symbol has no productions, every sentence will be rejected");
    }

    debug!(
      productions = productions.len(),
      terminals = terminals.len(),
      nonterminals = nonterminals.len(),
      "built grammar"
    );

    Self {
      start,
      productions,
      by_lhs,
      by_rhs,
      terminals,
      nonterminals,
      symbols,
    }
  }

  pub fn start(&self) -> &str {
    &self.start
  }

  pub fn productions(&self) -> &[Rc<Production>] {
    &self.productions
  }

  pub fn len(&self) -> usize {
    self.productions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn terminals(&self) -> &HashSet<String> {
    &self.terminals
  }

  pub fn nonterminals(&self) -> &HashSet<String> {
    &self.nonterminals
  }

  pub fn symbols(&self) -> &HashSet<String> {
    &self.symbols
  }

  /// A terminal shows up on some right-hand side, and never on a left-hand side
  pub fn is_terminal(&self, symbol: &str) -> bool {
    self.terminals.contains(symbol)
  }

  pub fn is_nonterminal(&self, symbol: &str) -> bool {
    self.nonterminals.contains(symbol)
  }

  pub fn productions_by_lhs(&self, lhs: &str) -> &[Rc<Production>] {
    self.by_lhs.get(lhs).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Productions whose right-hand side is exactly `rhs`, in grammar order
  pub fn productions_by_rhs<S: AsRef<str>>(&self, rhs: &[S]) -> &[Rc<Production>] {
    self.productions_by_rhs_key(&rhs_key(rhs))
  }

  /// Like [`Grammar::productions_by_rhs`], with a key already built by [`rhs_key`]
  pub fn productions_by_rhs_key(&self, key: &str) -> &[Rc<Production>] {
    self.by_rhs.get(key).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Checks that every production has one of the shapes the chart engine
  /// understands: `A -> t`, `A -> B`, or `A -> B C` with `B` and `C` nonterminals.
  pub fn is_weak_cnf(&self) -> bool {
    self.productions.iter().all(|p| {
      p.is_unary() || (p.is_binary() && p.rhs.iter().all(|s| self.is_nonterminal(s)))
    })
  }
}

impl PartialEq for Grammar {
  fn eq(&self, other: &Self) -> bool {
    self.start == other.start && self.productions == other.productions
  }
}

impl Eq for Grammar {}

/// Writes the grammar back out in the same format the loader reads,
/// one production per line.
impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "%start {}", self.start)?;
    for p in self.productions.iter() {
      writeln!(f, "{}", p)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn p(lhs: &str, rhs: &[&str]) -> Production {
    Production::new(lhs, rhs.iter().map(|s| s.to_string()).collect())
  }

  fn toy() -> Grammar {
    Grammar::new(
      "S",
      vec![
        p("S", &["NP", "VP"]),
        p("NP", &["\"dog\""]),
        p("VP", &["\"barks\""]),
        p("VP", &["V", "NP"]),
        p("V", &["\"bites\""]),
        p("NP", &["\"dog\""]),
      ],
    )
    .unwrap()
  }

  #[test]
  fn test_classification() {
    let g = toy();

    assert!(g.is_terminal("\"dog\""));
    assert!(!g.is_nonterminal("\"dog\""));
    assert!(g.is_nonterminal("VP"));
    assert!(!g.is_terminal("VP"));
    assert!(!g.is_terminal("missing"));
    assert!(!g.is_nonterminal("missing"));

    assert_eq!(g.terminals().len(), 3);
    assert_eq!(g.nonterminals().len(), 4);
    assert_eq!(g.symbols().len(), 7);
  }

  #[test]
  fn test_duplicates_dropped() {
    assert_eq!(toy().len(), 5);
  }

  #[test]
  fn test_lookups() {
    let g = toy();

    let vps = g.productions_by_lhs("VP");
    assert_eq!(vps.len(), 2);
    assert_eq!(vps[0].to_string(), "VP -> \"barks\"");
    assert_eq!(vps[1].to_string(), "VP -> V NP");

    assert_eq!(g.productions_by_rhs(&["NP", "VP"]).len(), 1);
    assert_eq!(g.productions_by_rhs(&["VP", "NP"]).len(), 0);
    assert_eq!(g.productions_by_rhs_key("V NP")[0].lhs, "VP");
    assert!(g.productions_by_lhs("\"dog\"").is_empty());
  }

  #[test]
  fn test_weak_cnf_check() {
    assert!(toy().is_weak_cnf());

    let g = Grammar::new("S", vec![p("S", &["A", "\"x\""]), p("A", &["\"y\""])]).unwrap();
    assert!(!g.is_weak_cnf());

    let g = Grammar::new("S", vec![p("S", &["A", "A", "A"]), p("A", &["\"y\""])]).unwrap();
    assert!(!g.is_weak_cnf());
  }

  #[test]
  fn test_empty_grammar() {
    assert_eq!(
      Grammar::new("S", Vec::new()).unwrap_err(),
      FormatError::EmptyGrammar
    );
  }

  #[test]
  fn test_display_reloads() {
    let g = toy();
    let text = g.to_string();
    assert!(text.starts_with("%start S\nS -> NP VP\n"));

    let reloaded: Grammar = text.parse().unwrap();
    assert_eq!(reloaded, g);
  }
}
