//! The CKY chart: a triangular table over the spans of the input, filled
//! bottom-up one span length at a time.
//!
//! Recognition and parsing share the same fill order and differ only in what a
//! cell holds: a set of symbols, or a list of entries with backpointers.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::grammar::Grammar;
use crate::rules::Production;
use crate::syntree::{Constituent, SynTree, Tree, Word};
use crate::utils::quote;

/// Result of checking one sentence against a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Accepted,
  Rejected,
  /// A token that no preterminal rewrites to. Holds the token as it appeared in the input.
  LexiconMiss(String),
}

impl Outcome {
  pub fn is_accepted(&self) -> bool {
    matches!(self, Self::Accepted)
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Accepted => write!(f, "accepted"),
      Self::Rejected => write!(f, "rejected"),
      Self::LexiconMiss(token) => write!(f, "token \"{}\" is not part of the lexicon", token),
    }
  }
}

/// Coordinates of an entry in the chart: the cell for span `row..col`, and the
/// entry's position in that cell
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntryRef {
  pub row: usize,
  pub col: usize,
  pub idx: usize,
}

impl EntryRef {
  pub fn new(row: usize, col: usize, idx: usize) -> Self {
    Self { row, col, idx }
  }
}

impl fmt::Display for EntryRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}#{}", self.row, self.col, self.idx)
  }
}

/// How a chart entry was built
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Derivation {
  /// Preterminal directly over the token of a span-1 cell
  Leaf,
  /// Unary production over another entry of the same cell
  Unit(EntryRef),
  /// Binary production over entries of `row..k` and `k..col`
  Binary(EntryRef, EntryRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'g> {
  pub symbol: &'g str,
  pub derivation: Derivation,
}

impl<'g> Entry<'g> {
  pub fn new(symbol: &'g str, derivation: Derivation) -> Self {
    Self { symbol, derivation }
  }
}

impl fmt::Display for Entry<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.derivation {
      Derivation::Leaf => write!(f, "{} -> ・", self.symbol),
      Derivation::Unit(r) => write!(f, "{} -> {}", self.symbol, r),
      Derivation::Binary(l, r) => write!(f, "{} -> {} {}", self.symbol, l, r),
    }
  }
}

/// What a table of cells has to support for [`fill`] to drive it
trait Cells<'g>: Sized {
  fn with_len(n: usize) -> Self;

  /// Seeds the span-1 cell `j..j+1` with the preterminals of its token
  fn add_leaves(&mut self, j: usize, token: &str, preterminals: &'g [Rc<Production>]);

  /// Adds everything derivable from `i..k` followed by `k..j` to cell `i..j`
  fn combine(&mut self, g: &'g Grammar, i: usize, k: usize, j: usize, key: &mut String);

  /// Closes cell `i..j` under unary productions
  fn close_units(&mut self, g: &'g Grammar, i: usize, j: usize);

  fn cell_len(&self, i: usize, j: usize) -> usize;
}

/// Fills a table for `input`. Fails with the first token that has no preterminal,
/// before any span longer than one token is looked at.
fn fill<'g, C: Cells<'g>>(g: &'g Grammar, input: &[&str]) -> Result<C, String> {
  let n = input.len();
  let mut cells = C::with_len(n);

  if !g.is_weak_cnf() {
    warn!("grammar is not in weak CNF, some of its productions will never apply");
  }

  for (j, token) in input.iter().enumerate() {
    let preterminals = g.productions_by_rhs_key(&quote(token));
    if preterminals.is_empty() {
      debug!(%token, position = j, "token is not part of the lexicon");
      return Err(token.to_string());
    }
    cells.add_leaves(j, token, preterminals);
  }

  // one buffer for every rhs lookup key, instead of one allocation per pair
  let mut key = String::new();
  for j in 1..=n {
    for i in (0..j).rev() {
      for k in (i + 1)..j {
        cells.combine(g, i, k, j, &mut key);
      }
      cells.close_units(g, i, j);
      trace!(i, j, entries = cells.cell_len(i, j), "filled cell");
    }
  }

  Ok(cells)
}

/// Boolean CKY table: each cell holds the set of symbols that span it
#[derive(Debug)]
struct Table<'g> {
  n: usize,
  cells: Vec<BTreeSet<&'g str>>,
}

impl<'g> Table<'g> {
  fn slot(&self, i: usize, j: usize) -> usize {
    i * (self.n + 1) + j
  }

  fn has(&self, i: usize, j: usize, symbol: &str) -> bool {
    self.cells[self.slot(i, j)].contains(symbol)
  }
}

impl<'g> Cells<'g> for Table<'g> {
  fn with_len(n: usize) -> Self {
    Self {
      n,
      cells: vec![BTreeSet::new(); (n + 1) * (n + 1)],
    }
  }

  fn add_leaves(&mut self, j: usize, _: &str, preterminals: &'g [Rc<Production>]) {
    let slot = self.slot(j, j + 1);
    self.cells[slot].extend(preterminals.iter().map(|p| p.lhs.as_str()));
  }

  fn combine(&mut self, g: &'g Grammar, i: usize, k: usize, j: usize, key: &mut String) {
    let mut found = Vec::new();
    for b in self.cells[self.slot(i, k)].iter() {
      for c in self.cells[self.slot(k, j)].iter() {
        key.clear();
        key.push_str(b);
        key.push(' ');
        key.push_str(c);
        found.extend(g.productions_by_rhs_key(key).iter().map(|p| p.lhs.as_str()));
      }
    }
    let slot = self.slot(i, j);
    self.cells[slot].extend(found);
  }

  fn close_units(&mut self, g: &'g Grammar, i: usize, j: usize) {
    let slot = self.slot(i, j);
    let cell = &mut self.cells[slot];

    // a symbol is only pushed when it is new to the cell, so cycles of unit
    // productions run dry
    let mut frontier = cell.iter().copied().collect::<Vec<_>>();
    while let Some(symbol) = frontier.pop() {
      for p in g.productions_by_rhs_key(symbol) {
        if cell.insert(p.lhs.as_str()) {
          frontier.push(p.lhs.as_str());
        }
      }
    }
  }

  fn cell_len(&self, i: usize, j: usize) -> usize {
    self.cells[self.slot(i, j)].len()
  }
}

/// Checks whether `input` is a sentence of `g`, without building any trees
pub fn recognize(g: &Grammar, input: &[&str]) -> Outcome {
  let outcome = match fill::<Table>(g, input) {
    Err(token) => Outcome::LexiconMiss(token),
    Ok(table) if !input.is_empty() && table.has(0, input.len(), g.start()) => Outcome::Accepted,
    Ok(_) => Outcome::Rejected,
  };
  debug!(tokens = input.len(), %outcome, "recognized");
  outcome
}

/// A filled CKY chart with backpointers. Entries are only ever appended, and
/// every backpointer refers to a smaller span or an earlier entry of the same cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart<'g> {
  n: usize,
  tokens: Vec<String>,
  cells: Vec<Vec<Entry<'g>>>,
}

impl<'g> Chart<'g> {
  /// Number of tokens the chart spans
  pub fn len(&self) -> usize {
    self.n
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn tokens(&self) -> &[String] {
    &self.tokens
  }

  fn slot(&self, i: usize, j: usize) -> usize {
    i * (self.n + 1) + j
  }

  /// Entries for the span `i..j`, in the order they were added
  pub fn cell(&self, i: usize, j: usize) -> &[Entry<'g>] {
    assert!(i < j && j <= self.len(), "no cell for span {}..{}", i, j);
    &self.cells[self.slot(i, j)]
  }

  pub fn get(&self, r: EntryRef) -> &Entry<'g> {
    &self.cell(r.row, r.col)[r.idx]
  }

  /// Entries covering the whole input with the given symbol
  pub fn roots<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = EntryRef> + 'a {
    let n = self.len();
    let cell: &[Entry<'g>] = if n == 0 { &[] } else { self.cell(0, n) };
    cell
      .iter()
      .enumerate()
      .filter(move |(_, e)| e.symbol == symbol)
      .map(move |(idx, _)| EntryRef::new(0, n, idx))
  }

  pub fn accepts(&self, start: &str) -> bool {
    self.roots(start).next().is_some()
  }

  /// Builds the tree rooted at an entry by following its backpointers
  pub fn tree(&self, r: EntryRef) -> Tree {
    let entry = self.get(r);
    let children = match entry.derivation {
      Derivation::Leaf => vec![SynTree::Leaf(Word {
        value: self.tokens[r.row].clone(),
        span: (r.row, r.col),
      })],
      Derivation::Unit(child) => vec![self.tree(child)],
      Derivation::Binary(left, right) => vec![self.tree(left), self.tree(right)],
    };

    SynTree::Branch(
      Constituent {
        value: entry.symbol.to_string(),
        span: (r.row, r.col),
      },
      children,
    )
  }

  /// Every tree for the whole input rooted at `start`, in the order the
  /// roots were added to the chart
  pub fn trees(&self, start: &str) -> Vec<Tree> {
    self.roots(start).map(|r| self.tree(r)).collect()
  }
}

impl<'g> Cells<'g> for Chart<'g> {
  fn with_len(n: usize) -> Self {
    Self {
      n,
      tokens: Vec::with_capacity(n),
      cells: vec![Vec::new(); (n + 1) * (n + 1)],
    }
  }

  fn add_leaves(&mut self, j: usize, token: &str, preterminals: &'g [Rc<Production>]) {
    self.tokens.push(token.to_string());
    let slot = self.slot(j, j + 1);
    self.cells[slot].extend(preterminals.iter().map(|p| Entry::new(&p.lhs, Derivation::Leaf)));
  }

  fn combine(&mut self, g: &'g Grammar, i: usize, k: usize, j: usize, key: &mut String) {
    let mut found = Vec::new();
    for (b_idx, b) in self.cells[self.slot(i, k)].iter().enumerate() {
      for (c_idx, c) in self.cells[self.slot(k, j)].iter().enumerate() {
        key.clear();
        key.push_str(b.symbol);
        key.push(' ');
        key.push_str(c.symbol);
        for p in g.productions_by_rhs_key(key) {
          found.push(Entry::new(
            &p.lhs,
            Derivation::Binary(EntryRef::new(i, k, b_idx), EntryRef::new(k, j, c_idx)),
          ));
        }
      }
    }
    let slot = self.slot(i, j);
    self.cells[slot].extend(found);
  }

  fn close_units(&mut self, g: &'g Grammar, i: usize, j: usize) {
    let slot = self.slot(i, j);

    // a unit chain starts at a leaf or binary entry, its base, and reaches each
    // symbol at most once from that base
    let mut bases: Vec<usize> = Vec::with_capacity(self.cells[slot].len());
    let mut reached: HashSet<(usize, &'g str)> = HashSet::new();

    // need to use while loop because the cell grows as units are added, and
    // new entries may feed further unit productions
    let mut idx = 0;
    while idx < self.cells[slot].len() {
      let entry = &self.cells[slot][idx];
      let symbol = entry.symbol;
      let base = match entry.derivation {
        Derivation::Unit(r) => bases[r.idx],
        _ => {
          reached.insert((idx, symbol));
          idx
        }
      };
      bases.push(base);

      for p in g.productions_by_rhs_key(symbol) {
        if reached.insert((base, p.lhs.as_str())) {
          let entry = Entry::new(&p.lhs, Derivation::Unit(EntryRef::new(i, j, idx)));
          self.cells[slot].push(entry);
        }
      }
      idx += 1;
    }
  }

  fn cell_len(&self, i: usize, j: usize) -> usize {
    self.cells[self.slot(i, j)].len()
  }
}

impl fmt::Display for Chart<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let n = self.len();
    for width in 1..=n {
      for i in 0..=(n - width) {
        let cell = self.cell(i, i + width);
        if cell.is_empty() {
          continue;
        }
        writeln!(f, "Span {}..{}:", i, i + width)?;
        for (idx, entry) in cell.iter().enumerate() {
          writeln!(f, "  #{} {}", idx, entry)?;
        }
      }
    }
    Ok(())
  }
}

/// Fills a chart with backpointers for `input`. Fails with the first token that
/// has no preterminal in `g`.
pub fn parse_chart<'g>(g: &'g Grammar, input: &[&str]) -> Result<Chart<'g>, String> {
  let chart = fill::<Chart>(g, input);
  if let Ok(chart) = &chart {
    debug!(
      tokens = input.len(),
      entries = chart.cells.iter().map(Vec::len).sum::<usize>(),
      "filled chart"
    );
  }
  chart
}

#[cfg(test)]
mod tests {
  use super::*;

  const DOG: &str = r#"
    %start S
    S -> NP VP
    NP -> "dog"
    VP -> "barks"
  "#;

  fn strings(trees: &[Tree]) -> Vec<String> {
    trees.iter().map(|t| t.to_string()).collect()
  }

  fn trees(g: &Grammar, input: &[&str]) -> Vec<Tree> {
    parse_chart(g, input).unwrap().trees(g.start())
  }

  #[test]
  fn test_dog_barks() {
    let g: Grammar = DOG.parse().unwrap();

    assert_eq!(recognize(&g, &["dog", "barks"]), Outcome::Accepted);
    assert_eq!(
      strings(&trees(&g, &["dog", "barks"])),
      ["( S ( NP dog ) ( VP barks ) )"]
    );
  }

  #[test]
  fn test_chart_entries() {
    let g: Grammar = DOG.parse().unwrap();
    let chart = parse_chart(&g, &["dog", "barks"]).unwrap();

    assert_eq!(chart.len(), 2);
    assert_eq!(chart.tokens(), ["dog", "barks"]);
    assert_eq!(chart.cell(0, 1), [Entry::new("NP", Derivation::Leaf)]);
    assert_eq!(chart.cell(1, 2), [Entry::new("VP", Derivation::Leaf)]);
    assert_eq!(
      chart.cell(0, 2),
      [Entry::new(
        "S",
        Derivation::Binary(EntryRef::new(0, 1, 0), EntryRef::new(1, 2, 0))
      )]
    );
    assert!(chart.accepts("S"));
    assert!(!chart.accepts("NP"));
  }

  #[test]
  fn test_lexicon_miss() {
    let g: Grammar = DOG.parse().unwrap();

    assert_eq!(
      recognize(&g, &["dog", "meows"]),
      Outcome::LexiconMiss("meows".to_string())
    );
    assert_eq!(parse_chart(&g, &["dog", "meows"]).unwrap_err(), "meows");
    // the first unknown token is the one reported
    assert_eq!(
      recognize(&g, &["cat", "meows"]),
      Outcome::LexiconMiss("cat".to_string())
    );
    // a nonterminal's name is not a word
    assert_eq!(
      recognize(&g, &["NP", "barks"]),
      Outcome::LexiconMiss("NP".to_string())
    );
  }

  #[test]
  fn test_rejected() {
    let g: Grammar = DOG.parse().unwrap();

    assert_eq!(recognize(&g, &["barks", "dog"]), Outcome::Rejected);
    assert_eq!(recognize(&g, &["dog"]), Outcome::Rejected);
    assert_eq!(recognize(&g, &[]), Outcome::Rejected);
    assert!(trees(&g, &["barks", "dog"]).is_empty());
    assert!(trees(&g, &[]).is_empty());
  }

  #[test]
  fn test_two_verb_phrases() {
    let g: Grammar = r#"
      S -> NP VP
      VP -> V NP | V N
      NP -> "fish"
      N -> "fish"
      V -> "eat"
    "#
    .parse()
    .unwrap();

    assert_eq!(
      strings(&trees(&g, &["fish", "eat", "fish"])),
      [
        "( S ( NP fish ) ( VP ( V eat ) ( NP fish ) ) )",
        "( S ( NP fish ) ( VP ( V eat ) ( N fish ) ) )",
      ]
    );
  }

  #[test]
  fn test_tree_generation() {
    // both bracketings of [x x x], in split-point order
    let g: Grammar = r#"
      S -> "x"
      S -> S S
    "#
    .parse()
    .unwrap();

    assert_eq!(
      strings(&trees(&g, &["x", "x", "x"])),
      [
        "( S ( S x ) ( S ( S x ) ( S x ) ) )",
        "( S ( S ( S x ) ( S x ) ) ( S x ) )",
      ]
    );

    // catalan numbers
    assert_eq!(trees(&g, &["x"; 4]).len(), 5);
    assert_eq!(trees(&g, &["x"; 5]).len(), 14);
    assert_eq!(trees(&g, &["x"; 6]).len(), 42);
  }

  #[test]
  fn test_unit_chain() {
    let g: Grammar = r#"
      S -> A
      A -> B
      B -> "x"
    "#
    .parse()
    .unwrap();

    assert_eq!(recognize(&g, &["x"]), Outcome::Accepted);
    assert_eq!(strings(&trees(&g, &["x"])), ["( S ( A ( B x ) ) )"]);
  }

  #[test]
  fn test_unit_chain_over_binary() {
    // the chain is listed bottom-up, so a single pass over the cell would miss S
    let g: Grammar = r#"
      %start S
      Y -> A B
      X -> Y
      S -> X
      A -> "a"
      B -> "b"
    "#
    .parse()
    .unwrap();

    assert_eq!(recognize(&g, &["a", "b"]), Outcome::Accepted);
    assert_eq!(
      strings(&trees(&g, &["a", "b"])),
      ["( S ( X ( Y ( A a ) ( B b ) ) ) )"]
    );
  }

  #[test]
  fn test_unit_cycle_terminates() {
    let g: Grammar = r#"
      S -> A
      A -> S | "x"
    "#
    .parse()
    .unwrap();

    assert_eq!(recognize(&g, &["x"]), Outcome::Accepted);
    assert_eq!(strings(&trees(&g, &["x"])), ["( S ( A x ) )"]);

    let chart = parse_chart(&g, &["x"]).unwrap();
    assert_eq!(
      chart.cell(0, 1),
      [
        Entry::new("A", Derivation::Leaf),
        Entry::new("S", Derivation::Unit(EntryRef::new(0, 1, 0))),
      ]
    );
  }

  #[test]
  fn test_unit_clique_bounded() {
    // every symbol rewrites to every other one
    let symbols = ["A", "B", "C", "D", "E", "F", "G"];
    let mut text = String::from("%start A\nA -> \"x\" | A A\n");
    for lhs in symbols {
      for rhs in symbols.iter().filter(|&&rhs| rhs != lhs) {
        text.push_str(&format!("{} -> {}\n", lhs, rhs));
      }
    }
    let g: Grammar = text.parse().unwrap();

    let chart = parse_chart(&g, &["x"; 3]).unwrap();
    assert_eq!(chart.cell(0, 1).len(), symbols.len());
    assert_eq!(chart.cell(0, 2).len(), symbols.len());
    // one A over 0..3 per split point, each closed over once
    assert_eq!(chart.cell(0, 3).len(), 2 * symbols.len());
    assert_eq!(chart.roots("A").count(), 2);

    assert_eq!(recognize(&g, &["x"; 6]), Outcome::Accepted);
    assert_eq!(trees(&g, &["x"; 6]).len(), 42);
  }

  #[test]
  fn test_unit_diamond_collapses() {
    let g: Grammar = r#"
      S -> A | B
      A -> X
      B -> X
      X -> "x"
    "#
    .parse()
    .unwrap();

    assert_eq!(strings(&trees(&g, &["x"])), ["( S ( A ( X x ) ) )"]);
  }

  #[test]
  fn test_ambiguous_unit_sources() {
    // two NPs over the same span each feed their own S
    let g: Grammar = r#"
      S -> NP
      NP -> Det N | Det Adj
      Det -> "the"
      N -> "poor"
      Adj -> "poor"
    "#
    .parse()
    .unwrap();

    assert_eq!(
      strings(&trees(&g, &["the", "poor"])),
      [
        "( S ( NP ( Det the ) ( N poor ) ) )",
        "( S ( NP ( Det the ) ( Adj poor ) ) )",
      ]
    );
  }

  #[test]
  fn test_display_chart() {
    let g: Grammar = DOG.parse().unwrap();
    let chart = parse_chart(&g, &["dog", "barks"]).unwrap();

    assert_eq!(
      chart.to_string(),
      "Span 0..1:\n  #0 NP -> ・\nSpan 1..2:\n  #0 VP -> ・\nSpan 0..2:\n  #0 S -> 0..1#0 1..2#0\n"
    );
  }
}
