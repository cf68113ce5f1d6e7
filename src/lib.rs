#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod cnf;
pub mod grammar;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;
pub mod utils;

#[cfg(test)]
mod proptests;

pub use crate::chart::{Chart, Outcome};
pub use crate::cnf::CnfGrammar;
pub use crate::grammar::Grammar;
pub use crate::rules::Production;
pub use crate::syntree::{SynTree, Tree};
pub use crate::utils::{Err, FormatError};

impl Grammar {
  /// Fills a CKY chart for `input`, or returns the first token missing from the lexicon
  pub fn parse_chart(&self, input: &[&str]) -> Result<Chart<'_>, String> {
    chart::parse_chart(self, input)
  }

  /// Checks whether `input` is a sentence of the grammar. The grammar should be in weak CNF.
  pub fn recognize(&self, input: &[&str]) -> Outcome {
    chart::recognize(self, input)
  }

  /// Every parse of `input` rooted at the start symbol, along with the outcome.
  /// The grammar should be in weak CNF.
  pub fn parse(&self, input: &[&str]) -> (Vec<Tree>, Outcome) {
    match self.parse_chart(input) {
      Err(token) => (Vec::new(), Outcome::LexiconMiss(token)),
      Ok(chart) => {
        let trees = chart.trees(self.start());
        let outcome = if trees.is_empty() {
          Outcome::Rejected
        } else {
          Outcome::Accepted
        };
        (trees, outcome)
      }
    }
  }
}

impl CnfGrammar {
  pub fn recognize(&self, input: &[&str]) -> Outcome {
    self.grammar.recognize(input)
  }

  /// Parses against the converted grammar, then strips the symbols the
  /// conversion introduced from every tree
  pub fn parse(&self, input: &[&str]) -> (Vec<Tree>, Outcome) {
    let (trees, outcome) = self.grammar.parse(input);
    let trees = trees
      .into_iter()
      .map(|t| t.into_de_binarized(&self.original_symbols))
      .collect();
    (trees, outcome)
  }
}

#[test]
fn test_parse_converted_grammar() {
  let g: Grammar = include_str!("../grammars/english.cfg").parse().unwrap();
  let cnf = g.to_weak_cnf();
  let sentence = "I saw the man with the telescope".split(' ').collect::<Vec<_>>();

  let (trees, outcome) = cnf.parse(&sentence);
  assert_eq!(outcome, Outcome::Accepted);
  assert_eq!(cnf.recognize(&sentence), Outcome::Accepted);

  let trees = trees.iter().map(|t| t.to_string()).collect::<Vec<_>>();
  assert_eq!(
    trees,
    [
      "( S ( NP ( Pronoun I ) ) ( VP ( Verb saw ) ( NP ( Det the ) ( Nominal ( Nominal ( Noun man ) ) ( PP ( Preposition with ) ( NP ( Det the ) ( Nominal ( Noun telescope ) ) ) ) ) ) ) )",
      "( S ( NP ( Pronoun I ) ) ( VP ( VP ( Verb saw ) ( NP ( Det the ) ( Nominal ( Noun man ) ) ) ) ( PP ( Preposition with ) ( NP ( Det the ) ( Nominal ( Noun telescope ) ) ) ) ) )",
      "( S ( NP ( Pronoun I ) ) ( VP ( Verb saw ) ( NP ( Det the ) ( Nominal ( Noun man ) ) ) ( PP ( Preposition with ) ( NP ( Det the ) ( Nominal ( Noun telescope ) ) ) ) ) )",
    ]
  );
}
