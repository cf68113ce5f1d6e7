//! Conversion of arbitrary grammars into weak Chomsky Normal Form.
//!
//! Weak CNF allows `A -> t`, `A -> B`, and `A -> B C`. Longer right-hand sides are
//! split into chains of binary productions over compound symbols (`A+B`), and
//! terminals inside them are lifted into dummy preterminals. Neither kind of
//! introduced symbol belongs to the source grammar, which is all
//! [`SynTree::de_binarize`](crate::syntree::SynTree::de_binarize) needs to undo
//! the conversion.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::grammar::Grammar;
use crate::parse_grammar::{ARROW, START_DIRECTIVE};
use crate::rules::Production;
use crate::utils::unquote;

/// Joins the surface names of the symbols folded into a compound symbol
pub const COMPOUND_SEPARATOR: &str = "+";

/// Prepended to a dummy preterminal's name until it no longer collides with a grammar symbol
pub const DUMMY_PREFIX: &str = "DUMMY_";

/// A grammar in weak CNF, along with the symbols of the grammar it was converted from
#[derive(Debug, Clone, PartialEq)]
pub struct CnfGrammar {
  pub grammar: Grammar,
  pub original_symbols: HashSet<String>,
}

impl Grammar {
  /// Converts the grammar into an equivalent one in weak CNF.
  ///
  /// Productions are emitted in source order; a production that splits up
  /// emits its dummy preterminals first, then its binary chain from the top down.
  pub fn to_weak_cnf(&self) -> CnfGrammar {
    let mut productions = Vec::with_capacity(self.len());
    // introduced symbol -> the terminal or symbol sequence it stands for
    let mut introduced = HashMap::new();

    for p in self.productions() {
      if p.len() < 2 {
        productions.push(p.as_ref().clone());
        continue;
      }

      let mut rhs = Vec::with_capacity(p.len());
      for symbol in p.rhs.iter() {
        // classify the token itself, a nonterminal passes through as is
        if self.is_terminal(symbol) {
          let dummy = self.fresh_name(unquote(symbol), &[symbol.as_str()], &mut introduced);
          productions.push(Production::new(dummy.clone(), vec![symbol.clone()]));
          rhs.push(dummy);
        } else {
          rhs.push(symbol.clone());
        }
      }

      let mut lhs = p.lhs.clone();
      while rhs.len() > 2 {
        let last = rhs.split_off(rhs.len() - 1);
        let compound = self.fresh_name(
          &rhs.join(COMPOUND_SEPARATOR),
          &rhs.iter().map(String::as_str).collect::<Vec<_>>(),
          &mut introduced,
        );

        let mut binary = vec![compound.clone()];
        binary.extend(last);
        productions.push(Production::new(lhs, binary));

        lhs = compound;
      }
      productions.push(Production::new(lhs, rhs));
    }

    let grammar = Grammar::from_productions(self.start(), productions);
    debug!(
      before = self.len(),
      after = grammar.len(),
      introduced = grammar.nonterminals().len() - self.nonterminals().len(),
      "converted grammar to weak CNF"
    );

    CnfGrammar {
      grammar,
      original_symbols: self.symbols().clone(),
    }
  }

  /// Name for a symbol introduced to stand in for `parts`: a dummy preterminal
  /// over one terminal, or a compound over a symbol sequence. The name is
  /// prefixed until it is neither a source symbol, nor taken by another
  /// introduced symbol, nor read back as something else by the grammar loader.
  fn fresh_name(
    &self,
    name: &str,
    parts: &[&str],
    introduced: &mut HashMap<String, Vec<String>>,
  ) -> String {
    let mut name = name.to_string();
    loop {
      if !is_reserved(&name) && !self.symbols().contains(&name) {
        match introduced.get(&name) {
          Some(existing) if existing.iter().eq(parts) => return name,
          Some(_) => {}
          None => {
            introduced.insert(name.clone(), parts.iter().map(|p| p.to_string()).collect());
            return name;
          }
        }
      }
      name = format!("{}{}", DUMMY_PREFIX, name);
    }
  }
}

/// Checks whether a line starting with `name` would not load back as a production for it
fn is_reserved(name: &str) -> bool {
  name.is_empty()
    || name.starts_with('#')
    || name.contains('|')
    || name == START_DIRECTIVE
    || name == ARROW
}
