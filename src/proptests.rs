use proptest::{collection, prelude::*, sample};

use crate::utils::quote;
use crate::{Grammar, Outcome, Tree};

const WORDS: &[&str] = &[
  "the", "a", "this", "book", "flight", "man", "telescope", "dog", "park", "saw", "walked",
  "include", "I", "she", "me", "Houston", "with", "in", "near", "does",
];

fn english() -> Grammar {
  include_str!("../grammars/english.cfg").parse().unwrap()
}

fn arb_sentence() -> impl Strategy<Value = Vec<&'static str>> {
  collection::vec(sample::select(WORDS), 1..7)
}

/// Checks that every branch of `t` rewrites to its children by some production of `g`
fn is_derivation(t: &Tree, g: &Grammar) -> bool {
  match t {
    Tree::Leaf(_) => true,
    Tree::Branch(cons, children) => {
      let rhs = children
        .iter()
        .map(|c| match c {
          Tree::Leaf(w) => quote(&w.value),
          Tree::Branch(c, _) => c.value.clone(),
        })
        .collect::<Vec<_>>();
      g.productions_by_rhs(&rhs).iter().any(|p| p.lhs == cons.value)
        && children.iter().all(|c| is_derivation(c, g))
    }
  }
}

proptest! {
  #[test]
  fn recognize_agrees_with_parse(sentence in arb_sentence()) {
    let g = english();
    let cnf = g.to_weak_cnf();

    let (trees, outcome) = cnf.parse(&sentence);
    prop_assert_eq!(cnf.recognize(&sentence), outcome.clone());
    prop_assert_eq!(outcome.is_accepted(), !trees.is_empty());

    for t in trees.iter() {
      let leaves = t.leaves().into_iter().map(String::as_str).collect::<Vec<_>>();
      prop_assert_eq!(&leaves, &sentence);
      prop_assert!(t.branch_values().into_iter().all(|v| g.symbols().contains(v)));
      prop_assert!(is_derivation(t, &g), "not a derivation: {}", t);
      prop_assert_eq!(&t.to_string().parse::<Tree>().unwrap(), t);
    }
  }

  #[test]
  fn de_binarize_is_idempotent(sentence in arb_sentence()) {
    let cnf = english().to_weak_cnf();

    let (raw, _) = cnf.grammar.parse(&sentence);
    for t in raw {
      let flat = t.de_binarize(&cnf.original_symbols);
      prop_assert_eq!(flat.leaves(), t.leaves());
      prop_assert_eq!(flat.span(), t.span());
      prop_assert_eq!(flat.de_binarize(&cnf.original_symbols), flat);
    }
  }

  #[test]
  fn unknown_word_is_reported(mut sentence in arb_sentence(), pos in any::<sample::Index>()) {
    let idx = pos.index(sentence.len() + 1);
    sentence.insert(idx, "zebra");
    let cnf = english().to_weak_cnf();
    let expected = Outcome::LexiconMiss("zebra".to_string());

    prop_assert_eq!(cnf.recognize(&sentence), expected.clone());
    let (trees, outcome) = cnf.parse(&sentence);
    prop_assert!(trees.is_empty());
    prop_assert_eq!(outcome, expected);
  }
}
