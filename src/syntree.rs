use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, PartialEq, Clone)]
pub struct Constituent<T> {
  pub value: T,
  pub span: (usize, usize),
}

impl<T> fmt::Display for Constituent<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Word<U> {
  pub value: U,
  pub span: (usize, usize),
}

impl<U> fmt::Display for Word<U>
where
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Clone)]
pub enum SynTree<T, U> {
  Branch(Constituent<T>, Vec<SynTree<T, U>>),
  Leaf(Word<U>),
}

/// A parse tree labelled with grammar symbols, over surface tokens
pub type Tree = SynTree<String, String>;

impl<T, U> SynTree<T, U> {
  pub fn get_leaf(&self) -> Option<&Word<U>> {
    match self {
      Self::Leaf(w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&Constituent<T>, &Vec<SynTree<T, U>>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  pub fn span(&self) -> (usize, usize) {
    match self {
      Self::Branch(c, _) => c.span,
      Self::Leaf(w) => w.span,
    }
  }

  /// The leaf values, left to right
  pub fn leaves(&self) -> Vec<&U> {
    let mut out = Vec::new();
    self.collect_leaves(&mut out);
    out
  }

  fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a U>) {
    match self {
      Self::Leaf(w) => out.push(&w.value),
      Self::Branch(_, children) => {
        for child in children.iter() {
          child.collect_leaves(out);
        }
      }
    }
  }

  /// The values of every branch, root first
  pub fn branch_values(&self) -> Vec<&T> {
    let mut out = Vec::new();
    let mut stack = vec![self];
    while let Some(node) = stack.pop() {
      if let Self::Branch(c, children) = node {
        out.push(&c.value);
        stack.extend(children.iter().rev());
      }
    }
    out
  }

  pub fn map<V, W>(
    &self,
    map_branch: fn(&Constituent<T>) -> V,
    map_leaf: fn(&Word<U>) -> W,
  ) -> SynTree<V, W> {
    match self {
      Self::Branch(t, children) => {
        let children = children
          .iter()
          .map(|c| c.map(map_branch, map_leaf))
          .collect::<Vec<_>>();
        SynTree::Branch(
          Constituent {
            span: t.span,
            value: map_branch(t),
          },
          children,
        )
      }
      Self::Leaf(u) => SynTree::Leaf(Word {
        span: u.span,
        value: map_leaf(u),
      }),
    }
  }
}

impl<U> SynTree<String, U> {
  /// Undoes CNF conversion: every branch whose symbol is not in `symbols` is
  /// replaced by its children, in place. The root and the leaves always stay.
  ///
  /// Children are rebuilt before their parent, so a spliced-in child list never
  /// holds anything left to remove, and a single pass reaches the fixed point.
  pub fn de_binarize(&self, symbols: &HashSet<String>) -> Self
  where
    U: Clone,
  {
    self.clone().into_de_binarized(symbols)
  }

  pub fn into_de_binarized(self, symbols: &HashSet<String>) -> Self {
    match self {
      Self::Leaf(_) => self,
      Self::Branch(cons, children) => {
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
          match child.into_de_binarized(symbols) {
            Self::Branch(c, grandchildren) if !symbols.contains(&c.value) => {
              kept.extend(grandchildren)
            }
            child => kept.push(child),
          }
        }
        Self::Branch(cons, kept)
      }
    }
  }
}

/// `{}` writes the bracketed form `( S ( NP dog ) ( VP barks ) )`, which
/// [`Tree::from_str`] reads back. `{:#}` writes an indented outline with spans.
impl<T, U> fmt::Display for SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if f.alternate() {
      return self.fmt_outline(f);
    }

    match self {
      Self::Leaf(w) => write!(f, "{}", w.value),
      Self::Branch(c, children) => {
        write!(f, "( {}", c.value)?;
        for child in children.iter() {
          write!(f, " {}", child)?;
        }
        write!(f, " )")
      }
    }
  }
}

impl<T, U> SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  fn fmt_outline(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(t) => write!(f, "{}", t),
      Self::Branch(t, ts) => {
        write!(f, "({}", t)?;
        if ts.len() == 1 {
          write!(f, " ({:#}))", ts[0])
        } else {
          for t in ts.iter() {
            let fmt = format!("{:#}", t);
            for line in fmt.lines() {
              write!(f, "\n  {}", line)?;
            }
          }
          write!(f, ")")
        }
      }
    }
  }
}

/// Errors from reading a bracketed tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeSyntaxError {
  #[error("unexpected end of input")]
  UnexpectedEnd,

  #[error("unexpected `{token}` at token {position}")]
  Unexpected { token: String, position: usize },

  #[error("node `{label}` has no children")]
  EmptyNode { label: String },

  #[error("trailing input starting with `{token}`")]
  TrailingInput { token: String },
}

/// Reads the bracketed form written by `Display`. Tokens are separated by
/// whitespace; a lone `(` or `)` is always a bracket, never a leaf. Leaf spans
/// are numbered left to right and branch spans cover their leaves.
impl FromStr for Tree {
  type Err = TreeSyntaxError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let tokens = s.split_whitespace().collect::<Vec<_>>();
    let mut reader = TreeReader {
      tokens: &tokens,
      pos: 0,
      leaves: 0,
    };

    let tree = reader.read_tree()?;
    match tokens.get(reader.pos) {
      Some(token) => Err(TreeSyntaxError::TrailingInput {
        token: token.to_string(),
      }),
      None => Ok(tree),
    }
  }
}

struct TreeReader<'a> {
  tokens: &'a [&'a str],
  pos: usize,
  leaves: usize,
}

impl<'a> TreeReader<'a> {
  fn advance(&mut self) -> Result<&'a str, TreeSyntaxError> {
    let token = *self.tokens.get(self.pos).ok_or(TreeSyntaxError::UnexpectedEnd)?;
    self.pos += 1;
    Ok(token)
  }

  fn unexpected(&self, token: &str) -> TreeSyntaxError {
    TreeSyntaxError::Unexpected {
      token: token.to_string(),
      position: self.pos - 1,
    }
  }

  fn read_tree(&mut self) -> Result<Tree, TreeSyntaxError> {
    match self.advance()? {
      "(" => self.read_branch(),
      ")" => Err(self.unexpected(")")),
      word => {
        let word = word.to_string();
        Ok(self.leaf(word))
      }
    }
  }

  fn leaf(&mut self, value: String) -> Tree {
    let span = (self.leaves, self.leaves + 1);
    self.leaves += 1;
    SynTree::Leaf(Word { value, span })
  }

  /// Reads the rest of a branch, after its opening bracket
  fn read_branch(&mut self) -> Result<Tree, TreeSyntaxError> {
    let label = match self.advance()? {
      "(" => return Err(self.unexpected("(")),
      ")" => return Err(self.unexpected(")")),
      label => label.to_string(),
    };

    let start = self.leaves;
    let mut children = Vec::new();
    loop {
      match self.advance()? {
        ")" => break,
        "(" => children.push(self.read_branch()?),
        word => {
          let word = word.to_string();
          children.push(self.leaf(word));
        }
      }
    }

    if children.is_empty() {
      return Err(TreeSyntaxError::EmptyNode { label });
    }

    Ok(SynTree::Branch(
      Constituent {
        value: label,
        span: (start, self.leaves),
      },
      children,
    ))
  }
}
