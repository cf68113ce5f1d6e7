use std::fmt;

/// A single rewrite rule `lhs -> rhs[0] rhs[1] ...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
  pub lhs: String,
  pub rhs: Vec<String>,
}

impl Production {
  pub fn new(lhs: impl Into<String>, rhs: Vec<String>) -> Self {
    Self {
      lhs: lhs.into(),
      rhs,
    }
  }

  pub fn len(&self) -> usize {
    self.rhs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn is_unary(&self) -> bool {
    self.len() == 1
  }

  pub fn is_binary(&self) -> bool {
    self.len() == 2
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.lhs)?;
    for s in self.rhs.iter() {
      write!(f, " {}", s)?;
    }
    Ok(())
  }
}

#[test]
fn test_display_production() {
  let p = Production::new("S", vec!["NP".to_string(), "VP".to_string()]);
  assert_eq!(p.to_string(), "S -> NP VP");
  assert!(p.is_binary());
  assert!(!p.is_unary());
}
