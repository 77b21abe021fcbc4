use std::fmt;
use std::rc::Rc;

use crate::environment::ScopeChain;
use crate::expression::Expression;
use crate::EvalError;

/// A complex number with double-precision parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
  pub re: f64,
  pub im: f64,
}

impl Complex {
  pub fn new(re: f64, im: f64) -> Self {
    Self { re, im }
  }

  /// Magnitude.
  pub fn abs(self) -> f64 {
    self.re.hypot(self.im)
  }

  /// Phase angle in radians.
  pub fn arg(self) -> f64 {
    self.im.atan2(self.re)
  }

  pub fn conj(self) -> Self {
    Self::new(self.re, -self.im)
  }

  /// Principal square root, via the polar form.
  pub fn sqrt(self) -> Self {
    let r = self.abs().sqrt();
    let theta = self.arg() / 2.0;
    Self::new(r * theta.cos(), r * theta.sin())
  }

  /// Complex exponentiation: z^w = exp(w ln z).
  pub fn powc(self, exp: Self) -> Self {
    if self.re == 0.0 && self.im == 0.0 {
      return if exp.re == 0.0 && exp.im == 0.0 {
        Self::new(1.0, 0.0)
      } else {
        Self::new(0.0, 0.0)
      };
    }
    let ln_r = self.abs().ln();
    let theta = self.arg();
    let scale = (exp.re * ln_r - exp.im * theta).exp();
    let angle = exp.im * ln_r + exp.re * theta;
    Self::new(scale * angle.cos(), scale * angle.sin())
  }
}

impl From<f64> for Complex {
  fn from(re: f64) -> Self {
    Self::new(re, 0.0)
  }
}

impl std::ops::Add for Complex {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self::new(self.re + rhs.re, self.im + rhs.im)
  }
}

impl std::ops::Sub for Complex {
  type Output = Self;

  fn sub(self, rhs: Self) -> Self {
    Self::new(self.re - rhs.re, self.im - rhs.im)
  }
}

impl std::ops::Mul for Complex {
  type Output = Self;

  fn mul(self, rhs: Self) -> Self {
    Self::new(
      self.re * rhs.re - self.im * rhs.im,
      self.re * rhs.im + self.im * rhs.re,
    )
  }
}

impl std::ops::Div for Complex {
  type Output = Self;

  fn div(self, rhs: Self) -> Self {
    let denom = rhs.re * rhs.re + rhs.im * rhs.im;
    Self::new(
      (self.re * rhs.re + self.im * rhs.im) / denom,
      (self.im * rhs.re - self.re * rhs.im) / denom,
    )
  }
}

impl std::ops::Neg for Complex {
  type Output = Self;

  fn neg(self) -> Self {
    Self::new(-self.re, -self.im)
  }
}

impl fmt::Display for Complex {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{},{}", self.re, self.im)
  }
}

/// Signature shared by every built-in procedure.
pub type BuiltinFn = fn(&[Expression]) -> Result<Expression, EvalError>;

/// A named built-in procedure. Two builtins compare equal when their
/// registered names match.
#[derive(Clone, Copy)]
pub struct Builtin {
  pub name: &'static str,
  pub func: BuiltinFn,
}

impl PartialEq for Builtin {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
  }
}

impl fmt::Debug for Builtin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Builtin({})", self.name)
  }
}

/// A user-defined procedure: formal parameter names, a body expression,
/// and the scope chain captured at the point of definition.
#[derive(Clone)]
pub struct Lambda {
  pub params: Vec<String>,
  pub body: Expression,
  pub env: ScopeChain,
}

impl fmt::Debug for Lambda {
  // the captured chain can contain this lambda itself; print params only
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Lambda({})", self.params.join(" "))
  }
}

/// A tagged leaf value: the head of every expression node.
#[derive(Debug, Clone, Default)]
pub enum Atom {
  /// Absence of a value; the head of a default-constructed expression.
  #[default]
  None,
  Number(f64),
  Complex(Complex),
  Symbol(String),
  Str(String),
  /// Marker head of a list expression.
  List,
  /// Marker head of an assembled discrete-plot result.
  DiscretePlot,
  Builtin(Builtin),
  Lambda(Rc<Lambda>),
}

impl PartialEq for Atom {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Atom::None, Atom::None) => true,
      (Atom::Number(a), Atom::Number(b)) => a == b,
      (Atom::Complex(a), Atom::Complex(b)) => a == b,
      (Atom::Symbol(a), Atom::Symbol(b)) => a == b,
      (Atom::Str(a), Atom::Str(b)) => a == b,
      (Atom::List, Atom::List) => true,
      (Atom::DiscretePlot, Atom::DiscretePlot) => true,
      (Atom::Builtin(a), Atom::Builtin(b)) => a == b,
      // lambdas are equal only when they are the same function object
      (Atom::Lambda(a), Atom::Lambda(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl Atom {
  pub fn is_none(&self) -> bool {
    matches!(self, Atom::None)
  }

  pub fn is_number(&self) -> bool {
    matches!(self, Atom::Number(_))
  }

  pub fn is_complex(&self) -> bool {
    matches!(self, Atom::Complex(_))
  }

  pub fn is_symbol(&self) -> bool {
    matches!(self, Atom::Symbol(_))
  }

  pub fn is_string(&self) -> bool {
    matches!(self, Atom::Str(_))
  }

  pub fn is_list(&self) -> bool {
    matches!(self, Atom::List)
  }

  pub fn is_procedure(&self) -> bool {
    matches!(self, Atom::Builtin(_) | Atom::Lambda(_))
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Atom::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_symbol(&self) -> Option<&str> {
    match self {
      Atom::Symbol(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_string(&self) -> Option<&str> {
    match self {
      Atom::Str(s) => Some(s),
      _ => None,
    }
  }

  /// Build an atom from raw token text: a number when the text has
  /// numeric shape and parses as one, a string when double-quoted, a
  /// symbol otherwise.
  pub fn parse(text: &str) -> Atom {
    // the shape check keeps symbols like "inf" from parsing as floats
    let numeric_shape = text
      .chars()
      .next()
      .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == '.')
      && text.contains(|c: char| c.is_ascii_digit());
    if numeric_shape {
      if let Ok(n) = text.parse::<f64>() {
        return Atom::Number(n);
      }
    }
    if text.starts_with('"') && text.ends_with('"') && text.len() >= 2 {
      let unescaped = snailquote::unescape(text)
        .unwrap_or_else(|_| text[1..text.len() - 1].to_string());
      return Atom::Str(unescaped);
    }
    Atom::Symbol(text.to_string())
  }
}

impl fmt::Display for Atom {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Atom::None => write!(f, "NONE"),
      Atom::Number(n) => write!(f, "{n}"),
      Atom::Complex(c) => write!(f, "{c}"),
      Atom::Symbol(s) => write!(f, "{s}"),
      Atom::Str(s) => write!(f, "\"{s}\""),
      Atom::List | Atom::DiscretePlot => Ok(()),
      Atom::Builtin(_) | Atom::Lambda(_) => write!(f, "<procedure>"),
    }
  }
}
