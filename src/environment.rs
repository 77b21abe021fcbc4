use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::{E, PI};
use std::rc::Rc;

use crate::atom::{Atom, Builtin, Complex};
use crate::expression::{Expression, SpecialForm};
use crate::EvalError;

/// One lexical scope: a shared, mutable symbol table.
pub type Scope = Rc<RefCell<HashMap<String, Expression>>>;
/// A chain of scopes, innermost last.
pub type ScopeChain = Vec<Scope>;

/// Default ceiling on nested evaluation depth.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// A chain of lexical scopes mapping symbols to evaluated expressions.
/// Scopes are reference counted so closures can keep their defining
/// chain alive after the defining call returns.
pub struct Environment {
  scopes: ScopeChain,
  max_depth: usize,
}

impl Default for Environment {
  fn default() -> Self {
    Self::new()
  }
}

impl Environment {
  /// An environment holding the startup bindings in its global scope.
  pub fn new() -> Self {
    Self::with_max_depth(DEFAULT_MAX_DEPTH)
  }

  /// Like `new`, with a custom recursion-depth ceiling.
  pub fn with_max_depth(max_depth: usize) -> Self {
    let mut env = Self {
      scopes: vec![Rc::new(RefCell::new(HashMap::new()))],
      max_depth,
    };
    env.install_startup_bindings();
    env
  }

  /// Rebuild an environment around a captured scope chain.
  pub(crate) fn from_chain(scopes: ScopeChain, max_depth: usize) -> Self {
    Self { scopes, max_depth }
  }

  pub fn max_depth(&self) -> usize {
    self.max_depth
  }

  /// Resolve a symbol through the chain, innermost scope first.
  pub fn lookup(&self, symbol: &str) -> Option<Expression> {
    self
      .scopes
      .iter()
      .rev()
      .find_map(|scope| scope.borrow().get(symbol).cloned())
  }

  /// Bind a symbol in the innermost scope. Special-form keywords and
  /// built-in procedure names cannot be rebound; user symbols can.
  pub fn define(
    &mut self,
    symbol: &str,
    value: Expression,
  ) -> Result<(), EvalError> {
    if SpecialForm::is_keyword(symbol) {
      return Err(EvalError::MalformedSpecialForm(format!(
        "cannot redefine special form {symbol}"
      )));
    }
    if let Some(existing) = self.lookup(symbol) {
      if matches!(existing.head(), Atom::Builtin(_)) {
        return Err(EvalError::MalformedSpecialForm(format!(
          "cannot redefine built-in procedure {symbol}"
        )));
      }
    }
    self
      .scopes
      .last()
      .expect("environment always has a global scope")
      .borrow_mut()
      .insert(symbol.to_string(), value);
    Ok(())
  }

  /// Push a fresh innermost scope.
  pub fn push_scope(&mut self) {
    self.scopes.push(Rc::new(RefCell::new(HashMap::new())));
  }

  /// Pop the innermost scope. The global scope is never popped.
  pub fn pop_scope(&mut self) {
    if self.scopes.len() > 1 {
      self.scopes.pop();
    }
  }

  /// Clone the scope chain for a closure. Scopes are shared, so a later
  /// `define` into a captured scope stays visible to the closure.
  pub fn capture(&self) -> ScopeChain {
    self.scopes.clone()
  }

  fn install_startup_bindings(&mut self) {
    let mut global = self.scopes[0].borrow_mut();
    global.insert("pi".into(), Expression::new(Atom::Number(PI)));
    global.insert("e".into(), Expression::new(Atom::Number(E)));
    global.insert(
      "I".into(),
      Expression::new(Atom::Complex(Complex::new(0.0, 1.0))),
    );
    for builtin in BUILTINS {
      global.insert(
        builtin.name.to_string(),
        Expression::new(Atom::Builtin(*builtin)),
      );
    }
  }
}

const BUILTINS: &[Builtin] = &[
  Builtin { name: "+", func: builtin_add },
  Builtin { name: "-", func: builtin_sub },
  Builtin { name: "*", func: builtin_mul },
  Builtin { name: "/", func: builtin_div },
  Builtin { name: "sqrt", func: builtin_sqrt },
  Builtin { name: "^", func: builtin_pow },
  Builtin { name: "ln", func: builtin_ln },
  Builtin { name: "sin", func: builtin_sin },
  Builtin { name: "cos", func: builtin_cos },
  Builtin { name: "tan", func: builtin_tan },
  Builtin { name: "real", func: builtin_real },
  Builtin { name: "imag", func: builtin_imag },
  Builtin { name: "mag", func: builtin_mag },
  Builtin { name: "arg", func: builtin_arg },
  Builtin { name: "conj", func: builtin_conj },
  Builtin { name: "list", func: builtin_list },
  Builtin { name: "first", func: builtin_first },
  Builtin { name: "rest", func: builtin_rest },
  Builtin { name: "length", func: builtin_length },
  Builtin { name: "append", func: builtin_append },
  Builtin { name: "join", func: builtin_join },
  Builtin { name: "range", func: builtin_range },
];

/// A real or complex operand; arithmetic promotes to complex when either
/// side is complex.
#[derive(Clone, Copy)]
enum Num {
  Real(f64),
  Cplx(Complex),
}

impl Num {
  fn of(expr: &Expression, proc_name: &str) -> Result<Num, EvalError> {
    match expr.head() {
      Atom::Number(n) => Ok(Num::Real(*n)),
      Atom::Complex(c) => Ok(Num::Cplx(*c)),
      _ => Err(EvalError::TypeMismatch(format!(
        "argument to {proc_name} is not a number"
      ))),
    }
  }

  fn complex(self) -> Complex {
    match self {
      Num::Real(n) => Complex::new(n, 0.0),
      Num::Cplx(c) => c,
    }
  }

  fn into_expression(self) -> Expression {
    match self {
      Num::Real(n) => Expression::new(Atom::Number(n)),
      Num::Cplx(c) => Expression::new(Atom::Complex(c)),
    }
  }
}

fn num_add(a: Num, b: Num) -> Num {
  match (a, b) {
    (Num::Real(x), Num::Real(y)) => Num::Real(x + y),
    _ => Num::Cplx(a.complex() + b.complex()),
  }
}

fn num_sub(a: Num, b: Num) -> Num {
  match (a, b) {
    (Num::Real(x), Num::Real(y)) => Num::Real(x - y),
    _ => Num::Cplx(a.complex() - b.complex()),
  }
}

fn num_mul(a: Num, b: Num) -> Num {
  match (a, b) {
    (Num::Real(x), Num::Real(y)) => Num::Real(x * y),
    _ => Num::Cplx(a.complex() * b.complex()),
  }
}

fn num_div(a: Num, b: Num) -> Num {
  match (a, b) {
    (Num::Real(x), Num::Real(y)) => Num::Real(x / y),
    _ => Num::Cplx(a.complex() / b.complex()),
  }
}

fn real_arg(expr: &Expression, proc_name: &str) -> Result<f64, EvalError> {
  expr.head().as_number().ok_or_else(|| {
    EvalError::TypeMismatch(format!("argument to {proc_name} is not a number"))
  })
}

fn complex_arg(expr: &Expression, proc_name: &str) -> Result<Complex, EvalError> {
  match expr.head() {
    Atom::Complex(c) => Ok(*c),
    _ => Err(EvalError::TypeMismatch(format!(
      "argument to {proc_name} is not complex"
    ))),
  }
}

fn list_arg<'a>(
  expr: &'a Expression,
  proc_name: &str,
) -> Result<&'a [Expression], EvalError> {
  if expr.is_head_list() {
    Ok(expr.tail())
  } else {
    Err(EvalError::TypeMismatch(format!(
      "argument to {proc_name} is not a list"
    )))
  }
}

fn builtin_add(args: &[Expression]) -> Result<Expression, EvalError> {
  let mut acc = Num::Real(0.0);
  for arg in args {
    acc = num_add(acc, Num::of(arg, "+")?);
  }
  Ok(acc.into_expression())
}

fn builtin_mul(args: &[Expression]) -> Result<Expression, EvalError> {
  let mut acc = Num::Real(1.0);
  for arg in args {
    acc = num_mul(acc, Num::of(arg, "*")?);
  }
  Ok(acc.into_expression())
}

fn builtin_sub(args: &[Expression]) -> Result<Expression, EvalError> {
  match args {
    [only] => {
      Ok(num_sub(Num::Real(0.0), Num::of(only, "-")?).into_expression())
    }
    [lhs, rhs] => {
      Ok(num_sub(Num::of(lhs, "-")?, Num::of(rhs, "-")?).into_expression())
    }
    _ => Err(EvalError::ArityMismatch(format!(
      "- takes one or two arguments, got {}",
      args.len()
    ))),
  }
}

fn builtin_div(args: &[Expression]) -> Result<Expression, EvalError> {
  match args {
    [only] => {
      Ok(num_div(Num::Real(1.0), Num::of(only, "/")?).into_expression())
    }
    [lhs, rhs] => {
      Ok(num_div(Num::of(lhs, "/")?, Num::of(rhs, "/")?).into_expression())
    }
    _ => Err(EvalError::ArityMismatch(format!(
      "/ takes one or two arguments, got {}",
      args.len()
    ))),
  }
}

fn builtin_sqrt(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "sqrt takes one argument, got {}",
      args.len()
    )));
  };
  Ok(match Num::of(arg, "sqrt")? {
    Num::Real(n) if n >= 0.0 => Expression::new(Atom::Number(n.sqrt())),
    // negative reals have a purely imaginary root
    Num::Real(n) => {
      Expression::new(Atom::Complex(Complex::new(0.0, (-n).sqrt())))
    }
    Num::Cplx(c) => Expression::new(Atom::Complex(c.sqrt())),
  })
}

fn builtin_pow(args: &[Expression]) -> Result<Expression, EvalError> {
  let [base, exp] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "^ takes two arguments, got {}",
      args.len()
    )));
  };
  let base = Num::of(base, "^")?;
  let exp = Num::of(exp, "^")?;
  Ok(match (base, exp) {
    (Num::Real(b), Num::Real(e)) => Expression::new(Atom::Number(b.powf(e))),
    _ => Expression::new(Atom::Complex(base.complex().powc(exp.complex()))),
  })
}

fn builtin_ln(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "ln takes one argument, got {}",
      args.len()
    )));
  };
  let value = real_arg(arg, "ln")?;
  if value <= 0.0 {
    return Err(EvalError::TypeMismatch(
      "argument to ln must be positive".into(),
    ));
  }
  Ok(Expression::new(Atom::Number(value.ln())))
}

fn builtin_sin(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "sin takes one argument, got {}",
      args.len()
    )));
  };
  Ok(Expression::new(Atom::Number(real_arg(arg, "sin")?.sin())))
}

fn builtin_cos(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "cos takes one argument, got {}",
      args.len()
    )));
  };
  Ok(Expression::new(Atom::Number(real_arg(arg, "cos")?.cos())))
}

fn builtin_tan(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "tan takes one argument, got {}",
      args.len()
    )));
  };
  Ok(Expression::new(Atom::Number(real_arg(arg, "tan")?.tan())))
}

fn builtin_real(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "real takes one argument, got {}",
      args.len()
    )));
  };
  Ok(Expression::new(Atom::Number(complex_arg(arg, "real")?.re)))
}

fn builtin_imag(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "imag takes one argument, got {}",
      args.len()
    )));
  };
  Ok(Expression::new(Atom::Number(complex_arg(arg, "imag")?.im)))
}

fn builtin_mag(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "mag takes one argument, got {}",
      args.len()
    )));
  };
  Ok(Expression::new(Atom::Number(complex_arg(arg, "mag")?.abs())))
}

fn builtin_arg(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "arg takes one argument, got {}",
      args.len()
    )));
  };
  Ok(Expression::new(Atom::Number(complex_arg(arg, "arg")?.arg())))
}

fn builtin_conj(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "conj takes one argument, got {}",
      args.len()
    )));
  };
  Ok(Expression::new(Atom::Complex(complex_arg(arg, "conj")?.conj())))
}

fn builtin_list(args: &[Expression]) -> Result<Expression, EvalError> {
  Ok(Expression::from_list(args.to_vec()))
}

fn builtin_first(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "first takes one argument, got {}",
      args.len()
    )));
  };
  let elements = list_arg(arg, "first")?;
  elements.first().cloned().ok_or_else(|| {
    EvalError::TypeMismatch("argument to first is an empty list".into())
  })
}

fn builtin_rest(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "rest takes one argument, got {}",
      args.len()
    )));
  };
  let elements = list_arg(arg, "rest")?;
  if elements.is_empty() {
    return Err(EvalError::TypeMismatch(
      "argument to rest is an empty list".into(),
    ));
  }
  Ok(Expression::from_list(elements[1..].to_vec()))
}

fn builtin_length(args: &[Expression]) -> Result<Expression, EvalError> {
  let [arg] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "length takes one argument, got {}",
      args.len()
    )));
  };
  let elements = list_arg(arg, "length")?;
  Ok(Expression::new(Atom::Number(elements.len() as f64)))
}

fn builtin_append(args: &[Expression]) -> Result<Expression, EvalError> {
  let [list, value] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "append takes a list and a value, got {} argument(s)",
      args.len()
    )));
  };
  let mut elements = list_arg(list, "append")?.to_vec();
  elements.push(value.clone());
  Ok(Expression::from_list(elements))
}

fn builtin_join(args: &[Expression]) -> Result<Expression, EvalError> {
  let [lhs, rhs] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "join takes two lists, got {} argument(s)",
      args.len()
    )));
  };
  let mut elements = list_arg(lhs, "join")?.to_vec();
  elements.extend_from_slice(list_arg(rhs, "join")?);
  Ok(Expression::from_list(elements))
}

fn builtin_range(args: &[Expression]) -> Result<Expression, EvalError> {
  let [lo, hi, step] = args else {
    return Err(EvalError::ArityMismatch(format!(
      "range takes a begin, an end, and an increment, got {} argument(s)",
      args.len()
    )));
  };
  let lo = real_arg(lo, "range")?;
  let hi = real_arg(hi, "range")?;
  let step = real_arg(step, "range")?;
  if lo >= hi {
    return Err(EvalError::TypeMismatch(
      "begin must be less than end in range".into(),
    ));
  }
  if step <= 0.0 {
    return Err(EvalError::TypeMismatch(
      "increment in range must be positive".into(),
    ));
  }
  let mut elements = Vec::new();
  let mut x = lo;
  while x <= hi {
    elements.push(Expression::new(Atom::Number(x)));
    x += step;
  }
  Ok(Expression::from_list(elements))
}
