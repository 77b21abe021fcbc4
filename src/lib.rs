use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod atom;
pub mod environment;
pub mod expression;
mod plot;

pub use atom::{Atom, Complex};
pub use environment::Environment;
pub use expression::{Expression, SpecialForm};

#[derive(Parser)]
#[grammar = "plotscript.pest"]
pub struct PlotscriptParser;

/// Errors surfaced while evaluating an expression tree. Every kind is
/// recoverable at the top-level call boundary; `StackExhausted` aborts
/// the current evaluation unit but leaves the session usable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
  #[error("unbound symbol: {0}")]
  UnboundSymbol(String),
  #[error("type mismatch: {0}")]
  TypeMismatch(String),
  #[error("arity mismatch: {0}")]
  ArityMismatch(String),
  #[error("not callable: {0}")]
  NotCallable(String),
  #[error("malformed special form: {0}")]
  MalformedSpecialForm(String),
  #[error("evaluation exceeded the recursion ceiling of {0}")]
  StackExhausted(usize),
}

#[derive(Error, Debug)]
pub enum InterpreterError {
  #[error("Parse error: {0}")]
  ParseError(#[from] Box<pest::error::Error<Rule>>),
  #[error("Empty input")]
  EmptyInput,
  #[error("Evaluation error: {0}")]
  Eval(#[from] EvalError),
}

/// Parse a single program expression into an expression tree. Trailing
/// tokens after the expression are a parse error.
pub fn parse(input: &str) -> Result<Expression, InterpreterError> {
  if input.trim().is_empty() {
    return Err(InterpreterError::EmptyInput);
  }
  let mut pairs =
    PlotscriptParser::parse(Rule::program, input).map_err(Box::new)?;
  let program = pairs.next().ok_or(InterpreterError::EmptyInput)?;
  let expr = program
    .into_inner()
    .find(|pair| pair.as_rule() != Rule::EOI)
    .ok_or(InterpreterError::EmptyInput)?;
  Ok(build_expression(expr)?)
}

/// Build an expression tree from a pest pair: atoms become leaves, and a
/// combination's first element supplies the head atom.
fn build_expression(pair: Pair<Rule>) -> Result<Expression, EvalError> {
  match pair.as_rule() {
    Rule::number | Rule::string | Rule::symbol => {
      Ok(Expression::new(Atom::parse(pair.as_str())))
    }
    Rule::list => {
      let mut inner = pair.into_inner();
      let Some(head_pair) = inner.next() else {
        // () has nothing to evaluate; it surfaces as a malformed form
        return Ok(Expression::default());
      };
      let head_expr = build_expression(head_pair)?;
      if head_expr.is_head_list() || !head_expr.tail().is_empty() {
        return Err(EvalError::MalformedSpecialForm(
          "the first element of a combination must be an atom".into(),
        ));
      }
      let mut expr = Expression::new(head_expr.head().clone());
      for child in inner {
        expr.push(build_expression(child)?);
      }
      Ok(expr)
    }
    rule => Err(EvalError::MalformedSpecialForm(format!(
      "unexpected parse rule {rule:?}"
    ))),
  }
}

/// A persistent interpreter session: bindings survive across top-level
/// evaluations, and a failed evaluation leaves the environment usable
/// for the next one.
pub struct Interpreter {
  env: Environment,
}

impl Default for Interpreter {
  fn default() -> Self {
    Self::new()
  }
}

impl Interpreter {
  pub fn new() -> Self {
    Self {
      env: Environment::new(),
    }
  }

  /// Like `new`, with a custom recursion-depth ceiling.
  pub fn with_max_depth(max_depth: usize) -> Self {
    Self {
      env: Environment::with_max_depth(max_depth),
    }
  }

  /// Parse and evaluate one program expression in this session.
  pub fn eval_str(
    &mut self,
    input: &str,
  ) -> Result<Expression, InterpreterError> {
    let expr = parse(input)?;
    Ok(expr.eval(&mut self.env)?)
  }
}

/// Parse and evaluate `input` in a fresh environment and render the
/// result to its parenthesized display form.
pub fn interpret(input: &str) -> Result<String, InterpreterError> {
  let mut session = Interpreter::new();
  Ok(session.eval_str(input)?.to_string())
}
