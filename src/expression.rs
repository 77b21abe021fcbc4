use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::atom::{Atom, Lambda};
use crate::environment::Environment;
use crate::EvalError;

// Rendering-parameter constants: process-wide tunables shared by the
// plotting layout and the property getters, not per-instance state.

/// Edge length of the drawing box plot layouts are scaled into, and the
/// number of segments a continuous curve is sampled with.
pub const BOX_SIZE: f64 = 20.0;
/// Distance between the drawing box and the surrounding labels.
pub const LABEL_OFFSET: f64 = 3.0;
/// Size reported for a point with no "size" property.
pub const POINT_SIZE: f64 = 3.0;
/// Thickness reported for a line with no "thickness" property.
pub const LINE_THICKNESS: f64 = 2.0;
/// Scale reported for a text with no "text-scale" property.
pub const TEXT_SCALE: f64 = 2.0;
/// Rotation reported for a text with no "text-rotation" property, and the
/// marker size attached to plotted data points.
pub const MARK_FRACTION: f64 = 0.5;

/// An expression is a tree of atoms: a head atom followed by a possibly
/// empty ordered list of sub-expressions called the tail, plus a
/// string-keyed property map carrying rendering metadata on plottable
/// results.
#[derive(Debug, Clone, Default)]
pub struct Expression {
  head: Atom,
  tail: Vec<Expression>,
  properties: BTreeMap<String, Expression>,
}

// Structural and recursive: heads equal and tails pairwise equal in
// order. The property map does not participate in value equality.
impl PartialEq for Expression {
  fn eq(&self, other: &Self) -> bool {
    self.head == other.head && self.tail == other.tail
  }
}

impl Expression {
  /// A leaf expression with the given head and an empty tail.
  pub fn new(head: Atom) -> Self {
    Self {
      head,
      tail: Vec::new(),
      properties: BTreeMap::new(),
    }
  }

  /// A list expression owning the given elements.
  pub fn from_list(elements: Vec<Expression>) -> Self {
    Self {
      head: Atom::List,
      tail: elements,
      properties: BTreeMap::new(),
    }
  }

  /// An assembled discrete-plot result bundling layout primitives.
  pub fn from_discrete_plot(primitives: Vec<Expression>) -> Self {
    Self {
      head: Atom::DiscretePlot,
      tail: primitives,
      properties: BTreeMap::new(),
    }
  }

  pub fn head(&self) -> &Atom {
    &self.head
  }

  pub fn head_mut(&mut self) -> &mut Atom {
    &mut self.head
  }

  /// Append an atom to the tail as a new leaf child.
  pub fn append(&mut self, atom: Atom) {
    self.tail.push(Expression::new(atom));
  }

  /// Append an already-built sub-expression to the tail.
  pub fn push(&mut self, expr: Expression) {
    self.tail.push(expr);
  }

  /// Read-only view of the children, in order.
  pub fn tail(&self) -> &[Expression] {
    &self.tail
  }

  /// Deep copy of the tail as a standalone sequence.
  pub fn make_tail(&self) -> Vec<Expression> {
    self.tail.clone()
  }

  pub fn is_head_number(&self) -> bool {
    self.head.is_number()
  }

  pub fn is_head_symbol(&self) -> bool {
    self.head.is_symbol()
  }

  pub fn is_head_complex(&self) -> bool {
    self.head.is_complex()
  }

  pub fn is_head_list(&self) -> bool {
    self.head.is_list()
  }

  pub fn is_head_string(&self) -> bool {
    self.head.is_string()
  }

  pub fn is_head_none(&self) -> bool {
    self.head.is_none()
  }

  pub fn is_head_procedure(&self) -> bool {
    self.head.is_procedure()
  }

  /// A point is a list of exactly two numbers.
  pub fn is_point(&self) -> bool {
    self.is_head_list()
      && self.tail.len() == 2
      && self
        .tail
        .iter()
        .all(|e| e.is_head_number() && e.tail.is_empty())
  }

  /// A line is a list of exactly two points.
  pub fn is_line(&self) -> bool {
    self.is_head_list()
      && self.tail.len() == 2
      && self.tail.iter().all(Expression::is_point)
  }

  /// A text is a string leaf; its placement lives in the property map.
  pub fn is_text(&self) -> bool {
    self.is_head_string() && self.tail.is_empty()
  }

  /// A discrete plot bundles point, line, and text primitives.
  pub fn is_discrete(&self) -> bool {
    matches!(self.head, Atom::DiscretePlot)
      && self
        .tail
        .iter()
        .all(|e| e.is_point() || e.is_line() || e.is_text())
  }

  /// Attach or overwrite a named rendering property.
  pub fn set_property(&mut self, name: &str, value: Expression) {
    self.properties.insert(name.to_string(), value);
  }

  pub fn get_property(&self, name: &str) -> Option<&Expression> {
    self.properties.get(name)
  }

  fn numeric_property(&self, name: &str, default: f64) -> f64 {
    self
      .properties
      .get(name)
      .and_then(|e| e.head.as_number())
      .unwrap_or(default)
  }

  pub fn get_size(&self) -> f64 {
    self.numeric_property("size", POINT_SIZE)
  }

  pub fn get_thickness(&self) -> f64 {
    self.numeric_property("thickness", LINE_THICKNESS)
  }

  pub fn get_text_scale(&self) -> f64 {
    self.numeric_property("text-scale", TEXT_SCALE)
  }

  pub fn get_text_rotation(&self) -> f64 {
    self.numeric_property("text-rotation", MARK_FRACTION)
  }

  /// Position of a text primitive: the "position" property, or the origin.
  pub fn get_position(&self) -> Expression {
    self.properties.get("position").cloned().unwrap_or_else(|| {
      Expression::from_list(vec![
        Expression::new(Atom::Number(0.0)),
        Expression::new(Atom::Number(0.0)),
      ])
    })
  }

  /// Render the head to text: the number/symbol/complex form, the raw
  /// payload for strings, and the full parenthesized form for lists.
  pub fn make_string(&self) -> String {
    match &self.head {
      Atom::Str(s) => s.clone(),
      Atom::List | Atom::DiscretePlot => self.to_string(),
      other => other.to_string(),
    }
  }
}

impl fmt::Display for Expression {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.head.is_none() && self.tail.is_empty() {
      return write!(f, "NONE");
    }
    write!(f, "({}", self.head)?;
    let mut first = matches!(self.head, Atom::List | Atom::DiscretePlot);
    for child in &self.tail {
      if first {
        first = false;
      } else {
        write!(f, " ")?;
      }
      write!(f, "{child}")?;
    }
    write!(f, ")")
  }
}

/// The closed set of head symbols evaluated by custom rules rather than
/// generic procedure application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
  Define,
  Begin,
  Lambda,
  Apply,
  Map,
  SetProperty,
  GetProperty,
  DiscretePlot,
  ContinuousPlot,
}

impl SpecialForm {
  pub fn from_symbol(name: &str) -> Option<Self> {
    Some(match name {
      "define" => Self::Define,
      "begin" => Self::Begin,
      "lambda" => Self::Lambda,
      "apply" => Self::Apply,
      "map" => Self::Map,
      "set-property" => Self::SetProperty,
      "get-property" => Self::GetProperty,
      "discrete-plot" => Self::DiscretePlot,
      "continuous-plot" => Self::ContinuousPlot,
      _ => return None,
    })
  }

  /// True for names that `define` must refuse to rebind.
  pub fn is_keyword(name: &str) -> bool {
    Self::from_symbol(name).is_some()
  }
}

impl Expression {
  /// Evaluate by post-order traversal against the given environment.
  pub fn eval(&self, env: &mut Environment) -> Result<Expression, EvalError> {
    self.eval_at(env, 0)
  }

  pub(crate) fn eval_at(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if depth >= env.max_depth() {
      return Err(EvalError::StackExhausted(env.max_depth()));
    }
    match &self.head {
      Atom::Number(_) | Atom::Complex(_) | Atom::Str(_) => {
        if self.tail.is_empty() {
          Ok(self.clone())
        } else {
          Err(EvalError::TypeMismatch(
            "a literal head takes no arguments".into(),
          ))
        }
      }
      Atom::Builtin(_) | Atom::Lambda(_) => Ok(self.clone()),
      Atom::List | Atom::DiscretePlot => {
        // already-evaluated data; children re-evaluate first
        let tail = self
          .tail
          .iter()
          .map(|e| e.eval_at(env, depth + 1))
          .collect::<Result<Vec<_>, _>>()?;
        Ok(Expression {
          head: self.head.clone(),
          tail,
          properties: self.properties.clone(),
        })
      }
      Atom::None => Err(EvalError::MalformedSpecialForm(
        "nothing to evaluate".into(),
      )),
      Atom::Symbol(name) => {
        if let Some(form) = SpecialForm::from_symbol(name) {
          self.eval_special(form, env, depth)
        } else if self.tail.is_empty() {
          self.handle_lookup(name, env)
        } else {
          self.handle_call(name, env, depth)
        }
      }
    }
  }

  fn eval_special(
    &self,
    form: SpecialForm,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    match form {
      SpecialForm::Define => self.handle_define(env, depth),
      SpecialForm::Begin => self.handle_begin(env, depth),
      SpecialForm::Lambda => self.handle_lambda(env),
      SpecialForm::Apply => self.handle_apply(env, depth),
      SpecialForm::Map => self.handle_map(env, depth),
      SpecialForm::SetProperty => self.set_property_form(env, depth),
      SpecialForm::GetProperty => self.get_property_form(env, depth),
      SpecialForm::DiscretePlot => self.discrete_plot(env, depth),
      SpecialForm::ContinuousPlot => self.continuous_plot(env, depth),
    }
  }

  fn handle_lookup(
    &self,
    name: &str,
    env: &Environment,
  ) -> Result<Expression, EvalError> {
    env
      .lookup(name)
      .ok_or_else(|| EvalError::UnboundSymbol(name.to_string()))
  }

  fn handle_define(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if self.tail.len() != 2 {
      return Err(EvalError::MalformedSpecialForm(
        "define takes a symbol and a value".into(),
      ));
    }
    // the symbol being defined is not evaluated
    let name = match self.tail[0].head() {
      Atom::Symbol(s) if self.tail[0].tail.is_empty() => s.clone(),
      _ => {
        return Err(EvalError::MalformedSpecialForm(
          "the first argument to define must be a symbol".into(),
        ))
      }
    };
    let value = self.tail[1].eval_at(env, depth + 1)?;
    env.define(&name, value.clone())?;
    Ok(value)
  }

  fn handle_begin(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if self.tail.is_empty() {
      return Err(EvalError::MalformedSpecialForm(
        "begin requires at least one expression".into(),
      ));
    }
    let mut result = Expression::default();
    for child in &self.tail {
      result = child.eval_at(env, depth + 1)?;
    }
    Ok(result)
  }

  fn handle_lambda(&self, env: &Environment) -> Result<Expression, EvalError> {
    if self.tail.len() != 2 {
      return Err(EvalError::MalformedSpecialForm(
        "lambda takes a parameter list and a body".into(),
      ));
    }
    let formals = &self.tail[0];
    let mut params = Vec::with_capacity(formals.tail.len() + 1);
    match formals.head() {
      Atom::Symbol(s) => params.push(s.clone()),
      _ => {
        return Err(EvalError::MalformedSpecialForm(
          "lambda parameters must be symbols".into(),
        ))
      }
    }
    for formal in &formals.tail {
      match formal.head() {
        Atom::Symbol(s) if formal.tail.is_empty() => params.push(s.clone()),
        _ => {
          return Err(EvalError::MalformedSpecialForm(
            "lambda parameters must be symbols".into(),
          ))
        }
      }
    }
    Ok(Expression::new(Atom::Lambda(Rc::new(Lambda {
      params,
      body: self.tail[1].clone(),
      env: env.capture(),
    }))))
  }

  fn handle_apply(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if self.tail.len() != 2 {
      return Err(EvalError::MalformedSpecialForm(
        "apply takes a procedure and an argument list".into(),
      ));
    }
    let procedure = self.tail[0].eval_at(env, depth + 1)?;
    let args = self.tail[1].eval_at(env, depth + 1)?;
    if !args.is_head_list() {
      return Err(EvalError::TypeMismatch(
        "the second argument to apply must be a list".into(),
      ));
    }
    apply_procedure(&procedure, args.tail(), env, depth)
  }

  fn handle_map(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if self.tail.len() != 2 {
      return Err(EvalError::MalformedSpecialForm(
        "map takes a procedure and a list".into(),
      ));
    }
    let procedure = self.tail[0].eval_at(env, depth + 1)?;
    let list = self.tail[1].eval_at(env, depth + 1)?;
    if !list.is_head_list() {
      return Err(EvalError::TypeMismatch(
        "the second argument to map must be a list".into(),
      ));
    }
    // left-to-right, preserving order for observable side effects
    let mut results = Vec::with_capacity(list.tail().len());
    for element in list.tail() {
      results.push(apply_procedure(
        &procedure,
        std::slice::from_ref(element),
        env,
        depth,
      )?);
    }
    Ok(Expression::from_list(results))
  }

  fn handle_call(
    &self,
    name: &str,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    // post-order: children first, left to right
    let mut args = Vec::with_capacity(self.tail.len());
    for child in &self.tail {
      args.push(child.eval_at(env, depth + 1)?);
    }
    let procedure = env
      .lookup(name)
      .ok_or_else(|| EvalError::UnboundSymbol(name.to_string()))?;
    apply_procedure(&procedure, &args, env, depth)
  }
}

/// Invoke an evaluated procedure expression with evaluated arguments.
/// Lambdas run in a call environment built from their captured scope
/// chain, with one pushed scope binding formals to arguments.
pub(crate) fn apply_procedure(
  procedure: &Expression,
  args: &[Expression],
  env: &Environment,
  depth: usize,
) -> Result<Expression, EvalError> {
  match procedure.head() {
    Atom::Builtin(builtin) => (builtin.func)(args),
    Atom::Lambda(lambda) => {
      if lambda.params.len() != args.len() {
        return Err(EvalError::ArityMismatch(format!(
          "procedure expects {} argument(s), got {}",
          lambda.params.len(),
          args.len()
        )));
      }
      let mut call_env =
        Environment::from_chain(lambda.env.clone(), env.max_depth());
      call_env.push_scope();
      for (param, arg) in lambda.params.iter().zip(args) {
        call_env.define(param, arg.clone())?;
      }
      let result = lambda.body.eval_at(&mut call_env, depth + 1);
      call_env.pop_scope();
      result
    }
    _ => Err(EvalError::NotCallable(procedure.to_string())),
  }
}
