use std::f64::consts::FRAC_PI_2;

use crate::atom::Atom;
use crate::environment::Environment;
use crate::expression::{
  apply_procedure, Expression, BOX_SIZE, LABEL_OFFSET, MARK_FRACTION,
};
use crate::EvalError;

impl Expression {
  /// `(set-property key value target)` returns a copy of the evaluated
  /// target with the property attached; the key must be a string.
  pub(crate) fn set_property_form(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if self.tail().len() != 3 {
      return Err(EvalError::MalformedSpecialForm(
        "set-property takes a key, a value, and a target".into(),
      ));
    }
    let key = self.tail()[0].eval_at(env, depth + 1)?;
    let Atom::Str(name) = key.head() else {
      return Err(EvalError::TypeMismatch(
        "the first argument to set-property must be a string".into(),
      ));
    };
    let name = name.clone();
    let value = self.tail()[1].eval_at(env, depth + 1)?;
    let mut target = self.tail()[2].eval_at(env, depth + 1)?;
    target.set_property(&name, value);
    Ok(target)
  }

  /// `(get-property key target)` returns the stored property expression,
  /// or NONE when the key is absent.
  pub(crate) fn get_property_form(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if self.tail().len() != 2 {
      return Err(EvalError::MalformedSpecialForm(
        "get-property takes a key and a target".into(),
      ));
    }
    let key = self.tail()[0].eval_at(env, depth + 1)?;
    let Atom::Str(name) = key.head() else {
      return Err(EvalError::TypeMismatch(
        "the first argument to get-property must be a string".into(),
      ));
    };
    let target = self.tail()[1].eval_at(env, depth + 1)?;
    Ok(target.get_property(name).cloned().unwrap_or_default())
  }

  /// `(discrete-plot data options)` builds a lollipop layout of a point
  /// list, scaled into the drawing box with axis and label furniture.
  pub(crate) fn discrete_plot(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if self.tail().len() != 2 {
      return Err(EvalError::MalformedSpecialForm(
        "discrete-plot takes a data list and an options list".into(),
      ));
    }
    let data = self.tail()[0].eval_at(env, depth + 1)?;
    if !data.is_head_list() {
      return Err(EvalError::TypeMismatch(
        "discrete-plot data must be a list of points".into(),
      ));
    }
    let points = data
      .tail()
      .iter()
      .map(point_coords)
      .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
      return Err(EvalError::TypeMismatch(
        "discrete-plot data must not be empty".into(),
      ));
    }
    let options =
      PlotOptions::from_expression(&self.tail()[1].eval_at(env, depth + 1)?)?;

    let bounds = Bounds::of(&points);
    let mut primitives = Vec::new();
    for &(x, y) in &points {
      let (sx, sy) = bounds.scale(x, y);
      let mut mark = make_point(sx, sy);
      mark.set_property("size", Expression::new(Atom::Number(MARK_FRACTION)));
      primitives.push(mark);
      primitives.push(make_line((sx, sy), (sx, bounds.stem_base()), 0.0));
    }
    primitives.extend(bounds.box_edges());
    primitives.extend(bounds.axis_lines());
    primitives.extend(bounds.tick_labels(options.text_scale));
    primitives.extend(options.captions(&bounds));
    Ok(Expression::from_discrete_plot(primitives))
  }

  /// `(continuous-plot proc bounds [options])` samples a unary procedure
  /// across the bounds and returns the polyline with the same furniture
  /// as a discrete plot.
  pub(crate) fn continuous_plot(
    &self,
    env: &mut Environment,
    depth: usize,
  ) -> Result<Expression, EvalError> {
    if self.tail().len() != 2 && self.tail().len() != 3 {
      return Err(EvalError::MalformedSpecialForm(
        "continuous-plot takes a procedure, bounds, and optional options"
          .into(),
      ));
    }
    let procedure = self.tail()[0].eval_at(env, depth + 1)?;
    if !procedure.is_head_procedure() {
      return Err(EvalError::NotCallable(procedure.to_string()));
    }
    let bounds_expr = self.tail()[1].eval_at(env, depth + 1)?;
    let (lo, hi) = match point_coords(&bounds_expr) {
      Ok(pair) => pair,
      Err(_) => {
        return Err(EvalError::TypeMismatch(
          "continuous-plot bounds must be a list of two numbers".into(),
        ))
      }
    };
    if lo >= hi {
      return Err(EvalError::TypeMismatch(
        "continuous-plot bounds must be increasing".into(),
      ));
    }
    let options = if let Some(opts) = self.tail().get(2) {
      PlotOptions::from_expression(&opts.eval_at(env, depth + 1)?)?
    } else {
      PlotOptions::default()
    };

    let segments = BOX_SIZE as usize;
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
      let x = lo + (hi - lo) * (i as f64) / BOX_SIZE;
      let value = apply_procedure(
        &procedure,
        &[Expression::new(Atom::Number(x))],
        env,
        depth,
      )?;
      let Atom::Number(y) = value.head() else {
        return Err(EvalError::TypeMismatch(
          "the sampled procedure must return numbers".into(),
        ));
      };
      points.push((x, *y));
    }

    let bounds = Bounds::of(&points);
    let mut primitives = Vec::new();
    for pair in points.windows(2) {
      primitives.push(make_line(
        bounds.scale(pair[0].0, pair[0].1),
        bounds.scale(pair[1].0, pair[1].1),
        0.0,
      ));
    }
    primitives.extend(bounds.box_edges());
    primitives.extend(bounds.axis_lines());
    primitives.extend(bounds.tick_labels(options.text_scale));
    primitives.extend(options.captions(&bounds));
    Ok(Expression::from_list(primitives))
  }
}

/// Data-space bounds of a plotted dataset and the scale factors mapping
/// it into the drawing box. Display-space y grows downward.
struct Bounds {
  xmin: f64,
  xmax: f64,
  ymin: f64,
  ymax: f64,
  xscale: f64,
  yscale: f64,
}

impl Bounds {
  fn of(points: &[(f64, f64)]) -> Self {
    let mut xmin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    let mut ymin = f64::INFINITY;
    let mut ymax = f64::NEG_INFINITY;
    for &(x, y) in points {
      xmin = xmin.min(x);
      xmax = xmax.max(x);
      ymin = ymin.min(y);
      ymax = ymax.max(y);
    }
    // a flat dataset still needs a finite box
    let xspan = if xmax > xmin { xmax - xmin } else { 1.0 };
    let yspan = if ymax > ymin { ymax - ymin } else { 1.0 };
    Self {
      xmin,
      xmax,
      ymin,
      ymax,
      xscale: BOX_SIZE / xspan,
      yscale: BOX_SIZE / yspan,
    }
  }

  fn scale(&self, x: f64, y: f64) -> (f64, f64) {
    (x * self.xscale, -y * self.yscale)
  }

  fn left(&self) -> f64 {
    self.xmin * self.xscale
  }

  fn right(&self) -> f64 {
    self.xmax * self.xscale
  }

  fn top(&self) -> f64 {
    -self.ymax * self.yscale
  }

  fn bottom(&self) -> f64 {
    -self.ymin * self.yscale
  }

  /// Stems drop to the x-axis when zero is in range, otherwise to the
  /// box edge nearest the data.
  fn stem_base(&self) -> f64 {
    if self.ymin <= 0.0 && 0.0 <= self.ymax {
      0.0
    } else if self.ymin > 0.0 {
      self.bottom()
    } else {
      self.top()
    }
  }

  fn box_edges(&self) -> Vec<Expression> {
    let (l, r, t, b) = (self.left(), self.right(), self.top(), self.bottom());
    vec![
      make_line((l, t), (r, t), 0.0),
      make_line((l, b), (r, b), 0.0),
      make_line((l, t), (l, b), 0.0),
      make_line((r, t), (r, b), 0.0),
    ]
  }

  fn axis_lines(&self) -> Vec<Expression> {
    let mut axes = Vec::new();
    if self.ymin < 0.0 && 0.0 < self.ymax {
      axes.push(make_line((self.left(), 0.0), (self.right(), 0.0), 0.0));
    }
    if self.xmin < 0.0 && 0.0 < self.xmax {
      axes.push(make_line((0.0, self.top()), (0.0, self.bottom()), 0.0));
    }
    axes
  }

  fn tick_labels(&self, text_scale: f64) -> Vec<Expression> {
    vec![
      make_text(
        &format_tick(self.xmin),
        (self.left(), self.bottom() + LABEL_OFFSET),
        text_scale,
        0.0,
      ),
      make_text(
        &format_tick(self.xmax),
        (self.right(), self.bottom() + LABEL_OFFSET),
        text_scale,
        0.0,
      ),
      make_text(
        &format_tick(self.ymin),
        (self.left() - LABEL_OFFSET, self.bottom()),
        text_scale,
        0.0,
      ),
      make_text(
        &format_tick(self.ymax),
        (self.left() - LABEL_OFFSET, self.top()),
        text_scale,
        0.0,
      ),
    ]
  }
}

/// Recognized `(key value)` options of the plot forms.
struct PlotOptions {
  title: Option<String>,
  abscissa_label: Option<String>,
  ordinate_label: Option<String>,
  text_scale: f64,
}

impl Default for PlotOptions {
  fn default() -> Self {
    Self {
      title: None,
      abscissa_label: None,
      ordinate_label: None,
      text_scale: 1.0,
    }
  }
}

impl PlotOptions {
  fn from_expression(options: &Expression) -> Result<Self, EvalError> {
    if !options.is_head_list() {
      return Err(EvalError::TypeMismatch(
        "plot options must be a list of (key value) pairs".into(),
      ));
    }
    let mut parsed = Self::default();
    for entry in options.tail() {
      if !entry.is_head_list() || entry.tail().len() != 2 {
        return Err(EvalError::TypeMismatch(
          "plot options must be (key value) pairs".into(),
        ));
      }
      let Atom::Str(key) = entry.tail()[0].head() else {
        return Err(EvalError::TypeMismatch(
          "plot option keys must be strings".into(),
        ));
      };
      let value = &entry.tail()[1];
      match key.as_str() {
        "title" => parsed.title = Some(text_payload(value)?),
        "abscissa-label" => parsed.abscissa_label = Some(text_payload(value)?),
        "ordinate-label" => parsed.ordinate_label = Some(text_payload(value)?),
        "text-scale" => match value.head() {
          Atom::Number(n) => parsed.text_scale = *n,
          _ => {
            return Err(EvalError::TypeMismatch(
              "the text-scale option must be a number".into(),
            ))
          }
        },
        _ => {
          return Err(EvalError::TypeMismatch(format!(
            "unknown plot option {key}"
          )))
        }
      }
    }
    Ok(parsed)
  }

  fn captions(&self, bounds: &Bounds) -> Vec<Expression> {
    let center_x = (bounds.left() + bounds.right()) / 2.0;
    let center_y = (bounds.top() + bounds.bottom()) / 2.0;
    let mut texts = Vec::new();
    if let Some(title) = &self.title {
      texts.push(make_text(
        title,
        (center_x, bounds.top() - LABEL_OFFSET),
        self.text_scale,
        0.0,
      ));
    }
    if let Some(label) = &self.abscissa_label {
      texts.push(make_text(
        label,
        (center_x, bounds.bottom() + LABEL_OFFSET),
        self.text_scale,
        0.0,
      ));
    }
    if let Some(label) = &self.ordinate_label {
      texts.push(make_text(
        label,
        (bounds.left() - LABEL_OFFSET, center_y),
        self.text_scale,
        -FRAC_PI_2,
      ));
    }
    texts
  }
}

fn point_coords(expr: &Expression) -> Result<(f64, f64), EvalError> {
  if expr.is_head_list() && expr.tail().len() == 2 {
    if let (Atom::Number(x), Atom::Number(y)) =
      (expr.tail()[0].head(), expr.tail()[1].head())
    {
      return Ok((*x, *y));
    }
  }
  Err(EvalError::TypeMismatch(
    "plot data entries must be lists of two numbers".into(),
  ))
}

fn text_payload(expr: &Expression) -> Result<String, EvalError> {
  match expr.head() {
    Atom::Str(s) if expr.tail().is_empty() => Ok(s.clone()),
    _ => Err(EvalError::TypeMismatch("plot labels must be strings".into())),
  }
}

fn make_point(x: f64, y: f64) -> Expression {
  Expression::from_list(vec![
    Expression::new(Atom::Number(x)),
    Expression::new(Atom::Number(y)),
  ])
}

fn make_line(from: (f64, f64), to: (f64, f64), thickness: f64) -> Expression {
  let mut line =
    Expression::from_list(vec![make_point(from.0, from.1), make_point(to.0, to.1)]);
  line.set_property("thickness", Expression::new(Atom::Number(thickness)));
  line
}

fn make_text(
  payload: &str,
  position: (f64, f64),
  scale: f64,
  rotation: f64,
) -> Expression {
  let mut text = Expression::new(Atom::Str(payload.to_string()));
  text.set_property("position", make_point(position.0, position.1));
  text.set_property("text-scale", Expression::new(Atom::Number(scale)));
  text.set_property("text-rotation", Expression::new(Atom::Number(rotation)));
  text
}

/// Tick values render with at most two decimal places.
fn format_tick(value: f64) -> String {
  let rounded = (value * 100.0).round() / 100.0;
  format!("{rounded}")
}
