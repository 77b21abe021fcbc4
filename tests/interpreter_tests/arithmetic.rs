use super::*;

mod real_arithmetic {
  use super::*;

  #[test]
  fn literals_evaluate_to_themselves() {
    assert_eq!(interpret("42").unwrap(), "(42)");
    assert_eq!(interpret("-1.5").unwrap(), "(-1.5)");
    assert_eq!(interpret("\"hello\"").unwrap(), "(\"hello\")");
  }

  #[test]
  fn addition_is_m_ary() {
    assert_eq!(interpret("(+ 1 2)").unwrap(), "(3)");
    assert_eq!(interpret("(+ 1 2 3 4)").unwrap(), "(10)");
  }

  #[test]
  fn subtraction_is_unary_or_binary() {
    assert_eq!(interpret("(- 5 8)").unwrap(), "(-3)");
    assert_eq!(interpret("(- 5)").unwrap(), "(-5)");
  }

  #[test]
  fn multiplication_and_division() {
    assert_eq!(interpret("(* 2 3.5)").unwrap(), "(7)");
    assert_eq!(interpret("(/ 8 2)").unwrap(), "(4)");
    assert_eq!(interpret("(/ 2)").unwrap(), "(0.5)");
  }

  #[test]
  fn power_log_and_trig() {
    assert_eq!(interpret("(^ 2 10)").unwrap(), "(1024)");
    assert_eq!(interpret("(sqrt 16)").unwrap(), "(4)");
    assert_eq!(interpret("(ln 1)").unwrap(), "(0)");
    assert_eq!(interpret("(sin 0)").unwrap(), "(0)");
    assert_eq!(interpret("(cos 0)").unwrap(), "(1)");
    assert_eq!(interpret("(tan 0)").unwrap(), "(0)");
  }

  #[test]
  fn nested_combinations_evaluate_post_order() {
    assert_eq!(interpret("(+ (* 2 3) (- 10 4))").unwrap(), "(12)");
  }

  #[test]
  fn named_constants_are_bound() {
    assert_eq!(
      interpret("pi").unwrap(),
      format!("({})", std::f64::consts::PI)
    );
    assert_eq!(
      interpret("e").unwrap(),
      format!("({})", std::f64::consts::E)
    );
  }
}

mod complex_arithmetic {
  use super::*;

  #[test]
  fn the_imaginary_unit_is_bound() {
    assert_eq!(interpret("I").unwrap(), "(0,1)");
  }

  #[test]
  fn sqrt_of_a_negative_real_is_complex() {
    assert_eq!(interpret("(sqrt -1)").unwrap(), "(0,1)");
    assert_eq!(interpret("(sqrt -4)").unwrap(), "(0,2)");
  }

  #[test]
  fn arithmetic_promotes_to_complex() {
    assert_eq!(interpret("(+ 3 (* 4 I))").unwrap(), "(3,4)");
    assert_eq!(interpret("(* I I)").unwrap(), "(-1,0)");
  }

  #[test]
  fn complex_accessors() {
    assert_eq!(interpret("(real (+ 3 (* 4 I)))").unwrap(), "(3)");
    assert_eq!(interpret("(imag (+ 3 (* 4 I)))").unwrap(), "(4)");
    assert_eq!(interpret("(mag (+ 3 (* 4 I)))").unwrap(), "(5)");
    assert_eq!(interpret("(conj (+ 3 (* 4 I)))").unwrap(), "(3,-4)");
    assert_eq!(interpret("(arg (+ 1 (* 0 I)))").unwrap(), "(0)");
  }
}
