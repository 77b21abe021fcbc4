use super::*;

mod define_and_begin {
  use super::*;

  #[test]
  fn define_returns_the_bound_value() {
    assert_eq!(interpret("(define x 10)").unwrap(), "(10)");
  }

  #[test]
  fn begin_sequences_and_returns_the_last_value() {
    assert_eq!(interpret("(begin (define x 2) (+ x 1))").unwrap(), "(3)");
    assert_eq!(interpret("(begin 1 2 3)").unwrap(), "(3)");
  }

  #[test]
  fn user_symbols_may_be_redefined() {
    assert_eq!(
      interpret("(begin (define x 1) (define x 2) x)").unwrap(),
      "(2)"
    );
  }

  #[test]
  fn bindings_persist_across_session_evaluations() {
    let mut session = Interpreter::new();
    session.eval_str("(define answer 42)").unwrap();
    assert_eq!(session.eval_str("answer").unwrap().to_string(), "(42)");
  }
}

mod lambdas {
  use super::*;

  #[test]
  fn lambda_evaluates_to_a_procedure() {
    assert_eq!(interpret("(lambda (x) (+ x 1))").unwrap(), "(<procedure>)");
  }

  #[test]
  fn the_body_is_not_evaluated_eagerly() {
    // a body referencing an unbound symbol only fails when called
    assert_eq!(
      interpret("(lambda (x) (no-such-symbol x))").unwrap(),
      "(<procedure>)"
    );
  }

  #[test]
  fn identity_applied_through_apply() {
    assert_eq!(
      interpret("(apply (lambda (x) (begin x)) (list 5))").unwrap(),
      "(5)"
    );
  }

  #[test]
  fn defined_procedures_are_callable() {
    assert_eq!(
      interpret("(begin (define double (lambda (x) (* 2 x))) (double 21))")
        .unwrap(),
      "(42)"
    );
  }

  #[test]
  fn parameters_shadow_outer_bindings_without_leaking() {
    let mut session = Interpreter::new();
    session.eval_str("(define x 1)").unwrap();
    session
      .eval_str("(define square (lambda (x) (* x x)))")
      .unwrap();
    assert_eq!(session.eval_str("(square 5)").unwrap().to_string(), "(25)");
    assert_eq!(session.eval_str("x").unwrap().to_string(), "(1)");
  }

  #[test]
  fn closures_retain_their_defining_scope() {
    assert_eq!(
      interpret(
        "(begin \
           (define make-adder (lambda (n) (lambda (x) (+ x n)))) \
           (define add2 (make-adder 2)) \
           (add2 3))"
      )
      .unwrap(),
      "(5)"
    );
  }

  #[test]
  fn sibling_calls_do_not_share_scopes() {
    assert_eq!(
      interpret(
        "(begin \
           (define make-adder (lambda (n) (lambda (x) (+ x n)))) \
           (define add2 (make-adder 2)) \
           (define add10 (make-adder 10)) \
           (list (add2 1) (add10 1) (add2 1)))"
      )
      .unwrap(),
      "((3) (11) (3))"
    );
  }
}

mod apply_and_map {
  use super::*;

  #[test]
  fn apply_spreads_a_list_of_arguments() {
    assert_eq!(interpret("(apply + (list 1 2 3))").unwrap(), "(6)");
    assert_eq!(interpret("(apply + (range 1 4 1))").unwrap(), "(10)");
  }

  #[test]
  fn map_preserves_element_order() {
    assert_eq!(
      interpret("(map (lambda (x) (* 2 x)) (list 1 2 3))").unwrap(),
      "((2) (4) (6))"
    );
  }

  #[test]
  fn map_works_with_builtins() {
    assert_eq!(interpret("(map sqrt (list 1 4 9))").unwrap(), "((1) (2) (3))");
  }

  #[test]
  fn map_over_the_empty_list() {
    assert_eq!(interpret("(map sqrt (list))").unwrap(), "()");
  }
}
