use super::*;

mod taxonomy {
  use super::*;

  #[test]
  fn unbound_symbols() {
    assert!(matches!(
      interpret("no-such-symbol").unwrap_err(),
      InterpreterError::Eval(EvalError::UnboundSymbol(_))
    ));
    assert!(matches!(
      interpret("(+ 1 no-such-symbol)").unwrap_err(),
      InterpreterError::Eval(EvalError::UnboundSymbol(_))
    ));
  }

  #[test]
  fn calling_a_non_procedure() {
    assert!(matches!(
      interpret("(begin (define x 5) (x 1))").unwrap_err(),
      InterpreterError::Eval(EvalError::NotCallable(_))
    ));
    assert!(matches!(
      interpret("(apply 3 (list 1))").unwrap_err(),
      InterpreterError::Eval(EvalError::NotCallable(_))
    ));
  }

  #[test]
  fn arity_mismatches() {
    assert!(matches!(
      interpret("(apply (lambda (x y) (+ x y)) (list 1))").unwrap_err(),
      InterpreterError::Eval(EvalError::ArityMismatch(_))
    ));
    assert!(matches!(
      interpret("(sqrt 1 2)").unwrap_err(),
      InterpreterError::Eval(EvalError::ArityMismatch(_))
    ));
  }

  #[test]
  fn type_mismatches() {
    assert!(matches!(
      interpret("(+ 1 \"two\")").unwrap_err(),
      InterpreterError::Eval(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
      interpret("(first 3)").unwrap_err(),
      InterpreterError::Eval(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
      interpret("(first (list))").unwrap_err(),
      InterpreterError::Eval(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
      interpret("(real 3)").unwrap_err(),
      InterpreterError::Eval(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
      interpret("(1 2)").unwrap_err(),
      InterpreterError::Eval(EvalError::TypeMismatch(_))
    ));
  }

  #[test]
  fn malformed_special_forms() {
    for program in [
      "()",
      "(begin)",
      "(define x)",
      "(define 3 4)",
      "(define x 1 2)",
      "(lambda (x))",
      "(lambda (3) x)",
      "(apply +)",
      "(map +)",
    ] {
      assert!(
        matches!(
          interpret(program).unwrap_err(),
          InterpreterError::Eval(EvalError::MalformedSpecialForm(_))
        ),
        "expected a malformed-special-form error for {program}"
      );
    }
  }

  #[test]
  fn builtins_and_keywords_cannot_be_redefined() {
    assert!(matches!(
      interpret("(define define 1)").unwrap_err(),
      InterpreterError::Eval(EvalError::MalformedSpecialForm(_))
    ));
    assert!(matches!(
      interpret("(define + 1)").unwrap_err(),
      InterpreterError::Eval(EvalError::MalformedSpecialForm(_))
    ));
  }
}

mod recursion_ceiling {
  use super::*;

  #[test]
  fn runaway_recursion_is_reported_not_fatal() {
    let mut session = Interpreter::with_max_depth(64);
    session
      .eval_str("(define loop (lambda (x) (loop x)))")
      .unwrap();
    assert!(matches!(
      session.eval_str("(loop 1)").unwrap_err(),
      InterpreterError::Eval(EvalError::StackExhausted(64))
    ));
    // the session environment stays usable afterwards
    assert_eq!(session.eval_str("(+ 1 1)").unwrap().to_string(), "(2)");
  }

  #[test]
  fn deeply_nested_data_hits_the_same_ceiling() {
    let mut session = Interpreter::with_max_depth(32);
    let mut program = String::new();
    for _ in 0..40 {
      program.push_str("(list ");
    }
    program.push('1');
    for _ in 0..40 {
      program.push(')');
    }
    assert!(matches!(
      session.eval_str(&program).unwrap_err(),
      InterpreterError::Eval(EvalError::StackExhausted(32))
    ));
  }
}

mod failure_is_total {
  use super::*;

  #[test]
  fn a_failing_sub_evaluation_aborts_the_whole_expression() {
    let mut session = Interpreter::new();
    let err = session
      .eval_str("(begin (define x 1) (list (first (list)) (define x 2)))")
      .unwrap_err();
    assert!(matches!(
      err,
      InterpreterError::Eval(EvalError::TypeMismatch(_))
    ));
    // the later define never ran
    assert_eq!(session.eval_str("x").unwrap().to_string(), "(1)");
  }
}
