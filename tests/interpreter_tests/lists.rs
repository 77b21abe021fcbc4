use super::*;

mod construction {
  use super::*;

  #[test]
  fn list_builds_from_evaluated_elements() {
    assert_eq!(interpret("(list 1 2 3)").unwrap(), "((1) (2) (3))");
    assert_eq!(interpret("(list)").unwrap(), "()");
    assert_eq!(interpret("(list (+ 1 1) (* 2 2))").unwrap(), "((2) (4))");
  }

  #[test]
  fn lists_nest_and_mix_types() {
    assert_eq!(
      interpret("(list (list 1 2) 3)").unwrap(),
      "(((1) (2)) (3))"
    );
    assert_eq!(interpret("(list 1 \"two\")").unwrap(), "((1) (\"two\"))");
  }

  #[test]
  fn range_is_inclusive() {
    assert_eq!(interpret("(range 0 1 0.5)").unwrap(), "((0) (0.5) (1))");
    assert_eq!(interpret("(range 1 4 1)").unwrap(), "((1) (2) (3) (4))");
  }
}

mod access {
  use super::*;

  #[test]
  fn first_and_rest() {
    assert_eq!(interpret("(first (list 8 9))").unwrap(), "(8)");
    assert_eq!(interpret("(rest (list 1 2 3))").unwrap(), "((2) (3))");
  }

  #[test]
  fn length_counts_elements() {
    assert_eq!(interpret("(length (list 1 2 3))").unwrap(), "(3)");
    assert_eq!(interpret("(length (list))").unwrap(), "(0)");
  }

  #[test]
  fn append_and_join() {
    assert_eq!(interpret("(append (list 1 2) 3)").unwrap(), "((1) (2) (3))");
    assert_eq!(
      interpret("(join (list 1) (list 2 3))").unwrap(),
      "((1) (2) (3))"
    );
  }

  #[test]
  fn append_does_not_splice() {
    assert_eq!(
      interpret("(append (list 1) (list 2 3))").unwrap(),
      "((1) ((2) (3)))"
    );
  }
}
