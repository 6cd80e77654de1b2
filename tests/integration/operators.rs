mod common;
use common::{compile_and_run_stdout, main_with};

fn eval(expr: &str) -> String {
    compile_and_run_stdout(&main_with(&format!("System.out.println({expr});")))
}

/// Print 1 or 0 for a boolean expression.
fn eval_bool(expr: &str) -> String {
    compile_and_run_stdout(&main_with(&format!(
        "if ({expr}) {{ System.out.println(1); }} else {{ System.out.println(0); }}"
    )))
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(eval("2 + 3 * 4"), "14\n");
    assert_eq!(eval("2 * 3 + 4"), "10\n");
}

#[test]
fn parentheses_override_precedence() {
    assert_eq!(eval("(2 + 3) * 4"), "20\n");
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(eval("10 - 3 - 2"), "5\n");
    assert_eq!(eval("100 / 10 / 5"), "2\n");
}

#[test]
fn division_truncates_toward_zero() {
    assert_eq!(eval("7 / 2"), "3\n");
    assert_eq!(eval("-7 / 2"), "-3\n");
    assert_eq!(eval("7 / -2"), "-3\n");
}

#[test]
fn unary_minus() {
    assert_eq!(eval("-3 + 5"), "2\n");
    assert_eq!(eval("- -4"), "4\n");
    assert_eq!(eval("2 * -3"), "-6\n");
}

#[test]
fn arithmetic_is_64_bit() {
    assert_eq!(eval("2147483647 + 1"), "2147483648\n");
    assert_eq!(eval("100000 * 100000"), "10000000000\n");
}

#[test]
fn relational_operators() {
    assert_eq!(eval_bool("1 < 2"), "1\n");
    assert_eq!(eval_bool("2 < 2"), "0\n");
    assert_eq!(eval_bool("2 <= 2"), "1\n");
    assert_eq!(eval_bool("3 > 2"), "1\n");
    assert_eq!(eval_bool("2 >= 3"), "0\n");
    assert_eq!(eval_bool("-1 < 0"), "1\n");
}

#[test]
fn equality_operators() {
    assert_eq!(eval_bool("3 == 3"), "1\n");
    assert_eq!(eval_bool("3 != 3"), "0\n");
    assert_eq!(eval_bool("true == false"), "0\n");
    assert_eq!(eval_bool("true != false"), "1\n");
}

#[test]
fn logical_operators() {
    assert_eq!(eval_bool("true && false"), "0\n");
    assert_eq!(eval_bool("true || false"), "1\n");
    assert_eq!(eval_bool("!false"), "1\n");
    assert_eq!(eval_bool("!(1 < 2) || 2 < 1"), "0\n");
    assert_eq!(eval_bool("1 < 2 && 2 < 3 && !(3 < 2)"), "1\n");
}

#[test]
fn and_binds_tighter_than_or() {
    assert_eq!(eval_bool("true || false && false"), "1\n");
    assert_eq!(eval_bool("(true || false) && false"), "0\n");
}

#[test]
fn both_operands_of_logical_operators_are_evaluated() {
    let out = compile_and_run_stdout(
        "class Main {
             public static void main(String[] args) {
                 boolean b = yes(1) || yes(2);
                 boolean c = no(3) && no(4);
             }
             static boolean yes(int tag) { System.out.println(tag); return true; }
             static boolean no(int tag) { System.out.println(tag); return false; }
         }",
    );
    assert_eq!(out, "1\n2\n3\n4\n");
}

#[test]
fn operands_evaluate_left_to_right() {
    let out = compile_and_run_stdout(
        "class Main {
             public static void main(String[] args) {
                 System.out.println(tag(1) - tag(2));
             }
             static int tag(int n) { System.out.println(n); return n * 10; }
         }",
    );
    assert_eq!(out, "1\n2\n-10\n");
}
