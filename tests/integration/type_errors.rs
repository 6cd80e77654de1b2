mod common;
use common::{compile, compile_should_fail_with, compile_should_succeed, main_with};

#[test]
fn boolean_field_assigned_an_int() {
    compile_should_fail_with(
        "class Main {
             static boolean b;
             public static void main(String[] args) { b = 3; }
         }",
        "Type error: types do not match for assignment to b: expected boolean, found int",
    );
}

#[test]
fn int_field_assigned_an_int() {
    compile_should_succeed(
        "class Main {
             static int n;
             public static void main(String[] args) { n = 3; }
         }",
    );
}

#[test]
fn declaration_mismatch() {
    compile_should_fail_with(
        &main_with("int x = true;"),
        "types do not match for declaration of x: expected int, found boolean",
    );
}

#[test]
fn null_into_objects_and_arrays_only() {
    compile_should_succeed(
        "class Main { public static void main(String[] args) { Main m = null; int[] xs = null; } }",
    );
    compile_should_fail_with(&main_with("int x = null;"), "expected int, found null");
}

#[test]
fn distinct_classes_are_incompatible() {
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { A a = new B(); } } class A { } class B { }",
        "expected A, found B",
    );
}

#[test]
fn operator_operand_types() {
    compile_should_fail_with(&main_with("int x = 1 + true;"), "for +, both sides must be of type int");
    compile_should_fail_with(&main_with("boolean b = 1 && true;"), "for &&, both sides must be of type boolean");
    compile_should_fail_with(&main_with("boolean b = true < false;"), "for <, both sides must be of type int");
    compile_should_fail_with(&main_with("boolean b = 1 == true;"), "for ==, both sides must have the same type");
    compile_should_fail_with(&main_with("boolean b = !1;"), "operator ! requires boolean, found int");
    compile_should_fail_with(&main_with("int x = -true;"), "operator - requires int, found boolean");
}

#[test]
fn conditions_must_be_boolean() {
    compile_should_fail_with(&main_with("if (1) { }"), "if condition must be of type boolean, found int");
    compile_should_fail_with(&main_with("while (0) { }"), "while condition must be of type boolean, found int");
}

#[test]
fn array_typing() {
    compile_should_fail_with(&main_with("int[] xs = new int[true];"), "array size must be of type int, found boolean");
    compile_should_fail_with(&main_with("int[] xs = new int[2]; xs[true] = 1;"), "index expression must be of type int");
    compile_should_fail_with(&main_with("int[] xs = new int[2]; xs[0] = false;"), "types do not match for element of xs");
    compile_should_fail_with(&main_with("int n = 3; int m = n[0];"), "n has type int and cannot be indexed");
}

#[test]
fn return_typing() {
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { } static int f() { return true; } }",
        "return type mismatch: expected int, found boolean",
    );
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { return 1; } }",
        "return expression not allowed in a void method",
    );
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { } static int f() { return; } }",
        "missing return value of type int",
    );
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { } static int f() { int x = 1; } }",
        "missing return statement in method f",
    );
}

#[test]
fn call_arity_and_argument_types() {
    let src = |call: &str| {
        format!(
            "class Main {{ public static void main(String[] args) {{ {call} }} static int f(int a, boolean b) {{ return a; }} }}"
        )
    };
    compile_should_fail_with(&src("f(1);"), "method f expects 2 argument(s), found 1");
    compile_should_fail_with(&src("f(true, true);"), "argument 1 of f: expected int, found boolean");
    compile_should_succeed(&src("int r = f(1, false);"));
}

#[test]
fn println_takes_an_int() {
    compile_should_fail_with(
        &main_with("System.out.println(true);"),
        "argument 1 of System.out.println: expected int, found boolean",
    );
}

#[test]
fn every_type_error_is_reported() {
    let (output, _dir, bin) = compile(&main_with("int a = true; boolean b = 1; if (3) { }"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!output.status.success());
    assert_eq!(stdout.lines().filter(|l| l.contains("Type error")).count(), 3, "{stdout}");
    assert!(!bin.exists());
}

#[test]
fn void_results_cannot_be_compared() {
    compile_should_fail_with(
        "class Main {
             static void v() { }
             public static void main(String[] args) { boolean b = v() == v(); }
         }",
        "found void and void",
    );
}
