mod common;
use common::{compile_should_fail_with, compile_should_succeed, main_with};

#[test]
fn duplicate_field() {
    compile_should_fail_with(
        "class Main { int x; int x; public static void main(String[] args) { } }",
        "Identification error: x already exists in this scope",
    );
}

#[test]
fn field_and_method_share_a_namespace() {
    compile_should_fail_with(
        "class Main { int run; void run() { } public static void main(String[] args) { } }",
        "run already exists in this scope",
    );
}

#[test]
fn duplicate_method() {
    compile_should_fail_with(
        "class Main { void m() { } void m() { } public static void main(String[] args) { } }",
        "m already exists in this scope",
    );
}

#[test]
fn duplicate_class() {
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { } } class Main { }",
        "Main already exists in this scope",
    );
}

#[test]
fn class_may_not_shadow_a_builtin() {
    compile_should_fail_with(
        "class System { } class Main { public static void main(String[] args) { } }",
        "System already exists in this scope",
    );
}

#[test]
fn duplicate_parameter() {
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { } static void f(int a, boolean a) { } }",
        "a already exists in this scope",
    );
}

#[test]
fn duplicate_local() {
    compile_should_fail_with(&main_with("int a = 1; int a = 2;"), "a already exists in this scope");
}

#[test]
fn local_may_not_redeclare_a_parameter() {
    compile_should_fail_with(&main_with("int args = 1;"), "args already exists in this scope");
}

#[test]
fn inner_block_may_shadow() {
    compile_should_succeed(&main_with("int a = 1; { int b = a; { int c = b; } }"));
}

#[test]
fn undeclared_variable() {
    compile_should_fail_with(&main_with("int x = y;"), "declaration not found: y");
}

#[test]
fn variable_used_after_its_block() {
    compile_should_fail_with(&main_with("{ int a = 1; } a = 2;"), "declaration not found: a");
}

#[test]
fn undeclared_class() {
    compile_should_fail_with(&main_with("Widget w = null;"), "undeclared class: Widget");
    compile_should_fail_with(&main_with("int[] w = new Widget[2];"), "undeclared class: Widget");
}

#[test]
fn unknown_member() {
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { Box b = new Box(); b.w = 1; } } class Box { int v; }",
        "declaration not found: w in class Box",
    );
}

#[test]
fn member_of_non_object() {
    compile_should_fail_with(&main_with("int n = 1; n.x = 2;"), "n has type int, which has no member x");
}

#[test]
fn variable_in_its_own_initializer() {
    compile_should_fail_with(&main_with("int x = x + 1;"), "variable x cannot be used in its own initializer");
}

#[test]
fn this_in_static_method() {
    compile_should_fail_with(
        "class Main { int f; public static void main(String[] args) { this.f = 1; } }",
        "this cannot be used in a static method",
    );
}

#[test]
fn instance_members_from_static_context() {
    compile_should_fail_with(
        "class Main { int f; public static void main(String[] args) { f = 1; } }",
        "non-static field f cannot be referenced from a static context",
    );
    compile_should_fail_with(
        "class Main { void g() { } public static void main(String[] args) { g(); } }",
        "non-static method g cannot be referenced from a static context",
    );
}

#[test]
fn instance_member_through_class_name() {
    compile_should_fail_with(
        "class Main { public static void main(String[] args) { Box.v = 1; } } class Box { int v; }",
        "non-static member v cannot be accessed through class Box",
    );
}

#[test]
fn solitary_declaration_as_branch() {
    compile_should_fail_with(
        &main_with("if (true) int x = 1;"),
        "solitary variable declaration statement not permitted here",
    );
    compile_should_fail_with(
        &main_with("while (false) int x = 1;"),
        "solitary variable declaration statement not permitted here",
    );
}

#[test]
fn calling_a_non_method() {
    compile_should_fail_with(&main_with("int x = 1; x();"), "x is not a method");
    compile_should_fail_with(
        "class Main { void m() { this(); } public static void main(String[] args) { } }",
        "this is not allowed as a method call",
    );
}

#[test]
fn method_or_class_as_value() {
    compile_should_fail_with(
        "class Main { static int g() { return 1; } public static void main(String[] args) { int x = g; } }",
        "method g cannot be used as a value",
    );
    compile_should_fail_with(&main_with("int x = Main;"), "class Main cannot be used as a value");
}

#[test]
fn assigning_to_this() {
    compile_should_fail_with(
        "class Main { void m() { this = null; } public static void main(String[] args) { } }",
        "cannot assign to this",
    );
}
