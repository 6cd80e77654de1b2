mod common;
use common::{compile_and_run_stdout, compile_should_fail_with, compile_should_succeed};

#[test]
fn fields_start_at_zero() {
    let src = "class Main {
         public static void main(String[] args) {
             Point p = new Point();
             System.out.println(p.x);
             System.out.println(p.y);
         }
     }
     class Point { int x; int y; }";
    assert_eq!(compile_and_run_stdout(src), "0\n0\n");
}

#[test]
fn field_assignment_and_methods() {
    let src = "class Main {
         public static void main(String[] args) {
             Point p = new Point();
             p.x = 3;
             p.y = 4;
             System.out.println(p.sum());
             p.scale(10);
             System.out.println(p.x);
             System.out.println(p.y);
         }
     }
     class Point {
         int x;
         int y;
         public int sum() { return x + this.y; }
         public void scale(int k) { x = x * k; this.y = y * k; }
     }";
    assert_eq!(compile_and_run_stdout(src), "7\n30\n40\n");
}

#[test]
fn objects_are_references() {
    let src = "class Main {
         public static void main(String[] args) {
             Box a = new Box();
             Box b = a;
             b.v = 9;
             System.out.println(a.v);
             Box c = new Box();
             if (a == b) System.out.println(1);
             if (a != c) System.out.println(2);
         }
     }
     class Box { int v; }";
    assert_eq!(compile_and_run_stdout(src), "9\n1\n2\n");
}

#[test]
fn null_references() {
    let src = "class Main {
         public static void main(String[] args) {
             Node n = new Node();
             if (n.next == null) System.out.println(1);
             n.next = new Node();
             if (n.next != null) System.out.println(2);
             n.next = null;
             if (n.next == null) System.out.println(3);
         }
     }
     class Node { Node next; }";
    assert_eq!(compile_and_run_stdout(src), "1\n2\n3\n");
}

#[test]
fn chained_field_access() {
    let src = "class Main {
         public static void main(String[] args) {
             Node a = new Node();
             a.next = new Node();
             a.next.next = new Node();
             a.next.next.value = 42;
             System.out.println(a.next.next.value);
             System.out.println(a.next.length());
         }
     }
     class Node {
         int value;
         Node next;
         public int length() {
             if (next == null) return 1;
             return 1 + next.length();
         }
     }";
    assert_eq!(compile_and_run_stdout(src), "42\n2\n");
}

#[test]
fn static_fields_are_shared() {
    let src = "class Main {
         public static void main(String[] args) {
             Counter a = new Counter();
             Counter b = new Counter();
             a.bump();
             b.bump();
             b.bump();
             System.out.println(Counter.count);
             Counter.count = 100;
             a.bump();
             System.out.println(Counter.count);
         }
     }
     class Counter {
         static int count;
         public void bump() { count = count + 1; }
     }";
    assert_eq!(compile_and_run_stdout(src), "3\n101\n");
}

#[test]
fn static_fields_of_different_classes_are_distinct() {
    let src = "class Main {
         static int n;
         public static void main(String[] args) {
             n = 1;
             Other.n = 2;
             System.out.println(n);
             System.out.println(Other.n);
         }
     }
     class Other { static int n; }";
    assert_eq!(compile_and_run_stdout(src), "1\n2\n");
}

#[test]
fn instance_methods_calling_each_other() {
    let src = "class Main {
         public static void main(String[] args) {
             Acc acc = new Acc();
             System.out.println(acc.addTwice(5));
         }
     }
     class Acc {
         int total;
         public int addTwice(int n) { add(n); this.add(n); return total; }
         private void add(int n) { total = total + n; }
     }";
    assert_eq!(compile_and_run_stdout(src), "10\n");
}

#[test]
fn objects_passed_to_methods() {
    let src = "class Main {
         public static void main(String[] args) {
             Box b = new Box();
             fill(b, 77);
             System.out.println(b.v);
         }
         static void fill(Box target, int v) { target.v = v; }
     }
     class Box { int v; }";
    assert_eq!(compile_and_run_stdout(src), "77\n");
}

#[test]
fn private_field_of_same_class_is_accessible() {
    compile_should_succeed(
        "class Main {
             private int f;
             public static void main(String[] args) { }
             public void set() { this.f = 5; }
             public void copy(Main other) { other.f = f; }
         }",
    );
}

#[test]
fn private_field_of_other_class_is_rejected() {
    compile_should_fail_with(
        "class Main {
             public static void main(String[] args) {
                 Secret s = new Secret();
                 s.f = 5;
             }
         }
         class Secret { private int f; }",
        "Identification error: f is private in class Secret",
    );
}

#[test]
fn private_method_of_other_class_is_rejected() {
    compile_should_fail_with(
        "class Main {
             public static void main(String[] args) {
                 Secret s = new Secret();
                 s.hide();
             }
         }
         class Secret { private void hide() { } }",
        "hide is private in class Secret",
    );
}
