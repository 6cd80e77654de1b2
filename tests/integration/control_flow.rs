mod common;
use common::{compile_and_run_stdout, main_with};

#[test]
fn if_without_else() {
    let out = compile_and_run_stdout(&main_with(
        "if (1 < 2) System.out.println(1);
         if (2 < 1) System.out.println(2);
         System.out.println(3);",
    ));
    assert_eq!(out, "1\n3\n");
}

#[test]
fn if_else_chain() {
    let src = "class Main {
         public static void main(String[] args) {
             classify(-5);
             classify(0);
             classify(12);
         }
         static void classify(int n) {
             if (n < 0) {
                 System.out.println(-1);
             } else if (n == 0) {
                 System.out.println(0);
             } else {
                 System.out.println(1);
             }
         }
     }";
    assert_eq!(compile_and_run_stdout(src), "-1\n0\n1\n");
}

#[test]
fn dangling_else_binds_to_nearest_if() {
    let out = compile_and_run_stdout(&main_with(
        "if (true) if (false) System.out.println(1); else System.out.println(2);",
    ));
    assert_eq!(out, "2\n");
}

#[test]
fn while_loop_counts() {
    let out = compile_and_run_stdout(&main_with(
        "int i = 0;
         while (i < 5) {
             System.out.println(i);
             i = i + 1;
         }",
    ));
    assert_eq!(out, "0\n1\n2\n3\n4\n");
}

#[test]
fn while_with_false_condition_never_runs() {
    let out = compile_and_run_stdout(&main_with(
        "while (false) System.out.println(1);
         System.out.println(2);",
    ));
    assert_eq!(out, "2\n");
}

#[test]
fn nested_loops_with_block_locals() {
    let out = compile_and_run_stdout(&main_with(
        "int total = 0;
         int i = 1;
         while (i <= 3) {
             int j = 1;
             while (j <= i) {
                 int product = i * j;
                 total = total + product;
                 j = j + 1;
             }
             i = i + 1;
         }
         System.out.println(total);",
    ));
    // 1 + (2 + 4) + (3 + 6 + 9)
    assert_eq!(out, "25\n");
}

#[test]
fn return_from_inside_a_loop() {
    let src = "class Main {
         public static void main(String[] args) {
             System.out.println(firstOver(50));
         }
         static int firstOver(int limit) {
             int n = 1;
             while (true) {
                 int sq = n * n;
                 if (sq > limit) { return n; }
                 n = n + 1;
             }
             return 0;
         }
     }";
    assert_eq!(compile_and_run_stdout(src), "8\n");
}

#[test]
fn early_return_from_void_method() {
    let src = "class Main {
         public static void main(String[] args) {
             report(3);
             report(-3);
         }
         static void report(int n) {
             if (n < 0) return;
             System.out.println(n);
         }
     }";
    assert_eq!(compile_and_run_stdout(src), "3\n");
}
