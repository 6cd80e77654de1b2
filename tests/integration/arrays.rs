mod common;
use common::{compile_and_run_stdout, main_with};

#[test]
fn new_array_is_zeroed() {
    let out = compile_and_run_stdout(&main_with(
        "int[] xs = new int[3];
         System.out.println(xs[0] + xs[1] + xs[2]);",
    ));
    assert_eq!(out, "0\n");
}

#[test]
fn element_reads_and_writes() {
    let out = compile_and_run_stdout(&main_with(
        "int[] xs = new int[5];
         int i = 0;
         while (i < 5) {
             xs[i] = i * i;
             i = i + 1;
         }
         System.out.println(xs[4]);
         System.out.println(xs[2] + xs[3]);
         xs[xs[1]] = 50;
         System.out.println(xs[1]);",
    ));
    assert_eq!(out, "16\n13\n50\n");
}

#[test]
fn arrays_alias() {
    let out = compile_and_run_stdout(&main_with(
        "int[] a = new int[2];
         int[] b = a;
         b[1] = 8;
         System.out.println(a[1]);",
    ));
    assert_eq!(out, "8\n");
}

#[test]
fn array_size_from_expression() {
    let out = compile_and_run_stdout(&main_with(
        "int n = 4;
         int[] xs = new int[n * 25];
         xs[99] = 7;
         System.out.println(xs[99]);",
    ));
    assert_eq!(out, "7\n");
}

#[test]
fn arrays_of_objects() {
    let src = "class Main {
         public static void main(String[] args) {
             Cell[] cells = new Cell[3];
             int i = 0;
             while (i < 3) {
                 Cell c = new Cell();
                 c.v = i + 10;
                 cells[i] = c;
                 i = i + 1;
             }
             Cell last = cells[2];
             System.out.println(last.v);
             if (cells[0] != cells[1]) System.out.println(1);
         }
     }
     class Cell { int v; }";
    assert_eq!(compile_and_run_stdout(src), "12\n1\n");
}

#[test]
fn arrays_as_fields_and_arguments() {
    let src = "class Main {
         public static void main(String[] args) {
             Stack s = new Stack();
             s.init(10);
             s.push(4);
             s.push(5);
             s.push(6);
             System.out.println(sum(s.items, s.top));
             System.out.println(s.pop());
         }
         static int sum(int[] xs, int n) {
             int total = 0;
             int i = 0;
             while (i < n) { total = total + xs[i]; i = i + 1; }
             return total;
         }
     }
     class Stack {
         int[] items;
         int top;
         public void init(int cap) { items = new int[cap]; top = 0; }
         public void push(int v) { items[top] = v; top = top + 1; }
         public int pop() { top = top - 1; return items[top]; }
     }";
    assert_eq!(compile_and_run_stdout(src), "15\n6\n");
}

#[test]
fn null_array_reference() {
    let out = compile_and_run_stdout(&main_with(
        "int[] xs = null;
         if (xs == null) System.out.println(1);",
    ));
    assert_eq!(out, "1\n");
}
