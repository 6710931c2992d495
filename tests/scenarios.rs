//! End-to-end scenarios: parse a whole program, run it against a
//! `BufferHost`, assert on printed output and/or exit status.

use microc::eval::{BufferHost, Interpreter};
use microc::front::parse;

fn run(src: &str, input: impl IntoIterator<Item = i32>) -> (i32, Vec<i32>) {
    let tu = parse(src).unwrap_or_else(|e| panic!("parse error: {e}\nsource:\n{src}"));
    let mut interp = Interpreter::new(&tu).unwrap_or_else(|e| panic!("init error: {e}"));
    let mut host = BufferHost::new(input);
    let status = interp.run(&mut host).unwrap_or_else(|e| panic!("eval error: {e}"));
    (status, host.output)
}

#[test]
fn arithmetic_and_conditional_max_of_two() {
    let src = r#"
        int GET();
        int PRINT(int x);
        int main() {
            int a;
            int b;
            a = GET();
            b = GET();
            if (a > b) PRINT(a); else PRINT(b);
            return 0;
        }
    "#;
    assert_eq!(run(src, [3, 7]).1, vec![7]);
    assert_eq!(run(src, [10, -4]).1, vec![10]);
}

#[test]
fn while_loop_sum() {
    let src = r#"
        int GET();
        int PRINT(int x);
        int main() {
            int n;
            n = GET();
            int i;
            i = 1;
            int sum;
            sum = 0;
            while (i <= n) {
                sum = sum + i;
                i = i + 1;
            }
            PRINT(sum);
            return 0;
        }
    "#;
    assert_eq!(run(src, [5]).1, vec![15]);
}

#[test]
fn for_loop_with_array() {
    let src = r#"
        int PRINT(int x);
        int main() {
            int a[10];
            int i;
            for (i = 0; i < 10; i = i + 1) a[i] = i * i;
            PRINT(a[7]);
            return 0;
        }
    "#;
    assert_eq!(run(src, []).1, vec![49]);
}

#[test]
fn recursive_factorial() {
    let src = r#"
        int GET();
        int PRINT(int x);
        int fact(int n) {
            if (n <= 1) return 1;
            return n * fact(n - 1);
        }
        int main() {
            int n;
            n = GET();
            PRINT(fact(n));
            return 0;
        }
    "#;
    assert_eq!(run(src, [6]).1, vec![720]);
}

#[test]
fn heap_pointer_arithmetic() {
    let src = r#"
        int MALLOC(int n);
        int FREE(int p);
        int PRINT(int x);
        int main() {
            int *p;
            p = MALLOC(40);
            int i;
            for (i = 0; i < 10; i = i + 1) *(p + i) = i + 1;
            PRINT(*(p + 5));
            FREE(p);
            return 0;
        }
    "#;
    assert_eq!(run(src, []).1, vec![6]);
}

#[test]
fn global_variable_visible_inside_a_function() {
    let src = r#"
        int g = 2;
        int f(int x) { return x + g; }
        int PRINT(int x);
        int main() {
            PRINT(f(3));
            return 0;
        }
    "#;
    assert_eq!(run(src, []).1, vec![5]);
}

#[test]
fn exit_status_is_mains_return_value() {
    let src = "int main() { return 42; }";
    assert_eq!(run(src, []).0, 42);
}

#[test]
fn falls_off_the_end_without_return_exits_zero() {
    let src = r#"
        int PRINT(int x);
        int main() {
            PRINT(1);
        }
    "#;
    let (status, output) = run(src, []);
    assert_eq!(status, 0);
    assert_eq!(output, vec![1]);
}

#[test]
fn division_by_zero_is_a_reported_error_not_a_panic() {
    let src = r#"
        int main() {
            int a;
            a = 1;
            int b;
            b = 0;
            return a / b;
        }
    "#;
    let tu = parse(src).unwrap();
    let mut interp = Interpreter::new(&tu).unwrap();
    let mut host = BufferHost::new([]);
    assert!(interp.run(&mut host).is_err());
}
