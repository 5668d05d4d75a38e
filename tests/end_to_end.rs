//! Assembly-surface checks against the seed scenarios: each test lowers a small
//! translation unit, runs it through `Sema` and `Codegen`, and asserts on the
//! resulting text directly rather than going through `driver::compile_to_assembly`
//! (which shells out to a host preprocessor these snippets don't need).

use rrcc::codegen::Codegen;
use rrcc::lower::lower_source;
use rrcc::sema::Sema;

fn compile(src: &str) -> String {
    let (unit, node_count) = lower_source(src, "test.c".into()).expect("lower");
    let mut sema = Sema::new(node_count);
    sema.check_unit(&unit).unwrap_or_else(|e| panic!("check_unit: {}", sema.diagnostic(e)));
    let mut codegen = Codegen::new(&sema.records);
    codegen.gen_unit(&unit).expect("gen_unit");
    codegen.finish(&sema.str_pool)
}

#[test]
fn uninitialized_global_emits_bss_object() {
    let asm = compile("int x;");
    assert!(asm.contains(".bss"));
    assert!(asm.contains(".align 2"));
    assert!(asm.contains("x:"));
    assert!(asm.contains(".fill 4"));
    assert!(asm.contains(".global $x"));
    assert!(asm.contains(".type $x, \"object\""));
    assert!(asm.contains(".size $x, -($. $x)"));
}

#[test]
fn string_literal_array_initializer_emits_data_object() {
    let asm = compile(r#"static const char s[] = "hi";"#);
    assert!(asm.contains(".data"));
    assert!(asm.contains(".asciz \"hi\""));
    // the array is initialized directly from the literal's bytes, not decayed to
    // a pointer, so nothing should land in the string literal pool
    assert!(!asm.contains(".LS_"));
}

#[test]
fn add_function_codegen() {
    let asm = compile("int add(int a, int b) { return a + b; }");
    assert!(asm.contains(".text"));
    assert!(asm.contains("add:"));
    assert!(asm.contains("push ra"));
    assert!(asm.contains("push fp"));
    assert!(asm.contains("mv fp, sp"));
    assert!(asm.contains("add.epilogue:"));
    assert!(asm.contains("mv sp, fp"));
    assert!(asm.contains("pop fp"));
    assert!(asm.contains("pop ra"));
    assert!(asm.contains("ret"));
    // the epilogue jump, not a bare `ret`, is how a mid-body `return` exits
    assert!(asm.contains("j add.epilogue"));
}

#[test]
fn pointer_arithmetic_scales_by_power_of_two_pointee_size() {
    // int is 4 bytes wide, a power of two: scaling is a shift, not a multiply/divide.
    let asm = compile("int f(int *p, int i) { return p[i]; }");
    assert!(asm.contains("slli"));
    assert!(!asm.contains("mul"));
}

#[test]
fn pointer_arithmetic_over_non_power_of_two_struct_uses_mul() {
    // a 3-byte struct forces a multiply rather than a shift.
    let src = "struct s3 { char a; char b; char c; }; int f(struct s3 *p, int i) { return p[i].a; }";
    let asm = compile(src);
    assert!(asm.contains("mul"));
}

#[test]
fn while_loop_codegen_emits_condition_and_back_jump() {
    let asm = compile("void f(void) { int i = 0; while (i < 10) { i = i + 1; } }");
    // a test label, a body, and a jump back to the test
    let test_labels: Vec<&str> = asm
        .lines()
        .filter(|l| l.trim_end_matches(':').starts_with(".L") && l.trim().ends_with(':'))
        .collect();
    assert!(!test_labels.is_empty(), "expected at least one loop label in:\n{asm}");
    assert!(asm.contains("j ."), "expected a jump back into a loop label in:\n{asm}");
}

#[test]
fn switch_statement_dispatches_case_and_default_labels() {
    let src = r#"
        int f(int x) {
            switch (x) {
                case 1:
                    return 10;
                case 2:
                    return 20;
                default:
                    return 0;
            }
        }
    "#;
    let asm = compile(src);
    assert!(asm.contains(".text"));
    // three distinct case/default bodies, each returning through the shared epilogue
    assert_eq!(asm.matches("j f.epilogue").count(), 3);
}

#[test]
fn undefined_identifier_is_reported_as_a_diagnostic() {
    let (unit, node_count) = lower_source("int f(void) { return y; }", "bad.c".into()).expect("lower");
    let mut sema = Sema::new(node_count);
    let err = sema.check_unit(&unit).expect_err("expected an undefined-identifier error");
    let diag = sema.diagnostic(err);
    assert!(format!("{diag}").to_lowercase().contains("y") || format!("{diag:?}").to_lowercase().contains("undefined"));
}
