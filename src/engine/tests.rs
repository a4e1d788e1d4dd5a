//! Compilation engine tests.

use pretty_assertions::assert_eq;

use crate::codegen::{render, Instruction};
use crate::error::Severity;

use super::{CompilationEngine, UnitReport};

fn compile_with(
    engine: &mut CompilationEngine,
    source: &str,
    class_name: &str,
) -> (UnitReport, Vec<Instruction>) {
    let mut code: Vec<Instruction> = Vec::new();
    let label = format!("{}.jack", class_name);
    let report = engine.compile_unit(source, class_name, &label, &mut code);
    (report, code)
}

fn compile(source: &str, class_name: &str) -> (UnitReport, Vec<Instruction>) {
    let mut engine = CompilationEngine::new();
    compile_with(&mut engine, source, class_name)
}

/// Compile a class that must be clean and render its VM text.
fn vm_text(source: &str, class_name: &str) -> String {
    let (report, code) = compile(source, class_name);
    assert!(
        report.valid,
        "expected a clean compile, got: {:?}",
        report.diagnostics
    );
    render(&code)
}

fn error_messages(report: &UnitReport) -> Vec<String> {
    report
        .diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn test_do_statement_codegen() {
    let source = "\
class Main {
    function void main() {
        do Output.printInt(1 + 2);
        return;
    }
}";
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.main 0\n\
         push constant 1\n\
         push constant 2\n\
         add\n\
         call Output.printInt 1\n\
         pop temp 0\n\
         push constant 0\n\
         return\n"
    );
}

#[test]
fn test_constructor_and_method_codegen() {
    let source = "\
class Point {
    field int x, y;

    constructor Point new(int ax, int ay) {
        let x = ax;
        let y = ay;
        return this;
    }

    method int getX() {
        return x;
    }
}";
    assert_eq!(
        vm_text(source, "Point"),
        "function Point.new 0\n\
         push constant 2\n\
         call Memory.alloc 1\n\
         pop pointer 0\n\
         push argument 0\n\
         pop this 0\n\
         push argument 1\n\
         pop this 1\n\
         push pointer 0\n\
         return\n\
         function Point.getX 0\n\
         push argument 0\n\
         pop pointer 0\n\
         push this 0\n\
         return\n"
    );
}

#[test]
fn test_while_codegen() {
    let source = "\
class Main {
    function void main() {
        var int i;
        let i = 0;
        while (i < 10) {
            let i = i + 1;
        }
        return;
    }
}";
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.main 1\n\
         push constant 0\n\
         pop local 0\n\
         label WHILE_EXP0\n\
         push local 0\n\
         push constant 10\n\
         lt\n\
         not\n\
         if-goto WHILE_END0\n\
         push local 0\n\
         push constant 1\n\
         add\n\
         pop local 0\n\
         goto WHILE_EXP0\n\
         label WHILE_END0\n\
         push constant 0\n\
         return\n"
    );
}

#[test]
fn test_if_else_codegen() {
    let source = "\
class Main {
    function int sign(int n) {
        if (n < 0) {
            return 1;
        } else {
            return 0;
        }
    }
}";
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.sign 0\n\
         push argument 0\n\
         push constant 0\n\
         lt\n\
         if-goto IF_TRUE0\n\
         goto IF_FALSE0\n\
         label IF_TRUE0\n\
         push constant 1\n\
         return\n\
         goto IF_END0\n\
         label IF_FALSE0\n\
         push constant 0\n\
         return\n\
         label IF_END0\n"
    );
}

#[test]
fn test_string_constant_codegen() {
    let source = "\
class Main {
    function void main() {
        do Output.printString(\"Hi\");
        return;
    }
}";
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.main 0\n\
         push constant 2\n\
         call String.new 1\n\
         push constant 72\n\
         call String.appendChar 2\n\
         push constant 105\n\
         call String.appendChar 2\n\
         call Output.printString 1\n\
         pop temp 0\n\
         push constant 0\n\
         return\n"
    );
}

#[test]
fn test_array_assignment_codegen() {
    let source = "\
class Main {
    function void main(Array a, int i, int x) {
        let a[i] = x;
        return;
    }
}";
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.main 0\n\
         push argument 1\n\
         push argument 0\n\
         add\n\
         push argument 2\n\
         pop temp 0\n\
         pop pointer 1\n\
         push temp 0\n\
         pop that 0\n\
         push constant 0\n\
         return\n"
    );
}

#[test]
fn test_array_access_codegen() {
    let source = "\
class Main {
    function int first(Array a) {
        return a[0];
    }
}";
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.first 0\n\
         push constant 0\n\
         push argument 0\n\
         add\n\
         pop pointer 1\n\
         push that 0\n\
         return\n"
    );
}

#[test]
fn test_void_return_with_value_is_an_error() {
    let source = "\
class Main {
    function void main() {
        return 1;
    }
}";
    let (report, code) = compile(source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["A void function must not return a value".to_string()]
    );
    // Invalid units never reach the sink.
    assert!(code.is_empty());
}

#[test]
fn test_missing_return_is_an_error() {
    let source = "\
class Main {
    function int main() {
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["Program flow may reach end of subroutine without 'return'".to_string()]
    );
}

#[test]
fn test_integer_constant_too_big() {
    let source = "\
class Main {
    function void main() {
        var int x;
        let x = 32768;
        return;
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["Integer constant too big".to_string()]
    );
}

#[test]
fn test_largest_integer_constant_is_fine() {
    let source = "\
class Main {
    function void main() {
        var int x;
        let x = 32767;
        return;
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(report.valid);
}

#[test]
fn test_unreachable_code_warns_once_and_keeps_output() {
    let source = "\
class Main {
    function int main() {
        if (true) {
            return 1;
        } else {
            return 2;
        }
        do Output.println();
        do Output.println();
        return 3;
    }
}";
    let (report, code) = compile(source, "Main");
    assert!(report.valid);
    let warnings: Vec<&str> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(warnings, vec!["Unreachable code"]);
    // Warnings alone do not suppress output.
    assert!(!code.is_empty());
}

#[test]
fn test_empty_statement_is_rejected() {
    let source = "\
class Main {
    function void main() {
        ;
        return;
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["An empty statement is not allowed".to_string()]
    );
}

#[test]
fn test_class_name_must_match_file_name() {
    let (report, _) = compile("class Foo { }", "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["The class name doesn't match the file name".to_string()]
    );
}

#[test]
fn test_undefined_variable_in_let() {
    let source = "\
class Main {
    function void main() {
        let y = 1;
        return;
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["y is not defined as a field, parameter or local or static variable".to_string()]
    );
}

#[test]
fn test_field_does_not_resolve_in_function() {
    let source = "\
class Point {
    field int x;

    function int bad() {
        return x;
    }
}";
    let (report, _) = compile(source, "Point");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["x is not defined as a field, parameter or local or static variable".to_string()]
    );
}

#[test]
fn test_variable_redeclaration() {
    let source = "\
class Main {
    function void main() {
        var int x;
        var boolean x;
        let x = 1;
        return;
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(!report.valid);
    // The first declaration survives, so the int assignment is fine.
    assert_eq!(error_messages(&report), vec!["x redeclared".to_string()]);
}

#[test]
fn test_subroutine_redeclaration_keeps_last() {
    let source = "\
class Main {
    function void f() {
        return;
    }
    function void f(int a) {
        return;
    }
}";
    let mut engine = CompilationEngine::new();
    let (report, _) = compile_with(&mut engine, source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["Subroutine f redeclared".to_string()]
    );
    // The last definition rules for call verification.
    assert_eq!(engine.declaration("Main.f").unwrap().parameters, 1);
}

#[test]
fn test_constructor_return_type_must_be_the_class() {
    let source = "\
class Point {
    constructor int new() {
        return this;
    }
}";
    let (report, _) = compile(source, "Point");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["The return type of a constructor must be of the class type".to_string()]
    );
}

#[test]
fn test_constructor_must_return_this() {
    let source = "\
class Point {
    constructor Point new() {
        return;
    }
}";
    let (report, _) = compile(source, "Point");
    assert!(!report.valid);
    let messages = error_messages(&report);
    assert!(messages.contains(&"A constructor must return 'this'".to_string()));
}

#[test]
fn test_this_cannot_be_referenced_in_a_function() {
    let source = "\
class Point {
    function void main() {
        var Point p;
        let p = this;
        return;
    }
}";
    let (report, _) = compile(source, "Point");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["'this' can't be referenced in a function".to_string()]
    );
}

#[test]
fn test_let_type_mismatch() {
    let source = "\
class Main {
    function void main() {
        var char c;
        let c = true;
        return;
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["a char value is expected".to_string()]
    );
}

#[test]
fn test_internal_call_from_a_function_is_an_error() {
    let source = "\
class Main {
    function void main() {
        do helper();
        return;
    }
    method void helper() {
        return;
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["Subroutine Main.helper called as a method from within a function".to_string()]
    );
}

#[test]
fn test_cross_unit_arity_mismatch() {
    let mut engine = CompilationEngine::new();
    let (main_report, _) = compile_with(
        &mut engine,
        "class Main { function void main() { do Other.run(1); return; } }",
        "Main",
    );
    let (other_report, _) = compile_with(
        &mut engine,
        "class Other { function void run() { return; } }",
        "Other",
    );
    assert!(main_report.valid);
    assert!(other_report.valid);

    let mismatches = engine.verify_calls();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(
        mismatches[0].message,
        "Subroutine Other.run (declared to accept 0 parameter(s)) called with 1 parameter(s)"
    );
    assert_eq!(
        mismatches[0].to_string(),
        "In Main.jack (line 1): In subroutine main: Subroutine Other.run (declared to accept 0 \
         parameter(s)) called with 1 parameter(s)"
    );
}

#[test]
fn test_calls_into_failed_classes_are_not_verified() {
    let mut engine = CompilationEngine::new();
    let (main_report, _) = compile_with(
        &mut engine,
        "class Main { function void main() { do Other.run(1); return; } }",
        "Main",
    );
    // Other fails to compile, so its declarations cannot be trusted.
    let (other_report, _) = compile_with(
        &mut engine,
        "class Other { function void run() { } }",
        "Other",
    );
    assert!(main_report.valid);
    assert!(!other_report.valid);
    assert!(engine.verify_calls().is_empty());
}

#[test]
fn test_method_called_as_a_function() {
    let mut engine = CompilationEngine::new();
    compile_with(
        &mut engine,
        "class Main { function void main() { do Other.m(); return; } }",
        "Main",
    );
    compile_with(
        &mut engine,
        "class Other { method void m() { return; } }",
        "Other",
    );

    let mismatches = engine.verify_calls();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(
        mismatches[0].message,
        "Method Other.m called as a function/constructor"
    );
}

#[test]
fn test_function_called_as_a_method() {
    let mut engine = CompilationEngine::new();
    let source = "\
class Main {
    function void main() {
        var Other o;
        let o = Other.make();
        do o.f();
        return;
    }
}";
    let (main_report, _) = compile_with(&mut engine, source, "Main");
    let (other_report, _) = compile_with(
        &mut engine,
        "class Other {
    function Other make() { return null; }
    function void f() { return; }
}",
        "Other",
    );
    assert!(main_report.valid);
    assert!(other_report.valid);

    let mismatches = engine.verify_calls();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].message, "Function Other.f called as a method");
}

#[test]
fn test_call_to_missing_subroutine() {
    let mut engine = CompilationEngine::new();
    compile_with(
        &mut engine,
        "class Main { function void main() { do Other.nope(); return; } }",
        "Main",
    );
    compile_with(
        &mut engine,
        "class Other { function void run() { return; } }",
        "Other",
    );

    let mismatches = engine.verify_calls();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(
        mismatches[0].message,
        "Function or constructor Other.nope doesn't exist"
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let main_source = "\
class Main {
    function void main() {
        var int i;
        let i = 0;
        while (i < 3) {
            do Other.tick(i);
            let i = i + 1;
        }
        return;
    }
}";
    let other_source = "class Other { function void tick(int n) { return; } }";

    let run = || {
        let mut engine = CompilationEngine::new();
        let (_, main_code) = compile_with(&mut engine, main_source, "Main");
        let (_, other_code) = compile_with(&mut engine, other_source, "Other");
        let verification: Vec<String> = engine
            .verify_calls()
            .iter()
            .map(|d| d.to_string())
            .collect();
        (render(&main_code), render(&other_code), verification)
    };

    assert_eq!(run(), run());
}

#[test]
fn test_terminal_error_resyncs_at_next_subroutine() {
    let source = "\
class Main {
    function void broken() {
        let = 5;
        return;
    }
    function void ok() {
        return;
    }
}";
    let (report, _) = compile(source, "Main");
    assert!(!report.valid);
    assert_eq!(
        error_messages(&report),
        vec!["Expected field, parameter or local or static variable name".to_string()]
    );
    // Only one error: `ok` was still compiled cleanly after recovery.
}

#[test]
fn test_operators_left_to_right() {
    let source = "\
class Main {
    function int calc() {
        return 2 + 3 * 4;
    }
}";
    // No precedence: strictly left to right.
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.calc 0\n\
         push constant 2\n\
         push constant 3\n\
         add\n\
         push constant 4\n\
         call Math.multiply 2\n\
         return\n"
    );
}

#[test]
fn test_unary_operators() {
    let source = "\
class Main {
    function int calc(int n) {
        return -n + ~n;
    }
}";
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.calc 0\n\
         push argument 0\n\
         neg\n\
         push argument 0\n\
         not\n\
         add\n\
         return\n"
    );
}

#[test]
fn test_true_false_and_null_codegen() {
    let source = "\
class Main {
    function void main() {
        var boolean b;
        var Main m;
        let b = true;
        let b = false;
        let m = null;
        return;
    }
}";
    assert_eq!(
        vm_text(source, "Main"),
        "function Main.main 2\n\
         push constant 0\n\
         not\n\
         pop local 0\n\
         push constant 0\n\
         pop local 0\n\
         push constant 0\n\
         pop local 1\n\
         push constant 0\n\
         return\n"
    );
}
