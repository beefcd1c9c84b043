//! Virtual machine tests: source text in, expected output (or error) out.

use bento_lang::compiler::code::CompiledProgram;
use bento_lang::errors::Error;
use bento_lang::vm::VirtualMachine;

fn run(source: &str) -> Result<String, Error> {
    let program = CompiledProgram::try_from(source)?;
    let mut vm = VirtualMachine::with_output(program, Vec::new());
    vm.run()?;
    Ok(String::from_utf8(vm.into_output()).expect("output was not utf-8"))
}

fn run_ok(source: &str) -> String {
    run(source).expect("program should run")
}

fn run_err(source: &str) -> String {
    run(source).expect_err("program should fail").to_string()
}

#[test]
fn test_hello_world() {
    assert_eq!(run_ok(r#"start: display "Hello, World!""#), "Hello, World!\n");
}

#[test]
fn test_missing_start() {
    assert_eq!(run_err(""), "no such function: start");
}

#[test]
fn test_unknown_sentence() {
    assert_eq!(
        run_err("start: do something impossible"),
        "no such function: do something impossible"
    );
}

#[test]
fn test_display_is_variadic() {
    assert_eq!(run_ok(r#"start: display "a" "b" "c""#), "abc\n");
    assert_eq!(run_ok("start: display"), "\n");
}

#[test]
fn test_display_blackhole_prints_nothing() {
    assert_eq!(run_ok(r#"start: display "a" _ "b""#), "ab\n");
}

#[test]
fn test_set_text() {
    assert_eq!(
        run_ok("start: declare foo is text\nset foo to \"hi\"\ndisplay foo"),
        "hi\n"
    );
}

#[test]
fn test_set_number_rounds_to_destination_precision() {
    assert_eq!(
        run_ok("start: declare x is number with 1 decimal place\nset x to 1.23\ndisplay x"),
        "1.2\n"
    );
}

#[test]
fn test_set_across_types_fails() {
    assert_eq!(
        run_err("start: declare x is number\nset x to \"1\""),
        "cannot set: number to text"
    );
}

#[test]
fn test_number_arithmetic_and_rounding() {
    assert_eq!(
        run_ok(
            "start:\ndeclare x is number with 1 decimal place\nadd 5.5 and 6.5 into x\ndisplay x"
        ),
        "12\n"
    );
    assert_eq!(
        run_ok(
            "start:\ndeclare x is number with 1 decimal place\nadd 5.5 and 6.5 into x\nmultiply x and 11 into x\ndisplay x"
        ),
        "132\n"
    );
}

#[test]
fn test_subtract_is_from() {
    // "subtract a from b" stores b - a.
    assert_eq!(
        run_ok("start: declare x is number\nsubtract 1 from 10 into x\ndisplay x"),
        "9\n"
    );
}

#[test]
fn test_divide_rounds_to_destination_precision() {
    assert_eq!(
        run_ok(
            "start: declare x is number with 2 decimal places\ndivide 5.5 by 6.5 into x\ndisplay x"
        ),
        "0.85\n"
    );
}

#[test]
fn test_divide_by_zero() {
    assert_eq!(
        run_err("start: declare x is number\ndivide 1 by 0 into x"),
        "division by zero"
    );
}

#[test]
fn test_arithmetic_on_text_fails() {
    assert_eq!(
        run_err("start: declare x is number\nadd \"1\" and 2 into x"),
        "expected number, but found text"
    );
}

#[test]
fn test_if_else_with_text_equality() {
    assert_eq!(
        run_ok(
            "start:\nif \"foo\" = \"bar\", display \"match!\", otherwise display \"no match!\"\ndisplay \"done\""
        ),
        "no match!\ndone\n"
    );
}

#[test]
fn test_if_without_else() {
    assert_eq!(
        run_ok("start:\nif \"foo\" = \"foo\", display \"match!\"\ndisplay \"done\""),
        "match!\ndone\n"
    );
    assert_eq!(
        run_ok("start:\nif \"foo\" = \"bar\", display \"match!\"\ndisplay \"done\""),
        "done\n"
    );
}

#[test]
fn test_unless_inverts_the_branches() {
    assert_eq!(
        run_ok("start:\nunless \"foo\" = \"bar\", display \"different\"\ndisplay \"done\""),
        "different\ndone\n"
    );
    assert_eq!(
        run_ok(
            "start:\nunless \"foo\" = \"foo\", display \"different\", otherwise display \"same\""
        ),
        "same\n"
    );
}

#[test]
fn test_until_loop() {
    assert_eq!(
        run_ok("start:\ndeclare i is a number\nuntil i > 3, add i and 1 into i\ndisplay i"),
        "4\n"
    );
}

#[test]
fn test_while_loop() {
    assert_eq!(
        run_ok("start:\ndeclare i is a number\nwhile i < 5, add i and 1 into i\ndisplay i"),
        "5\n"
    );
}

#[test]
fn test_question_in_if() {
    assert_eq!(
        run_ok("start: if something is true, display \"yes!\"\nsomething is true? yes"),
        "yes!\n"
    );
    assert_eq!(
        run_ok("start: if something is true, display \"yes!\"\nsomething is true? no"),
        ""
    );
}

#[test]
fn test_unanswered_question_reads_as_no() {
    assert_eq!(
        run_ok(
            "start: if something is true, display \"yes!\", otherwise display \"no!\"\nsomething is true? display \"asked\""
        ),
        "asked\nno!\n"
    );
}

#[test]
fn test_question_with_branches() {
    let source = "start:\nif n is small, display \"small\", otherwise display \"big\"\n\nn is small? (n is number)\nif n < 10, yes, otherwise no";
    // The question is called with no argument here, so n reads as zero.
    assert_eq!(run_err(source), "no such function: n is small");
}

#[test]
fn test_question_with_argument() {
    let source = "start:\nif 3 is small, display \"small\", otherwise display \"big\"\nif 30 is small, display \"small\", otherwise display \"big\"\n\nn is small? (n is number)\nif n < 10, yes, otherwise no";
    assert_eq!(run_ok(source), "small\nbig\n");
}

#[test]
fn test_answer_outside_a_question_is_harmless() {
    assert_eq!(run_ok("start: yes\ndisplay \"done\""), "done\n");
}

#[test]
fn test_calling_a_function_with_arguments() {
    assert_eq!(
        run_ok("start: greet \"World\"\ngreet name (name is text):\ndisplay \"Hello, \" name"),
        "Hello, World\n"
    );
}

#[test]
fn test_output_arguments_write_through_to_the_caller() {
    let source = "start:\ndeclare total is a number\nadd up 1 and 2 into total\ndisplay total\n\nadd up a and b into c (a is number, b is number, c is number):\nadd a and b into c";
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn test_recursion() {
    let source = "start: count down from 3\n\ncount down from n (n is a number):\nif n = 0, display \"liftoff!\", otherwise keep counting n\n\nkeep counting n (n is a number):\ndisplay n\nsubtract 1 from n into n\ncount down from n";
    assert_eq!(run_ok(source), "3\n2\n1\nliftoff!\n");
}

#[test]
fn test_blackhole_discards_output_arguments() {
    assert_eq!(
        run_ok("start:\nadd 1 and 2 into _\ndisplay \"done\""),
        "done\n"
    );
}

#[test]
fn test_comparisons() {
    let tests: &[(&str, Result<bool, &str>)] = &[
        (r#""foo" = "foo""#, Ok(true)),
        (r#""foo" = "bar""#, Ok(false)),
        ("1.230 = 1.23", Ok(true)),
        ("1.23 = 2.23", Ok(false)),
        (r#"1.23 = "1.23""#, Err("cannot compare: number = text")),
        (r#""1.23" = 1.23"#, Err("cannot compare: text = number")),
        (r#""foo" != "foo""#, Ok(false)),
        (r#""foo" != "bar""#, Ok(true)),
        ("1.230 != 1.23", Ok(false)),
        ("1.23 != 2.23", Ok(true)),
        (r#"1.23 != "1.23""#, Err("cannot compare: number != text")),
        (r#""foo" < "foo""#, Ok(false)),
        (r#""bar" < "foo""#, Ok(true)),
        ("1.230 < 1.23", Ok(false)),
        ("1.23 < 2.23", Ok(true)),
        (r#"1.23 < "1.23""#, Err("cannot compare: number < text")),
        (r#""foo" <= "foo""#, Ok(true)),
        (r#""foo" <= "bar""#, Ok(false)),
        ("1.230 <= 1.23", Ok(true)),
        ("2.23 <= 1.23", Ok(false)),
        (r#""1.23" <= 1.23"#, Err("cannot compare: text <= number")),
        (r#""foo" > "foo""#, Ok(false)),
        (r#""foo" > "bar""#, Ok(true)),
        ("1.230 > 1.23", Ok(false)),
        ("2.23 > 1.23", Ok(true)),
        (r#"1.23 > "1.23""#, Err("cannot compare: number > text")),
        (r#""foo" >= "foo""#, Ok(true)),
        (r#""bar" >= "foo""#, Ok(false)),
        ("1.230 >= 1.23", Ok(true)),
        ("1.23 >= 2.23", Ok(false)),
        (r#""1.23" >= 1.23"#, Err("cannot compare: text >= number")),
    ];
    for (condition, expected) in tests {
        let source = format!("start: if {condition}, display \"yes\"");
        match expected {
            Ok(true) => assert_eq!(run_ok(&source), "yes\n", "{condition}"),
            Ok(false) => assert_eq!(run_ok(&source), "", "{condition}"),
            Err(message) => assert_eq!(run_err(&source), *message, "{condition}"),
        }
    }
}

#[test]
fn test_exact_comparison_survives_display_rounding() {
    // The stored sum is exact even though it displays rounded.
    let source = "start:\ndeclare x is number with 1 decimal place\nadd 0.04 and 0.01 into x\ndisplay x\nif x = 0.05, display \"exact\"";
    assert_eq!(run_ok(source), "0.1\nexact\n");
}

#[test]
fn test_number_display_trims_zeros() {
    assert_eq!(
        run_ok("start: declare x is number\nset x to 12.100\ndisplay x"),
        "12.1\n"
    );
    assert_eq!(
        run_ok("start: declare x is number\nset x to -0.5\ndisplay x"),
        "-0.5\n"
    );
}

#[test]
fn test_run_system_command_writes_output() {
    assert_eq!(run_ok(r#"start: run system command "echo hi""#), "hi\n");
}

#[test]
fn test_run_system_command_captures_output() {
    let source = "start:\ndeclare out is text\nrun system command \"echo hi\" output into out\ndisplay \"got \" out";
    assert_eq!(run_ok(source), "got hi\n\n");
}

#[test]
fn test_run_system_command_captures_status_code() {
    let source = "start:\ndeclare result is a number\nrun system command \"exit 3\" status code into result\ndisplay result";
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn test_run_system_command_blackhole_sink() {
    // The echoed output is discarded; only the status code is kept.
    let source = "start:\ndeclare result is a number\nrun system command \"echo hi\" output into _ status code into result\ndisplay result";
    assert_eq!(run_ok(source), "0\n");
}

#[test]
fn test_comment_and_continuation() {
    let source = "# greeting\nstart:\ndisplay \"a\" ...\n\"b\" # back to back\n";
    assert_eq!(run_ok(source), "ab\n");
}
