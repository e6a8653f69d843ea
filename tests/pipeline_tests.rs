use std::fs;

use emjc::backend::{Backend, ObjectBackend};
use emjc::error::{CompileError, InterpError, LexError, ParseError};
use emjc::ir::Interpreter;
use emjc::parser::parse_source;
use emjc::visualize::TreeVisualizer;

fn run(input: &str) -> String {
    let module = emjc::compile(input).unwrap();
    let mut out: Vec<u8> = vec![];
    let code = Interpreter::new(&module).run(&mut out).unwrap();
    assert_eq!(code, 0);
    String::from_utf8(out).unwrap()
}

#[test]
fn counting_loop() {
    let input = "
num x;
x = 0;
while (x < 3) {
    print x;
    x++;
}
";
    assert_eq!(run(input), "0\n1\n2\n");
}

#[test]
fn countdown() {
    assert_eq!(
        run("num n; n = 3; while (n > 0) { print n; n--; }"),
        "3\n2\n1\n"
    );
}

#[test]
fn arithmetic() {
    assert_eq!(run("print 1 + 2 * 3;"), "7\n");
    assert_eq!(run("print (1 + 2) * 3;"), "9\n");
    assert_eq!(run("print 7 / 2;"), "3.5\n");
    assert_eq!(run("print -4 + 1;"), "-3\n");
    assert_eq!(run("print 10 - 2 - 3;"), "5\n");
    assert_eq!(run("print 0.25 + 0.5;"), "0.75\n");
}

#[test]
fn declarations_start_empty() {
    assert_eq!(run("num x; str s; print x; print s;"), "0\n\n");
}

#[test]
fn strings() {
    let input = r#"
str greeting;
greeting = "hello";
print greeting;
print "tab\tend";
"#;
    assert_eq!(run(input), "hello\ntab\tend\n");
}

#[test]
fn branches() {
    let input = r#"
num x;
x = 5;
if (x > 3) { print "big"; } else { print "small"; }
if (x <= 3) { print "never"; }
if (x != 5) { print "never"; } else { print "five"; }
"#;
    assert_eq!(run(input), "big\nfive\n");
}

#[test]
fn logical_operators() {
    let input = "
num x;
x = 2;
if (x > 1 && !(x == 3)) { print 1; }
if (x > 5 || x < 0) { print 2; }
if (!(x > 5) || x < 0) { print 3; }
";
    assert_eq!(run(input), "1\n3\n");
}

#[test]
fn nested_loops() {
    let input = "
num i;
num j;
num total;
while (i < 3) {
    j = 0;
    while (j < 4) {
        total = total + 1;
        j++;
    }
    i++;
}
print total;
";
    assert_eq!(run(input), "12\n");
}

#[test]
fn runaway_program_hits_step_limit() {
    let module = emjc::compile("num x; while (x < 1) { }").unwrap();
    let err = Interpreter::new(&module)
        .with_step_limit(100)
        .run(&mut Vec::<u8>::new())
        .unwrap_err();
    assert!(matches!(err, InterpError::StepLimit(100)));
}

#[test]
fn lex_and_parse_errors() {
    assert!(matches!(
        emjc::compile("num x; x = 1 $ 2;"),
        Err(CompileError::Lex(LexError::UnexpectedChar { found: '$', .. }))
    ));
    assert!(matches!(
        emjc::compile("print \"open"),
        Err(CompileError::Lex(LexError::UnterminatedString { .. }))
    ));
    assert!(matches!(
        emjc::compile("num x"),
        Err(CompileError::Parse(ParseError::UnexpectedEof { .. }))
    ));
    assert!(matches!(
        emjc::compile("while x < 1 { }"),
        Err(CompileError::Parse(ParseError::UnexpectedToken { line: 1, .. }))
    ));
}

#[test]
fn dump_ast_is_stable() {
    let program = parse_source("num x; x = 2; if (x > 1) { print \"yes\"; }").unwrap();
    let mut visualizer = TreeVisualizer::new();
    let first = visualizer.render(&program);
    assert_eq!(first, visualizer.render(&program));

    assert!(first.starts_with("graph {\n"));
    assert!(first.ends_with("}\n"));
    assert!(first.contains("[label=\"NUM x\"]"));
    assert!(first.contains("[label=\"x=\"]"));
    assert!(first.contains("[label=\"program\"]"));
}

#[test]
fn object_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.o");

    let input = r#"
num x;
str s;
s = "done";
while (x < 3) {
    if (x == 1 || !(x < 2)) { print x; } else { print s; }
    x++;
}
"#;
    emjc::compile_to_object(input, &path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(!bytes.is_empty());
    #[cfg(target_os = "linux")]
    assert_eq!(&bytes[..4], b"\x7fELF");
}

#[test]
fn backend_emits_in_memory() {
    let module = emjc::compile("num x; x = x + 1; print x;").unwrap();
    let backend = ObjectBackend::new().unwrap();
    assert_eq!(backend.name(), "cranelift");
    assert!(!backend.target().is_empty());

    let bytes = backend.emit(&module).unwrap();
    assert!(!bytes.is_empty());
}

#[test]
fn no_object_for_invalid_program() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.o");

    let err = emjc::compile_to_object("num x; x = \"oops\";", &path).unwrap_err();
    assert!(matches!(err, CompileError::Semantic(_)));
    assert!(!path.exists());
}
