use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn emjc(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_emjc"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn write_source(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn missing_source_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = emjc(dir.path(), &["does_not_exist.emj"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
    assert!(!dir.path().join("program.o").exists());
}

#[test]
fn output_defaults_to_program_o() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(
        dir.path(),
        "count.emj",
        "num x; while (x < 3) { print x; x++; }",
    );

    let output = emjc(dir.path(), &[&source]);
    assert!(output.status.success());

    let bytes = fs::read(dir.path().join("program.o")).unwrap();
    assert!(!bytes.is_empty());
}

#[test]
fn explicit_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), "a.emj", "print \"hi\";");

    let output = emjc(dir.path(), &[&source, "a.o"]);
    assert!(output.status.success());
    assert!(dir.path().join("a.o").exists());
    assert!(!dir.path().join("program.o").exists());
}

#[test]
fn each_semantic_error_is_one_stderr_line() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), "bad.emj", "num x; num x; print y;");

    let output = emjc(dir.path(), &[&source, "out.o"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(
        stderr.lines().collect::<Vec<_>>(),
        vec!["redeclared var x", "undeclared var y"]
    );
    assert!(!dir.path().join("out.o").exists());
}

#[test]
fn dump_ast_and_run_write_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), "emo.emj", "print \"café 😀\";");

    let output = emjc(dir.path(), &[&source, "--dump-ast", "--run"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("graph {\n"));
    assert!(stdout.contains("[label=\"\\\"café 😀\\\"\"]"));
    assert!(stdout.ends_with("}\ncafé 😀\n"));
    // --run does not write an object file
    assert!(!dir.path().join("program.o").exists());
}
