use emjc::analyzer::SemanticVisitor;
use emjc::error::{CompileError, SemanticError};
use emjc::parser::{parse_source, DeclKind, Node};

fn check(input: &str) -> Vec<SemanticError> {
    let program = parse_source(input).unwrap();
    SemanticVisitor::new().check(&program).errors().to_vec()
}

#[test]
fn valid_program_has_no_errors() {
    let input = r#"
num x;
str s;
x = 1 + 2 * 3;
s = "hi";
while (x < 10) {
    x++;
}
if (x >= 10 && !(x == 11)) {
    print s;
} else {
    print x;
}
"#;
    assert_eq!(check(input), vec![]);
}

#[test]
fn redeclaration() {
    assert_eq!(
        check("num x; num x;"),
        vec![SemanticError::Redeclared("x".to_string())]
    );
    // the kind does not matter
    assert_eq!(
        check("num x; str x;"),
        vec![SemanticError::Redeclared("x".to_string())]
    );
}

#[test]
fn use_before_declaration() {
    assert_eq!(
        check("print y;"),
        vec![SemanticError::Undeclared("y".to_string())]
    );
    assert_eq!(
        check("y = 1;"),
        vec![SemanticError::Undeclared("y".to_string())]
    );
    assert_eq!(
        check("print y; num y;"),
        vec![SemanticError::Undeclared("y".to_string())]
    );
}

#[test]
fn increment_of_undeclared_variable() {
    assert_eq!(
        check("z++; z--;"),
        vec![
            SemanticError::Undeclared("z".to_string()),
            SemanticError::Undeclared("z".to_string()),
        ]
    );
}

#[test]
fn string_variable_assigned_a_number() {
    let errors = check("str s; s = 5;");
    assert_eq!(
        errors,
        vec![SemanticError::IncorrectType {
            name: "s".to_string(),
            declared: DeclKind::String.to_string(),
            found: DeclKind::Number.to_string(),
        }]
    );
    assert!(errors[0].to_string().starts_with("type mismatch"));
}

#[test]
fn number_variable_assigned_a_string() {
    let errors = check("num x; x = \"hi\";");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SemanticError::IncorrectType { name, .. } if name == "x"
    ));
}

#[test]
fn assignment_between_variables_of_different_kind() {
    let errors = check("num x; str s; x = s;");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].name(), "x");

    assert_eq!(check("num x; num y; x = y;"), vec![]);
    assert_eq!(check("str a; str b; a = b;"), vec![]);
}

#[test]
fn undeclared_right_hand_side_is_reported_once() {
    assert_eq!(
        check("num x; x = y;"),
        vec![SemanticError::Undeclared("y".to_string())]
    );
}

#[test]
fn every_error_is_collected() {
    let input = "num x; num x; print y; str s; s = 1; z = 2;";
    let errors = check(input);
    assert_eq!(errors.len(), 4);
    assert_eq!(
        errors.iter().map(|e| e.name()).collect::<Vec<_>>(),
        vec!["x", "y", "s", "z"]
    );
}

#[test]
fn reset_between_programs() {
    let program = parse_source("num x; x = 1;").unwrap();
    let mut visitor = SemanticVisitor::new();
    assert!(visitor.check(&program).is_ok());

    // without a reset the declaration is seen twice
    assert_eq!(visitor.check(&program).error_count(), 1);

    visitor.reset();
    assert!(visitor.check(&program).is_ok());
}

#[test]
fn hand_built_tree() {
    let program = Node::program(Node::stmts(vec![
        Node::decl("s", DeclKind::String),
        Node::assign("s", Node::float(1.5)),
    ]));
    let report = SemanticVisitor::new().check(&program);
    assert_eq!(report.error_count(), 1);
    assert!(report.into_result().is_err());
}

#[test]
fn semantic_errors_stop_compilation() {
    let Err(CompileError::Semantic(errors)) = emjc::compile("print y; num x; num x;") else {
        panic!("expected semantic errors");
    };
    assert_eq!(errors.len(), 2);

    let e = emjc::compile("print y;").unwrap_err();
    assert_eq!(e.diagnostics(), vec!["undeclared var y".to_string()]);
}
