use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Number,
    String,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Number => write!(f, "NUM"),
            DeclKind::String => write!(f, "STR"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn symbol(&self) -> char {
        match self {
            ArithOp::Add => '+',
            ArithOp::Sub => '-',
            ArithOp::Mul => '*',
            ArithOp::Div => '/',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelOp {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
}

impl RelOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            RelOp::Equal => "=",
            RelOp::NotEqual => "!=",
            RelOp::Greater => ">",
            RelOp::Less => "<",
            RelOp::GreaterEqual => ">=",
            RelOp::LessEqual => "<=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::Not => "!",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Program,
    Stmts,
    Ident(String),
    Float(f64),
    Int(i32),
    Str(String),
    Assign(String),
    Decl(String, DeclKind),
    Print,
    Arith(ArithOp),
    Inc(String),
    Dec(String),
    While,
    If,
    IfElse,
    Relational(RelOp),
    Logical(LogicalOp),
}

/// A tree element. Children are owned and kept in insertion order.
///
/// The typed constructors below always produce the fixed arity of their
/// variant; `add_child` on its own does not, and the generator rejects
/// nodes whose arity is off.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: vec![],
        }
    }

    fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    pub fn program(stmts: Node) -> Self {
        Self::with_children(NodeKind::Program, vec![stmts])
    }

    pub fn stmts(stmts: Vec<Node>) -> Self {
        Self::with_children(NodeKind::Stmts, stmts)
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Ident(name.into()))
    }

    pub fn float(value: f64) -> Self {
        Self::new(NodeKind::Float(value))
    }

    pub fn int(value: i32) -> Self {
        Self::new(NodeKind::Int(value))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Str(value.into()))
    }

    pub fn assign(name: impl Into<String>, value: Node) -> Self {
        Self::with_children(NodeKind::Assign(name.into()), vec![value])
    }

    pub fn decl(name: impl Into<String>, kind: DeclKind) -> Self {
        Self::new(NodeKind::Decl(name.into(), kind))
    }

    pub fn print(expr: Node) -> Self {
        Self::with_children(NodeKind::Print, vec![expr])
    }

    pub fn arith(left: Node, op: ArithOp, right: Node) -> Self {
        Self::with_children(NodeKind::Arith(op), vec![left, right])
    }

    pub fn inc(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_children(NodeKind::Inc(name.clone()), vec![Node::ident(name)])
    }

    pub fn dec(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_children(NodeKind::Dec(name.clone()), vec![Node::ident(name)])
    }

    pub fn while_loop(cond: Node, body: Node) -> Self {
        Self::with_children(NodeKind::While, vec![cond, body])
    }

    pub fn if_then(cond: Node, body: Node) -> Self {
        Self::with_children(NodeKind::If, vec![cond, body])
    }

    pub fn if_else(cond: Node, if_body: Node, else_body: Node) -> Self {
        Self::with_children(NodeKind::IfElse, vec![cond, if_body, else_body])
    }

    pub fn relational(left: Node, op: RelOp, right: Node) -> Self {
        Self::with_children(NodeKind::Relational(op), vec![left, right])
    }

    pub fn logical(left: Node, op: LogicalOp, right: Node) -> Self {
        Self::with_children(NodeKind::Logical(op), vec![left, right])
    }

    pub fn not(operand: Node) -> Self {
        Self::with_children(NodeKind::Logical(LogicalOp::Not), vec![operand])
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Number of children this variant must have, `None` for lists.
    pub fn expected_arity(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::Program | NodeKind::Stmts => None,
            NodeKind::Ident(_)
            | NodeKind::Float(_)
            | NodeKind::Int(_)
            | NodeKind::Str(_)
            | NodeKind::Decl(_, _) => Some(0),
            NodeKind::Assign(_) | NodeKind::Print | NodeKind::Inc(_) | NodeKind::Dec(_) => Some(1),
            NodeKind::Arith(_) | NodeKind::Relational(_) | NodeKind::While | NodeKind::If => {
                Some(2)
            }
            NodeKind::Logical(LogicalOp::Not) => Some(1),
            NodeKind::Logical(_) => Some(2),
            NodeKind::IfElse => Some(3),
        }
    }

    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Program => "program".to_string(),
            NodeKind::Stmts => "stmts".to_string(),
            NodeKind::Ident(name) => name.clone(),
            NodeKind::Float(value) => format!("{:.6}", value),
            NodeKind::Int(value) => value.to_string(),
            NodeKind::Str(value) => format!("\\\"{}\\\"", escape_label(value)),
            NodeKind::Assign(name) => format!("{}=", name),
            NodeKind::Decl(name, kind) => format!("{} {}", kind, name),
            NodeKind::Print => "print".to_string(),
            NodeKind::Arith(op) => op.symbol().to_string(),
            NodeKind::Inc(_) => "++".to_string(),
            NodeKind::Dec(_) => "--".to_string(),
            NodeKind::While => "while".to_string(),
            NodeKind::If => "if".to_string(),
            NodeKind::IfElse => "ifElse".to_string(),
            NodeKind::Relational(op) => op.symbol().to_string(),
            NodeKind::Logical(op) => op.symbol().to_string(),
        }
    }
}

/// Escapes a string for a quoted DOT label. Printable text, including
/// non-ASCII, is kept as is.
fn escape_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_respect_arity() {
        let nodes = [
            Node::assign("x", Node::int(1)),
            Node::print(Node::str("hi")),
            Node::arith(Node::int(1), ArithOp::Add, Node::int(2)),
            Node::inc("x"),
            Node::dec("x"),
            Node::while_loop(Node::ident("c"), Node::stmts(vec![])),
            Node::if_then(Node::ident("c"), Node::stmts(vec![])),
            Node::if_else(Node::ident("c"), Node::stmts(vec![]), Node::stmts(vec![])),
            Node::relational(Node::int(1), RelOp::Less, Node::int(2)),
            Node::logical(Node::ident("a"), LogicalOp::Or, Node::ident("b")),
            Node::not(Node::ident("a")),
        ];
        for node in nodes {
            assert_eq!(node.expected_arity(), Some(node.children().len()));
        }
    }

    #[test]
    fn add_child_keeps_order() {
        let mut stmts = Node::stmts(vec![]);
        stmts.add_child(Node::decl("a", DeclKind::Number));
        stmts.add_child(Node::decl("b", DeclKind::String));
        let labels: Vec<_> = stmts.children().iter().map(Node::label).collect();
        assert_eq!(labels, ["NUM a", "STR b"]);
    }

    #[test]
    fn labels() {
        assert_eq!(Node::float(2.5).label(), "2.500000");
        assert_eq!(Node::str("hi").label(), "\\\"hi\\\"");
        assert_eq!(Node::str("café 😀").label(), "\\\"café 😀\\\"");
        assert_eq!(Node::str("a\"b\\c\n").label(), "\\\"a\\\"b\\\\c\\n\\\"");
        assert_eq!(Node::assign("x", Node::int(1)).label(), "x=");
        assert_eq!(
            Node::relational(Node::int(1), RelOp::Equal, Node::int(1)).label(),
            "="
        );
        assert_eq!(Node::not(Node::ident("a")).label(), "!");
        assert_eq!(
            Node::if_else(Node::ident("c"), Node::stmts(vec![]), Node::stmts(vec![])).label(),
            "ifElse"
        );
    }
}
