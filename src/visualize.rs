//! Graphviz rendering of the syntax tree, for debugging.

use std::fmt::Write as _;
use std::io;

use crate::parser::Node;

/// Renders a tree as an undirected DOT graph.
///
/// Nodes are numbered in post-order, so the same tree always renders to the
/// same text. Each node line comes after all of its children's lines and is
/// followed by one edge per child.
#[derive(Debug, Default)]
pub struct TreeVisualizer {
    out: String,
    next_id: usize,
}

impl TreeVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, root: &Node) -> String {
        self.out.clear();
        self.next_id = 0;

        self.out.push_str("graph {\n");
        self.render_recursive(root);
        self.out.push_str("}\n");

        std::mem::take(&mut self.out)
    }

    pub fn write_to(&mut self, root: &Node, mut w: impl io::Write) -> io::Result<()> {
        let text = self.render(root);
        w.write_all(text.as_bytes())
    }

    fn render_recursive(&mut self, node: &Node) -> usize {
        let children: Vec<usize> = node
            .children()
            .iter()
            .map(|c| self.render_recursive(c))
            .collect();

        let id = self.next_id;
        self.next_id += 1;

        // writing into a String cannot fail
        let _ = writeln!(self.out, "n{}[label=\"{}\"];", id, node.label());
        for child in children {
            let _ = writeln!(self.out, "n{} -- n{};", id, child);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ArithOp, DeclKind, RelOp};

    fn sample() -> Node {
        Node::program(Node::stmts(vec![
            Node::decl("x", DeclKind::Number),
            Node::assign(
                "x",
                Node::arith(Node::int(1), ArithOp::Add, Node::float(2.5)),
            ),
            Node::while_loop(
                Node::relational(Node::ident("x"), RelOp::Less, Node::int(3)),
                Node::stmts(vec![Node::print(Node::str("hi")), Node::inc("x")]),
            ),
        ]))
    }

    fn count(node: &Node) -> usize {
        1 + node.children().iter().map(count).sum::<usize>()
    }

    #[test]
    fn renders_leaf_first() {
        let text = TreeVisualizer::new().render(&Node::print(Node::ident("x")));
        assert_eq!(
            text,
            "graph {\nn0[label=\"x\"];\nn1[label=\"print\"];\nn1 -- n0;\n}\n"
        );
    }

    #[test]
    fn every_node_and_edge_once() {
        let tree = sample();
        let text = TreeVisualizer::new().render(&tree);
        let nodes = text.lines().filter(|l| l.contains("[label=")).count();
        let edges = text.lines().filter(|l| l.contains(" -- ")).count();
        assert_eq!(nodes, count(&tree));
        assert_eq!(edges, count(&tree) - 1);
        assert!(text.contains("[label=\"\\\"hi\\\"\"]"));
    }

    #[test]
    fn keeps_unicode_in_string_labels() {
        let text = TreeVisualizer::new().render(&Node::print(Node::str("café 😀")));
        assert!(text.contains("n0[label=\"\\\"café 😀\\\"\"];"));
        assert!(!text.contains("\\u{"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let tree = sample();
        let mut visualizer = TreeVisualizer::new();
        let first = visualizer.render(&tree);
        let second = visualizer.render(&tree);
        assert_eq!(first, second);

        let mut buf: Vec<u8> = vec![];
        TreeVisualizer::new().write_to(&tree, &mut buf).unwrap();
        assert_eq!(buf, first.into_bytes());
    }
}
