use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

use super::{ArithOp, DeclKind, LogicalOp, Node, RelOp};

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

type Result<T> = std::result::Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn parse(&mut self) -> Result<Node> {
        self.parse_program()
    }

    fn is_eof(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek() != Some(kind) {
            return false;
        }
        self.index += 1;
        true
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.index) {
            Some(t) => ParseError::UnexpectedToken {
                line: t.line,
                found: format!("{:?}", t.kind),
                expected: expected.to_string(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.consume(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("{:?}", kind)))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        if let Some(TokenKind::Ident(name)) = self.peek() {
            let name = name.clone();
            self.index += 1;
            return Ok(name);
        }
        Err(self.unexpected("Ident"))
    }

    /// program = stmt*
    fn parse_program(&mut self) -> Result<Node> {
        let mut stmts = vec![];
        while !self.is_eof() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Node::program(Node::stmts(stmts)))
    }

    /// block = "{" stmt* "}"
    fn parse_block(&mut self) -> Result<Node> {
        self.expect(&TokenKind::OpenCurlyBrace)?;
        let mut stmts = vec![];
        while !self.consume(&TokenKind::CloseCurlyBrace) {
            if self.is_eof() {
                return Err(self.unexpected("CloseCurlyBrace"));
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(Node::stmts(stmts))
    }

    /// stmt = ("num" | "str") ident ";"
    ///      | "print" expr ";"
    ///      | "while" "(" expr ")" block
    ///      | "if" "(" expr ")" block ("else" block)?
    ///      | ident "=" expr ";"
    ///      | ident "++" ";"
    ///      | ident "--" ";"
    fn parse_stmt(&mut self) -> Result<Node> {
        if self.consume(&TokenKind::Num) {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::SemiColon)?;
            Ok(Node::decl(name, DeclKind::Number))
        } else if self.consume(&TokenKind::Str) {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::SemiColon)?;
            Ok(Node::decl(name, DeclKind::String))
        } else if self.consume(&TokenKind::Print) {
            let expr = self.parse_expr()?;
            self.expect(&TokenKind::SemiColon)?;
            Ok(Node::print(expr))
        } else if self.consume(&TokenKind::While) {
            let cond = self.parse_condition()?;
            let body = self.parse_block()?;
            Ok(Node::while_loop(cond, body))
        } else if self.consume(&TokenKind::If) {
            let cond = self.parse_condition()?;
            let body = self.parse_block()?;
            if self.consume(&TokenKind::Else) {
                let else_body = self.parse_block()?;
                Ok(Node::if_else(cond, body, else_body))
            } else {
                Ok(Node::if_then(cond, body))
            }
        } else {
            let name = self.expect_ident()?;
            let node = if self.consume(&TokenKind::Equal) {
                Node::assign(name, self.parse_expr()?)
            } else if self.consume(&TokenKind::Increment) {
                Node::inc(name)
            } else if self.consume(&TokenKind::Decrement) {
                Node::dec(name)
            } else {
                return Err(self.unexpected("Equal, Increment or Decrement"));
            };
            self.expect(&TokenKind::SemiColon)?;
            Ok(node)
        }
    }

    /// condition = "(" expr ")"
    fn parse_condition(&mut self) -> Result<Node> {
        self.expect(&TokenKind::OpenParen)?;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::CloseParen)?;
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Node> {
        self.parse_or()
    }

    /// or = and ("||" and)*
    fn parse_or(&mut self) -> Result<Node> {
        let mut node = self.parse_and()?;
        while self.consume(&TokenKind::DoublePipe) {
            node = Node::logical(node, LogicalOp::Or, self.parse_and()?);
        }
        Ok(node)
    }

    /// and = not ("&&" not)*
    fn parse_and(&mut self) -> Result<Node> {
        let mut node = self.parse_not()?;
        while self.consume(&TokenKind::DoubleAmpersand) {
            node = Node::logical(node, LogicalOp::And, self.parse_not()?);
        }
        Ok(node)
    }

    /// not = "!" not | relational
    fn parse_not(&mut self) -> Result<Node> {
        if self.consume(&TokenKind::Exclamation) {
            return Ok(Node::not(self.parse_not()?));
        }
        self.parse_relational()
    }

    /// relational = add (("==" | "!=" | ">" | "<" | ">=" | "<=") add)?
    fn parse_relational(&mut self) -> Result<Node> {
        let node = self.parse_add()?;

        let op = match self.peek() {
            Some(TokenKind::DoubleEqual) => RelOp::Equal,
            Some(TokenKind::NotEqual) => RelOp::NotEqual,
            Some(TokenKind::GreaterThan) => RelOp::Greater,
            Some(TokenKind::LessThan) => RelOp::Less,
            Some(TokenKind::GreaterEqual) => RelOp::GreaterEqual,
            Some(TokenKind::LessEqual) => RelOp::LessEqual,
            _ => return Ok(node),
        };
        self.index += 1;

        Ok(Node::relational(node, op, self.parse_add()?))
    }

    /// add = mul ("+" mul | "-" mul)*
    fn parse_add(&mut self) -> Result<Node> {
        let mut node = self.parse_mul()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => ArithOp::Add,
                Some(TokenKind::Minus) => ArithOp::Sub,
                _ => return Ok(node),
            };
            self.index += 1;
            node = Node::arith(node, op, self.parse_mul()?);
        }
    }

    /// mul = unary ("*" unary | "/" unary)*
    fn parse_mul(&mut self) -> Result<Node> {
        let mut node = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => ArithOp::Mul,
                Some(TokenKind::Slash) => ArithOp::Div,
                _ => return Ok(node),
            };
            self.index += 1;
            node = Node::arith(node, op, self.parse_unary()?);
        }
    }

    /// unary = ("+" | "-")? primary
    fn parse_unary(&mut self) -> Result<Node> {
        if self.consume(&TokenKind::Plus) {
            self.parse_primary()
        } else if self.consume(&TokenKind::Minus) {
            Ok(Node::arith(Node::int(0), ArithOp::Sub, self.parse_primary()?))
        } else {
            self.parse_primary()
        }
    }

    /// primary = int | float | string | ident | "(" expr ")"
    fn parse_primary(&mut self) -> Result<Node> {
        let node = match self.peek() {
            Some(TokenKind::OpenParen) => {
                self.index += 1;
                let node = self.parse_expr()?;
                self.expect(&TokenKind::CloseParen)?;
                return Ok(node);
            }
            Some(TokenKind::IntLit(value)) => Node::int(*value),
            Some(TokenKind::FloatLit(value)) => Node::float(*value),
            Some(TokenKind::StrLit(value)) => Node::str(value.clone()),
            Some(TokenKind::Ident(name)) => Node::ident(name.clone()),
            _ => return Err(self.unexpected("expression")),
        };
        self.index += 1;
        Ok(node)
    }
}
