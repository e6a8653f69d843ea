use phf::phf_map;

pub(super) static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "num" => TokenKind::Num,
    "str" => TokenKind::Str,
    "print" => TokenKind::Print,
    "while" => TokenKind::While,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
};

pub(super) static TWO_SYMBOLS_TOKENS: phf::Map<&'static str, TokenKind> = phf_map! {
    "==" => TokenKind::DoubleEqual,
    "!=" => TokenKind::NotEqual,
    "<=" => TokenKind::LessEqual,
    ">=" => TokenKind::GreaterEqual,
    "&&" => TokenKind::DoubleAmpersand,
    "||" => TokenKind::DoublePipe,
    "++" => TokenKind::Increment,
    "--" => TokenKind::Decrement,
};

pub(super) static ONE_SYMBOL_TOKENS: phf::Map<char, TokenKind> = phf_map! {
    '+' => TokenKind::Plus,
    '-' => TokenKind::Minus,
    '*' => TokenKind::Star,
    '/' => TokenKind::Slash,
    '(' => TokenKind::OpenParen,
    ')' => TokenKind::CloseParen,
    '{' => TokenKind::OpenCurlyBrace,
    '}' => TokenKind::CloseCurlyBrace,
    ';' => TokenKind::SemiColon,
    '=' => TokenKind::Equal,
    '<' => TokenKind::LessThan,
    '>' => TokenKind::GreaterThan,
    '!' => TokenKind::Exclamation,
};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    IntLit(i32),
    FloatLit(f64),
    StrLit(String),
    Ident(String),

    Num,
    Str,
    Print,
    While,
    If,
    Else,

    Plus,
    Minus,
    Star,
    Slash,
    OpenParen,
    CloseParen,
    OpenCurlyBrace,
    CloseCurlyBrace,
    SemiColon,
    Equal,

    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    DoubleEqual,
    NotEqual,

    DoubleAmpersand,
    DoublePipe,
    Exclamation,

    Increment,
    Decrement,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}
