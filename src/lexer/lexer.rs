use crate::error::LexError;

use super::token::{Token, TokenKind, KEYWORDS, ONE_SYMBOL_TOKENS, TWO_SYMBOLS_TOKENS};

#[derive(Debug)]
pub struct Lexer {
    tokens: Vec<Token>,
    index: usize,
    line: usize,
}

impl Lexer {
    fn new() -> Self {
        Self {
            tokens: vec![],
            index: 0,
            line: 1,
        }
    }

    fn new_token(&mut self, kind: TokenKind, len: usize) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
        self.index += len;
    }

    fn parse_number(&mut self, chars: &[char]) -> Result<(), LexError> {
        let s: String = chars
            .iter()
            .take_while(|c| c.is_ascii_digit() || **c == '.')
            .collect();

        let kind = if s.contains('.') {
            s.parse().map(TokenKind::FloatLit).ok()
        } else {
            s.parse().map(TokenKind::IntLit).ok()
        };
        let Some(kind) = kind else {
            return Err(LexError::InvalidNumber {
                line: self.line,
                text: s,
            });
        };

        self.new_token(kind, s.chars().count());
        Ok(())
    }

    fn parse_identifier(&mut self, chars: &[char]) {
        let s: String = chars
            .iter()
            .take_while(|&&c| c.is_ascii_alphanumeric() || c == '_')
            .collect();
        let len = s.len();

        if let Some(kind) = KEYWORDS.get(s.as_str()) {
            self.new_token(kind.clone(), len);
        } else {
            self.new_token(TokenKind::Ident(s), len);
        }
    }

    /// string = '"' (char | '\' escape)* '"'
    fn parse_string(&mut self, chars: &[char]) -> Result<(), LexError> {
        let start_line = self.line;
        let mut value = String::new();
        let mut i = 1;

        loop {
            match chars.get(i) {
                None => return Err(LexError::UnterminatedString { line: start_line }),
                Some('"') => break,
                Some('\\') => {
                    let escaped = match chars.get(i + 1) {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(&c) => {
                            return Err(LexError::UnexpectedChar {
                                line: self.line,
                                found: c,
                            })
                        }
                        None => return Err(LexError::UnterminatedString { line: start_line }),
                    };
                    value.push(escaped);
                    i += 2;
                }
                Some(&c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    value.push(c);
                    i += 1;
                }
            }
        }

        self.tokens.push(Token {
            kind: TokenKind::StrLit(value),
            line: start_line,
        });
        self.index += i + 1;
        Ok(())
    }

    fn skip_line_comment(&mut self, chars: &[char]) {
        self.index += chars.iter().take_while(|&&c| c != '\n').count();
    }

    fn _tokenize(&mut self, s: &str) -> Result<(), LexError> {
        let chars: Vec<_> = s.chars().collect();

        while self.index < chars.len() {
            let c = chars[self.index];
            let c2 = chars[self.index..].iter().take(2).collect::<String>();

            if c == '\n' {
                self.line += 1;
                self.index += 1;
            } else if c.is_whitespace() {
                self.index += 1;
            } else if c2 == "//" {
                self.skip_line_comment(&chars[self.index..]);
            } else if c.is_ascii_digit() {
                self.parse_number(&chars[self.index..])?;
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.parse_identifier(&chars[self.index..]);
            } else if c == '"' {
                self.parse_string(&chars[self.index..])?;
            } else if let Some(kind) = TWO_SYMBOLS_TOKENS.get(c2.as_str()) {
                self.new_token(kind.clone(), 2);
            } else if let Some(kind) = ONE_SYMBOL_TOKENS.get(&c) {
                self.new_token(kind.clone(), 1);
            } else {
                return Err(LexError::UnexpectedChar {
                    line: self.line,
                    found: c,
                });
            }
        }

        Ok(())
    }

    pub fn tokenize(s: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new();
        lexer._tokenize(s)?;

        Ok(lexer.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(s: &str) -> Vec<TokenKind> {
        Lexer::tokenize(s)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_symbols() {
        assert_eq!(
            kinds("num x; x++; while (x <= 3.5) {}"),
            vec![
                TokenKind::Num,
                TokenKind::Ident("x".to_string()),
                TokenKind::SemiColon,
                TokenKind::Ident("x".to_string()),
                TokenKind::Increment,
                TokenKind::SemiColon,
                TokenKind::While,
                TokenKind::OpenParen,
                TokenKind::Ident("x".to_string()),
                TokenKind::LessEqual,
                TokenKind::FloatLit(3.5),
                TokenKind::CloseParen,
                TokenKind::OpenCurlyBrace,
                TokenKind::CloseCurlyBrace,
            ]
        );
    }

    #[test]
    fn strings_and_comments() {
        assert_eq!(
            kinds("print \"a\\\"b\\n\"; // trailing\nprint 1;"),
            vec![
                TokenKind::Print,
                TokenKind::StrLit("a\"b\n".to_string()),
                TokenKind::SemiColon,
                TokenKind::Print,
                TokenKind::IntLit(1),
                TokenKind::SemiColon,
            ]
        );
    }

    #[test]
    fn tracks_lines() {
        let tokens = Lexer::tokenize("num a;\n\nstr b;").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[3].line, 3);
    }

    #[test]
    fn rejects_unknown_characters() {
        assert_eq!(
            Lexer::tokenize("num a;\n@"),
            Err(LexError::UnexpectedChar { line: 2, found: '@' })
        );
        assert_eq!(
            Lexer::tokenize("print \"oops"),
            Err(LexError::UnterminatedString { line: 1 })
        );
        assert!(matches!(
            Lexer::tokenize("x = 1.2.3;"),
            Err(LexError::InvalidNumber { .. })
        ));
    }
}
