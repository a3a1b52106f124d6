//! Tokenizer for the formula language.
//!
//! Turns a formula string into a flat token list ending in a single
//! [`TokenKind::End`] marker. The tokenizer is a pure function of its input;
//! callers re-tokenize from scratch for every parse.

use super::errors::{EngineError, EngineResult};

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
    And,
    Or,
    Not,
    Max,
    Min,
    CellRef,
    Comma,
    End,
    True,
    False,
}

/// A single token with its source text and 0-based position, used only for
/// diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }
}

/// Lexical analyzer over the characters of one formula.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenizes the whole input.
    ///
    /// Fails with [`EngineError::Lex`] on a character outside the language
    /// or an identifier that is neither a keyword nor a cell reference.
    pub fn tokenize(mut self) -> EngineResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(current) = self.current() else {
                break;
            };

            if current.is_ascii_digit() {
                tokens.push(self.read_number());
            } else if current.is_alphabetic() {
                tokens.push(self.read_identifier()?);
            } else {
                tokens.push(self.read_operator()?);
            }
        }

        tokens.push(Token::new(TokenKind::End, "", self.input.len()));
        Ok(tokens)
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(|ch| ch.is_whitespace()) {
            self.position += 1;
        }
    }

    /// Reads a maximal run of decimal digits. Integer literals only: no
    /// decimal point, no exponent, no sign (sign is the parser's unary
    /// operator).
    fn read_number(&mut self) -> Token {
        let start = self.position;
        let mut text = String::new();

        while let Some(ch) = self.current() {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.position += 1;
        }

        Token::new(TokenKind::Number, text, start)
    }

    /// Reads a letter-led run of letters/digits/underscores and classifies
    /// it as a keyword or a cell reference.
    fn read_identifier(&mut self) -> EngineResult<Token> {
        let start = self.position;
        let mut text = String::new();

        while let Some(ch) = self.current() {
            if !ch.is_alphanumeric() && ch != '_' {
                break;
            }
            text.push(ch);
            self.position += 1;
        }

        let kind = match text.to_lowercase().as_str() {
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "not" => Some(TokenKind::Not),
            "max" => Some(TokenKind::Max),
            "min" => Some(TokenKind::Min),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            _ => None,
        };

        if let Some(kind) = kind {
            // Keywords are stored lower-cased; cell references keep the
            // user's casing.
            return Ok(Token::new(kind, text.to_lowercase(), start));
        }

        if is_cell_reference_shaped(&text) {
            return Ok(Token::new(TokenKind::CellRef, text, start));
        }

        Err(EngineError::lex(
            format!("unknown identifier '{}' at position {}", text, start),
            start,
        ))
    }

    fn read_operator(&mut self) -> EngineResult<Token> {
        let start = self.position;
        let current = self.input[self.position];

        let simple = |kind, text: &str| Ok(Token::new(kind, text, start));

        self.position += 1;
        match current {
            '+' => simple(TokenKind::Plus, "+"),
            '-' => simple(TokenKind::Minus, "-"),
            '*' => simple(TokenKind::Star, "*"),
            '/' => simple(TokenKind::Slash, "/"),
            '(' => simple(TokenKind::LeftParen, "("),
            ')' => simple(TokenKind::RightParen, ")"),
            ',' => simple(TokenKind::Comma, ","),
            '=' => simple(TokenKind::Eq, "="),
            '<' => match self.current() {
                Some('=') => {
                    self.position += 1;
                    simple(TokenKind::Le, "<=")
                }
                Some('>') => {
                    self.position += 1;
                    simple(TokenKind::Ne, "<>")
                }
                _ => simple(TokenKind::Lt, "<"),
            },
            '>' => {
                if self.current() == Some('=') {
                    self.position += 1;
                    simple(TokenKind::Ge, ">=")
                } else {
                    simple(TokenKind::Gt, ">")
                }
            }
            _ => Err(EngineError::lex(
                format!("unknown character '{}' at position {}", current, start),
                start,
            )),
        }
    }
}

/// One or more letters followed by one or more digits, nothing else.
fn is_cell_reference_shaped(text: &str) -> bool {
    let letters = text.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    if letters == 0 || letters == text.len() {
        return false;
    }
    text.chars().skip(letters).all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("42 007").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].text, "007");
        assert_eq!(tokens[2].kind, TokenKind::End);
    }

    #[test]
    fn test_number_literals_are_integer_only() {
        // The dot is not part of the language, so "3.14" lexes as a number
        // and then fails on the unknown character.
        assert!(Lexer::new("3.14").tokenize().is_err());
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / ( ) , = < > <= >= <>"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Comma,
                TokenKind::Eq,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Ne,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_two_character_operators_are_greedy() {
        let tokens = Lexer::new("1<=2").tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Le);
        assert_eq!(tokens[1].text, "<=");

        let tokens = Lexer::new("1<>2").tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Ne);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("and OR Not MAX min TRUE False"),
            vec![
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Max,
                TokenKind::Min,
                TokenKind::True,
                TokenKind::False,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_cell_references_keep_casing() {
        let tokens = Lexer::new("a1 BC12").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::CellRef);
        assert_eq!(tokens[0].text, "a1");
        assert_eq!(tokens[1].kind, TokenKind::CellRef);
        assert_eq!(tokens[1].text, "BC12");
    }

    #[test]
    fn test_unknown_identifier() {
        let err = Lexer::new("sum").tokenize().unwrap_err();
        assert!(matches!(err, EngineError::Lex { .. }));
        assert_eq!(err.to_string(), "unknown identifier 'sum' at position 0");

        // Digits inside the letter run break the reference shape.
        assert!(Lexer::new("A1B").tokenize().is_err());
        assert!(Lexer::new("x_1").tokenize().is_err());
    }

    #[test]
    fn test_unknown_character() {
        let err = Lexer::new("1 @ 2").tokenize().unwrap_err();
        assert!(matches!(err, EngineError::Lex { position: Some(2), .. }));
    }

    #[test]
    fn test_end_token_position() {
        let tokens = Lexer::new("1+2").tokenize().unwrap();
        let end = tokens.last().unwrap();
        assert_eq!(end.kind, TokenKind::End);
        assert_eq!(end.position, 3);

        let tokens = Lexer::new("").tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::End);
        assert_eq!(tokens[0].position, 0);
    }

    #[test]
    fn test_whitespace_is_skipped() {
        assert_eq!(
            kinds("  1 +\t2  "),
            vec![TokenKind::Number, TokenKind::Plus, TokenKind::Number, TokenKind::End]
        );
    }
}
