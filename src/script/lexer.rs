//! Lexer (tokenizer) for heap scripts
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Statements are line-oriented, so newlines are significant and produce
//! [`Token::Newline`], except inside brackets where a literal may span lines.
//! `#` starts a comment that runs to the end of the line.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    StringLiteral(String, SourceLocation),
    BytesLiteral(Vec<u8>, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    Class(SourceLocation),
    Slots(SourceLocation),
    Footprint(SourceLocation),
    Sizeof(SourceLocation),
    Dump(SourceLocation),
    Print(SourceLocation),
    None(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),

    // Operators and punctuation
    Eq(SourceLocation),        // =
    Minus(SourceLocation),     // -
    Dot(SourceLocation),       // .
    Colon(SourceLocation),     // :
    Comma(SourceLocation),     // ,
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Semicolon(SourceLocation), // ;

    // Statement separator
    Newline(SourceLocation),

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::FloatLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::BytesLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Class(loc)
            | Token::Slots(loc)
            | Token::Footprint(loc)
            | Token::Sizeof(loc)
            | Token::Dump(loc)
            | Token::Print(loc)
            | Token::None(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::Eq(loc)
            | Token::Minus(loc)
            | Token::Dot(loc)
            | Token::Colon(loc)
            | Token::Comma(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Newline(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::FloatLiteral(x, _) => write!(f, "float literal {:?}", x),
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s),
            Token::BytesLiteral(b, _) => write!(f, "bytes literal of length {}", b.len()),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Class(_) => write!(f, "'class'"),
            Token::Slots(_) => write!(f, "'slots'"),
            Token::Footprint(_) => write!(f, "'footprint'"),
            Token::Sizeof(_) => write!(f, "'sizeof'"),
            Token::Dump(_) => write!(f, "'dump'"),
            Token::Print(_) => write!(f, "'print'"),
            Token::None(_) => write!(f, "'None'"),
            Token::True(_) => write!(f, "'True'"),
            Token::False(_) => write!(f, "'False'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::Comma(_) => write!(f, "','"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Newline(_) => write!(f, "end of line"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, Error)]
#[error("Lexer error at line {}, column {}: {}", .location.line, .location.column, .message)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for heap scripts
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Open `(`, `[` and `{` count; newlines inside brackets are skipped
    nesting: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            nesting: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            let token = self.next_token()?;
            // Collapse runs of blank lines into one separator
            if matches!(token, Token::Newline(_)) && matches!(tokens.last(), Some(Token::Newline(_)) | None) {
                continue;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            '\n' => Ok(Token::Newline(loc)),

            // Bytes literals
            'b' if self.peek() == Some('"') => {
                self.advance(); // consume opening quote
                let text = self.quoted_text(loc)?;
                if let Some(c) = text.chars().find(|c| *c as u32 > 0xff) {
                    return Err(LexError {
                        message: format!("Non-byte character '{}' in bytes literal", c),
                        location: loc,
                    });
                }
                Ok(Token::BytesLiteral(
                    text.chars().map(|c| c as u8).collect(),
                    loc,
                ))
            }

            // String literals
            '"' => Ok(Token::StringLiteral(self.quoted_text(loc)?, loc)),

            // Numeric literals
            '0'..='9' => self.number_literal(ch, loc),

            // Identifiers and keywords
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),

            '=' => Ok(Token::Eq(loc)),
            '-' => Ok(Token::Minus(loc)),
            '.' => Ok(Token::Dot(loc)),
            ':' => Ok(Token::Colon(loc)),
            ',' => Ok(Token::Comma(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            '(' => {
                self.nesting += 1;
                Ok(Token::LParen(loc))
            }
            '[' => {
                self.nesting += 1;
                Ok(Token::LBracket(loc))
            }
            '{' => {
                self.nesting += 1;
                Ok(Token::LBrace(loc))
            }
            ')' => {
                self.nesting = self.nesting.saturating_sub(1);
                Ok(Token::RParen(loc))
            }
            ']' => {
                self.nesting = self.nesting.saturating_sub(1);
                Ok(Token::RBracket(loc))
            }
            '}' => {
                self.nesting = self.nesting.saturating_sub(1);
                Ok(Token::RBrace(loc))
            }

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Read the body of a quoted literal; the opening quote is already consumed
    fn quoted_text(&mut self, loc: SourceLocation) -> Result<String, LexError> {
        let mut text = String::new();

        while let Some(ch) = self.peek() {
            if ch == '"' {
                self.advance(); // consume closing quote
                return Ok(text);
            }
            if ch == '\n' {
                break;
            }

            if ch == '\\' {
                self.advance();
                let escaped = self.advance().ok_or_else(|| LexError {
                    message: "Unexpected end of file in string literal".to_string(),
                    location: self.current_location(),
                })?;

                let unescaped = match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '\\' => '\\',
                    '"' => '"',
                    '0' => '\0',
                    'x' => self.hex_escape()?,
                    _ => {
                        return Err(LexError {
                            message: format!("Unknown escape sequence: \\{}", escaped),
                            location: self.current_location(),
                        });
                    }
                };
                text.push(unescaped);
            } else {
                text.push(ch);
                self.advance();
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Parse the two digits of a `\xHH` escape
    fn hex_escape(&mut self) -> Result<char, LexError> {
        let mut hex = String::new();
        for _ in 0..2 {
            let digit = self.advance().ok_or_else(|| LexError {
                message: "Incomplete hex escape sequence".to_string(),
                location: self.current_location(),
            })?;
            hex.push(digit);
        }
        u8::from_str_radix(&hex, 16)
            .map(char::from)
            .map_err(|_| LexError {
                message: format!("Invalid hex escape sequence: \\x{}", hex),
                location: self.current_location(),
            })
    }

    /// Parse numeric literal (integer or float)
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut num_str = String::new();
        num_str.push(first_digit);
        let mut is_float = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                if ch != '_' {
                    num_str.push(ch);
                }
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if is_float {
            let value = num_str.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid float literal: {}", num_str),
                location: loc,
            })?;
            Ok(Token::FloatLiteral(value, loc))
        } else {
            let value = num_str.parse::<i64>().map_err(|_| LexError {
                message: format!("Invalid integer literal: {}", num_str),
                location: loc,
            })?;
            Ok(Token::IntLiteral(value, loc))
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "class" => Token::Class(loc),
            "slots" => Token::Slots(loc),
            "footprint" => Token::Footprint(loc),
            "sizeof" => Token::Sizeof(loc),
            "dump" => Token::Dump(loc),
            "print" => Token::Print(loc),
            "None" => Token::None(loc),
            "True" => Token::True(loc),
            "False" => Token::False(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Skip whitespace and comments; newlines are kept unless inside brackets
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') if self.nesting > 0 => {
                    self.advance();
                }
                Some('#') => self.skip_line_comment(),
                _ => break,
            }
        }
    }

    /// Skip to the end of the line, leaving the newline itself
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_tokens() {
        let mut lexer = Lexer::new("d1 = DataItem(\"Alex\", 42)\nfootprint d1");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "d1"));
        assert!(matches!(tokens[1], Token::Eq(_)));
        assert!(matches!(tokens[2], Token::Ident(ref s, _) if s == "DataItem"));
        assert!(matches!(tokens[3], Token::LParen(_)));
        assert!(matches!(tokens[4], Token::StringLiteral(ref s, _) if s == "Alex"));
        assert!(matches!(tokens[5], Token::Comma(_)));
        assert!(matches!(tokens[6], Token::IntLiteral(42, _)));
        assert!(matches!(tokens[7], Token::RParen(_)));
        assert!(matches!(tokens[8], Token::Newline(_)));
        assert!(matches!(tokens[9], Token::Footprint(_)));
        assert!(matches!(tokens[10], Token::Ident(ref s, _) if s == "d1"));
        assert!(matches!(tokens[11], Token::Eof(_)));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let mut lexer = Lexer::new("# header\n\n\nx = 1  # trailing\n\ny = 2\n");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[1], Token::Eq(_)));
        assert!(matches!(tokens[2], Token::IntLiteral(1, _)));
        assert!(matches!(tokens[3], Token::Newline(_)));
        assert!(matches!(tokens[4], Token::Ident(ref s, _) if s == "y"));
        assert!(matches!(tokens[7], Token::Newline(_)));
        assert!(matches!(tokens[8], Token::Eof(_)));
    }

    #[test]
    fn test_newlines_inside_brackets() {
        let mut lexer = Lexer::new("xs = [\n  1,\n  2,\n]");
        let tokens = lexer.tokenize().unwrap();
        assert!(!tokens.iter().any(|t| matches!(t, Token::Newline(_))));
    }

    #[test]
    fn test_literals() {
        let mut lexer = Lexer::new(r#"2.5 1_000 "a\tb" b"\x00\xff" None True"#);
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::FloatLiteral(x, _) if x == 2.5));
        assert!(matches!(tokens[1], Token::IntLiteral(1000, _)));
        assert!(matches!(tokens[2], Token::StringLiteral(ref s, _) if s == "a\tb"));
        assert!(matches!(tokens[3], Token::BytesLiteral(ref b, _) if b == &vec![0u8, 255]));
        assert!(matches!(tokens[4], Token::None(_)));
        assert!(matches!(tokens[5], Token::True(_)));
    }

    #[test]
    fn test_attribute_access_is_not_float() {
        let mut lexer = Lexer::new("xs.append(1)");
        let tokens = lexer.tokenize().unwrap();
        assert!(matches!(tokens[1], Token::Dot(_)));
        assert!(matches!(tokens[2], Token::Ident(ref s, _) if s == "append"));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("x = \"oops\ny = 1");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.location, SourceLocation::new(1, 5));
        assert!(err.to_string().contains("Unterminated string literal"));
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("x = 1 + 2");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.message, "Unexpected character: '+'");
        assert_eq!(err.location.column, 7);
    }
}
