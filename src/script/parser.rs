use crate::script::ast::*;
use crate::script::lexer::{LexError, Lexer, Token};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, Error)]
#[error("Parse error at line {}, column {}: {}", .location.line, .location.column, .message)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for heap scripts
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse the entire script
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        loop {
            self.skip_separators();
            if self.is_at_end() {
                break;
            }
            let stmt = self.parse_statement()?;
            program.statements.push(stmt);
            self.expect_statement_end()?;
        }

        Ok(program)
    }

    /// Parse a single statement
    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.current_location();

        match self.peek_token() {
            Token::Slots(_) => {
                self.advance();
                self.expect_token(&Token::Class(location), "Expected 'class' after 'slots'")?;
                self.parse_class_definition(location, true)
            }
            Token::Class(_) => {
                self.advance();
                self.parse_class_definition(location, false)
            }
            Token::Footprint(_) => {
                self.advance();
                let mut exprs = vec![self.parse_expression()?];
                while self.match_token(&Token::Comma(location)) {
                    exprs.push(self.parse_expression()?);
                }
                Ok(Statement::Footprint { exprs, location })
            }
            Token::Sizeof(_) => {
                self.advance();
                let expr = self.parse_expression()?;
                Ok(Statement::Sizeof { expr, location })
            }
            Token::Dump(_) => {
                self.advance();
                let expr = self.parse_expression()?;
                Ok(Statement::Dump { expr, location })
            }
            Token::Print(_) => {
                self.advance();
                let expr = self.parse_expression()?;
                Ok(Statement::Print { expr, location })
            }
            _ => {
                let expr = self.parse_expression()?;
                if self.match_token(&Token::Eq(location)) {
                    let target = Self::assignment_target(expr)?;
                    let value = self.parse_expression()?;
                    Ok(Statement::Assign {
                        target,
                        value,
                        location,
                    })
                } else {
                    Ok(Statement::Expr { expr, location })
                }
            }
        }
    }

    /// Parse the rest of a class definition: Name(field, ...)
    fn parse_class_definition(
        &mut self,
        location: SourceLocation,
        slots: bool,
    ) -> Result<Statement, ParseError> {
        let name = self.expect_identifier()?;
        self.expect_token(
            &Token::LParen(self.current_location()),
            "Expected '(' after class name",
        )?;

        let mut fields = Vec::new();
        while !self.check(&Token::RParen(self.current_location())) {
            let field_loc = self.current_location();
            let field = self.expect_identifier()?;
            if fields.contains(&field) {
                return Err(ParseError {
                    message: format!("Duplicate field '{}' in class '{}'", field, name),
                    location: field_loc,
                });
            }
            fields.push(field);
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_token(
            &Token::RParen(self.current_location()),
            "Expected ')' after class fields",
        )?;

        Ok(Statement::ClassDef {
            name,
            fields,
            slots,
            location,
        })
    }

    /// Convert a parsed expression into an assignment target
    fn assignment_target(expr: Expr) -> Result<Target, ParseError> {
        match expr {
            Expr::Name(name, _) => Ok(Target::Name(name)),
            Expr::Attribute { object, name, .. } => Ok(Target::Attribute {
                object: *object,
                name,
            }),
            Expr::Index { object, index, .. } => Ok(Target::Index {
                object: *object,
                index: *index,
            }),
            other => Err(ParseError {
                message: format!("Cannot assign to '{}'", other),
                location: other.location(),
            }),
        }
    }

    /// Parse an expression: a primary followed by any number of
    /// `.name`, `.method(args)` and `[index]` suffixes
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let location = self.current_location();
            if self.match_token(&Token::Dot(location)) {
                let name = self.expect_identifier()?;
                if self.match_token(&Token::LParen(location)) {
                    let args = self.parse_arguments(Token::RParen(location), "')'")?;
                    expr = Expr::MethodCall {
                        object: Box::new(expr),
                        method: name,
                        args,
                        location,
                    };
                } else {
                    expr = Expr::Attribute {
                        object: Box::new(expr),
                        name,
                        location,
                    };
                }
            } else if self.match_token(&Token::LBracket(location)) {
                let index = self.parse_expression()?;
                self.expect_token(
                    &Token::RBracket(self.current_location()),
                    "Expected ']' after index",
                )?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse comma-separated expressions up to `close` (consumed).
    /// A trailing comma is allowed.
    fn parse_arguments(&mut self, close: Token, close_text: &str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.check(&close) {
            items.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }
        self.expect_token(&close, &format!("Expected {}", close_text))?;
        Ok(items)
    }

    /// Parse primary (literals, names, calls, brackets)
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();

        match self.peek_token() {
            Token::IntLiteral(n, loc) => {
                self.advance();
                Ok(Expr::Int(n, loc))
            }
            Token::FloatLiteral(x, loc) => {
                self.advance();
                Ok(Expr::Float(x, loc))
            }
            Token::StringLiteral(s, loc) => {
                self.advance();
                Ok(Expr::Str(s, loc))
            }
            Token::BytesLiteral(b, loc) => {
                self.advance();
                Ok(Expr::Bytes(b, loc))
            }
            Token::None(loc) => {
                self.advance();
                Ok(Expr::None(loc))
            }
            Token::True(loc) => {
                self.advance();
                Ok(Expr::Bool(true, loc))
            }
            Token::False(loc) => {
                self.advance();
                Ok(Expr::Bool(false, loc))
            }
            Token::Minus(loc) => {
                self.advance();
                match self.peek_token() {
                    Token::IntLiteral(n, _) => {
                        self.advance();
                        Ok(Expr::Int(-n, loc))
                    }
                    Token::FloatLiteral(x, _) => {
                        self.advance();
                        Ok(Expr::Float(-x, loc))
                    }
                    _ => Err(ParseError {
                        message: format!("Expected number after '-', found {}", self.peek()),
                        location: self.current_location(),
                    }),
                }
            }
            Token::Ident(name, loc) => {
                self.advance();
                if self.match_token(&Token::LParen(loc)) {
                    let args = self.parse_arguments(Token::RParen(loc), "')'")?;
                    Ok(Expr::Call {
                        callee: name,
                        args,
                        location: loc,
                    })
                } else {
                    Ok(Expr::Name(name, loc))
                }
            }
            Token::LBracket(_) => {
                self.advance();
                let items = self.parse_arguments(Token::RBracket(loc), "']'")?;
                Ok(Expr::List(items, loc))
            }
            Token::LParen(_) => {
                self.advance();
                self.parse_parenthesized(loc)
            }
            Token::LBrace(_) => {
                self.advance();
                self.parse_braced(loc)
            }
            _ => Err(ParseError {
                message: format!("Unexpected token: {}", self.peek()),
                location: loc,
            }),
        }
    }

    /// After '(': empty tuple, grouping, or tuple
    fn parse_parenthesized(&mut self, loc: SourceLocation) -> Result<Expr, ParseError> {
        if self.match_token(&Token::RParen(loc)) {
            return Ok(Expr::Tuple(Vec::new(), loc));
        }

        let first = self.parse_expression()?;
        if self.match_token(&Token::RParen(loc)) {
            return Ok(first);
        }

        self.expect_token(
            &Token::Comma(self.current_location()),
            "Expected ',' or ')' in parenthesized expression",
        )?;
        let mut items = vec![first];
        items.extend(self.parse_arguments(Token::RParen(loc), "')'")?);
        Ok(Expr::Tuple(items, loc))
    }

    /// After '{': dict (`{}` or `{k: v}`) or set (`{a, b}`)
    fn parse_braced(&mut self, loc: SourceLocation) -> Result<Expr, ParseError> {
        if self.match_token(&Token::RBrace(loc)) {
            return Ok(Expr::Dict(Vec::new(), loc));
        }

        let first = self.parse_expression()?;
        if !self.match_token(&Token::Colon(loc)) {
            let mut items = vec![first];
            if self.match_token(&Token::Comma(loc)) {
                items.extend(self.parse_arguments(Token::RBrace(loc), "'}'")?);
            } else {
                self.expect_token(&Token::RBrace(loc), "Expected ',' or '}' in set")?;
            }
            return Ok(Expr::Set(items, loc));
        }

        let mut pairs = vec![(first, self.parse_expression()?)];
        while self.match_token(&Token::Comma(loc)) {
            if self.check(&Token::RBrace(loc)) {
                break;
            }
            let key = self.parse_expression()?;
            self.expect_token(&Token::Colon(loc), "Expected ':' after dict key")?;
            let value = self.parse_expression()?;
            pairs.push((key, value));
        }
        self.expect_token(&Token::RBrace(loc), "Expected ',' or '}' in dict")?;
        Ok(Expr::Dict(pairs, loc))
    }

    // ===== Helper methods =====

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Token::Newline(_) | Token::Semicolon(_)) {
            self.advance();
        }
    }

    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Token::Newline(_) | Token::Semicolon(_) | Token::Eof(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected end of statement, found {}", other),
                location: self.current_location(),
            }),
        }
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_token(&self) -> Token {
        self.tokens[self.position].clone()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError {
                message: format!("{}, found {}", message, self.peek()),
                location: self.current_location(),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            Ok(name)
        } else {
            Err(ParseError {
                message: format!("Expected identifier, found {}", self.peek()),
                location: self.current_location(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn test_parse_class_definitions() {
        let program = parse("class DataItem(name, age, address)\nslots class Packed(a, b)");

        assert_eq!(program.statements.len(), 2);
        match &program.statements[0] {
            Statement::ClassDef {
                name,
                fields,
                slots,
                ..
            } => {
                assert_eq!(name, "DataItem");
                assert_eq!(fields, &["name", "age", "address"]);
                assert!(!slots);
            }
            _ => panic!("Expected class definition"),
        }
        assert!(matches!(
            &program.statements[1],
            Statement::ClassDef { slots: true, .. }
        ));
    }

    #[test]
    fn test_parse_assignment_targets() {
        let program = parse("x = 1; x.weight = 66; xs[0] = x");

        assert!(matches!(
            &program.statements[0],
            Statement::Assign { target: Target::Name(n), .. } if n == "x"
        ));
        assert!(matches!(
            &program.statements[1],
            Statement::Assign { target: Target::Attribute { name, .. }, .. } if name == "weight"
        ));
        assert!(matches!(
            &program.statements[2],
            Statement::Assign { target: Target::Index { .. }, .. }
        ));
    }

    #[test]
    fn test_parse_containers() {
        let program = parse("v = [(), (1,), (1, 2), {}, {1, 2}, {\"k\": -3, }]");

        let Statement::Assign { value: Expr::List(items, _), .. } = &program.statements[0] else {
            panic!("Expected list assignment");
        };
        assert!(matches!(&items[0], Expr::Tuple(v, _) if v.is_empty()));
        assert!(matches!(&items[1], Expr::Tuple(v, _) if v.len() == 1));
        assert!(matches!(&items[2], Expr::Tuple(v, _) if v.len() == 2));
        assert!(matches!(&items[3], Expr::Dict(v, _) if v.is_empty()));
        assert!(matches!(&items[4], Expr::Set(v, _) if v.len() == 2));
        match &items[5] {
            Expr::Dict(pairs, _) => {
                assert_eq!(pairs.len(), 1);
                assert!(matches!(pairs[0].1, Expr::Int(-3, _)));
            }
            other => panic!("Expected dict, got {:?}", other),
        }
    }

    #[test]
    fn test_grouping_is_not_tuple() {
        let program = parse("x = (5)");
        assert!(matches!(
            &program.statements[0],
            Statement::Assign { value: Expr::Int(5, _), .. }
        ));
    }

    #[test]
    fn test_parse_footprint_and_methods() {
        let program = parse("xs.append(xs)\nfootprint a, b.c, d[0]\nsizeof a\ndump a\nprint a");

        assert!(matches!(
            &program.statements[0],
            Statement::Expr { expr: Expr::MethodCall { method, .. }, .. } if method == "append"
        ));
        match &program.statements[1] {
            Statement::Footprint { exprs, .. } => {
                let labels: Vec<String> = exprs.iter().map(|e| e.to_string()).collect();
                assert_eq!(labels, vec!["a", "b.c", "d[0]"]);
            }
            _ => panic!("Expected footprint statement"),
        }
        assert!(matches!(&program.statements[2], Statement::Sizeof { .. }));
        assert!(matches!(&program.statements[3], Statement::Dump { .. }));
        assert!(matches!(&program.statements[4], Statement::Print { .. }));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = Parser::new("1 = x").unwrap().parse_program().unwrap_err();
        assert_eq!(err.message, "Cannot assign to '1'");
    }

    #[test]
    fn test_missing_statement_end() {
        let err = Parser::new("x = 1 y = 2").unwrap().parse_program().unwrap_err();
        assert!(err.message.starts_with("Expected end of statement"));
        assert_eq!(err.location, SourceLocation::new(1, 7));
    }
}
