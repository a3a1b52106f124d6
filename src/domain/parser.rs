//! Recursive descent parser and evaluator for formulas.
//!
//! The parser evaluates as it goes: there is no syntax tree, operator
//! precedence is encoded directly in the call chain. The grammar, loosest
//! binding first:
//!
//! ```bnf
//! Or             ::= And ( "or" And )*
//! And            ::= Not ( "and" Not )*
//! Not            ::= "not" Not | Comparison
//! Comparison     ::= Additive ( CMPOP Additive )?
//! Additive       ::= Multiplicative ( ( "+" | "-" ) Multiplicative )*
//! Multiplicative ::= Unary ( ( "*" | "/" ) Unary )*
//! Unary          ::= ( "+" | "-" ) Unary | Primary
//! Primary        ::= Number | "true" | "false" | CellRef
//!                  | Function | "(" Or ")"
//! Function       ::= ( "max" | "min" ) "(" Or ( "," Or )* ")"
//! ```
//!
//! Comparison is deliberately non-chaining: `a < b < c` is a syntax error.
//! Cell references are resolved through the engine, which may recursively
//! evaluate the referenced cell under the cycle guard.

use std::collections::HashSet;

use super::engine::Engine;
use super::errors::{EngineError, EngineResult};
use super::lexer::{Lexer, Token, TokenKind};
use super::models::{Grid, Value, EPSILON};

/// Evaluating parser over one formula's token stream.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    engine: &'a mut Engine,
    guard: &'a mut HashSet<String>,
}

impl<'a> Parser<'a> {
    /// Tokenizes and evaluates a formula in one pass.
    ///
    /// `guard` is the set of cell references currently mid-evaluation on
    /// this call stack; it is threaded through every cell resolution so the
    /// engine can detect cycles.
    pub fn evaluate(
        expression: &str,
        engine: &'a mut Engine,
        guard: &'a mut HashSet<String>,
    ) -> EngineResult<Value> {
        let tokens = Lexer::new(expression).tokenize()?;
        let mut parser = Parser {
            tokens,
            position: 0,
            engine,
            guard,
        };

        let value = parser.parse_or()?;
        if parser.current().kind != TokenKind::End {
            return Err(parser.unexpected_token());
        }
        Ok(value)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn unexpected_token(&self) -> EngineError {
        let token = self.current();
        EngineError::parse_at(
            format!(
                "unexpected token '{}' at position {}",
                token.text, token.position
            ),
            token.position,
        )
    }

    fn parse_or(&mut self) -> EngineResult<Value> {
        let mut left = self.parse_and()?;

        while self.current().kind == TokenKind::Or {
            self.advance();
            let right = self.parse_and()?;
            left = Value::Boolean(left.as_bool() || right.as_bool());
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> EngineResult<Value> {
        let mut left = self.parse_not()?;

        while self.current().kind == TokenKind::And {
            self.advance();
            let right = self.parse_not()?;
            left = Value::Boolean(left.as_bool() && right.as_bool());
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> EngineResult<Value> {
        if self.current().kind == TokenKind::Not {
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Value::Boolean(!operand.as_bool()));
        }

        self.parse_comparison()
    }

    /// At most one comparison operator per expression at this level.
    fn parse_comparison(&mut self) -> EngineResult<Value> {
        let left = self.parse_additive()?;

        let op = self.current().kind;
        if !matches!(
            op,
            TokenKind::Eq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Le
                | TokenKind::Ge
                | TokenKind::Ne
        ) {
            return Ok(left);
        }

        self.advance();
        let right = self.parse_additive()?;

        let l = left.as_number();
        let r = right.as_number();
        let result = match op {
            TokenKind::Eq => (l - r).abs() < EPSILON,
            TokenKind::Ne => (l - r).abs() >= EPSILON,
            TokenKind::Lt => l < r,
            TokenKind::Gt => l > r,
            TokenKind::Le => l <= r,
            TokenKind::Ge => l >= r,
            _ => unreachable!(),
        };

        Ok(Value::Boolean(result))
    }

    fn parse_additive(&mut self) -> EngineResult<Value> {
        let mut left = self.parse_multiplicative()?;

        while matches!(self.current().kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.current().kind;
            self.advance();
            let right = self.parse_multiplicative()?;

            let l = left.as_number();
            let r = right.as_number();
            left = Value::Number(if op == TokenKind::Plus { l + r } else { l - r });
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> EngineResult<Value> {
        let mut left = self.parse_unary()?;

        while matches!(self.current().kind, TokenKind::Star | TokenKind::Slash) {
            let op = self.current().kind;
            self.advance();
            let right = self.parse_unary()?;

            let l = left.as_number();
            let r = right.as_number();
            left = if op == TokenKind::Star {
                Value::Number(l * r)
            } else {
                // Refuse divisors within the tolerance of zero, not just
                // exact zero, so floating noise cannot sneak through.
                if r.abs() < EPSILON {
                    return Err(EngineError::eval("division by zero"));
                }
                Value::Number(l / r)
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> EngineResult<Value> {
        match self.current().kind {
            TokenKind::Plus => {
                // Unary plus passes the operand through untouched.
                self.advance();
                self.parse_unary()
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Value::Number(-operand.as_number()))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> EngineResult<Value> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Number => {
                self.advance();
                let n = token.text.parse::<f64>().map_err(|_| {
                    EngineError::parse_at(
                        format!("invalid number '{}' at position {}", token.text, token.position),
                        token.position,
                    )
                })?;
                Ok(Value::Number(n))
            }
            TokenKind::True => {
                self.advance();
                Ok(Value::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Value::Boolean(false))
            }
            TokenKind::CellRef => {
                self.advance();
                let (row, col) = Grid::parse_cell_reference(&token.text).ok_or_else(|| {
                    EngineError::eval(format!("invalid cell reference '{}'", token.text))
                })?;
                self.engine.cell_value(row, col, self.guard)
            }
            TokenKind::Max | TokenKind::Min => self.parse_function(),
            TokenKind::LeftParen => {
                self.advance();
                let value = self.parse_or()?;

                let closing = self.current();
                if closing.kind != TokenKind::RightParen {
                    return Err(EngineError::parse_at(
                        format!("expected closing parenthesis at position {}", closing.position),
                        closing.position,
                    ));
                }
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected_token()),
        }
    }

    fn parse_function(&mut self) -> EngineResult<Value> {
        let name = self.current().text.clone();
        let pick_max = self.current().kind == TokenKind::Max;
        self.advance();

        if self.current().kind != TokenKind::LeftParen {
            return Err(EngineError::parse(format!(
                "expected opening parenthesis after '{}'",
                name
            )));
        }
        self.advance();

        let mut args = vec![self.parse_or()?];
        while self.current().kind == TokenKind::Comma {
            self.advance();
            args.push(self.parse_or()?);
        }

        if self.current().kind != TokenKind::RightParen {
            return Err(EngineError::parse(format!(
                "expected closing parenthesis for function '{}'",
                name
            )));
        }
        self.advance();

        if args.len() < 2 {
            return Err(EngineError::parse(format!(
                "function {} requires at least 2 arguments",
                name
            )));
        }

        // First argument seeds the extremum; strict comparison keeps the
        // earliest occurrence on ties.
        let mut winner = args[0].as_number();
        for arg in &args[1..] {
            let candidate = arg.as_number();
            if (pick_max && candidate > winner) || (!pick_max && candidate < winner) {
                winner = candidate;
            }
        }

        Ok(Value::Number(winner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str) -> EngineResult<Value> {
        let mut engine = Engine::new(5, 5);
        let mut guard = HashSet::new();
        Parser::evaluate(expression, &mut engine, &mut guard)
    }

    fn eval_ok(expression: &str) -> Value {
        eval(expression).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_ok("2+3"), Value::Number(5.0));
        assert_eq!(eval_ok("10-3"), Value::Number(7.0));
        assert_eq!(eval_ok("4*5"), Value::Number(20.0));
        assert_eq!(eval_ok("15/3"), Value::Number(5.0));
        assert_eq!(eval_ok("2+3*4"), Value::Number(14.0));
        assert_eq!(eval_ok("(2+3)*4"), Value::Number(20.0));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval_ok("-5"), Value::Number(-5.0));
        assert_eq!(eval_ok("--5"), Value::Number(5.0));
        assert_eq!(eval_ok("-5+10"), Value::Number(5.0));
        assert_eq!(eval_ok("+7"), Value::Number(7.0));
        // Unary plus is a pass-through, so a boolean survives it.
        assert_eq!(eval_ok("+true"), Value::Boolean(true));
        assert_eq!(eval_ok("-true"), Value::Number(-1.0));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval_ok("5 < 10"), Value::Boolean(true));
        assert_eq!(eval_ok("10 < 5"), Value::Boolean(false));
        assert_eq!(eval_ok("5 <= 5"), Value::Boolean(true));
        assert_eq!(eval_ok("5 >= 6"), Value::Boolean(false));
        assert_eq!(eval_ok("5 = 5"), Value::Boolean(true));
        assert_eq!(eval_ok("5 <> 5"), Value::Boolean(false));
        assert_eq!(eval_ok("5 <> 4"), Value::Boolean(true));
    }

    #[test]
    fn test_comparison_equality_uses_epsilon() {
        // 0.1 + 0.2 style noise is far above 1e-10, but identical values
        // offset by less than the tolerance compare equal.
        assert_eq!(eval_ok("1/3 = 1/3"), Value::Boolean(true));
        assert_eq!(eval_ok("10/4 = 5/2"), Value::Boolean(true));
    }

    #[test]
    fn test_comparison_does_not_chain() {
        let err = eval("1 < 2 < 3").unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn test_boolean_logic() {
        assert_eq!(eval_ok("true and true"), Value::Boolean(true));
        assert_eq!(eval_ok("true and false"), Value::Boolean(false));
        assert_eq!(eval_ok("false or true"), Value::Boolean(true));
        assert_eq!(eval_ok("false or false"), Value::Boolean(false));
        assert_eq!(eval_ok("not false"), Value::Boolean(true));
        assert_eq!(eval_ok("not not true"), Value::Boolean(true));
        assert_eq!(eval_ok("1 < 2 and 3 < 4"), Value::Boolean(true));
        assert_eq!(eval_ok("1 > 2 or 3 < 4"), Value::Boolean(true));
    }

    #[test]
    fn test_boolean_number_coercions() {
        // Numbers coerce to booleans in logic, booleans to numbers in
        // arithmetic.
        assert_eq!(eval_ok("1 and 2"), Value::Boolean(true));
        assert_eq!(eval_ok("0 or 0"), Value::Boolean(false));
        assert_eq!(eval_ok("not 0"), Value::Boolean(true));
        assert_eq!(eval_ok("true + true"), Value::Number(2.0));
        assert_eq!(eval_ok("false * 10"), Value::Number(0.0));
        assert_eq!(eval_ok("true = 1"), Value::Boolean(true));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1/0").unwrap_err().to_string(), "division by zero");
        // Divisors inside the epsilon band count as zero too.
        assert!(eval("5 / (1/100000000000 / 10)").is_err());
        assert_eq!(eval("1/false").unwrap_err().to_string(), "division by zero");
    }

    #[test]
    fn test_max_min() {
        assert_eq!(eval_ok("max(1, 2)"), Value::Number(2.0));
        assert_eq!(eval_ok("min(1, 2)"), Value::Number(1.0));
        assert_eq!(eval_ok("max(3, 1+3, 2)"), Value::Number(4.0));
        assert_eq!(eval_ok("min(5, -2, 7, 0)"), Value::Number(-2.0));
        assert_eq!(eval_ok("max(true, false)"), Value::Number(1.0));
        assert_eq!(eval_ok("max(min(1, 2), 3)"), Value::Number(3.0));
    }

    #[test]
    fn test_max_min_arity() {
        let err = eval("max(1)").unwrap_err();
        assert_eq!(err.to_string(), "function max requires at least 2 arguments");
        assert!(eval("min(7)").is_err());
        // Empty argument lists fail earlier, on the unexpected ')'.
        assert!(matches!(eval("max()"), Err(EngineError::Parse { .. })));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(eval("2 +"), Err(EngineError::Parse { .. })));
        assert!(matches!(eval("(2 + 3"), Err(EngineError::Parse { .. })));
        assert!(matches!(eval("2 3"), Err(EngineError::Parse { .. })));
        assert!(matches!(eval("max 1, 2)"), Err(EngineError::Parse { .. })));
        assert!(matches!(eval(")"), Err(EngineError::Parse { .. })));
    }

    #[test]
    fn test_trailing_garbage_reports_position() {
        let err = eval("1 + 2 )").unwrap_err();
        assert_eq!(err.to_string(), "unexpected token ')' at position 6");
    }

    #[test]
    fn test_blank_cell_reference_reads_as_zero() {
        assert_eq!(eval_ok("A1"), Value::Number(0.0));
        assert_eq!(eval_ok("A1 + 5"), Value::Number(5.0));
    }

    #[test]
    fn test_out_of_range_reference() {
        // The test engine is 5x5, so Z99 is out of range.
        let err = eval("Z99").unwrap_err();
        assert_eq!(err.to_string(), "reference out of range");
    }
}
