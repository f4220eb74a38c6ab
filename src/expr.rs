//! Arithmetic expressions for numeric setup values
//!
//! Numeric fields accept a small expression language so scripts can write
//! `Setup 0 Duration 1.5*2` or `Setup 0 Left (1/3)`. Supported: numbers (with
//! optional exponent), `+ - * / %`, unary minus/plus and parentheses. Float
//! semantics are IEEE: `1/0` is infinity, not an error.

use thiserror::Error;

/// Error type for expression parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character {found:?} at {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("unexpected token at {position}")]
    UnexpectedToken { position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("malformed number {0:?}")]
    MalformedNumber(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

/// Evaluates `input` to a number
pub fn evaluate(input: &str) -> Result<f64, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }

    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let value = parser.expr()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(value),
        Some(&(_, position)) => Err(ExprError::UnexpectedToken { position }),
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ExprError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let single = match c {
            ' ' | '\t' => {
                i += 1;
                continue;
            }
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push((token, i));
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            // Exponent: 1e3, 2.5E-2
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    while j < bytes.len() && bytes[j].is_ascii_digit() {
                        j += 1;
                    }
                    i = j;
                }
            }
            let text = &input[start..i];
            let value = text
                .parse::<f64>()
                .map_err(|_| ExprError::MalformedNumber(text.to_string()))?;
            tokens.push((Token::Number(value), start));
            continue;
        }

        // Report the full char, not a byte of a multi-byte sequence
        let found = input[i..].chars().next().unwrap_or(c);
        return Err(ExprError::UnexpectedChar { found, position: i });
    }

    Ok(tokens)
}

struct Parser<'t> {
    tokens: &'t [(Token, usize)],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    value /= self.unary()?;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    value %= self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, ExprError> {
        match self.next() {
            Some((Token::Number(v), _)) => Ok(v),
            Some((Token::LParen, _)) => {
                let value = self.expr()?;
                match self.next() {
                    Some((Token::RParen, _)) => Ok(value),
                    Some((_, position)) => Err(ExprError::UnexpectedToken { position }),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some((_, position)) => Err(ExprError::UnexpectedToken { position }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}
