//! TQL lexer: query text → spanned token stream.
//!
//! The scanner is a single forward pass over the source. It recognizes
//! keywords, Unicode identifiers, numbers, duration literals (`7d`, `2w`),
//! ISO date literals, double-quoted strings, and the operator set. The
//! token list always ends in `Eof`; the first invalid input aborts the
//! scan with a spanned [`LexerError`].

pub mod errors;
pub mod token;

pub use errors::LexerError;
pub use token::{lookup_keyword, Keyword, Token, TokenKind};

use crate::span::Span;
use chrono::{NaiveDate, NaiveDateTime};

/// Milliseconds per duration unit: `d`, `w`, `m`, `y`.
/// Months and years are fixed-length approximations (30d / 365d).
fn duration_unit_millis(unit: char) -> Option<i64> {
    const DAY: i64 = 86_400_000;
    match unit {
        'd' => Some(DAY),
        'w' => Some(7 * DAY),
        'm' => Some(30 * DAY),
        'y' => Some(365 * DAY),
        _ => None,
    }
}

/// Tokenize a full query. Returns the token list ending in `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    let mut lexer = Lexer { src: source, pos: 0 };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_whitespace();
        if lexer.at_end() {
            break;
        }
        tokens.push(lexer.next_token()?);
    }
    let end = source.len();
    tokens.push(Token::new(TokenKind::Eof, "", Span::new(end, end)));
    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn slice(&self, span: Span) -> &'a str {
        &self.src[span.start..span.end]
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if matches!(ch, ' ' | '\t' | '\n' | '\r') {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        let ch = self.peek().expect("next_token called at end of input");

        if ch == '"' {
            return self.scan_string();
        }
        if ch.is_ascii_digit() {
            return self.scan_number_or_date();
        }
        if is_ident_start(ch) {
            return Ok(self.scan_identifier());
        }

        self.bump();
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '.' => {
                if self.peek() == Some('.') {
                    self.bump();
                    TokenKind::DotDot
                } else {
                    TokenKind::Dot
                }
            }
            '=' => {
                if self.peek() == Some('?') {
                    self.bump();
                    TokenKind::NullSafeEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    if self.peek() == Some('?') {
                        self.bump();
                        TokenKind::NullSafeNotEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            _ => {
                return Err(LexerError::UnexpectedCharacter {
                    ch,
                    span: Span::new(start, self.pos),
                });
            }
        };
        let span = Span::new(start, self.pos);
        Ok(Token::new(kind, self.slice(span), span))
    }

    fn scan_string(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    let esc_start = self.pos - 1;
                    match self.bump() {
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some(other) => {
                            return Err(LexerError::InvalidEscape {
                                ch: other,
                                span: Span::new(esc_start, self.pos),
                            });
                        }
                        None => {
                            return Err(LexerError::UnterminatedEscape {
                                span: Span::new(esc_start, self.pos),
                            });
                        }
                    }
                }
                Some(other) => value.push(other),
                None => {
                    return Err(LexerError::UnterminatedString {
                        span: Span::new(start, self.pos),
                    });
                }
            }
        }
        let span = Span::new(start, self.pos);
        Ok(Token::new(TokenKind::Str(value), self.slice(span), span))
    }

    fn scan_number_or_date(&mut self) -> Result<Token, LexerError> {
        // A number that begins a full in-range ISO date pattern re-scans
        // as a single date literal; anything else falls back to a number.
        if let Some((date, end)) = self.try_scan_date() {
            let span = Span::new(self.pos, end);
            self.pos = end;
            return Ok(Token::new(TokenKind::Date(date), self.slice(span), span));
        }

        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        // Decimal point only when followed by a digit, so `1..5` stays a range.
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let number_span = Span::new(start, self.pos);
        let text = self.slice(number_span);
        let value: f64 = text.parse().map_err(|_| LexerError::InvalidNumber {
            text: text.to_string(),
            span: number_span,
        })?;

        // Duration suffix: one of d/w/m/y not followed by more identifier.
        if let Some(unit) = self.peek() {
            if let Some(unit_millis) = duration_unit_millis(unit) {
                if !self.peek_second().is_some_and(is_ident_continue) {
                    self.bump();
                    let span = Span::new(start, self.pos);
                    let millis = (value * unit_millis as f64).round() as i64;
                    return Ok(Token::new(
                        TokenKind::Duration { millis },
                        self.slice(span),
                        span,
                    ));
                }
            }
        }

        Ok(Token::new(TokenKind::Number(value), text, number_span))
    }

    /// Look ahead for `YYYY-MM-DD` (optionally `THH:MM:SS`) with every
    /// field in range. Returns the parsed date and its end offset without
    /// consuming anything.
    fn try_scan_date(&self) -> Option<(NaiveDateTime, usize)> {
        let rest = self.src[self.pos..].as_bytes();
        let digits = |range: std::ops::Range<usize>| -> bool {
            range.end <= rest.len() && rest[range].iter().all(u8::is_ascii_digit)
        };
        let field = |range: std::ops::Range<usize>| -> u32 {
            std::str::from_utf8(&rest[range])
                .expect("ascii digits")
                .parse()
                .expect("ascii digits")
        };

        if !(digits(0..4) && rest.get(4) == Some(&b'-') && digits(5..7)
            && rest.get(7) == Some(&b'-') && digits(8..10))
        {
            return None;
        }

        let (year, month, day) = (field(0..4) as i32, field(5..7), field(8..10));
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        let has_time = rest.get(10) == Some(&b'T')
            && digits(11..13)
            && rest.get(13) == Some(&b':')
            && digits(14..16)
            && rest.get(16) == Some(&b':')
            && digits(17..19);

        if has_time {
            if rest.get(19).is_some_and(u8::is_ascii_digit) {
                return None;
            }
            let datetime = date.and_hms_opt(field(11..13), field(14..16), field(17..19))?;
            Some((datetime, self.pos + 19))
        } else {
            if rest.get(10).is_some_and(u8::is_ascii_digit) {
                return None;
            }
            Some((date.and_hms_opt(0, 0, 0)?, self.pos + 10))
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        self.bump();
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        let span = Span::new(start, self.pos);
        let text = self.slice(span);
        let kind = match lookup_keyword(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        };
        Token::new(kind, text, span)
    }
}

/// Identifier start: Unicode letters, letter-like symbols (e.g. `№`),
/// currency symbols, underscore.
fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic()
        || ch == '_'
        || matches!(ch, '$' | '¢' | '£' | '¤' | '¥')
        || ('\u{20A0}'..='\u{20CF}').contains(&ch) // currency symbols block
        || ('\u{2100}'..='\u{214F}').contains(&ch) // letterlike symbols block
}

/// Identifier continuation adds digits and hyphen.
fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_numeric() || ch == '-'
}
