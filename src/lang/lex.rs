use super::{token::*, Column, Error, UnitId};
use crate::error;
use crate::mach::{Config, Precision, Val};

type Result<T> = std::result::Result<T, Error>;

fn is_calc_whitespace(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\n' || c == b'\r' || c == 0x0b || c == 0x0c
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// ## Expression lexer
///
/// Hands out one token at a time so the parser can stop in the
/// middle of the source, which is how a program statement ends.

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    config: &'a Config,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, config: &'a Config) -> Lexer<'a> {
        Lexer {
            src,
            pos: 0,
            config,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rewind(&mut self, pos: usize) {
        debug_assert!(pos <= self.src.len());
        self.pos = pos;
    }

    pub fn skip_whitespace(&mut self) {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && is_calc_whitespace(bytes[self.pos]) {
            self.pos += 1;
        }
    }

    pub fn next_token(&mut self) -> Result<(Token, Column)> {
        self.skip_whitespace();
        let start = self.pos;
        let token = self.token()?;
        Ok((token, start..self.pos))
    }

    fn token(&mut self) -> Result<Token> {
        let bytes = self.src.as_bytes();
        let ch = match bytes.get(self.pos) {
            None | Some(b';') => return Ok(Token::End),
            Some(ch) => *ch,
        };
        match ch {
            b'(' => {
                self.pos += 1;
                Ok(Token::Open)
            }
            b')' => {
                self.pos += 1;
                Ok(Token::Close)
            }
            b'[' => {
                self.pos += 1;
                Ok(Token::OpenBracket)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::CloseBracket)
            }
            b'"' | b'\'' => Ok(self.string(ch)),
            _ if is_ident_start(ch) => Ok(self.ident()),
            _ if ch.is_ascii_digit() => self.number(),
            b'.' if bytes.get(self.pos + 1).map_or(false, u8::is_ascii_digit) => self.number(),
            _ => {
                if let Some(op) = Op::longest_match(&self.src[self.pos..]) {
                    self.pos += op.descriptor().token.len();
                    return Ok(Token::Operator(op));
                }
                let unknown = self.src[self.pos..].chars().next().unwrap_or('\0');
                self.pos += unknown.len_utf8();
                Ok(Token::Unknown(unknown))
            }
        }
    }

    fn ident(&mut self) -> Token {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        self.pos += 1;
        while self.pos < bytes.len() && is_ident_char(bytes[self.pos]) {
            self.pos += 1;
        }
        Token::Ident(self.src[start..self.pos].into())
    }

    fn string(&mut self, quote: u8) -> Token {
        self.pos += 1;
        let mut s = String::new();
        let mut chars = self.src[self.pos..].char_indices().peekable();
        let mut end = self.src.len() - self.pos;
        while let Some((index, ch)) = chars.next() {
            if ch as u32 == quote as u32 {
                end = index + 1;
                break;
            }
            if ch != '\\' {
                s.push(ch);
                continue;
            }
            let escaped = match chars.next() {
                Some((_, escaped)) => escaped,
                None => {
                    s.push('\\');
                    break;
                }
            };
            match escaped {
                'a' => s.push('\x07'),
                'b' => s.push('\x08'),
                't' => s.push('\t'),
                'n' => s.push('\n'),
                'v' => s.push('\x0b'),
                'f' => s.push('\x0c'),
                'r' => s.push('\r'),
                'x' => {
                    let mut code = 0;
                    for _ in 0..2 {
                        match chars.peek().and_then(|(_, c)| c.to_digit(16)) {
                            Some(digit) => {
                                code = code * 16 + digit;
                                chars.next();
                            }
                            None => break,
                        }
                    }
                    s.push(std::char::from_u32(code).unwrap_or('\0'));
                }
                other => s.push(other),
            }
        }
        self.pos += end;
        Token::Literal(Val::Str(s.into()))
    }

    fn number(&mut self) -> Result<Token> {
        let rest = &self.src[self.pos..];
        let (val, len) = match scan_number(rest, self.config.precision) {
            Some(found) => found,
            None => return Err(error!(SyntaxError)),
        };
        self.pos += len;
        let bytes = self.src.as_bytes();
        let word_end = bytes[self.pos..]
            .iter()
            .position(|c| !c.is_ascii_alphabetic())
            .map_or(bytes.len(), |p| self.pos + p);
        if word_end == self.pos {
            return Ok(Token::Literal(val));
        }
        if let Some((unit, mult)) = UnitId::from_suffix(&self.src[self.pos..word_end]) {
            self.pos = word_end;
            let raw = val.to_f64().unwrap_or(0.0) * mult;
            let target = self.config.units.get(unit.category());
            return Ok(Token::Literal(Val::Measure(
                unit.convert(raw, target),
                target,
            )));
        }
        Ok(Token::Literal(val))
    }
}

/// Integer in C notation: `0x` hexadecimal, leading `0` octal.
/// Returns the value, bytes consumed, radix and whether it overflowed.
fn scan_integer(s: &[u8]) -> (u64, usize, u32, bool) {
    let (radix, start) = if s.len() > 2
        && s[0] == b'0'
        && (s[1] == b'x' || s[1] == b'X')
        && s[2].is_ascii_hexdigit()
    {
        (16, 2)
    } else if s.len() > 1 && s[0] == b'0' {
        (8, 1)
    } else {
        (10, 0)
    };
    let mut value: u64 = 0;
    let mut overflow = false;
    let mut pos = start;
    while let Some(digit) = s.get(pos).and_then(|c| (*c as char).to_digit(radix)) {
        match value
            .checked_mul(radix as u64)
            .and_then(|v| v.checked_add(digit as u64))
        {
            Some(v) => value = v,
            None => overflow = true,
        }
        pos += 1;
    }
    if overflow {
        value = u64::max_value();
    }
    (value, pos, radix, overflow)
}

fn scan_float(s: &[u8]) -> usize {
    let mut pos = 0;
    let mut digits = 0;
    while pos < s.len() && s[pos].is_ascii_digit() {
        pos += 1;
        digits += 1;
    }
    if pos < s.len() && s[pos] == b'.' {
        pos += 1;
        while pos < s.len() && s[pos].is_ascii_digit() {
            pos += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return 0;
    }
    if pos < s.len() && (s[pos] == b'e' || s[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < s.len() && (s[exp] == b'+' || s[exp] == b'-') {
            exp += 1;
        }
        if exp < s.len() && s[exp].is_ascii_digit() {
            while exp < s.len() && s[exp].is_ascii_digit() {
                exp += 1;
            }
            pos = exp;
        }
    }
    pos
}

/// Numeric literal at the start of `s`; integer first, then floating point.
fn scan_number(s: &str, precision: Precision) -> Option<(Val, usize)> {
    let bytes = s.as_bytes();
    let (value, len, radix, overflow) = scan_integer(bytes);
    let float_follows = match bytes.get(len) {
        Some(b'.') | Some(b'e') | Some(b'E') => true,
        Some(c) => c.is_ascii_digit(),
        None => false,
    };
    let integer_fits = match precision {
        Precision::Bits64 => !overflow,
        Precision::Bits32 => value <= u32::max_value() as u64,
    };
    if len > 0 && !float_follows && (integer_fits || radix != 10) {
        let val = match precision {
            Precision::Bits64 => Val::Int(value as i64),
            Precision::Bits32 if integer_fits => Val::Int32(value as u32 as i32),
            Precision::Bits32 => Val::Int32(-1),
        };
        return Some((val, len));
    }
    let len = scan_float(bytes);
    if len == 0 {
        return None;
    }
    let text = &s[..len];
    let val = match precision {
        Precision::Bits64 => Val::Double(text.parse::<f64>().ok()?),
        Precision::Bits32 => Val::Float(text.parse::<f32>().ok()?),
    };
    Some((val, len))
}

/// Whole string as a number, for strings used in arithmetic.
/// An optional leading `-` and surrounding whitespace are accepted.
pub fn parse_number(s: &str, precision: Precision) -> Option<Val> {
    let trimmed = s.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (val, len) = scan_number(digits, precision)?;
    if len != digits.len() {
        return None;
    }
    if !negative {
        return Some(val);
    }
    Some(match val {
        Val::Int(n) => Val::Int(n.wrapping_neg()),
        Val::Int32(n) => Val::Int32(n.wrapping_neg()),
        Val::Double(n) => Val::Double(-n),
        Val::Float(n) => Val::Float(-n),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(s: &str, config: &Config) -> Vec<Token> {
        let mut lexer = Lexer::new(s, config);
        let mut tokens = vec![];
        loop {
            let (token, _) = lexer.next_token().unwrap();
            if token == Token::End {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_radix() {
        let config = Config::default();
        assert_eq!(
            lex_all("0x1F 017 9 0", &config),
            vec![
                Token::Literal(Val::Int(31)),
                Token::Literal(Val::Int(15)),
                Token::Literal(Val::Int(9)),
                Token::Literal(Val::Int(0)),
            ]
        );
    }

    #[test]
    fn test_float_fallback() {
        let config = Config::default();
        assert_eq!(
            lex_all("1.5 2e3 .25 0.5", &config),
            vec![
                Token::Literal(Val::Double(1.5)),
                Token::Literal(Val::Double(2000.0)),
                Token::Literal(Val::Double(0.25)),
                Token::Literal(Val::Double(0.5)),
            ]
        );
    }

    #[test]
    fn test_bits32() {
        let config = Config {
            precision: Precision::Bits32,
            ..Config::default()
        };
        assert_eq!(
            lex_all("0xFFFFFFFF 2.5", &config),
            vec![
                Token::Literal(Val::Int32(-1)),
                Token::Literal(Val::Float(2.5)),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let config = Config::default();
        assert_eq!(
            lex_all(r#""a\tb\x41\q" 'it''s'"#, &config),
            vec![
                Token::Literal(Val::Str("a\tbAq".into())),
                Token::Literal(Val::Str("it".into())),
                Token::Literal(Val::Str("s".into())),
            ]
        );
    }

    #[test]
    fn test_operators_and_idents() {
        let config = Config::default();
        assert_eq!(
            lex_all("$1<<=x_2 (", &config),
            vec![
                Token::Ident("$1".into()),
                Token::Operator(Op::ShlAssign),
                Token::Ident("x_2".into()),
                Token::Open,
            ]
        );
    }

    #[test]
    fn test_semicolon_ends() {
        let config = Config::default();
        let mut lexer = Lexer::new("1;2", &config);
        assert_eq!(lexer.next_token().unwrap().0, Token::Literal(Val::Int(1)));
        assert_eq!(lexer.next_token().unwrap().0, Token::End);
        assert_eq!(lexer.pos(), 1);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" -12 ", Precision::Bits64), Some(Val::Int(-12)));
        assert_eq!(parse_number("1.5", Precision::Bits32), Some(Val::Float(1.5)));
        assert_eq!(parse_number("12abc", Precision::Bits64), None);
        assert_eq!(parse_number("", Precision::Bits64), None);
    }
}
