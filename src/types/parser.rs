//! Type-name parser
//!
//! Recursive-descent parser over the canonical form emitted by
//! [`Type::name`]. For every constructible type `t`,
//! `parse_type_name(&t.name()).unwrap() == t`.

use crate::{BlockError, Result};

use super::{EnumItem, Type};

/// Parses a canonical server-syntax type name.
pub fn parse_type_name(input: &str) -> Result<Type> {
    let mut lexer = Lexer::new(input);
    let ty = parse_type(&mut lexer)?;
    match lexer.next()? {
        Token::End => Ok(ty),
        other => Err(lexer.error(format!("trailing input after type: {:?}", other))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Quoted(String),
    LParen,
    RParen,
    Comma,
    Eq,
    End,
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, message: String) -> BlockError {
        BlockError::Parse {
            offset: self.pos,
            message,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn next(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let Some(&b) = self.bytes.get(self.pos) else {
            return Ok(Token::End);
        };
        match b {
            b'(' => {
                self.pos += 1;
                Ok(Token::LParen)
            }
            b')' => {
                self.pos += 1;
                Ok(Token::RParen)
            }
            b',' => {
                self.pos += 1;
                Ok(Token::Comma)
            }
            b'=' => {
                self.pos += 1;
                Ok(Token::Eq)
            }
            b'\'' => self.quoted(),
            b'-' | b'0'..=b'9' => self.integer(),
            b if b.is_ascii_alphabetic() || b == b'_' => Ok(self.ident()),
            other => Err(self.error(format!("unexpected byte {:?}", other as char))),
        }
    }

    fn ident(&mut self) -> Token {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        // Slicing at ASCII boundaries keeps this valid UTF-8.
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or_default();
        Token::Ident(text.to_string())
    }

    fn integer(&mut self) -> Result<Token> {
        let start = self.pos;
        if self.bytes[self.pos] == b'-' {
            self.pos += 1;
        }
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or_default();
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| self.error(format!("invalid integer literal '{}'", text)))
    }

    fn quoted(&mut self) -> Result<Token> {
        self.pos += 1; // opening quote
        let mut out = Vec::new();
        loop {
            let Some(&b) = self.bytes.get(self.pos) else {
                return Err(self.error("unterminated quoted name".into()));
            };
            self.pos += 1;
            match b {
                b'\'' => {
                    return String::from_utf8(out)
                        .map(Token::Quoted)
                        .map_err(|_| self.error("quoted name is not valid UTF-8".into()));
                }
                b'\\' => {
                    let Some(&esc) = self.bytes.get(self.pos) else {
                        return Err(self.error("unterminated escape in quoted name".into()));
                    };
                    self.pos += 1;
                    match esc {
                        b'\'' => out.push(b'\''),
                        b'\\' => out.push(b'\\'),
                        other => {
                            return Err(
                                self.error(format!("unknown escape '\\{}'", other as char))
                            )
                        }
                    }
                }
                b => out.push(b),
            }
        }
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        let got = self.next()?;
        if got == token {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}, got {:?}", token, got)))
        }
    }
}

fn parse_type(lexer: &mut Lexer) -> Result<Type> {
    let name = match lexer.next()? {
        Token::Ident(name) => name,
        other => return Err(lexer.error(format!("expected type name, got {:?}", other))),
    };

    match name.as_str() {
        "Int8" => Ok(Type::Int8),
        "Int16" => Ok(Type::Int16),
        "Int32" => Ok(Type::Int32),
        "Int64" => Ok(Type::Int64),
        "UInt8" => Ok(Type::UInt8),
        "UInt16" => Ok(Type::UInt16),
        "UInt32" => Ok(Type::UInt32),
        "UInt64" => Ok(Type::UInt64),
        "Float32" => Ok(Type::Float32),
        "Float64" => Ok(Type::Float64),
        "String" => Ok(Type::String),
        "Date" => Ok(Type::Date),
        "DateTime" => Ok(Type::DateTime),
        "FixedString" => parse_fixed_string(lexer),
        "Array" => {
            lexer.expect(Token::LParen)?;
            let item = parse_type(lexer)?;
            lexer.expect(Token::RParen)?;
            Ok(Type::array(item))
        }
        "Nullable" => {
            lexer.expect(Token::LParen)?;
            let item = parse_type(lexer)?;
            lexer.expect(Token::RParen)?;
            Ok(Type::nullable(item))
        }
        "Enum8" => Type::enum8(parse_enum_items(lexer)?),
        "Enum16" => Type::enum16(parse_enum_items(lexer)?),
        "Tuple" => parse_tuple(lexer),
        other => Err(lexer.error(format!("unknown type name '{}'", other))),
    }
}

fn parse_fixed_string(lexer: &mut Lexer) -> Result<Type> {
    lexer.expect(Token::LParen)?;
    let n = match lexer.next()? {
        Token::Int(n) if n > 0 => n as usize,
        Token::Int(n) => {
            return Err(lexer.error(format!("FixedString width must be positive, got {}", n)))
        }
        other => return Err(lexer.error(format!("expected string width, got {:?}", other))),
    };
    lexer.expect(Token::RParen)?;
    Type::fixed_string(n)
}

fn parse_enum_items(lexer: &mut Lexer) -> Result<Vec<EnumItem>> {
    lexer.expect(Token::LParen)?;
    let mut items = Vec::new();
    loop {
        let name = match lexer.next()? {
            Token::Quoted(name) => name,
            other => return Err(lexer.error(format!("expected quoted enum name, got {:?}", other))),
        };
        lexer.expect(Token::Eq)?;
        let value = match lexer.next()? {
            Token::Int(v) if (i16::MIN as i64..=i16::MAX as i64).contains(&v) => v as i16,
            Token::Int(v) => return Err(lexer.error(format!("enum value {} out of range", v))),
            other => return Err(lexer.error(format!("expected enum value, got {:?}", other))),
        };
        items.push(EnumItem::new(name, value));
        match lexer.next()? {
            Token::Comma => continue,
            Token::RParen => return Ok(items),
            other => return Err(lexer.error(format!("expected ',' or ')', got {:?}", other))),
        }
    }
}

fn parse_tuple(lexer: &mut Lexer) -> Result<Type> {
    lexer.expect(Token::LParen)?;
    let mut items = Vec::new();
    loop {
        items.push(parse_type(lexer)?);
        match lexer.next()? {
            Token::Comma => continue,
            Token::RParen => return Type::tuple(items),
            other => return Err(lexer.error(format!("expected ',' or ')', got {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(ty: Type) {
        let name = ty.name();
        let parsed = parse_type_name(&name).unwrap_or_else(|e| panic!("parse {}: {}", name, e));
        assert_eq!(parsed, ty, "roundtrip of {}", name);
    }

    #[test]
    fn test_roundtrip_scalars() {
        for ty in [
            Type::Int8,
            Type::Int16,
            Type::Int32,
            Type::Int64,
            Type::UInt8,
            Type::UInt16,
            Type::UInt32,
            Type::UInt64,
            Type::Float32,
            Type::Float64,
            Type::String,
            Type::Date,
            Type::DateTime,
        ] {
            roundtrip(ty);
        }
    }

    #[test]
    fn test_roundtrip_composites() {
        roundtrip(Type::fixed_string(4).unwrap());
        roundtrip(Type::array(Type::UInt64));
        roundtrip(Type::array(Type::nullable(Type::UInt64)));
        roundtrip(Type::nullable(Type::fixed_string(16).unwrap()));
        roundtrip(Type::enum8(vec![EnumItem::new("One", 1), EnumItem::new("Two", 2)]).unwrap());
        roundtrip(Type::enum16(vec![EnumItem::new("negative", -300)]).unwrap());
        roundtrip(Type::tuple(vec![Type::UInt64, Type::String]).unwrap());
        roundtrip(
            Type::tuple(vec![
                Type::array(Type::Int32),
                Type::nullable(Type::Date),
                Type::fixed_string(2).unwrap(),
            ])
            .unwrap(),
        );
    }

    #[test]
    fn test_roundtrip_escaped_enum_names() {
        roundtrip(Type::enum8(vec![EnumItem::new("it's\\here", 1)]).unwrap());
    }

    #[test]
    fn test_whitespace_tolerated() {
        let ty = parse_type_name(" Array( Nullable( UInt64 ) ) ").unwrap();
        assert_eq!(ty, Type::array(Type::nullable(Type::UInt64)));
        let e = parse_type_name("Enum8('One' = 1, 'Two' = 2)").unwrap();
        assert_eq!(
            e,
            Type::enum8(vec![EnumItem::new("One", 1), EnumItem::new("Two", 2)]).unwrap()
        );
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "NotAType",
            "Array",
            "Array(",
            "Array()",
            "Array(UInt64",
            "FixedString(0)",
            "FixedString(x)",
            "Enum8()",
            "Enum8('One')",
            "Enum8('One'=300)",
            "Enum8('unterminated)",
            "UInt64 trailing",
            "Tuple()",
        ] {
            assert!(parse_type_name(bad).is_err(), "should reject {:?}", bad);
        }
    }
}
