// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The ASCII FBX lexer (L3'). Produces the same logical node tree as the
//! binary tokenizer so everything above the DOM layer is dialect-agnostic.

use crate::dom::{Document, Node};
use crate::error::{Error, Kind};
use crate::value::Value;

const MAX_NAME_LEN: usize = 255;
const MAX_NUMERIC_LEN: usize = 128;

struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Colon,
    Comma,
    OpenBrace,
    CloseBrace,
    Value(Value),
    Eof,
}

impl<'a> Lexer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Lexer { data, pos: 0 }
    }

    fn err(&self, kind: Kind) -> Error {
        Error::new(kind)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => self.pos += 1,
                Some(b';') => {
                    while let Some(b) = self.peek_byte() {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_'
    }

    fn is_ident_continue(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b':'
    }

    fn lex_string(&mut self) -> Result<Token, Error> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.peek_byte() {
                None => return Err(self.err(Kind::MalformedAscii { offset: self.pos })),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'&') => {
                    if self.data[self.pos..].starts_with(b"&quot;") {
                        out.push('"');
                        self.pos += 6;
                    } else {
                        out.push('&');
                        self.pos += 1;
                    }
                }
                Some(b) => {
                    out.push(b as char);
                    self.pos += 1;
                }
            }
        }
        Ok(Token::Value(Value::String(out.into_bytes().into_boxed_slice())))
    }

    fn lex_number(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(b) = self.peek_byte() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' => {
                    is_float = true;
                    self.pos += 1;
                }
                b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| self.err(Kind::MalformedAscii { offset: start }))?;
        if text.len() >= MAX_NUMERIC_LEN {
            return Err(self.err(Kind::MalformedAscii { offset: start }));
        }
        if is_float {
            let as_f32: f32 = text.parse().map_err(|_| self.err(Kind::MalformedAscii { offset: start }))?;
            let as_f64: f64 = text.parse().map_err(|_| self.err(Kind::MalformedAscii { offset: start }))?;
            // Prefer the narrower `F` width when it round-trips exactly.
            if as_f32 as f64 == as_f64 {
                Ok(Token::Value(Value::Float(as_f32 as f64)))
            } else {
                Ok(Token::Value(Value::Float(as_f64)))
            }
        } else {
            let as_i64: i64 = text.parse().map_err(|_| self.err(Kind::MalformedAscii { offset: start }))?;
            Ok(Token::Value(Value::Int(as_i64)))
        }
    }

    fn next(&mut self) -> Result<Token, Error> {
        self.skip_trivia();
        match self.peek_byte() {
            None => Ok(Token::Eof),
            Some(b':') => {
                self.pos += 1;
                Ok(Token::Colon)
            }
            Some(b',') => {
                self.pos += 1;
                Ok(Token::Comma)
            }
            Some(b'{') => {
                self.pos += 1;
                Ok(Token::OpenBrace)
            }
            Some(b'}') => {
                self.pos += 1;
                Ok(Token::CloseBrace)
            }
            Some(b'"') => self.lex_string(),
            Some(b'*') => {
                // `*N { a: ... }`: array count marker; treat `*` as part of
                // an identifier so arrays parse as an ordinary child node
                // whose values are the array elements.
                self.pos += 1;
                self.lex_ident_or_number()
            }
            Some(b) if Self::is_ident_start(b) => self.lex_ident_or_number(),
            Some(b) if b.is_ascii_digit() || b == b'-' || b == b'+' => self.lex_number(),
            Some(_) => Err(self.err(Kind::MalformedAscii { offset: self.pos })),
        }
    }

    fn lex_ident_or_number(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if Self::is_ident_continue(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| self.err(Kind::MalformedAscii { offset: start }))?
            .to_string();
        match text.as_str() {
            "T" | "Y" => Ok(Token::Value(Value::Int(1))),
            "F" | "N" => Ok(Token::Value(Value::Int(0))),
            _ => Ok(Token::Ident(text)),
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8]) -> Result<Self, Error> {
        let mut lexer = Lexer::new(data);
        let lookahead = lexer.next()?;
        Ok(Parser { lexer, lookahead })
    }

    fn bump(&mut self) -> Result<Token, Error> {
        let next = self.lexer.next()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn parse_nodes_until_eof(&mut self) -> Result<Vec<Node>, Error> {
        let mut nodes = Vec::new();
        while self.lookahead != Token::Eof {
            nodes.push(self.parse_node()?);
        }
        Ok(nodes)
    }

    fn parse_node(&mut self) -> Result<Node, Error> {
        let name = match self.bump()? {
            Token::Ident(name) => name,
            _ => return Err(self.lexer.err(Kind::MalformedAscii { offset: self.lexer.pos })),
        };
        if name.len() > MAX_NAME_LEN {
            return Err(self.lexer.err(Kind::MalformedAscii { offset: self.lexer.pos }));
        }
        match self.bump()? {
            Token::Colon => {}
            _ => return Err(self.lexer.err(Kind::MalformedAscii { offset: self.lexer.pos })),
        }

        let mut values = Vec::new();
        loop {
            match &self.lookahead {
                Token::Value(_) => {
                    if let Token::Value(v) = self.bump()? {
                        values.push(v);
                    }
                    if self.lookahead == Token::Comma {
                        self.bump()?;
                        continue;
                    }
                    break;
                }
                _ => break,
            }
        }

        let mut children = Vec::new();
        if self.lookahead == Token::OpenBrace {
            self.bump()?;
            while self.lookahead != Token::CloseBrace {
                if self.lookahead == Token::Eof {
                    return Err(self.lexer.err(Kind::MalformedAscii { offset: self.lexer.pos }));
                }
                children.push(self.parse_node()?);
            }
            self.bump()?; // consume '}'
        }

        Ok(Node::new(name.into_boxed_str(), values, children))
    }
}

/// The file version to assume for ASCII files that omit
/// `FBXHeaderExtension/FBXVersion`.
pub const DEFAULT_ASCII_VERSION: u32 = 7500;

fn find_version(nodes: &[Node]) -> u32 {
    nodes
        .iter()
        .find(|n| n.name() == "FBXHeaderExtension")
        .and_then(|n| n.child("FBXVersion"))
        .and_then(|n| n.value(0).ok())
        .and_then(|v| v.as_i64().ok())
        .map(|v| v as u32)
        .unwrap_or(DEFAULT_ASCII_VERSION)
}

/// Lexes an ASCII FBX byte stream into a [`Document`].
pub fn parse(data: &[u8]) -> Result<Document, Error> {
    if data.is_empty() {
        return Err(Error::new(Kind::EmptyFile));
    }
    let mut parser = Parser::new(data)?;
    let top_level = parser.parse_nodes_until_eof()?;
    let version = find_version(&top_level);
    let root = Node::new("".into(), Vec::new(), top_level);
    Ok(Document::new(version, root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_nested_node_tree() {
        let doc = parse(b"Node: 1 {\n\tSub: 2,3\n}").unwrap();
        let nodes = doc.root().children();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name(), "Node");
        assert_eq!(nodes[0].value(0).unwrap().as_i64().unwrap(), 1);
        let sub = nodes[0].child("Sub").unwrap();
        assert_eq!(sub.value(0).unwrap().as_i64().unwrap(), 2);
        assert_eq!(sub.value(1).unwrap().as_i64().unwrap(), 3);
    }

    #[test]
    fn defaults_to_version_7500_without_header() {
        let doc = parse(b"Node: 1 {}").unwrap();
        assert_eq!(doc.version(), DEFAULT_ASCII_VERSION);
    }

    #[test]
    fn comments_are_ignored() {
        let doc = parse(b"; a comment\nNode: 1 {}\n").unwrap();
        assert_eq!(doc.root().children().len(), 1);
    }

    #[test]
    fn unterminated_string_fails_with_position() {
        let err = parse(b"Node: \"oops").unwrap_err();
        assert!(matches!(err.kind(), Kind::MalformedAscii { .. }));
    }

    #[test]
    fn quot_escape_is_recognised() {
        let doc = parse(b"Node: \"a&quot;b\"").unwrap();
        let v = doc.root().children()[0].value(0).unwrap();
        assert_eq!(v.as_str().unwrap(), "a\"b");
    }
}
