//! Byte-classified tokenizer for the blueprint DSL.
//!
//! The lexer never looks back past the current byte: every token is
//! produced by a single forward scan, and `peek`/`advance` give the parser
//! one token of lookahead without re-scanning.

use std::fmt::{self, Display};

/// A position in a source file. Immutable once constructed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub byte_offset: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TokenKind {
    Eof,
    Identifier,
    String,
    Integer,

    Dot,
    Comma,
    Equal,
    Colon,
    DoubleColon,
    Semicolon,
    Plus,
    Minus,
    Asterisk,
    Slash,
    At,
    Hash,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    KwExecutable,
    KwBrick,
    KwLibrary,
    KwImport,
    KwAs,

    /// A string literal whose closing `"` was never found before EOF.
    MissingQuote,
    /// A byte that does not belong to any recognized token.
    Unknown,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A single lexical token. `text` is the token's literal source text: for
/// `String` tokens this excludes the surrounding quotes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, location: SourceLocation, text: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            text: text.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ByteClass {
    Character,
    Digit,
    Whitespace,
    Control,
    Unused,
}

/// 128-entry classification table; bytes >= 0x80 are classified `Unused`
/// directly. Non-ASCII identifiers and strings are not supported.
fn classify(byte: u8) -> ByteClass {
    use ByteClass::*;
    if byte >= 0x80 {
        return Unused;
    }
    const TABLE: [ByteClass; 128] = build_table();
    TABLE[byte as usize]
}

const fn build_table() -> [ByteClass; 128] {
    use ByteClass::*;
    let mut table = [Unused; 128];
    let mut i = 0;
    while i < 128 {
        table[i] = match i as u8 {
            b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | b' ' => Whitespace,
            b'0'..=b'9' => Digit,
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => Character,
            0x21..=0x2F | 0x3A..=0x40 | 0x5B..=0x60 | 0x7B..=0x7E => Control,
            _ => Unused,
        };
        i += 1;
    }
    table
}

fn keyword(text: &str) -> Option<TokenKind> {
    match text {
        "executable" => Some(TokenKind::KwExecutable),
        "brick" => Some(TokenKind::KwBrick),
        "library" => Some(TokenKind::KwLibrary),
        "import" => Some(TokenKind::KwImport),
        "as" => Some(TokenKind::KwAs),
        _ => None,
    }
}

pub struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    fn loc(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        self.column += 1;
        Some(byte)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b'\n') | Some(b'\r') => {
                    let first = self.bump().unwrap();
                    if let Some(second) = self.peek_byte() {
                        if (second == b'\n' || second == b'\r') && second != first {
                            self.bump();
                        }
                    }
                    self.line += 1;
                    self.column = 1;
                }
                Some(b) if classify(b) == ByteClass::Whitespace => {
                    self.bump();
                }
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                    while !matches!(self.peek_byte(), None | Some(b'\n') | Some(b'\r')) {
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let location = self.loc();
        let start = self.pos;
        while matches!(self.peek_byte(), Some(b) if classify(b) == ByteClass::Character || classify(b) == ByteClass::Digit)
        {
            self.bump();
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .expect("identifiers are ASCII")
            .to_string();
        let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, location, text)
    }

    fn scan_integer(&mut self) -> Token {
        let location = self.loc();
        let start = self.pos;
        while matches!(self.peek_byte(), Some(b) if classify(b) == ByteClass::Digit) {
            self.bump();
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .expect("integers are ASCII")
            .to_string();
        Token::new(TokenKind::Integer, location, text)
    }

    /// `location` is the opening `"`'s position, captured by the caller
    /// before it consumed that byte -- the caret in a `MissingQuote`
    /// diagnostic must point at the quote, not at the first content byte.
    fn scan_string(&mut self, location: SourceLocation) -> Token {
        let start = self.pos;
        loop {
            match self.bump() {
                None => {
                    let text = std::str::from_utf8(&self.bytes[start..self.pos])
                        .unwrap_or("")
                        .to_string();
                    return Token::new(TokenKind::MissingQuote, location, text);
                }
                Some(b'"') => {
                    let text = std::str::from_utf8(&self.bytes[start..self.pos - 1])
                        .unwrap_or("")
                        .to_string();
                    return Token::new(TokenKind::String, location, text);
                }
                Some(_) => {}
            }
        }
    }

    fn scan_control(&mut self) -> Token {
        let location = self.loc();
        let byte = self.bump().expect("caller checked a byte is available");
        let kind = match byte {
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b'=' => TokenKind::Equal,
            b':' => {
                if self.peek_byte() == Some(b':') {
                    self.bump();
                    return Token::new(TokenKind::DoubleColon, location, "::");
                }
                TokenKind::Colon
            }
            b'"' => return self.scan_string(location),
            b';' => TokenKind::Semicolon,
            b'*' => TokenKind::Asterisk,
            b'/' => TokenKind::Slash,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'@' => TokenKind::At,
            b'#' => TokenKind::Hash,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            _ => TokenKind::Unknown,
        };
        let text = (byte as char).to_string();
        Token::new(kind, location, text)
    }

    fn lex_next(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        match self.peek_byte() {
            None => Token::new(TokenKind::Eof, self.loc(), ""),
            Some(b) => match classify(b) {
                ByteClass::Character => self.scan_identifier(),
                ByteClass::Digit => self.scan_integer(),
                ByteClass::Control => self.scan_control(),
                ByteClass::Whitespace => unreachable!("consumed by skip_whitespace_and_comments"),
                ByteClass::Unused => {
                    let location = self.loc();
                    let byte = self.bump().unwrap();
                    Token::new(TokenKind::Unknown, location, (byte as char).to_string())
                }
            },
        }
    }

    /// Return the current token without consuming it.
    pub fn peek(&mut self) -> Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex_next());
        }
        self.peeked.clone().unwrap()
    }

    /// Return the current token and advance past it. Returns `Eof`
    /// indefinitely once the input is exhausted.
    pub fn advance(&mut self) -> Token {
        match self.peeked.take() {
            Some(token) => token,
            None => self.lex_next(),
        }
    }
}
