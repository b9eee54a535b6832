//! Assembler for MISC16 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! out     equ 0xFFFC          ; Constant
//!         org 0x10            ; Set origin address
//! start   mov out, msg        ; Emit the pair (msg, out): out := [msg]
//!         mov 0, here         ; Jump: pc := [here]
//! here    dw start            ; Word data, labels allowed
//! msg     db 'Hi', 10         ; Packed bytes, high byte first
//! ```
//!
//! A leading symbol is a label. `mov dst, src` stores the transport pair
//! in machine order: source word first, then destination. Text between
//! single quotes becomes one integer per character. Commas are plain
//! separators. Labels may be used before they are defined.

use crate::cpu::MEMORY_SIZE;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code into a memory image.
pub fn assemble(source: &str) -> Result<Assembly, AssemblyErrors> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// A successfully assembled program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// Image words, zero where nothing was emitted.
    pub image: Vec<u16>,
    /// Final location counter; the image is written up to here.
    pub len: usize,
    /// Labels and constants, in definition order.
    pub labels: Vec<(String, u16)>,
    /// One entry per source line.
    pub listing: Vec<ListingLine>,
}

impl Assembly {
    /// The words up to the final location counter.
    pub fn words(&self) -> &[u16] {
        &self.image[..self.len]
    }

    /// Look up a label or constant.
    pub fn symbol(&self, name: &str) -> Option<u16> {
        self.labels
            .iter()
            .find(|(label, _)| label == name)
            .map(|&(_, value)| value)
    }
}

/// Source line with the address range it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    /// 1-based source line number.
    pub line: usize,
    /// Address of the first word the line emitted.
    pub start: usize,
    /// Location counter after the line.
    pub end: usize,
    /// Source text.
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Org,
    Dw,
    Db,
    Equ,
    Mov,
}

impl Keyword {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "org" => Some(Keyword::Org),
            "dw" => Some(Keyword::Dw),
            "db" => Some(Keyword::Db),
            "equ" => Some(Keyword::Equ),
            "mov" => Some(Keyword::Mov),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Keyword(Keyword),
    Integer(i64),
    Symbol(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", format!("{:?}", k).to_lowercase()),
            Token::Integer(v) => write!(f, "{}", v),
            Token::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// Location counter ran off the end of memory.
struct MemoryFull;

/// The assembler state.
struct Assembler {
    /// Current address.
    location: usize,
    /// Symbol table (label -> value), plus definition order.
    symbols: HashMap<String, u16>,
    order: Vec<String>,
    /// Pending references (address, label, source line).
    pending: Vec<(usize, String, usize)>,
    image: Vec<u16>,
    listing: Vec<ListingLine>,
    errors: Vec<AssemblerError>,
    line: usize,
    /// Address of the first word emitted by the current line.
    line_start: Option<usize>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            location: 0,
            symbols: HashMap::new(),
            order: Vec::new(),
            pending: Vec::new(),
            image: vec![0; MEMORY_SIZE],
            listing: Vec::new(),
            errors: Vec::new(),
            line: 0,
            line_start: None,
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Assembly, AssemblyErrors> {
        for (line_num, text) in source.lines().enumerate() {
            self.line = line_num + 1;
            self.line_start = None;
            let full = self.process_line(text).is_err();
            self.listing.push(ListingLine {
                line: self.line,
                start: self.line_start.unwrap_or(self.location),
                end: self.location,
                text: text.to_string(),
            });
            if full {
                self.error(AssemblerError::MemoryFull { line: self.line });
                break;
            }
        }

        if self.errors.is_empty() {
            self.resolve_references();
        }

        if !self.errors.is_empty() {
            return Err(AssemblyErrors {
                errors: std::mem::take(&mut self.errors),
            });
        }

        let labels = self
            .order
            .iter()
            .map(|name| (name.clone(), self.symbols[name]))
            .collect();

        Ok(Assembly {
            image: std::mem::take(&mut self.image),
            len: self.location,
            labels,
            listing: std::mem::take(&mut self.listing),
        })
    }

    fn process_line(&mut self, text: &str) -> Result<(), MemoryFull> {
        let expanded = expand_strings(text);
        let code = match expanded.find(';') {
            Some(idx) => &expanded[..idx],
            None => &expanded[..],
        };
        let mut tokens: Vec<Token> = code.split_whitespace().map(lex).collect();
        if tokens.is_empty() {
            return Ok(());
        }

        let leading_label = match &tokens[0] {
            Token::Symbol(label) => Some(label.clone()),
            _ => None,
        };
        if let Some(label) = leading_label {
            if self.symbols.contains_key(&label) {
                self.error(AssemblerError::RedefinedLabel { line: self.line, label });
                return Ok(());
            }
            if tokens.get(1) == Some(&Token::Keyword(Keyword::Equ)) {
                match tokens.as_slice() {
                    [_, _, Token::Integer(value)] => {
                        if let Some(word) = self.to_word(*value) {
                            self.define(label, word);
                        }
                    }
                    _ => self.syntax("expected single integer on right side of equ"),
                }
                return Ok(());
            }
            // The location never exceeds MEMORY_SIZE, so it fits a word.
            self.define(label, self.location as u16);
            tokens.remove(0);
        }

        let Some(first) = tokens.first() else {
            return Ok(());
        };
        let Token::Keyword(keyword) = first else {
            let message = format!("expected keyword instead of '{}'", first);
            self.syntax(&message);
            return Ok(());
        };

        let operands = &tokens[1..];
        match keyword {
            Keyword::Org => self.org(operands),
            Keyword::Dw => self.dw(operands),
            Keyword::Db => self.db(operands),
            Keyword::Equ => {
                self.syntax("unexpected 'equ'");
                Ok(())
            }
            Keyword::Mov => self.mov(operands),
        }
    }

    fn org(&mut self, operands: &[Token]) -> Result<(), MemoryFull> {
        match operands {
            [Token::Integer(addr)] => {
                if *addr < 0 {
                    self.error(AssemblerError::ValueOutOfRange { line: self.line, value: *addr });
                    return Ok(());
                }
                if *addr as u64 >= MEMORY_SIZE as u64 {
                    return Err(MemoryFull);
                }
                self.location = *addr as usize;
            }
            _ => self.syntax("expected single integer on right side of org"),
        }
        Ok(())
    }

    fn dw(&mut self, operands: &[Token]) -> Result<(), MemoryFull> {
        for token in operands {
            match token {
                Token::Integer(value) => {
                    if let Some(word) = self.to_word(*value) {
                        self.emit(word)?;
                    }
                }
                Token::Symbol(label) => {
                    self.pending.push((self.location, label.clone(), self.line));
                    self.emit(0)?;
                }
                Token::Keyword(_) => {
                    let message = format!("expected integer or reference instead of '{}'", token);
                    self.syntax(&message);
                }
            }
        }
        Ok(())
    }

    fn db(&mut self, operands: &[Token]) -> Result<(), MemoryFull> {
        let mut high = None;
        for token in operands {
            let Token::Integer(value) = token else {
                let message = format!("expected integer instead of '{}'", token);
                self.syntax(&message);
                continue;
            };
            if !(-128..=255).contains(value) {
                self.error(AssemblerError::ByteOutOfRange { line: self.line, value: *value });
                continue;
            }
            let byte = (*value as i16 as u16) & 0xFF;
            match high.take() {
                None => high = Some(byte),
                Some(hi) => self.emit((hi << 8) | byte)?,
            }
        }
        if let Some(hi) = high {
            self.emit(hi << 8)?;
        }
        Ok(())
    }

    fn mov(&mut self, operands: &[Token]) -> Result<(), MemoryFull> {
        match operands {
            [dst, src] => self.dw(&[src.clone(), dst.clone()]),
            _ => {
                self.syntax("expected 2 operands for mov instruction");
                Ok(())
            }
        }
    }

    fn emit(&mut self, word: u16) -> Result<(), MemoryFull> {
        if self.location >= MEMORY_SIZE {
            return Err(MemoryFull);
        }
        self.line_start.get_or_insert(self.location);
        self.image[self.location] = word;
        self.location += 1;
        Ok(())
    }

    fn define(&mut self, label: String, value: u16) {
        self.order.push(label.clone());
        self.symbols.insert(label, value);
    }

    /// Fit a value into a word, accepting signed and unsigned 16-bit ranges.
    fn to_word(&mut self, value: i64) -> Option<u16> {
        if (-32768..=65535).contains(&value) {
            Some(value as i32 as u16)
        } else {
            self.error(AssemblerError::ValueOutOfRange { line: self.line, value });
            None
        }
    }

    fn resolve_references(&mut self) {
        for (addr, label, line) in std::mem::take(&mut self.pending) {
            match self.symbols.get(&label) {
                Some(&value) => self.image[addr] = value,
                None => self.errors.push(AssemblerError::UndefinedLabel { line, label }),
            }
        }
    }

    fn syntax(&mut self, message: &str) {
        self.error(AssemblerError::SyntaxError {
            line: self.line,
            message: message.to_string(),
        });
    }

    fn error(&mut self, error: AssemblerError) {
        self.errors.push(error);
    }
}

/// Replace quoted text with character codes and commas with spaces.
fn expand_strings(line: &str) -> String {
    let mut quoted = false;
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if c == '\'' {
            quoted = !quoted;
        } else if quoted {
            out.push_str(&format!(" {} ", c as u32));
        } else if c == ',' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

fn lex(token: &str) -> Token {
    if let Some(keyword) = Keyword::parse(token) {
        return Token::Keyword(keyword);
    }
    match parse_integer(token) {
        Some(value) => Token::Integer(value),
        None => Token::Symbol(token.to_string()),
    }
}

/// Parse a decimal, `0x`, `0o` or `0b` integer with an optional sign.
fn parse_integer(token: &str) -> Option<i64> {
    let (negative, digits) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else {
        (10, lower.as_str())
    };
    let body = body.replace('_', "");
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = i64::from_str_radix(&body, radix).ok()?;
    Some(if negative { -value } else { value })
}

/// A single assembly error, tied to its source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("redefined label on line {line}: {label}")]
    RedefinedLabel { line: usize, label: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value} exceeds 16-bit integer range")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("value out of range on line {line}: {value} exceeds 8-bit integer range")]
    ByteOutOfRange { line: usize, value: i64 },

    #[error("program exceeds memory size on line {line}")]
    MemoryFull { line: usize },
}

impl AssemblerError {
    /// Source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            AssemblerError::SyntaxError { line, .. }
            | AssemblerError::RedefinedLabel { line, .. }
            | AssemblerError::UndefinedLabel { line, .. }
            | AssemblerError::ValueOutOfRange { line, .. }
            | AssemblerError::ByteOutOfRange { line, .. }
            | AssemblerError::MemoryFull { line } => *line,
        }
    }
}

/// Every error found in a failed assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("assembly failed with {} errors", errors.len())]
pub struct AssemblyErrors {
    pub errors: Vec<AssemblerError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::OUTPUT_ADDR;

    #[test]
    fn test_assemble_mov_order() {
        let source = r#"
            org 0x10
            mov 0xFFFC, 0x100   ; out := [0x100]
        "#;

        let asm = assemble(source).unwrap();
        assert_eq!(asm.len, 0x12);
        assert_eq!(asm.image[0x10], 0x100);
        assert_eq!(asm.image[0x11], OUTPUT_ADDR);
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
out     equ 0xFFFC
        org 16
start   mov out, msg
        mov 0, back
back    dw start
msg     dw 'A'
        "#;

        let asm = assemble(source).unwrap();
        assert_eq!(asm.symbol("out"), Some(0xFFFC));
        assert_eq!(asm.symbol("start"), Some(16));
        assert_eq!(asm.symbol("back"), Some(20));
        assert_eq!(asm.symbol("msg"), Some(21));
        assert_eq!(asm.words()[16..], [21, 0xFFFC, 20, 0, 16, 0x41]);

        let names: Vec<&str> = asm.labels.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["out", "start", "back", "msg"]);
    }

    #[test]
    fn test_assemble_data() {
        let source = "dw 42, -1, 0x8000\ndw 65535";
        let asm = assemble(source).unwrap();
        assert_eq!(asm.words(), [42, 0xFFFF, 0x8000, 0xFFFF]);
    }

    #[test]
    fn test_db_packs_high_first() {
        let asm = assemble("db 'Hi!', -1").unwrap();
        assert_eq!(asm.words(), [0x4869, 0x21FF]);

        let asm = assemble("db 1, 2, 3").unwrap();
        assert_eq!(asm.words(), [0x0102, 0x0300]);
    }

    #[test]
    fn test_strings_hide_separators() {
        let asm = assemble("dw 'a;b,c'").unwrap();
        assert_eq!(asm.words(), [b'a' as u16, b';' as u16, b'b' as u16, b',' as u16, b'c' as u16]);
    }

    #[test]
    fn test_integer_forms() {
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("0X1f"), Some(31));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("-12"), Some(-12));
        assert_eq!(parse_integer("1_000"), Some(1000));
        assert_eq!(parse_integer("loop"), None);
        assert_eq!(parse_integer("0x"), None);
        assert_eq!(parse_integer("-"), None);
    }

    #[test]
    fn test_forward_reference() {
        let asm = assemble("dw later\nlater dw 7").unwrap();
        assert_eq!(asm.words(), [1, 7]);
    }

    #[test]
    fn test_label_only_line() {
        let asm = assemble("top\n dw top").unwrap();
        assert_eq!(asm.symbol("top"), Some(0));
        assert_eq!(asm.words(), [0]);
    }

    #[test]
    fn test_errors_are_collected() {
        let source = "dw 70000\nfoo dw 1\nfoo dw 2\n42\nmov 1\ndb 300\ndw missing";
        let err = assemble(source).unwrap_err();
        let lines: Vec<usize> = err.errors.iter().map(|e| e.line()).collect();
        assert_eq!(lines, [1, 3, 4, 5, 6]);
        assert!(matches!(err.errors[0], AssemblerError::ValueOutOfRange { value: 70000, .. }));
        assert!(matches!(err.errors[1], AssemblerError::RedefinedLabel { .. }));
        assert!(matches!(err.errors[4], AssemblerError::ByteOutOfRange { value: 300, .. }));
    }

    #[test]
    fn test_undefined_reference() {
        let err = assemble("dw 1\ndw nowhere").unwrap_err();
        assert_eq!(
            err.errors,
            vec![AssemblerError::UndefinedLabel { line: 2, label: "nowhere".into() }]
        );
    }

    #[test]
    fn test_equ_needs_one_integer() {
        let err = assemble("x equ\ny equ 1 2\nequ 3").unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert!(err.to_string().contains("3 errors"));
    }

    #[test]
    fn test_memory_full() {
        let err = assemble("org 0x7FFF\ndw 1, 2").unwrap_err();
        assert_eq!(err.errors, vec![AssemblerError::MemoryFull { line: 2 }]);

        let err = assemble("org 0x8000").unwrap_err();
        assert_eq!(err.errors, vec![AssemblerError::MemoryFull { line: 1 }]);

        let asm = assemble("org 0x7FFF\ndw 1").unwrap();
        assert_eq!(asm.len, MEMORY_SIZE);
    }

    #[test]
    fn test_listing_ranges() {
        let asm = assemble("; header\norg 4\ndw 1, 2, 3\n").unwrap();
        assert_eq!(asm.listing.len(), 3);
        assert_eq!((asm.listing[0].start, asm.listing[0].end), (0, 0));
        assert_eq!((asm.listing[1].start, asm.listing[1].end), (4, 4));
        assert_eq!((asm.listing[2].start, asm.listing[2].end), (4, 7));
        assert_eq!(asm.listing[2].text, "dw 1, 2, 3");
    }
}
