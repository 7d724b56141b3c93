use crate::Error;

use std::str::Chars;

/// The type of a token and the data associated with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokTy<'a> {
    /// Identifier followed by a ':'.
    Label(&'a str),
    /// Identifier. Either a mnemonic, a register name, or a label reference.
    Id(&'a str),
    /// Integer literal (signed, after accounting for a leading '-').
    Num(i64),
    /// End of a logical source line.
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Tok<'a> {
    pub ty: TokTy<'a>,
    /// The line containing the token.
    pub line: usize,
}

impl<'a> Tok<'a> {
    fn new(line: usize, ty: TokTy<'a>) -> Self {
        Self { line, ty }
    }
}

#[derive(Clone)]
struct Lexer<'a> {
    chars: Chars<'a>,
    line: usize,
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_id_con(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Lexer<'a> {
        Self { chars: input.chars(), line: 1 }
    }

    fn err(&self, msg: impl Into<String>) -> Error {
        Error::new(self.line, msg)
    }

    /// Peek one character ahead.
    fn first(&self) -> char {
        self.chars.clone().next().unwrap_or('\0')
    }

    /// Peek two characters ahead.
    fn second(&self) -> char {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next().unwrap_or('\0')
    }

    fn is_done(&mut self) -> bool {
        self.chars.as_str().is_empty()
    }

    fn eat(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn eat_n(&mut self, n: usize) -> Option<char> {
        self.chars.nth(n - 1)
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.first() == c {
            self.eat();
            true
        } else {
            false
        }
    }

    /// Consume characters while `pred` holds. Returns the amount consumed.
    fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> usize {
        let mut eaten = 0;
        while pred(self.first()) && !self.is_done() {
            self.eat();
            eaten += 1;
        }
        eaten
    }

    /// Consume spaces/tabs and `;` comments, but not newlines (they're significant).
    fn eat_inline_whitespace(&mut self) {
        loop {
            self.eat_while(is_whitespace);
            if self.first() == ';' {
                self.eat_while(|c| c != '\n');
            } else {
                break;
            }
        }
    }

    fn eat_id(&mut self) -> &'a str {
        let as_str = self.chars.as_str();
        let eaten = if is_id_start(self.first()) {
            self.eat();
            1
        } else {
            0
        };
        let eaten = eaten + self.eat_while(is_id_con);
        &as_str[..eaten]
    }

    /// Consume and parse an unsigned number. Expects `first()` to be a digit.
    fn eat_num(&mut self) -> Result<i64, Error> {
        debug_assert!(self.first().is_ascii_digit());
        let (base, eat_while): (u32, fn(char) -> bool) = if self.first() == '0' {
            if self.second() == 'x' || self.second() == 'X' {
                self.eat_n(2);
                (16, |c| c.is_ascii_hexdigit() || c == '_')
            } else if self.second() == 'b' || self.second() == 'B' {
                self.eat_n(2);
                (2, |c| matches!(c, '0' | '1' | '_'))
            } else {
                (10, |c| c.is_ascii_digit() || c == '_')
            }
        } else {
            (10, |c| c.is_ascii_digit() || c == '_')
        };
        let as_str = self.chars.as_str();
        let eaten = self.eat_while(eat_while);
        let digits: String = as_str[..eaten].chars().filter(|c| *c != '_').collect();
        i64::from_str_radix(&digits, base).map_err(|err| self.err(format!("invalid number: {err}")))
    }

    fn tok(&self, ty: TokTy<'a>) -> Tok<'a> {
        Tok::new(self.line, ty)
    }

    /// Scan the next token. Returns `TokTy::Eof` once the whole input is consumed.
    fn next_tok(&mut self) -> Result<Tok<'a>, Error> {
        self.eat_inline_whitespace();
        match self.first() {
            '\n' => {
                self.eat();
                let tok = self.tok(TokTy::Newline);
                self.line += 1;
                Ok(tok)
            }
            c if is_id_start(c) => {
                let id = self.eat_id();
                if self.eat_char(':') {
                    Ok(self.tok(TokTy::Label(id)))
                } else {
                    Ok(self.tok(TokTy::Id(id)))
                }
            }
            c if c.is_ascii_digit() => self.eat_num().map(|num| self.tok(TokTy::Num(num))),
            '-' => {
                self.eat();
                if !self.first().is_ascii_digit() {
                    Err(self.err("expected number after '-'"))
                } else {
                    self.eat_num().map(|num| self.tok(TokTy::Num(-num)))
                }
            }
            '\0' => Ok(self.tok(TokTy::Eof)),
            c => Err(self.err(format!("invalid token '{c}'"))),
        }
    }
}

/// Make an iterator of tokens from a source string.
pub fn tokenize(input: &str) -> impl Iterator<Item = Result<Tok<'_>, Error>> + '_ {
    let mut lexer = Lexer::new(input);
    std::iter::from_fn(move || match lexer.next_tok() {
        Ok(t) if t.ty == TokTy::Eof => None,
        t => Some(t),
    })
}
