//! Assembler for the Turtle CPU ISA: text source in, a byte-exact instruction
//! image out.

#[macro_use]
extern crate log;

mod gen;
mod ins;
mod lex;
mod parse;

pub use ins::{AddressOperand, Function, ParsedInstruction};

use std::fmt;

/// An assembly error, carrying the 1-based source line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub line: usize,
    pub message: String,
}

impl Error {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for Error {}

/// Assemble `source` into a little-endian instruction image.
pub fn assemble(source: &str) -> Result<Vec<u8>, Error> {
    let parsed = parse::parse(source)?;
    gen::encode(&parsed)
}

/// Assemble `source`, then zero-pad the image to `length` bytes.
///
/// Fails if `length` is smaller than the assembled length.
pub fn assemble_padded(source: &str, length: usize) -> Result<Vec<u8>, Error> {
    let mut image = assemble(source)?;
    if length < image.len() {
        return Err(Error::new(
            0,
            format!("requested padding length {length} is shorter than assembled length {}", image.len()),
        ));
    }
    image.resize(length, 0);
    Ok(image)
}
