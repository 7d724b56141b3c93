use std::fmt;

use crate::opcode::InvalidField;

/// A directly-addressable register. `DMAR`/`IMAR` are wide derived views over
/// `DBAR`/`DOFF` and `IBAR`/`IOFF` respectively and have no index of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterIndex {
    R0 = 0b0000,
    R1 = 0b0001,
    R2 = 0b0010,
    R3 = 0b0011,
    R4 = 0b0100,
    R5 = 0b0101,
    R6 = 0b0110,
    R7 = 0b0111,
    Acc = 0b1000,
    Dbar = 0b1001,
    Doff = 0b1010,
    Ibar = 0b1101,
    Ioff = 0b1110,
    Status = 0b1111,
}

impl RegisterIndex {
    pub const GENERAL: [RegisterIndex; 8] = [
        RegisterIndex::R0,
        RegisterIndex::R1,
        RegisterIndex::R2,
        RegisterIndex::R3,
        RegisterIndex::R4,
        RegisterIndex::R5,
        RegisterIndex::R6,
        RegisterIndex::R7,
    ];

    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RegisterIndex {
    type Error = InvalidField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b0000 => Ok(RegisterIndex::R0),
            0b0001 => Ok(RegisterIndex::R1),
            0b0010 => Ok(RegisterIndex::R2),
            0b0011 => Ok(RegisterIndex::R3),
            0b0100 => Ok(RegisterIndex::R4),
            0b0101 => Ok(RegisterIndex::R5),
            0b0110 => Ok(RegisterIndex::R6),
            0b0111 => Ok(RegisterIndex::R7),
            0b1000 => Ok(RegisterIndex::Acc),
            0b1001 => Ok(RegisterIndex::Dbar),
            0b1010 => Ok(RegisterIndex::Doff),
            0b1101 => Ok(RegisterIndex::Ibar),
            0b1110 => Ok(RegisterIndex::Ioff),
            0b1111 => Ok(RegisterIndex::Status),
            value => Err(InvalidField { kind: "register index", value }),
        }
    }
}

impl fmt::Display for RegisterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegisterIndex::R0 => "R0",
            RegisterIndex::R1 => "R1",
            RegisterIndex::R2 => "R2",
            RegisterIndex::R3 => "R3",
            RegisterIndex::R4 => "R4",
            RegisterIndex::R5 => "R5",
            RegisterIndex::R6 => "R6",
            RegisterIndex::R7 => "R7",
            RegisterIndex::Acc => "ACC",
            RegisterIndex::Dbar => "DBAR",
            RegisterIndex::Doff => "DOFF",
            RegisterIndex::Ibar => "IBAR",
            RegisterIndex::Ioff => "IOFF",
            RegisterIndex::Status => "STATUS",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for RegisterIndex {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "R0" => Ok(RegisterIndex::R0),
            "R1" => Ok(RegisterIndex::R1),
            "R2" => Ok(RegisterIndex::R2),
            "R3" => Ok(RegisterIndex::R3),
            "R4" => Ok(RegisterIndex::R4),
            "R5" => Ok(RegisterIndex::R5),
            "R6" => Ok(RegisterIndex::R6),
            "R7" => Ok(RegisterIndex::R7),
            "ACC" => Ok(RegisterIndex::Acc),
            "DBAR" => Ok(RegisterIndex::Dbar),
            "DOFF" => Ok(RegisterIndex::Doff),
            "IBAR" => Ok(RegisterIndex::Ibar),
            "IOFF" => Ok(RegisterIndex::Ioff),
            "STATUS" => Ok(RegisterIndex::Status),
            _ => Err(()),
        }
    }
}
