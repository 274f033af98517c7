use std::fmt;

/// Fatal configuration/programming errors. None of these are recoverable:
/// once one surfaces, no partial emulator state can be trusted and the
/// caller is expected to halt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The decode table has no entry for this opcode byte.
    UnknownOpcode { opcode: u8, prefixed: bool, addr: u16 },
    /// Header byte 0x0147 names an MBC we do not implement.
    UnsupportedCartridgeType(u8),
    /// A header field holds a value outside its enumerated set.
    InvalidHeader(String),
    /// The ROM buffer length does not match what the header declares.
    RomSizeMismatch { declared: usize, actual: usize },
    /// Access to the echo-RAM mirror or the 0xFEA0-0xFEFF hole.
    ForbiddenAddress { addr: u16 },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::UnknownOpcode {
                opcode,
                prefixed,
                addr,
            } => {
                let prefix = if *prefixed { "0xCB " } else { "" };
                write!(
                    f,
                    "unknown opcode {}0x{:02X} at 0x{:04X}",
                    prefix, opcode, addr
                )
            }
            CoreError::UnsupportedCartridgeType(code) => {
                write!(f, "unsupported cartridge type: 0x{:02X}", code)
            }
            CoreError::InvalidHeader(reason) => write!(f, "invalid cartridge header: {}", reason),
            CoreError::RomSizeMismatch { declared, actual } => write!(
                f,
                "ROM size mismatch: header declares {} bytes, file holds {}",
                declared, actual
            ),
            CoreError::ForbiddenAddress { addr } => {
                write!(f, "access to forbidden address 0x{:04X}", addr)
            }
        }
    }
}

impl std::error::Error for CoreError {}
