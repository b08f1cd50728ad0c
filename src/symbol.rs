use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::error::DecodeError;

/// APRS display symbol: table identifier plus code (`/-` house, `/_`
/// weather station, `\^` large aircraft, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub table: char,
    pub code: char,
}

impl Symbol {
    pub(crate) fn from_bytes(table: u8, code: u8) -> Result<Symbol, DecodeError> {
        if !table.is_ascii() || !code.is_ascii() {
            return Err(DecodeError::InvalidEncoding("symbol"));
        }
        Ok(Symbol {
            table: table as char,
            code: code as char,
        })
    }

    /// The `/_` symbol marks a weather station and switches the comment
    /// decoder into weather mode.
    pub fn is_weather_station(&self) -> bool {
        self.code == '_'
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.table, self.code)
    }
}
