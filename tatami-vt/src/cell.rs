//! A single character cell: a code point plus its display attribute.

use serde::{Deserialize, Serialize};

use crate::attr::Attribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub attr: Attribute,
    pub ch: char,
}

impl Cell {
    pub const fn new(attr: Attribute, ch: char) -> Self {
        Cell { attr, ch }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            attr: Attribute::RESET,
            ch: ' ',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let cell = Cell::default();
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.attr, Attribute::RESET);
    }
}
