//! Human-readable screen dumps, used by tests and the replay driver.

use std::fmt::Write as _;

use crate::attr::Attribute;
use crate::point::Point;
use crate::term::Term;

impl Term {
    /// Renders the grid as a framed, attribute-annotated text block.
    ///
    /// Attribute changes are printed as `{HEX}` relative to a running
    /// attribute that starts at the reset value; code points outside the
    /// printable ASCII range appear as `[XXXX]`. The format matches the
    /// recorded fixtures under `tests/golden/vt.out`.
    pub fn debug_dump(&self) -> String {
        let size = self.size();
        let mut out = String::new();
        let _ = writeln!(out, ".-===[ {}x{} ]", size.x, size.y);

        let mut attr = Attribute::RESET;
        for y in 0..size.y {
            out.push_str("| ");
            for x in 0..size.x {
                let cell = self.get(Point::new(x, y));
                if cell.attr != attr {
                    attr = cell.attr;
                    let _ = write!(out, "{{{:X}}}", attr.bits());
                }
                if cell.ch >= ' ' && (cell.ch as u32) < 127 {
                    out.push(cell.ch);
                } else {
                    let _ = write!(out, "[{:04X}]", cell.ch as u32);
                }
            }
            out.push('\n');
        }
        let cursor = self.cursor();
        let _ = writeln!(out, "`-===[ cursor at {},{}]", cursor.x, cursor.y);
        out
    }
}
