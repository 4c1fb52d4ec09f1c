//! Terminal state and screen operations.
//!
//! `Term` owns everything: the flat cell buffer, the cursor, the scrolling
//! region, mode flags, and the escape-sequence parser state. All public
//! operations run to completion synchronously; malformed input is absorbed
//! without panicking.

use crate::attr::Attribute;
use crate::cell::Cell;
use crate::parser::{VtMode, MAX_PARAMS};
use crate::point::{Point, Range};

pub type CursorMovedFn = Box<dyn FnMut(Point)>;
pub type CharWrittenFn = Box<dyn FnMut(Point, Cell)>;
pub type ClearedFn = Box<dyn FnMut(Point, usize)>;
pub type ScrolledFn = Box<dyn FnMut(i32)>;
pub type ResizedFn = Box<dyn FnMut(Point, Point)>;
pub type FlushedFn = Box<dyn FnMut()>;

/// A virtual terminal: a grid of cells plus cursor and mode state, driven
/// by a byte stream.
pub struct Term {
    size: Point,
    buf: Vec<Cell>,
    cursor: Point,
    saved_cursor: Point,
    attr: Attribute,
    scroll_range: Range,

    /// Whether the cursor is shown (DEC private mode 26 in this dialect).
    pub cursor_visible: bool,
    /// Wrap to the next line when printing past the right edge.
    pub auto_wrap: bool,
    /// Application keypad mode (`ESC =` / `ESC >`).
    pub kpad: bool,
    /// Decode input as UTF-8; when off, bytes are CP437.
    pub utf8: bool,
    /// Honor `CSI 8 ; rows ; cols t` window resizes.
    pub resizable: bool,
    /// Log unknown escape sequences and resizes.
    pub debug: bool,

    pub(crate) state: VtMode,
    pub(crate) params: Vec<u8>,
    pub(crate) cset_select: u32,
    pub(crate) cset_shift: u32,
    pub(crate) utf_char: u32,
    pub(crate) utf_count: i32,

    pub(crate) cursor_moved: Option<CursorMovedFn>,
    pub(crate) char_written: Option<CharWrittenFn>,
    pub(crate) cleared: Option<ClearedFn>,
    pub(crate) scrolled: Option<ScrolledFn>,
    pub(crate) resized: Option<ResizedFn>,
    pub(crate) flushed: Option<FlushedFn>,
}

fn clamp(x: i32, min: i32, max: i32) -> i32 {
    if x < min {
        min
    } else if x > max {
        max
    } else {
        x
    }
}

fn default_size() -> Point {
    Point::new(80, 24)
}

impl Term {
    /// Creates a terminal at the default 80x24 size.
    pub fn new() -> Self {
        Self::with_size(default_size())
    }

    /// Creates a terminal at the given size.
    pub fn with_size(size: Point) -> Self {
        let mut term = Term {
            size,
            buf: vec![Cell::default(); size.area().max(0) as usize],
            cursor: Point::default(),
            saved_cursor: Point::default(),
            attr: Attribute::RESET,
            scroll_range: Range {
                low: 0,
                high: size.y,
            },
            cursor_visible: true,
            auto_wrap: true,
            kpad: false,
            utf8: true,
            resizable: false,
            debug: false,
            state: VtMode::Norm,
            params: Vec::with_capacity(MAX_PARAMS),
            cset_select: 1 << 1,
            cset_shift: 0,
            utf_char: 0,
            utf_count: 0,
            cursor_moved: None,
            char_written: None,
            cleared: None,
            scrolled: None,
            resized: None,
            flushed: None,
        };
        term.reset();
        term
    }

    /// Returns the terminal to its power-on state: home cursor, default
    /// attribute, full-screen scroll region, ASCII shift, cleared grid.
    /// The `utf8`, `resizable` and `debug` flags are configuration and
    /// survive a reset.
    pub fn reset(&mut self) {
        self.cursor = Point::default();
        self.attr = Attribute::RESET;
        self.cursor_visible = true;
        self.auto_wrap = true;
        self.kpad = false;
        self.scroll_range = Range {
            low: 0,
            high: self.size.y,
        };
        self.saved_cursor = Point::default();
        self.cset_shift = 0;
        self.cset_select = 1 << 1;
        self.utf_count = 0;
        self.clear_region(0, self.max_offset());
        self.change_state(VtMode::Norm);
        self.clear_par_state();
    }

    /// Feeds raw bytes through the parser.
    pub fn write(&mut self, content: &[u8]) {
        for &b in content {
            self.consume_byte(b);
        }
        if let Some(f) = self.flushed.as_mut() {
            f();
        }
    }

    pub fn write_str(&mut self, content: &str) {
        self.write(content.as_bytes());
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn attr(&self) -> Attribute {
        self.attr
    }

    pub(crate) fn set_attr(&mut self, attr: Attribute) {
        self.attr = attr;
    }

    pub fn scroll_range(&self) -> Range {
        self.scroll_range
    }

    /// Whether the active G set is DEC special graphics.
    pub fn in_dec_cset(&self) -> bool {
        self.cset_select & (1 << self.cset_shift) != 0
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.size.x && p.y >= 0 && p.y < self.size.y
    }

    /// Reads the cell at `p`. The coordinate must be in bounds.
    pub fn get(&self, p: Point) -> Cell {
        self.buf[self.pos_offset(p)]
    }

    /// Writes the cell at `p`. The coordinate must be in bounds.
    pub fn set(&mut self, p: Point, cell: Cell) {
        let offset = self.pos_offset(p);
        self.buf[offset] = cell;
    }

    /// Returns up to `length` code points starting at `at`, or the empty
    /// string if `at` is outside the grid. The result may mix arbitrary
    /// code points and need not resemble any source encoding.
    pub fn text_at(&self, at: Point, length: usize) -> String {
        if !self.in_bounds(at) {
            return String::new();
        }
        let offset = self.pos_offset(at);
        let end = (offset + length).min(self.max_offset());
        self.buf[offset..end].iter().map(|c| c.ch).collect()
    }

    /// A blank cell carrying the current attribute.
    pub fn default_cell(&self) -> Cell {
        Cell::new(self.attr, ' ')
    }

    /// Fills `length` cells starting at buffer offset `start` with the
    /// default cell. The range must lie within the grid.
    pub fn clear_region(&mut self, start: usize, length: usize) {
        let zero = self.default_cell();
        for cell in &mut self.buf[start..start + length] {
            *cell = zero;
        }
        if length > 0 {
            let at = Point::new(
                start as i32 % self.size.x,
                start as i32 / self.size.x,
            );
            if let Some(f) = self.cleared.as_mut() {
                f(at, length);
            }
        }
    }

    /// Clears the grid and homes the cursor.
    pub fn clear_screen(&mut self) {
        self.cursor = Point::default();
        self.clear_region(0, self.max_offset());
    }

    /// Shifts the scroll region's contents by `lines`: positive moves
    /// content up (new blank lines at the bottom), negative moves it down.
    pub fn scroll(&mut self, lines: i32) {
        let span = self.scroll_range.span();
        let preserved_lines = span - lines.abs();

        if preserved_lines <= 0 {
            self.clear_region(
                self.size.line_offset(self.scroll_range.low),
                (span * self.size.x) as usize,
            );
        } else {
            let preserved = (preserved_lines * self.size.x) as usize;
            if lines < 0 {
                let target = self.pos_offset(Point::new(0, self.scroll_range.low - lines));
                let source = self.pos_offset(Point::new(0, self.scroll_range.low));
                self.buf.copy_within(source..source + preserved, target);
                self.clear_region(
                    self.size.line_offset(self.scroll_range.low),
                    (-lines * self.size.x) as usize,
                );
            } else {
                let target = self.pos_offset(Point::new(0, self.scroll_range.low));
                let source = self.pos_offset(Point::new(0, self.scroll_range.low + lines));
                self.buf.copy_within(source..source + preserved, target);
                self.clear_region(
                    self.size.line_offset(self.scroll_range.high - lines),
                    (lines * self.size.x) as usize,
                );
            }
        }
        if let Some(f) = self.scrolled.as_mut() {
            f(lines);
        }
    }

    /// Replaces the grid with one of the new size, preserving the top-left
    /// intersection. Resets the scroll region and clamps the cursor.
    /// Non-positive dimensions are ignored.
    pub fn resize(&mut self, newsize: Point) {
        if newsize == self.size || newsize.x < 1 || newsize.y < 1 {
            return;
        }
        let oldsize = self.size;
        if self.debug {
            log::debug!("resize from {} to {}", oldsize, newsize);
        }

        let oldbuf = std::mem::replace(
            &mut self.buf,
            vec![Cell::default(); newsize.area() as usize],
        );
        self.size = newsize;
        self.clear_region(0, newsize.area() as usize);

        let copysize = Point::min(oldsize, newsize);
        for y in 0..copysize.y {
            let old_offset = oldsize.line_offset(y);
            let new_offset = newsize.line_offset(y);
            self.buf[new_offset..new_offset + copysize.x as usize]
                .copy_from_slice(&oldbuf[old_offset..old_offset + copysize.x as usize]);
        }
        self.scroll_range = Range {
            low: 0,
            high: newsize.y,
        };
        self.cursor.x = clamp(self.cursor.x, 0, newsize.x);
        self.cursor.y = clamp(self.cursor.y, 0, newsize.y - 1);
        if let Some(f) = self.resized.as_mut() {
            f(oldsize, newsize);
        }
    }

    // Observer registration. Callbacks are advisory: they see mutations
    // after the fact and must not re-enter the terminal.

    pub fn on_cursor_moved(&mut self, f: impl FnMut(Point) + 'static) {
        self.cursor_moved = Some(Box::new(f));
    }

    pub fn on_char_written(&mut self, f: impl FnMut(Point, Cell) + 'static) {
        self.char_written = Some(Box::new(f));
    }

    pub fn on_cleared(&mut self, f: impl FnMut(Point, usize) + 'static) {
        self.cleared = Some(Box::new(f));
    }

    pub fn on_scrolled(&mut self, f: impl FnMut(i32) + 'static) {
        self.scrolled = Some(Box::new(f));
    }

    pub fn on_resized(&mut self, f: impl FnMut(Point, Point) + 'static) {
        self.resized = Some(Box::new(f));
    }

    pub fn on_flushed(&mut self, f: impl FnMut() + 'static) {
        self.flushed = Some(Box::new(f));
    }

    // Cursor and line primitives.

    pub(crate) fn pos_offset(&self, p: Point) -> usize {
        self.size.offset(p)
    }

    pub(crate) fn max_offset(&self) -> usize {
        self.size.area() as usize
    }

    fn clamp_cursor(&self, c: Point) -> Point {
        // X may rest one past the right edge between prints; Y may not
        // leave the grid.
        Point::new(
            clamp(c.x, 0, self.size.x),
            clamp(c.y, 0, self.size.y - 1),
        )
    }

    pub(crate) fn clamp_cursor_strict(&self, c: Point) -> Point {
        Point::new(
            clamp(c.x, 0, self.size.x - 1),
            clamp(c.y, 0, self.size.y - 1),
        )
    }

    pub(crate) fn cursor_move(&mut self, delta: Point) {
        self.cursor = self.clamp_cursor(Point::new(
            self.cursor.x + delta.x,
            self.cursor.y + delta.y,
        ));
    }

    pub(crate) fn set_cursor(&mut self, c: Point) {
        self.cursor = c;
    }

    pub(crate) fn set_cursor_x(&mut self, x: i32) {
        self.cursor.x = clamp(x, 0, self.size.x - 1);
    }

    pub(crate) fn set_cursor_y(&mut self, y: i32) {
        self.cursor.y = clamp(y, 0, self.size.y - 1);
    }

    pub(crate) fn save_cursor(&mut self) {
        self.saved_cursor = self.cursor;
    }

    pub(crate) fn restore_cursor(&mut self) {
        self.cursor = self.saved_cursor;
    }

    pub(crate) fn backspace(&mut self) {
        if self.cursor.x > 0 {
            self.cursor.x -= 1;
            if let Some(f) = self.cursor_moved.as_mut() {
                f(self.cursor);
            }
        }
    }

    fn is_tab_stop(x: i32) -> bool {
        x & 7 == 0
    }

    /// Overwrites with blanks up to the next tab stop or the right edge.
    pub(crate) fn tab(&mut self) {
        let zero = self.default_cell();
        while self.cursor.x < self.size.x {
            self.set(self.cursor, zero);
            self.cursor.x += 1;
            if Self::is_tab_stop(self.cursor.x) {
                break;
            }
        }
    }

    pub(crate) fn carriage_return(&mut self) {
        self.cursor.x = 0;
    }

    pub(crate) fn linefeed(&mut self) {
        self.carriage_return();
        self.vertical_tab();
    }

    /// Moves the cursor down one row, scrolling when it crosses the bottom
    /// of the scroll region and clamping at the bottom of the screen.
    pub(crate) fn vertical_tab(&mut self) {
        self.cursor.y += 1;
        if self.cursor.y == self.scroll_range.high {
            self.scroll(1);
            self.cursor.y = self.scroll_range.high - 1;
        } else if self.cursor.y >= self.size.y {
            self.cursor.y = self.size.y - 1;
        }
    }

    /// Moves the cursor up one row, scrolling down when it crosses the top
    /// of the scroll region.
    pub(crate) fn up_line(&mut self) {
        self.cursor.y -= 1;
        if self.cursor.y == self.scroll_range.low - 1 {
            self.cursor.y = self.scroll_range.low;
            self.scroll(-1);
        } else if self.cursor.y < 0 {
            self.cursor.y = 0;
        }
    }

    /// Resolves a cursor resting past the right edge before a print:
    /// wrap (with scroll) when auto-wrap is on, clamp otherwise.
    pub(crate) fn clamp_cursor_x(&mut self) {
        if self.cursor.x >= self.size.x {
            if self.auto_wrap {
                self.cursor.x = 0;
                self.vertical_tab();
            } else {
                self.cursor.x = self.size.x - 1;
            }
        }
    }

    pub(crate) fn write_cell(&mut self, ch: char) {
        let offset = self.pos_offset(self.cursor);
        let cell = Cell::new(self.attr, ch);
        self.buf[offset] = cell;
        if let Some(f) = self.char_written.as_mut() {
            f(self.cursor, cell);
        }
        self.cursor.x += 1;
    }

    pub fn in_scrolling_region(&self) -> bool {
        self.cursor.y >= self.scroll_range.low && self.cursor.y < self.scroll_range.high
    }

    /// Runs `action` with the scroll region's top edge pinned to the cursor
    /// row, restoring it afterwards. Used by line insert/delete.
    pub(crate) fn scroll_excursion(&mut self, action: impl FnOnce(&mut Term)) {
        let low = self.scroll_range.low;
        self.scroll_range.low = self.cursor.y;
        action(self);
        self.scroll_range.low = low;
    }

    /// Installs the given scrolling region; the caller has validated it.
    pub(crate) fn set_scroll_range(&mut self, range: Range) {
        self.scroll_range = range;
    }
}

impl Default for Term {
    fn default() -> Self {
        Self::new()
    }
}
