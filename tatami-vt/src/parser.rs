//! The VT escape-sequence state machine.
//!
//! Every byte first passes through universal consumption (control characters
//! that act the same in any state); what survives goes to the handler for
//! the current state. Unknown sequences drop back to `Norm` without
//! disturbing the grid.

use serde::{Deserialize, Serialize};

use crate::charset;
use crate::point::{Point, Range};
use crate::term::Term;

/// Parser states. `Norm` feeds bytes to the active character decoder; the
/// rest accumulate an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VtMode {
    #[default]
    Norm,
    /// Saw ESC.
    Esc,
    /// Saw `ESC [`.
    Square,
    /// Saw `ESC [ ?`.
    Ques,
    /// Accumulating numeric CSI parameters.
    GetPars,
    /// Saw `ESC %`.
    Percent,
    /// Saw `ESC (`.
    SetG0,
    /// Saw `ESC )`.
    SetG1,
    /// Saw `ESC ]`; bytes are discarded until BEL.
    Osc,
}

impl VtMode {
    /// Sequence introducer, for diagnostics.
    fn code(self) -> &'static str {
        match self {
            VtMode::Square => "[",
            VtMode::Ques => "[?",
            VtMode::Percent => "%",
            _ => "",
        }
    }
}

/// CSI parameter slots; an eleventh parameter is an error.
pub(crate) const MAX_PARAMS: usize = 10;

impl Term {
    pub(crate) fn consume_byte(&mut self, b: u8) {
        if self.any_state_consume(b) {
            return;
        }
        match self.state {
            VtMode::Norm => self.consume_norm(b),
            VtMode::Esc => self.consume_esc(b),
            VtMode::Square => self.consume_esc_square(b),
            VtMode::Ques => self.consume_esc_ques(b),
            VtMode::GetPars => self.consume_esc_get_pars(b),
            VtMode::Percent => self.consume_esc_percent(b),
            VtMode::SetG0 => self.consume_set_g0(b),
            VtMode::SetG1 => self.consume_set_g1(b),
            VtMode::Osc => {}
        }
    }

    /// Control characters honored in every state. Returns true when the
    /// byte has been fully handled.
    fn any_state_consume(&mut self, b: u8) -> bool {
        match b {
            0 | 127 => {}
            7 => {
                if self.state == VtMode::Osc {
                    self.change_state(VtMode::Norm);
                }
            }
            8 => self.backspace(),
            9 => self.tab(),
            10 => self.linefeed(),
            11 => self.vertical_tab(),
            12 => self.clear_screen(),
            13 => self.carriage_return(),
            14 => self.cset_shift = 1,
            15 => self.cset_shift = 0,
            24 => {} // CAN is dropped without leaving the current state
            26 => self.change_state(VtMode::Norm),
            27 => self.change_state(VtMode::Esc),
            _ => return false,
        }
        true
    }

    pub(crate) fn change_state(&mut self, new_state: VtMode) {
        if self.state == VtMode::GetPars {
            self.clear_par_state();
        }
        self.state = new_state;
    }

    pub(crate) fn clear_par_state(&mut self) {
        self.params.clear();
        self.params.push(0);
    }

    fn consume_norm(&mut self, b: u8) {
        if self.utf8 {
            self.consume_utf8(b);
        } else {
            self.apply_char(charset::CP437[b as usize]);
        }
    }

    /// Incremental UTF-8 assembly. A stray continuation byte or an
    /// unrecognized lead byte silently resets the accumulator.
    fn consume_utf8(&mut self, b: u8) {
        if b > 0x7f {
            if self.utf_count > 0 && (b & 0xc0) == 0x80 {
                self.utf_char = (self.utf_char << 6) | u32::from(b & 0x3f);
                self.utf_count -= 1;
                if self.utf_count <= 0 {
                    self.apply_char(charset::normalize_multibyte(self.utf_char));
                }
            } else if (b & 0xe0) == 0xc0 {
                self.start_utf8(1, b & 0x1f);
            } else if (b & 0xf0) == 0xe0 {
                self.start_utf8(2, b & 0x0f);
            } else if (b & 0xf8) == 0xf0 {
                self.start_utf8(3, b & 0x07);
            } else if (b & 0xfc) == 0xf8 {
                self.start_utf8(4, b & 0x03);
            } else if (b & 0xfe) == 0xfc {
                self.start_utf8(5, b & 0x01);
            } else {
                self.start_utf8(0, 0);
            }
        } else {
            self.utf_count = 0;
            self.apply_char(b as char);
        }
    }

    fn start_utf8(&mut self, count: i32, seed: u8) {
        self.utf_count = count;
        self.utf_char = u32::from(seed);
    }

    /// Places a decoded code point on the grid: BOM and control-range
    /// values are dropped, the DEC overlay applies to the low half, and a
    /// cursor resting past the right edge wraps first.
    fn apply_char(&mut self, c: char) {
        if charset::is_bom(c) {
            return;
        }
        if c as u32 > 31 {
            let c = if (c as u32) < 128 && self.in_dec_cset() {
                charset::dec_graphics(c)
            } else {
                c
            };
            self.clamp_cursor_x();
            self.write_cell(c);
        }
    }

    fn consume_esc(&mut self, b: u8) {
        match b {
            b'[' => {
                self.change_state(VtMode::Square);
                self.clear_par_state();
            }
            b']' => self.change_state(VtMode::Osc),
            b'(' => self.change_state(VtMode::SetG0),
            b')' => self.change_state(VtMode::SetG1),
            b'%' => self.change_state(VtMode::Percent),
            b'7' => {
                self.save_cursor();
                self.change_state(VtMode::Norm);
            }
            b'8' => {
                self.restore_cursor();
                self.change_state(VtMode::Norm);
            }
            b'D' => {
                self.change_state(VtMode::Norm);
                self.vertical_tab();
            }
            b'E' => {
                self.change_state(VtMode::Norm);
                self.linefeed();
            }
            b'M' => {
                self.change_state(VtMode::Norm);
                self.up_line();
            }
            b'=' => {
                self.change_state(VtMode::Norm);
                self.kpad = true;
            }
            b'>' => {
                self.change_state(VtMode::Norm);
                self.kpad = false;
            }
            _ => self.err(b),
        }
    }

    fn consume_esc_percent(&mut self, b: u8) {
        match b {
            b'@' => self.utf8 = false,
            b'8' | b'G' => self.utf8 = true,
            _ => {}
        }
        self.change_state(VtMode::Norm);
    }

    fn consume_esc_square(&mut self, b: u8) {
        if b == b'?' {
            self.change_state(VtMode::Ques);
            return;
        }
        self.change_state(VtMode::GetPars);
        self.consume_byte(b);
    }

    fn consume_set_g0(&mut self, b: u8) {
        self.set_charset(0, b);
        self.change_state(VtMode::Norm);
    }

    fn consume_set_g1(&mut self, b: u8) {
        self.set_charset(1, b);
        self.change_state(VtMode::Norm);
    }

    fn set_charset(&mut self, g: u32, b: u8) {
        match b {
            b'0' => self.cset_select |= 1 << g,
            b'B' | b'U' => self.cset_select &= !(1 << g),
            _ => {}
        }
    }

    /// Accumulates digits and separators into the parameter buffer.
    /// Returns true when the byte was part of the parameter list.
    fn apply_parameter_byte(&mut self, b: u8) -> bool {
        match b {
            b'0'..=b'9' => {
                let i = self.params.len() - 1;
                self.params[i] = self.params[i].wrapping_mul(10).wrapping_add(b - b'0');
                true
            }
            b';' => {
                if self.params.len() == MAX_PARAMS {
                    self.err(b);
                } else {
                    self.params.push(0);
                }
                true
            }
            _ => false,
        }
    }

    fn consume_esc_get_pars(&mut self, b: u8) {
        if self.apply_parameter_byte(b) {
            return;
        }
        match b {
            b'm' => {
                let mut attr = self.attr();
                attr.apply_sgr(&self.params);
                self.set_attr(attr);
            }
            b'D' => {
                let n = self.min_move(0, 1);
                self.cursor_move(Point::new(-n, 0));
            }
            b'C' | b'a' => {
                let n = self.min_move(0, 1);
                self.cursor_move(Point::new(n, 0));
            }
            b'A' => {
                let n = self.min_move(0, 1);
                self.cursor_move(Point::new(0, -n));
            }
            b'B' => {
                let n = self.min_move(0, 1);
                self.cursor_move(Point::new(0, n));
            }
            b'r' => {
                let low = self.min_move(0, 1);
                let high = if self.params.len() > 1 && self.params[1] > 0 {
                    i32::from(self.params[1])
                } else {
                    self.size().y
                };
                if high <= self.size().y && low < high {
                    self.set_scroll_range(Range { low, high });
                    self.set_cursor(Point::new(0, low));
                }
            }
            b'J' => match self.state_n(0) {
                0 => {
                    let offset = self.pos_offset(self.cursor());
                    self.clear_region(offset, self.max_offset() - offset);
                }
                1 => {
                    let offset = self.pos_offset(self.cursor());
                    self.clear_region(0, offset);
                }
                2 => self.clear_region(0, self.max_offset()),
                _ => {}
            },
            b'K' => match self.state_n(0) {
                0 => {
                    let offset = self.pos_offset(self.cursor());
                    let length = (self.size().x - self.cursor().x) as usize;
                    self.clear_region(offset, length);
                }
                1 => {
                    let offset = self.pos_offset(Point::new(0, self.cursor().y));
                    self.clear_region(offset, self.cursor().x as usize);
                }
                2 => {
                    let offset = self.pos_offset(Point::new(0, self.cursor().y));
                    self.clear_region(offset, self.size().x as usize);
                }
                _ => {}
            },
            b'L' => {
                if self.in_scrolling_region() {
                    let n = self.min_move(0, 1);
                    self.scroll_excursion(|t| t.scroll(-n));
                }
            }
            b'M' => {
                if self.in_scrolling_region() {
                    let n = self.min_move(0, 1);
                    self.scroll_excursion(|t| t.scroll(n));
                }
            }
            b'X' => {
                let mut length = self.min_move(0, 1);
                if length + self.cursor().x > self.size().x {
                    length = self.size().x - self.cursor().x;
                }
                let offset = self.pos_offset(self.cursor());
                self.clear_region(offset, length as usize);
            }
            b'f' | b'H' => {
                let target = Point::new(self.state_n(1) - 1, self.state_n(0) - 1);
                let target = self.clamp_cursor_strict(target);
                self.set_cursor(target);
            }
            b'G' | b'`' => self.set_cursor_x(self.state_n(0) - 1),
            b'd' => self.set_cursor_y(self.state_n(0) - 1),
            b'c' => self.reset(),
            b't' => {
                if self.state_n(0) == 8 && self.resizable {
                    let newsize = Point::new(
                        self.state_n_def(2, self.size().x),
                        self.state_n_def(1, self.size().y),
                    );
                    self.resize(newsize);
                }
            }
            _ => {}
        }
        self.change_state(VtMode::Norm);
    }

    fn consume_esc_ques(&mut self, b: u8) {
        if self.apply_parameter_byte(b) {
            return;
        }
        match b {
            b'h' => self.apply_par_options(true),
            b'l' => self.apply_par_options(false),
            _ => {}
        }
        self.change_state(VtMode::Norm);
    }

    fn apply_par_options(&mut self, set: bool) {
        for i in 0..self.params.len() {
            match self.params[i] {
                7 => self.auto_wrap = set,
                26 => self.cursor_visible = set,
                _ => {}
            }
        }
    }

    fn state_n(&self, index: usize) -> i32 {
        self.state_n_def(index, 0)
    }

    fn state_n_def(&self, index: usize, default: i32) -> i32 {
        match self.params.get(index) {
            Some(&v) => i32::from(v),
            None => default,
        }
    }

    fn min_move(&self, index: usize, min: i32) -> i32 {
        self.state_n(index).max(min)
    }

    /// Abandons the current sequence and returns to `Norm`.
    fn err(&mut self, b: u8) {
        if self.debug {
            self.debug_err(b);
        }
        self.change_state(VtMode::Norm);
    }

    fn debug_err(&self, b: u8) {
        match self.state {
            VtMode::Norm => log::debug!("unknown code 0x{:02x}", b),
            VtMode::Esc => log::debug!("unknown code ESC {}", b as char),
            VtMode::Square | VtMode::Ques | VtMode::Percent => {
                log::debug!("unknown code ESC {} {}", self.state.code(), self.esc_state())
            }
            _ => log::debug!("bad state for VT"),
        }
    }

    fn esc_state(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        params.join(" ")
    }
}
