//! Packed display attributes and the SGR parameter machine.
//!
//! An attribute is a single `u32` with three fields:
//! - bits 0..8: foreground palette index (0-7, or 0x10 for the default)
//! - bits 8..16: background palette index, stored shifted
//! - bits 16..22: style flags
//!
//! Only the 16-color palette is representable; SGR parameters arrive as
//! 8-bit counters, so extended palette indices wrap mod 256.

use serde::{Deserialize, Serialize};

/// A packed cell attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute(u32);

impl Attribute {
    pub const BOLD: u32 = 1 << 16;
    pub const DIM: u32 = 1 << 17;
    pub const ITALIC: u32 = 1 << 18;
    pub const UNDERLINE: u32 = 1 << 19;
    pub const BLINK: u32 = 1 << 20;
    pub const INVERSE: u32 = 1 << 21;

    /// Palette index meaning "terminal default" for either channel.
    pub const DEFAULT_COLOR: u8 = 0x10;

    /// Default foreground and background, no styling.
    pub const RESET: Attribute = Attribute(0x1010);

    pub const fn new(bits: u32) -> Self {
        Attribute(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn fg(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn bg(self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub fn set_fg(&mut self, index: u8) {
        self.0 = (self.0 & !0xff) | u32::from(index);
    }

    pub fn set_bg(&mut self, index: u8) {
        self.0 = (self.0 & !0xff00) | (u32::from(index) << 8);
    }

    pub fn contains(self, flags: u32) -> bool {
        self.0 & flags != 0
    }

    pub fn insert(&mut self, flags: u32) {
        self.0 |= flags;
    }

    pub fn remove(&mut self, flags: u32) {
        self.0 &= !flags;
    }

    /// Applies an SGR parameter list (the contents of `ESC [ ... m`).
    pub fn apply_sgr(&mut self, params: &[u8]) {
        let mut state = SgrState::Ground;
        for &p in params {
            state = self.apply_sgr_param(state, p);
        }
    }

    fn apply_sgr_param(&mut self, state: SgrState, p: u8) -> SgrState {
        match state {
            SgrState::FgExtMarker => {
                // Only the `5;index` palette form is understood; the RGB,
                // CMY and CMYK subcommands are dropped.
                return if p == 5 {
                    SgrState::FgExtIndex
                } else {
                    SgrState::Ground
                };
            }
            SgrState::FgExtIndex => {
                if p == 16 {
                    self.0 &= !0xff;
                } else {
                    self.set_fg(p);
                }
                return SgrState::Ground;
            }
            SgrState::BgExtMarker => {
                return if p == 5 {
                    SgrState::BgExtIndex
                } else {
                    SgrState::Ground
                };
            }
            SgrState::BgExtIndex => {
                if p == 16 {
                    self.0 &= !0xff00;
                } else {
                    self.set_bg(p);
                }
                return SgrState::Ground;
            }
            SgrState::Ground => {}
        }

        match p {
            0 => *self = Attribute::RESET,
            1 => {
                self.insert(Self::BOLD);
                self.remove(Self::DIM);
            }
            2 => {
                self.insert(Self::DIM);
                self.remove(Self::BOLD);
            }
            3 => self.insert(Self::ITALIC),
            4 => self.insert(Self::UNDERLINE),
            5 => self.insert(Self::BLINK),
            7 => self.insert(Self::INVERSE),
            21 | 22 => self.remove(Self::BOLD | Self::DIM),
            23 => self.remove(Self::ITALIC),
            24 => self.remove(Self::UNDERLINE),
            25 => self.remove(Self::BLINK),
            27 => self.remove(Self::INVERSE),
            30..=37 => self.set_fg(p - 30),
            38 => return SgrState::FgExtMarker,
            39 => self.set_fg(Self::DEFAULT_COLOR),
            40..=47 => self.set_bg(p - 40),
            48 => return SgrState::BgExtMarker,
            49 => self.set_bg(Self::DEFAULT_COLOR),
            _ => {}
        }
        SgrState::Ground
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Attribute::RESET
    }
}

/// Sub-states for the `38;5;n` / `48;5;n` extended-color introducers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SgrState {
    Ground,
    FgExtMarker,
    FgExtIndex,
    BgExtMarker,
    BgExtIndex,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(params: &[u8]) -> Attribute {
        let mut attr = Attribute::RESET;
        attr.apply_sgr(params);
        attr
    }

    #[test]
    fn test_reset_value() {
        assert_eq!(Attribute::RESET.bits(), 0x1010);
        assert_eq!(Attribute::RESET.fg(), 0x10);
        assert_eq!(Attribute::RESET.bg(), 0x10);
    }

    #[test]
    fn test_simple_colors() {
        let attr = applied(&[31, 44]);
        assert_eq!(attr.fg(), 1);
        assert_eq!(attr.bg(), 4);
        assert_eq!(attr.bits(), 0x0401);
    }

    #[test]
    fn test_default_colors() {
        let attr = applied(&[31, 44, 39, 49]);
        assert_eq!(attr, Attribute::RESET);
    }

    #[test]
    fn test_bold_dim_exclusive() {
        let attr = applied(&[1, 2]);
        assert!(attr.contains(Attribute::DIM));
        assert!(!attr.contains(Attribute::BOLD));

        let attr = applied(&[2, 1]);
        assert!(attr.contains(Attribute::BOLD));
        assert!(!attr.contains(Attribute::DIM));

        assert_eq!(applied(&[1, 2, 22]), Attribute::RESET);
    }

    #[test]
    fn test_style_flags() {
        let attr = applied(&[3, 4, 5, 7]);
        assert!(attr.contains(Attribute::ITALIC));
        assert!(attr.contains(Attribute::UNDERLINE));
        assert!(attr.contains(Attribute::BLINK));
        assert!(attr.contains(Attribute::INVERSE));
        assert_eq!(applied(&[3, 4, 5, 7, 23, 24, 25, 27]), Attribute::RESET);
    }

    #[test]
    fn test_full_reset() {
        let attr = applied(&[1, 31, 44, 0]);
        assert_eq!(attr, Attribute::RESET);
    }

    #[test]
    fn test_extended_fg() {
        let attr = applied(&[38, 5, 9]);
        assert_eq!(attr.fg(), 9);
        assert_eq!(attr.bg(), 0x10);
    }

    #[test]
    fn test_extended_bg() {
        let attr = applied(&[48, 5, 123]);
        assert_eq!(attr.bg(), 123);
    }

    // Palette index 16 clears the channel instead of selecting color 16.
    #[test]
    fn test_extended_index_sixteen_clears() {
        assert_eq!(applied(&[38, 5, 16]).fg(), 0);
        assert_eq!(applied(&[48, 5, 16]).bg(), 0);
    }

    #[test]
    fn test_extended_unknown_subcommand_dropped() {
        // 38;2;r;g;b is not supported: the 2 drops back to ground and the
        // r;g;b parameters are then interpreted as ordinary SGR codes.
        let attr = applied(&[38, 2]);
        assert_eq!(attr, Attribute::RESET);
    }

    #[test]
    fn test_trailing_introducer_is_inert() {
        let attr = applied(&[38]);
        assert_eq!(attr, Attribute::RESET);
        let attr = applied(&[38, 5]);
        assert_eq!(attr, Attribute::RESET);
    }
}
