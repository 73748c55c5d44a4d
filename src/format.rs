//! Formatting state and the `Render` capability.
//!
//! Every [`OStream`](crate::stream::OStream) owns a [`FormatState`]. Values are
//! rendered to text once, with the writing stream's state, and the text is what
//! gets forwarded to destinations.

use std::borrow::Cow;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Format flag bits.
///
/// Grouped fields (`BASEFIELD`, `FLOATFIELD`, `ADJUSTFIELD`) are used as masks with
/// [`OStream::insert_flags_masked`](crate::stream::OStream::insert_flags_masked).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FmtFlags(u32);

impl FmtFlags {
    /// No flags.
    pub const EMPTY: FmtFlags = FmtFlags(0);
    /// Render `bool` as `true`/`false` instead of `1`/`0`.
    pub const BOOLALPHA: FmtFlags = FmtFlags(1 << 0);
    /// Decimal integers.
    pub const DEC: FmtFlags = FmtFlags(1 << 1);
    /// Hexadecimal integers.
    pub const HEX: FmtFlags = FmtFlags(1 << 2);
    /// Octal integers.
    pub const OCT: FmtFlags = FmtFlags(1 << 3);
    /// Fixed-point floats.
    pub const FIXED: FmtFlags = FmtFlags(1 << 4);
    /// Scientific floats.
    pub const SCIENTIFIC: FmtFlags = FmtFlags(1 << 5);
    /// Pad on the right.
    pub const LEFT: FmtFlags = FmtFlags(1 << 6);
    /// Pad on the left.
    pub const RIGHT: FmtFlags = FmtFlags(1 << 7);
    /// Pad between sign/base and digits.
    pub const INTERNAL: FmtFlags = FmtFlags(1 << 8);
    /// Prefix non-decimal integers with their base.
    pub const SHOWBASE: FmtFlags = FmtFlags(1 << 9);
    /// Keep the decimal point and trailing zeros of floats.
    pub const SHOWPOINT: FmtFlags = FmtFlags(1 << 10);
    /// Prefix non-negative decimal numbers with `+`.
    pub const SHOWPOS: FmtFlags = FmtFlags(1 << 11);
    /// Upper-case hex digits, base prefixes and exponents.
    pub const UPPERCASE: FmtFlags = FmtFlags(1 << 12);

    /// Mask of the integer base flags.
    pub const BASEFIELD: FmtFlags = FmtFlags(Self::DEC.0 | Self::HEX.0 | Self::OCT.0);
    /// Mask of the float notation flags.
    pub const FLOATFIELD: FmtFlags = FmtFlags(Self::FIXED.0 | Self::SCIENTIFIC.0);
    /// Mask of the padding flags.
    pub const ADJUSTFIELD: FmtFlags = FmtFlags(Self::LEFT.0 | Self::RIGHT.0 | Self::INTERNAL.0);

    const NAMES: [(FmtFlags, &'static str); 13] = [
        (Self::BOOLALPHA, "BOOLALPHA"),
        (Self::DEC, "DEC"),
        (Self::HEX, "HEX"),
        (Self::OCT, "OCT"),
        (Self::FIXED, "FIXED"),
        (Self::SCIENTIFIC, "SCIENTIFIC"),
        (Self::LEFT, "LEFT"),
        (Self::RIGHT, "RIGHT"),
        (Self::INTERNAL, "INTERNAL"),
        (Self::SHOWBASE, "SHOWBASE"),
        (Self::SHOWPOINT, "SHOWPOINT"),
        (Self::SHOWPOS, "SHOWPOS"),
        (Self::UPPERCASE, "UPPERCASE"),
    ];

    /// Raw bit representation.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping unknown ones.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        FmtFlags(bits & ((1 << 13) - 1))
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: FmtFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FmtFlags {
    type Output = FmtFlags;

    fn bitor(self, rhs: FmtFlags) -> FmtFlags {
        FmtFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FmtFlags {
    fn bitor_assign(&mut self, rhs: FmtFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FmtFlags {
    type Output = FmtFlags;

    fn bitand(self, rhs: FmtFlags) -> FmtFlags {
        FmtFlags(self.0 & rhs.0)
    }
}

impl Not for FmtFlags {
    type Output = FmtFlags;

    fn not(self) -> FmtFlags {
        FmtFlags::from_bits_truncate(!self.0)
    }
}

impl fmt::Debug for FmtFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "FmtFlags(EMPTY)");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "FmtFlags({})", names.join(" | "))
    }
}

/// Directives that are not values: they carry no text of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manip {
    /// End the current line and flush. The next write starts a new line.
    Endl,
    /// Flush every destination.
    Flush,
}

/// Precision, width, fill and flags applied when rendering values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatState {
    /// Significant digits (general floats) or digits after the point (fixed/scientific).
    pub precision: usize,
    /// Minimum field width of the next value. Reset to 0 after every value.
    pub width: usize,
    /// Padding character.
    pub fill: char,
    /// Flag bits.
    pub flags: FmtFlags,
}

impl Default for FormatState {
    fn default() -> Self {
        Self {
            precision: 6,
            width: 0,
            fill: ' ',
            flags: FmtFlags::DEC,
        }
    }
}

impl FormatState {
    /// Pad `body` to `width` with `fill`.
    ///
    /// `split` is the char index where `INTERNAL` padding goes (after any sign or
    /// base prefix).
    pub fn pad(&self, body: &str, split: usize) -> String {
        let len = body.chars().count();
        if self.width <= len {
            return body.to_string();
        }
        let fill: String = std::iter::repeat(self.fill).take(self.width - len).collect();
        let adjust = self.flags & FmtFlags::ADJUSTFIELD;
        if adjust == FmtFlags::LEFT {
            format!("{body}{fill}")
        } else if adjust == FmtFlags::INTERNAL {
            let at = body
                .char_indices()
                .nth(split)
                .map(|(i, _)| i)
                .unwrap_or(body.len());
            format!("{}{}{}", &body[..at], fill, &body[at..])
        } else {
            format!("{fill}{body}")
        }
    }
}

/// Capability of being written to a line-oriented text sink.
///
/// Implement this for your own types, or wrap any `Display` type in [`Shown`].
pub trait Render {
    /// Render `self` as text according to `state`.
    fn render(&self, state: &FormatState) -> String;
}

/// Adapter rendering any `Display` value, padded per the format state.
#[derive(Debug, Clone, Copy)]
pub struct Shown<T>(pub T);

impl<T: fmt::Display> Render for Shown<T> {
    fn render(&self, state: &FormatState) -> String {
        state.pad(&self.0.to_string(), 0)
    }
}

impl<T: Render + ?Sized> Render for &T {
    fn render(&self, state: &FormatState) -> String {
        (**self).render(state)
    }
}

impl<T: Render + ?Sized> Render for Box<T> {
    fn render(&self, state: &FormatState) -> String {
        (**self).render(state)
    }
}

impl Render for str {
    fn render(&self, state: &FormatState) -> String {
        state.pad(self, 0)
    }
}

impl Render for String {
    fn render(&self, state: &FormatState) -> String {
        state.pad(self, 0)
    }
}

impl Render for Cow<'_, str> {
    fn render(&self, state: &FormatState) -> String {
        state.pad(self, 0)
    }
}

impl Render for char {
    fn render(&self, state: &FormatState) -> String {
        let mut buf = [0u8; 4];
        state.pad(self.encode_utf8(&mut buf), 0)
    }
}

impl Render for bool {
    fn render(&self, state: &FormatState) -> String {
        let text = match (state.flags.contains(FmtFlags::BOOLALPHA), *self) {
            (true, true) => "true",
            (true, false) => "false",
            (false, true) => "1",
            (false, false) => "0",
        };
        state.pad(text, 0)
    }
}

fn render_integer(state: &FormatState, negative: bool, magnitude: u128, raw: u128) -> String {
    let flags = state.flags;
    let upper = flags.contains(FmtFlags::UPPERCASE);
    let show_base = flags.contains(FmtFlags::SHOWBASE) && raw != 0;
    let base = flags & FmtFlags::BASEFIELD;
    let (lead, digits) = if base == FmtFlags::HEX {
        let prefix = match (show_base, upper) {
            (false, _) => "",
            (true, false) => "0x",
            (true, true) => "0X",
        };
        let digits = if upper {
            format!("{raw:X}")
        } else {
            format!("{raw:x}")
        };
        (prefix, digits)
    } else if base == FmtFlags::OCT {
        (if show_base { "0" } else { "" }, format!("{raw:o}"))
    } else {
        let sign = if negative {
            "-"
        } else if flags.contains(FmtFlags::SHOWPOS) {
            "+"
        } else {
            ""
        };
        (sign, magnitude.to_string())
    };
    state.pad(&format!("{lead}{digits}"), lead.len())
}

macro_rules! render_unsigned {
    ($($t:ty),*) => {
        $(
            impl Render for $t {
                fn render(&self, state: &FormatState) -> String {
                    render_integer(state, false, *self as u128, *self as u128)
                }
            }
        )*
    };
}

macro_rules! render_signed {
    ($($t:ty => $u:ty),*) => {
        $(
            impl Render for $t {
                fn render(&self, state: &FormatState) -> String {
                    render_integer(
                        state,
                        *self < 0,
                        self.unsigned_abs() as u128,
                        (*self as $u) as u128,
                    )
                }
            }
        )*
    };
}

render_unsigned!(u8, u16, u32, u64, u128, usize);
render_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128, isize => usize);

fn split_exponent(text: &str) -> (&str, i32) {
    match text.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (text, 0),
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn with_exponent(mantissa: &str, exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
}

fn fixed(value: f64, precision: usize, show_point: bool) -> String {
    let mut text = format!("{value:.precision$}");
    if precision == 0 && show_point {
        text.push('.');
    }
    text
}

fn scientific(value: f64, precision: usize, show_point: bool) -> String {
    let text = format!("{value:.precision$e}");
    let (mantissa, exp) = split_exponent(&text);
    let mut mantissa = mantissa.to_string();
    if precision == 0 && show_point {
        mantissa.push('.');
    }
    with_exponent(&mantissa, exp)
}

fn general(value: f64, precision: usize, show_point: bool) -> String {
    let significant = precision.max(1);
    let probe = format!("{:.*e}", significant - 1, value);
    let (mantissa, exp) = split_exponent(&probe);
    if exp >= -4 && exp < significant as i32 {
        let decimals = (significant as i32 - 1 - exp) as usize;
        let text = format!("{value:.decimals$}");
        if show_point {
            text
        } else {
            trim_fraction(&text).to_string()
        }
    } else if show_point {
        with_exponent(mantissa, exp)
    } else {
        with_exponent(trim_fraction(mantissa), exp)
    }
}

fn render_float(state: &FormatState, value: f64) -> String {
    let flags = state.flags;
    let sign = if value.is_sign_negative() && !value.is_nan() {
        "-"
    } else if flags.contains(FmtFlags::SHOWPOS) {
        "+"
    } else {
        ""
    };
    let magnitude = value.abs();
    let show_point = flags.contains(FmtFlags::SHOWPOINT);
    let notation = flags & FmtFlags::FLOATFIELD;
    let body = if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        "inf".to_string()
    } else if notation == FmtFlags::FIXED {
        fixed(magnitude, state.precision, show_point)
    } else if notation == FmtFlags::SCIENTIFIC {
        scientific(magnitude, state.precision, show_point)
    } else {
        general(magnitude, state.precision, show_point)
    };
    let body = if flags.contains(FmtFlags::UPPERCASE) {
        body.to_uppercase()
    } else {
        body
    };
    state.pad(&format!("{sign}{body}"), sign.len())
}

impl Render for f64 {
    fn render(&self, state: &FormatState) -> String {
        render_float(state, *self)
    }
}

impl Render for f32 {
    fn render(&self, state: &FormatState) -> String {
        render_float(state, f64::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_flags(flags: FmtFlags) -> FormatState {
        FormatState {
            flags,
            ..FormatState::default()
        }
    }

    #[test]
    fn default_float_uses_six_significant_digits() {
        let state = FormatState::default();
        assert_eq!(1.23456789012_f64.render(&state), "1.23457");
        assert_eq!(100000.0_f64.render(&state), "100000");
        assert_eq!(1_000_000.0_f64.render(&state), "1e+06");
        assert_eq!(0.0001_f64.render(&state), "0.0001");
        assert_eq!(5.0_f64.render(&state), "5");
    }

    #[test]
    fn precision_twelve_shows_full_value() {
        let state = FormatState {
            precision: 12,
            ..FormatState::default()
        };
        assert_eq!(1.23456789012_f64.render(&state), "1.23456789012");
    }

    #[test]
    fn fixed_and_scientific_notation() {
        let fixed = FormatState {
            precision: 2,
            ..with_flags(FmtFlags::FIXED)
        };
        assert_eq!(3.14159_f64.render(&fixed), "3.14");
        let sci = FormatState {
            precision: 3,
            ..with_flags(FmtFlags::SCIENTIFIC | FmtFlags::UPPERCASE)
        };
        assert_eq!(12345.678_f64.render(&sci), "1.235E+04");
        assert_eq!((-0.00012_f64).render(&sci), "-1.200E-04");
    }

    #[test]
    fn hex_and_octal_integers() {
        assert_eq!(16i32.render(&with_flags(FmtFlags::HEX)), "10");
        assert_eq!(
            255u8.render(&with_flags(FmtFlags::HEX | FmtFlags::SHOWBASE | FmtFlags::UPPERCASE)),
            "0XFF"
        );
        assert_eq!(8i32.render(&with_flags(FmtFlags::OCT | FmtFlags::SHOWBASE)), "010");
        assert_eq!((-1i8).render(&with_flags(FmtFlags::HEX)), "ff");
        assert_eq!(0i32.render(&with_flags(FmtFlags::HEX | FmtFlags::SHOWBASE)), "0");
    }

    #[test]
    fn signs_and_booleans() {
        assert_eq!(42i32.render(&with_flags(FmtFlags::DEC | FmtFlags::SHOWPOS)), "+42");
        assert_eq!((-42i32).render(&FormatState::default()), "-42");
        assert_eq!(true.render(&FormatState::default()), "1");
        assert_eq!(false.render(&with_flags(FmtFlags::BOOLALPHA)), "false");
    }

    #[test]
    fn padding_respects_adjustment() {
        let mut state = FormatState {
            width: 6,
            fill: '#',
            ..FormatState::default()
        };
        assert_eq!("ab".render(&state), "####ab");
        state.flags = FmtFlags::DEC | FmtFlags::LEFT;
        assert_eq!("ab".render(&state), "ab####");
        state.flags = FmtFlags::DEC | FmtFlags::INTERNAL;
        assert_eq!((-7i32).render(&state), "-####7");
        state.width = 1;
        assert_eq!("abc".render(&state), "abc");
    }

    #[test]
    fn shown_wraps_display_types() {
        let state = FormatState {
            width: 5,
            ..FormatState::default()
        };
        assert_eq!(Shown(std::net::Ipv4Addr::LOCALHOST).render(&FormatState::default()), "127.0.0.1");
        assert_eq!(Shown('x').render(&state), "    x");
    }

    #[test]
    fn flag_masks_and_debug() {
        let flags = FmtFlags::HEX | FmtFlags::LEFT;
        assert!(flags.contains(FmtFlags::HEX));
        assert!(!flags.contains(FmtFlags::BASEFIELD));
        assert_eq!(flags & FmtFlags::ADJUSTFIELD, FmtFlags::LEFT);
        assert_eq!(format!("{:?}", flags), "FmtFlags(HEX | LEFT)");
        assert_eq!(format!("{:?}", FmtFlags::EMPTY), "FmtFlags(EMPTY)");
    }
}
