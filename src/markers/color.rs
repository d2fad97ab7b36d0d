use std::fmt;

/// Marker color as a packed 32-bit ARGB value (alpha in the high byte).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Argb(pub u32);

impl Argb {
    pub const BLUE: Argb = Argb(0xFF00_00FF);
    pub const YELLOW: Argb = Argb(0xFFFF_FF00);
    pub const ORANGE: Argb = Argb(0xFFFF_A500);
    pub const PURPLE: Argb = Argb(0xFF80_0080);
    pub const PINK: Argb = Argb(0xFFFF_C0CB);
    pub const RED: Argb = Argb(0xFFFF_0000);

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Parse a bare hexadecimal ARGB value (`FF0000FF`, `ff00`). No `#` or `0x`
    /// prefix and no sign; surrounding whitespace is ignored.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Argb)
    }

    /// Palette name if this is one of the default colors.
    pub fn palette_name(self) -> Option<&'static str> {
        PALETTE
            .iter()
            .find(|(_, color)| *color == self)
            .map(|(name, _)| *name)
    }

    /// Next palette entry, wrapping around. Colors outside the palette start
    /// again at the first entry.
    pub fn next_in_palette(self) -> Argb {
        match PALETTE.iter().position(|(_, color)| *color == self) {
            Some(idx) => PALETTE[(idx + 1) % PALETTE.len()].1,
            None => PALETTE[0].1,
        }
    }

    /// Previous palette entry, wrapping around.
    pub fn prev_in_palette(self) -> Argb {
        match PALETTE.iter().position(|(_, color)| *color == self) {
            Some(idx) => PALETTE[(idx + PALETTE.len() - 1) % PALETTE.len()].1,
            None => PALETTE[PALETTE.len() - 1].1,
        }
    }

    /// Pick a default color for a new marker. Deterministic in `seed`.
    pub fn default_for(seed: u64) -> Argb {
        let idx = (rand_simple(seed) * PALETTE.len() as f64) as usize;
        PALETTE[idx.min(PALETTE.len() - 1)].1
    }
}

/// Uppercase hex without prefix or zero padding.
impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// Default marker colors, in the order the edit dialog cycles through them.
pub const PALETTE: [(&str, Argb); 6] = [
    ("Blue", Argb::BLUE),
    ("Yellow", Argb::YELLOW),
    ("Orange", Argb::ORANGE),
    ("Purple", Argb::PURPLE),
    ("Pink", Argb::PINK),
    ("Red", Argb::RED),
];

/// Splitmix64 mapped to [0, 1)
#[inline(always)]
fn rand_simple(seed: u64) -> f64 {
    let mut x = seed.wrapping_mul(0x9e3779b97f4a7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    (x >> 11) as f64 / 9007199254740992.0
}
