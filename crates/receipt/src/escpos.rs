const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left = 0,
    Center = 1,
    Right = 2,
}

/// The subset of ESC/POS the receipt uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `ESC @`
    Initialize,
    /// `ESC a n`
    Align(Alignment),
    /// `ESC E n`
    Bold(bool),
    /// `GS ! n`; both magnifications are clamped to 1..=8.
    CharacterSize { width: u8, height: u8 },
    /// `ESC d n`
    Feed(u8),
    /// `GS V A n`: feed n lines, then partial cut.
    Cut,
}

impl Command {
    pub fn bytes(&self) -> Vec<u8> {
        match *self {
            Command::Initialize => vec![ESC, b'@'],
            Command::Align(alignment) => vec![ESC, b'a', alignment as u8],
            Command::Bold(on) => vec![ESC, b'E', u8::from(on)],
            Command::CharacterSize { width, height } => {
                let width = width.clamp(1, 8) - 1;
                let height = height.clamp(1, 8) - 1;
                vec![GS, b'!', (width << 4) | height]
            }
            Command::Feed(lines) => vec![ESC, b'd', lines],
            Command::Cut => vec![GS, b'V', b'A', 3],
        }
    }
}

#[cfg(test)]
#[path = "tests/escpos_tests.rs"]
mod tests;
