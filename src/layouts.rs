use crate::chromosome::{CharacterSet, Layer};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Established layouts used to seed the initial population.
#[derive(Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum KnownLayout {
    Qwerty,
    Dvorak,
    Colemak,
    ColemakDH,
    Workman,
}

impl KnownLayout {
    // Standard 30-key block, row by row.
    pub fn get_str(&self) -> &'static str {
        match self {
            Self::Qwerty => "qwertyuiopasdfghjkl;zxcvbnm,./",
            Self::Dvorak => "',.pyfgcrlaoeuidhtns;qjkxbmwvz",
            Self::Colemak => "qwfpgjluy;arstdhneiozxcvbkm,./",
            Self::ColemakDH => "qwfpbjluy;arstgmneiozxcdvkh,./",
            Self::Workman => "qdrwbjfup;ashtgyneoizxmcvkl,./",
        }
    }

    /// The layout's key order restricted to `charset`; characters it does not
    /// cover follow in character-set order.
    pub fn to_layer(&self, charset: &CharacterSet) -> Layer {
        let mut genes: Vec<char> = Vec::with_capacity(charset.len());
        for c in self.get_str().chars() {
            if charset.contains(c) && !genes.contains(&c) {
                genes.push(c);
            }
        }
        for &c in charset.chars() {
            if !genes.contains(&c) {
                genes.push(c);
            }
        }
        Layer::from_genes_unchecked(genes)
    }
}

pub fn all_layouts() -> Vec<KnownLayout> {
    KnownLayout::iter().collect()
}
