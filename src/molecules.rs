//! HITRAN-2004 molecule catalog.
//!
//! Molecule numbers follow the catalog order starting at 1. Isotope numbers
//! follow the order of each isotope list, also starting at 1.

/// Molecules abridged when no explicit selection is given.
pub const DEFAULT_MOLECULES: [&str; 6] = ["H2O", "CO2", "O3", "N2O", "CH4", "NO2"];

const CATALOG: &[(&str, &[&str])] = &[
    ("H2O", &["161", "181", "171", "162"]),
    ("CO2", &["626", "636", "628", "627", "638", "637", "828", "728"]),
    ("O3", &["666", "668", "686", "667", "676"]),
    ("N2O", &["446", "456", "546", "448", "447"]),
    ("CO", &["26", "36", "28", "27", "38", "37"]),
    ("CH4", &["211", "311", "212"]),
    ("O2", &["66", "68", "67"]),
    ("NO", &["46", "56", "48"]),
    ("SO2", &["626", "646"]),
    ("NO2", &["646"]),
    ("NH3", &["4111", "5111"]),
    ("HNO3", &["146"]),
    ("OH", &["61", "81", "62"]),
    ("HF", &["19"]),
    ("HCl", &["15", "17"]),
    ("HBr", &["19", "11"]),
    ("HI", &["17"]),
    ("ClO", &["56", "76"]),
    ("OCS", &["622", "624", "632", "623", "822"]),
    ("H2CO", &["126", "136", "128"]),
    ("HOCl", &["165", "167"]),
    ("N2", &["44"]),
    ("HCN", &["124", "134", "125"]),
    ("CH3Cl", &["215", "217"]),
    ("H2O2", &["1661"]),
    ("C2H2", &["1221", "1231"]),
    ("C2H6", &["1221"]),
    ("PH3", &["1111"]),
    ("COF2", &["269"]),
    ("SF6", &["29"]),
    ("H2S", &["121", "141", "131"]),
    ("HCOOH", &["126"]),
    ("HO2", &["166"]),
    ("O", &["6"]),
    ("ClONO2", &["5646", "7646"]),
    ("NO+", &["46"]),
    ("HOBr", &["169", "161"]),
    ("C2H4", &["221", "231"]),
    ("CH3OH", &["216"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Molecule {
    pub number: u8,
    pub name: &'static str,
    /// Isotopologue codes; isotope number `n` is `isotopes[n - 1]`.
    pub isotopes: &'static [&'static str],
}

impl Molecule {
    fn from_index(idx: usize) -> Option<Self> {
        let (name, isotopes) = *CATALOG.get(idx)?;
        Some(Self {
            number: u8::try_from(idx + 1).ok()?,
            name,
            isotopes,
        })
    }

    pub fn by_number(number: u8) -> Option<Self> {
        Self::from_index(usize::from(number).checked_sub(1)?)
    }

    /// Case-sensitive lookup (`NO` and `No` are not the same thing).
    pub fn by_name(name: &str) -> Option<Self> {
        let idx = CATALOG.iter().position(|(n, _)| *n == name)?;
        Self::from_index(idx)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..CATALOG.len()).filter_map(Self::from_index)
    }

    /// Isotopologue code for a 1-based isotope number.
    pub fn isotope_code(&self, isotope_num: u8) -> Option<&'static str> {
        self.isotopes
            .get(usize::from(isotope_num).checked_sub(1)?)
            .copied()
    }
}
