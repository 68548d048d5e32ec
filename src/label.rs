use serde::{Deserialize, Serialize};
use std::fmt;

/// The four ethnicity classes predicted from shipping names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ethnicity {
    Malay,
    Indian,
    Chinese,
    Others,
}

impl Ethnicity {
    pub const COUNT: usize = 4;

    pub const ALL: [Ethnicity; Ethnicity::COUNT] = [
        Ethnicity::Malay,
        Ethnicity::Indian,
        Ethnicity::Chinese,
        Ethnicity::Others,
    ];

    /// Stable class index used for model targets and probability columns.
    pub fn index(self) -> usize {
        match self {
            Ethnicity::Malay => 0,
            Ethnicity::Indian => 1,
            Ethnicity::Chinese => 2,
            Ethnicity::Others => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Ethnicity::Malay,
            1 => Ethnicity::Indian,
            2 => Ethnicity::Chinese,
            _ => Ethnicity::Others,
        }
    }

    /// Parses a raw label cell, case-insensitively.
    ///
    /// Empty cells, the literal `nan` a spreadsheet export leaves behind, and
    /// any unrecognized label all map to [`Ethnicity::Others`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "malay" => Ethnicity::Malay,
            "indian" => Ethnicity::Indian,
            "chinese" => Ethnicity::Chinese,
            _ => Ethnicity::Others,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ethnicity::Malay => "Malay",
            Ethnicity::Indian => "Indian",
            Ethnicity::Chinese => "Chinese",
            Ethnicity::Others => "Others",
        }
    }
}

impl fmt::Display for Ethnicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Ethnicity::parse("MALAY"), Ethnicity::Malay);
        assert_eq!(Ethnicity::parse(" chinese "), Ethnicity::Chinese);
        assert_eq!(Ethnicity::parse("Indian"), Ethnicity::Indian);
    }

    #[test]
    fn missing_or_unknown_labels_become_others() {
        assert_eq!(Ethnicity::parse(""), Ethnicity::Others);
        assert_eq!(Ethnicity::parse("nan"), Ethnicity::Others);
        assert_eq!(Ethnicity::parse("NaN"), Ethnicity::Others);
        assert_eq!(Ethnicity::parse("eurasian"), Ethnicity::Others);
    }

    #[test]
    fn index_round_trips() {
        for class in Ethnicity::ALL {
            assert_eq!(Ethnicity::from_index(class.index()), class);
        }
        assert_eq!(Ethnicity::from_index(99), Ethnicity::Others);
    }
}
