//! Additive password strength heuristic.
//!
//! Five independent checks contribute one point each; nothing is weighted,
//! so a 20-character password scores the same on length as an 8-character
//! one. The score is always recomputed from the whole value.

/// Minimum length, in UTF-16 code units, for the length check to pass.
pub const MIN_LENGTH: usize = 8;

/// Highest attainable score.
pub const MAX_SCORE: u8 = 5;

/// Percentage of the meter filled per point.
pub const PERCENT_PER_POINT: u8 = 20;

/// Outcome of each individual check for one password value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrengthChecks {
    pub long_enough: bool,
    pub has_lowercase: bool,
    pub has_uppercase: bool,
    pub has_digit: bool,
    pub has_symbol: bool,
}

impl StrengthChecks {
    pub fn evaluate(password: &str) -> Self {
        Self {
            // Browsers report input length in UTF-16 code units.
            long_enough: password.encode_utf16().count() >= MIN_LENGTH,
            has_lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            has_digit: password.chars().any(|c| c.is_ascii_digit()),
            has_symbol: password.chars().any(|c| !c.is_ascii_alphanumeric()),
        }
    }

    pub fn passed(&self) -> u8 {
        [
            self.long_enough,
            self.has_lowercase,
            self.has_uppercase,
            self.has_digit,
            self.has_symbol,
        ]
        .into_iter()
        .map(u8::from)
        .sum()
    }
}

/// Score in `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Strength(u8);

impl Strength {
    pub fn of(password: &str) -> Self {
        Self::from(StrengthChecks::evaluate(password))
    }

    pub fn score(self) -> u8 {
        self.0
    }

    /// Meter fill, `score * 20`.
    pub fn fill_percent(self) -> u8 {
        self.0 * PERCENT_PER_POINT
    }

    pub fn tier(self) -> StrengthTier {
        StrengthTier::from_score(self.0)
    }
}

impl From<StrengthChecks> for Strength {
    fn from(checks: StrengthChecks) -> Self {
        Self(checks.passed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrengthTier {
    Weak,
    Medium,
    Strong,
}

impl StrengthTier {
    /// `0..=2` weak, `3` medium, `4..` strong. Every score has a tier.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=2 => Self::Weak,
            3 => Self::Medium,
            _ => Self::Strong,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_follow_the_documented_ladder() {
        assert_eq!(Strength::of("").score(), 0);
        assert_eq!(Strength::of("abcdefgh").score(), 2);
        assert_eq!(Strength::of("Abcdefgh").score(), 3);
        assert_eq!(Strength::of("Abcdefg1").score(), 4);
        assert_eq!(Strength::of("Abcdefg1!").score(), 5);
    }

    #[test]
    fn length_counts_once_no_matter_how_long() {
        let short = Strength::of("abcdefgh");
        let long = Strength::of("abcdefghijklmnopqrst");
        assert_eq!(short, long);
    }

    #[test]
    fn non_ascii_letters_count_as_symbols_not_letters() {
        let checks = StrengthChecks::evaluate("é");
        assert!(checks.has_symbol);
        assert!(!checks.has_lowercase);
        assert_eq!(Strength::of("é").score(), 1);
    }

    #[test]
    fn length_uses_utf16_units() {
        // Four astral characters are eight UTF-16 code units.
        let checks = StrengthChecks::evaluate("😀😀😀😀");
        assert!(checks.long_enough);
        assert!(!StrengthChecks::evaluate("ééééééé").long_enough);
    }

    #[test]
    fn whitespace_is_a_symbol() {
        assert!(StrengthChecks::evaluate(" ").has_symbol);
    }

    #[test]
    fn fill_percent_is_twenty_per_point() {
        assert_eq!(Strength::of("").fill_percent(), 0);
        assert_eq!(Strength::of("abc").fill_percent(), 20);
        assert_eq!(Strength::of("Password1!").fill_percent(), 100);
    }

    #[test]
    fn tiers_have_inclusive_low_boundaries() {
        let tiers = (0..=MAX_SCORE)
            .map(StrengthTier::from_score)
            .collect::<Vec<_>>();
        assert_eq!(
            tiers,
            vec![
                StrengthTier::Weak,
                StrengthTier::Weak,
                StrengthTier::Weak,
                StrengthTier::Medium,
                StrengthTier::Strong,
                StrengthTier::Strong,
            ]
        );
    }
}
