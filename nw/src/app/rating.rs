//! Star ratings and the presentation derived from them

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest selectable score
pub const MIN_RATING: u8 = 1;

/// Highest selectable score
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Rating must be between 1 and 5, got {0}")]
pub struct RatingError(pub u8);

/// A star score, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingError(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Every rating, lowest first
    pub fn all() -> impl Iterator<Item = Rating> {
        (MIN_RATING..=MAX_RATING).map(Rating)
    }

    /// Emoji shown next to the stars for this score
    pub fn emoji(self) -> Emoji {
        match self.0 {
            1 => Emoji::new("😣", "Not Satisfied"),
            2 => Emoji::new("😕", "Slightly Satisfied"),
            3 => Emoji::new("😐", "Neutral"),
            4 => Emoji::new("😊", "Satisfied"),
            _ => Emoji::new("🤩", "Very Satisfied"),
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emoji {
    pub symbol: &'static str,
    pub label: &'static str,
}

impl Emoji {
    const fn new(symbol: &'static str, label: &'static str) -> Self {
        Self { symbol, label }
    }
}

/// Page-wide mood derived from the selected score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Low,
    Neutral,
    Happy,
    Wow,
}

impl Mood {
    /// Body classes for every mood; applying one removes the others
    pub const ALL_CLASSES: [&'static str; 4] = ["mood-low", "mood-neutral", "mood-happy", "mood-wow"];

    pub fn for_rating(rating: Option<Rating>) -> Option<Mood> {
        Some(match rating?.value() {
            1 | 2 => Mood::Low,
            3 => Mood::Neutral,
            4 => Mood::Happy,
            _ => Mood::Wow,
        })
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Mood::Low => "mood-low",
            Mood::Neutral => "mood-neutral",
            Mood::Happy => "mood-happy",
            Mood::Wow => "mood-wow",
        }
    }
}

/// Score under the pointer on a rating bar `width` wide
///
/// `relative_x` is measured from the bar's left edge and clamped to the bar.
pub fn hover_rating(relative_x: f64, width: f64) -> Option<Rating> {
    if width.is_nan() || width <= 0.0 || !relative_x.is_finite() {
        return None;
    }
    let fraction = (relative_x / width).clamp(0.0, 1.0);
    let stars = (fraction * f64::from(MAX_RATING)).ceil() as u8;
    Some(Rating(stars.clamp(MIN_RATING, MAX_RATING)))
}
