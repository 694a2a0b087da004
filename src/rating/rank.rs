use serde::Serialize;

/// Upper bound of the rank table; ratings at or above it overflow the top tier.
pub const RANK_CEILING: f64 = 16000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iron => "Iron",
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Emerald => "Emerald",
            Self::Diamond => "Diamond",
            Self::Master => "Master",
            Self::Grandmaster => "Grandmaster",
            Self::Challenger => "Challenger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Division {
    IV,
    III,
    II,
    I,
}

impl Division {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IV => "IV",
            Self::III => "III",
            Self::II => "II",
            Self::I => "I",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rank {
    pub tier: Tier,
    pub division: Option<Division>,
    pub min_elo: f64,
    pub max_elo: f64,
    pub color: &'static str,
    pub icon: &'static str,
    pub overflow: bool,
}

impl Rank {
    const fn entry(
        tier: Tier,
        division: Option<Division>,
        min_elo: f64,
        max_elo: f64,
        color: &'static str,
        icon: &'static str,
    ) -> Self {
        Self {
            tier,
            division,
            min_elo,
            max_elo,
            color,
            icon,
            overflow: false,
        }
    }

    pub fn name(&self) -> String {
        let base = match self.division {
            Some(division) => format!("{} {}", self.tier.as_str(), division.as_str()),
            None => self.tier.as_str().to_string(),
        };
        if self.overflow {
            format!("{}+", base)
        } else {
            base
        }
    }

    pub fn contains(&self, rating: f64) -> bool {
        rating >= self.min_elo && rating < self.max_elo
    }
}

use Division::{I, II, III, IV};
use Tier::*;

pub static RANK_TABLE: [Rank; 31] = [
    Rank::entry(Iron, Some(IV), 0.0, 640.0, "#5e5e5e", "iron"),
    Rank::entry(Iron, Some(III), 640.0, 960.0, "#5e5e5e", "iron"),
    Rank::entry(Iron, Some(II), 960.0, 1280.0, "#5e5e5e", "iron"),
    Rank::entry(Iron, Some(I), 1280.0, 1600.0, "#5e5e5e", "iron"),
    Rank::entry(Bronze, Some(IV), 1600.0, 1920.0, "#a0522d", "bronze"),
    Rank::entry(Bronze, Some(III), 1920.0, 2240.0, "#a0522d", "bronze"),
    Rank::entry(Bronze, Some(II), 2240.0, 2560.0, "#a0522d", "bronze"),
    Rank::entry(Bronze, Some(I), 2560.0, 2880.0, "#a0522d", "bronze"),
    Rank::entry(Silver, Some(IV), 2880.0, 3200.0, "#a8b2bc", "silver"),
    Rank::entry(Silver, Some(III), 3200.0, 3520.0, "#a8b2bc", "silver"),
    Rank::entry(Silver, Some(II), 3520.0, 3840.0, "#a8b2bc", "silver"),
    Rank::entry(Silver, Some(I), 3840.0, 4160.0, "#a8b2bc", "silver"),
    Rank::entry(Gold, Some(IV), 4160.0, 4480.0, "#d4af37", "gold"),
    Rank::entry(Gold, Some(III), 4480.0, 4800.0, "#d4af37", "gold"),
    Rank::entry(Gold, Some(II), 4800.0, 5120.0, "#d4af37", "gold"),
    Rank::entry(Gold, Some(I), 5120.0, 5440.0, "#d4af37", "gold"),
    Rank::entry(Platinum, Some(IV), 5440.0, 5760.0, "#3fb5a3", "platinum"),
    Rank::entry(Platinum, Some(III), 5760.0, 6080.0, "#3fb5a3", "platinum"),
    Rank::entry(Platinum, Some(II), 6080.0, 6400.0, "#3fb5a3", "platinum"),
    Rank::entry(Platinum, Some(I), 6400.0, 6720.0, "#3fb5a3", "platinum"),
    Rank::entry(Emerald, Some(IV), 6720.0, 7040.0, "#2ecc71", "emerald"),
    Rank::entry(Emerald, Some(III), 7040.0, 7360.0, "#2ecc71", "emerald"),
    Rank::entry(Emerald, Some(II), 7360.0, 7680.0, "#2ecc71", "emerald"),
    Rank::entry(Emerald, Some(I), 7680.0, 8000.0, "#2ecc71", "emerald"),
    Rank::entry(Diamond, Some(IV), 8000.0, 8320.0, "#6fa8dc", "diamond"),
    Rank::entry(Diamond, Some(III), 8320.0, 8640.0, "#6fa8dc", "diamond"),
    Rank::entry(Diamond, Some(II), 8640.0, 8960.0, "#6fa8dc", "diamond"),
    Rank::entry(Diamond, Some(I), 8960.0, 9280.0, "#6fa8dc", "diamond"),
    Rank::entry(Master, None, 9280.0, 11200.0, "#9b59b6", "master"),
    Rank::entry(Grandmaster, None, 11200.0, 13600.0, "#e74c3c", "grandmaster"),
    Rank::entry(Challenger, None, 13600.0, RANK_CEILING, "#f1c40f", "challenger"),
];

const OVERFLOW_ICON: &str = "challenger-crown";

pub fn rank_index(rating: f64) -> usize {
    if rating.is_nan() || rating < RANK_TABLE[0].min_elo {
        return 0;
    }
    RANK_TABLE
        .iter()
        .position(|rank| rank.contains(rating))
        .unwrap_or(RANK_TABLE.len() - 1)
}

pub fn rank_for_rating(rating: f64) -> Rank {
    let index = rank_index(rating);
    let mut rank = RANK_TABLE[index];
    if rating >= RANK_CEILING {
        rank.overflow = true;
        rank.icon = OVERFLOW_ICON;
    }
    rank
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankDisplay {
    pub current_rank: Rank,
    pub lp_gain: i64,
    pub current_lp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_rank: Option<Rank>,
    pub progress_to_next: f64,
}

impl RankDisplay {
    pub fn lp_gain_label(&self) -> String {
        if self.lp_gain >= 0 {
            format!("+{} LP", self.lp_gain)
        } else {
            format!("-{} LP", self.lp_gain.unsigned_abs())
        }
    }
}

pub fn rank_display(rating: f64, rating_change: f64) -> RankDisplay {
    let index = rank_index(rating);
    let current_rank = rank_for_rating(rating);
    let current_lp = interpolate(rating, current_rank.min_elo, current_rank.max_elo);

    let next_rank = if current_rank.overflow {
        None
    } else {
        RANK_TABLE.get(index + 1).copied()
    };
    let progress_to_next = match next_rank {
        Some(next) => interpolate(rating, current_rank.min_elo, next.min_elo),
        None => 100.0,
    };

    RankDisplay {
        current_rank,
        lp_gain: rating_change.round() as i64,
        current_lp,
        next_rank,
        progress_to_next,
    }
}

fn interpolate(rating: f64, low: f64, high: f64) -> f64 {
    let span = high - low;
    if span <= 0.0 || rating.is_nan() {
        return 0.0;
    }
    ((rating - low) / span * 100.0).clamp(0.0, 100.0)
}
