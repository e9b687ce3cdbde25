use serde::Serialize;

use crate::glicko::Rating;
use crate::matrix::Competitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Tier {
    pub const ALL: [Tier; 6] = [Tier::S, Tier::A, Tier::B, Tier::C, Tier::D, Tier::F];

    pub fn for_rating(rating: f64) -> Self {
        if rating >= 1800.0 {
            Tier::S
        } else if rating >= 1650.0 {
            Tier::A
        } else if rating >= 1500.0 {
            Tier::B
        } else if rating >= 1350.0 {
            Tier::C
        } else if rating >= 1200.0 {
            Tier::D
        } else {
            Tier::F
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
            Tier::F => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierEntry {
    pub competitor: Competitor,
    pub rating: Rating,
    /// Games behind the rating, shown next to it.
    pub matches: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierRow {
    pub tier: Tier,
    pub entries: Vec<TierEntry>,
}

/// All six tiers top to bottom, each sorted by descending rating. Empty tiers
/// are kept so lists for two players line up.
pub fn tier_list(ratings: &[Rating]) -> Vec<TierRow> {
    let mut rows: Vec<TierRow> = Tier::ALL
        .iter()
        .map(|&tier| TierRow {
            tier,
            entries: Vec::new(),
        })
        .collect();
    for (i, r) in ratings.iter().enumerate() {
        let tier = Tier::for_rating(r.rating);
        if let Some(row) = rows.iter_mut().find(|row| row.tier == tier) {
            row.entries.push(TierEntry {
                competitor: Competitor(i),
                rating: *r,
                matches: r.matches,
            });
        }
    }
    for row in &mut rows {
        row.entries
            .sort_by(|a, b| b.rating.rating.total_cmp(&a.rating.rating));
    }
    rows
}

/// The competitor in `others` whose rating is nearest `reference`; the first
/// one wins ties.
pub fn closest_rated(reference: f64, others: &[Rating]) -> Option<Competitor> {
    others
        .iter()
        .enumerate()
        .filter(|(_, r)| r.rating.is_finite())
        .fold(None::<(usize, f64)>, |best, (i, r)| {
            let delta = (r.rating - reference).abs();
            match best {
                Some((_, d)) if d <= delta => best,
                _ => Some((i, delta)),
            }
        })
        .map(|(i, _)| Competitor(i))
}
