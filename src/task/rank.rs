//! Rank thresholds over cumulative points.

/// Ascending (name, minimum points) thresholds. Rank is the highest entry
/// the point total meets or exceeds; the first entry starts at zero so
/// every total maps to a rank.
pub const RANKS: &[(&str, u64)] = &[
    ("Novice", 0),
    ("Apprentice", 150),
    ("Adept", 400),
    ("Skilled", 800),
    ("Expert", 1500),
    ("Master", 3000),
];

pub fn rank_for(points: u64) -> &'static str {
    let mut current = RANKS[0].0;
    for &(name, min_points) in RANKS {
        if points >= min_points {
            current = name;
        } else {
            break;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_points_is_the_first_rank() {
        assert_eq!(rank_for(0), "Novice");
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(rank_for(149), "Novice");
        assert_eq!(rank_for(150), "Apprentice");
        assert_eq!(rank_for(399), "Apprentice");
        assert_eq!(rank_for(400), "Adept");
        assert_eq!(rank_for(3000), "Master");
        assert_eq!(rank_for(u64::MAX), "Master");
    }

    #[test]
    fn table_is_strictly_ascending() {
        for pair in RANKS.windows(2) {
            assert!(pair[0].1 < pair[1].1, "rank table must ascend");
        }
    }
}
