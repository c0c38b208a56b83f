//! Supplier matching
//!
//! Scores suppliers against an RFQ with a fixed-point weighted sum and
//! returns the best N. Weights total 100:
//!
//! | factor       | points                                   |
//! |--------------|------------------------------------------|
//! | category     | 40 when a supplier category equals the RFQ's |
//! | location     | 25 when the supplier is in the delivery city |
//! | rating       | `round(rating × 4)`, 0..=20               |
//! | experience   | 10 at five years or more, else 2 per year |
//! | verification | 5 when verified                           |

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::users::{normalize_category, SupplierSummary};

pub const CATEGORY_POINTS: u32 = 40;
pub const LOCATION_POINTS: u32 = 25;
pub const RATING_MAX_POINTS: u32 = 20;
pub const EXPERIENCE_POINTS: u32 = 10;
pub const VERIFIED_POINTS: u32 = 5;

/// Years in business that earn the full experience allocation
pub const EXPERIENCE_FULL_YEARS: i32 = 5;

/// Hard cap on how many matches a caller may request
pub const MAX_MATCH_LIMIT: usize = 50;

/// What an RFQ asks for, as far as matching is concerned
#[derive(Debug, Clone)]
pub struct MatchCriteria {
    pub category: String,
    pub location: Option<String>,
}

impl MatchCriteria {
    pub fn new(category: &str, location: Option<&str>) -> Self {
        Self {
            category: normalize_category(category),
            location: location.map(normalize_category).filter(|l| !l.is_empty()),
        }
    }
}

/// Per-factor points for one supplier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub category: u32,
    pub location: u32,
    pub rating: u32,
    pub experience: u32,
    pub verification: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.category + self.location + self.rating + self.experience + self.verification
    }
}

/// A scored supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierMatch {
    pub supplier: SupplierSummary,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub reasons: Vec<String>,
}

fn rating_points(rating: f64) -> u32 {
    if !rating.is_finite() {
        return 0;
    }
    ((rating.clamp(0.0, 5.0) * 4.0).round() as u32).min(RATING_MAX_POINTS)
}

fn experience_points(years: i32) -> u32 {
    if years >= EXPERIENCE_FULL_YEARS {
        EXPERIENCE_POINTS
    } else {
        (years.max(0) as u32) * 2
    }
}

/// Score one supplier against the criteria.
pub fn score(criteria: &MatchCriteria, supplier: &SupplierSummary) -> ScoreBreakdown {
    let category = if !criteria.category.is_empty()
        && supplier
            .categories
            .iter()
            .any(|c| normalize_category(c) == criteria.category)
    {
        CATEGORY_POINTS
    } else {
        0
    };

    let location = match (&criteria.location, &supplier.location) {
        (Some(wanted), Some(have)) if normalize_category(have) == *wanted => LOCATION_POINTS,
        _ => 0,
    };

    ScoreBreakdown {
        category,
        location,
        rating: rating_points(supplier.rating),
        experience: experience_points(supplier.years_in_business),
        verification: if supplier.verified { VERIFIED_POINTS } else { 0 },
    }
}

fn reasons(criteria: &MatchCriteria, supplier: &SupplierSummary, b: &ScoreBreakdown) -> Vec<String> {
    let mut out = Vec::new();
    if b.category > 0 {
        out.push(format!("Supplies {}", criteria.category));
    }
    if b.location > 0 {
        if let Some(location) = &supplier.location {
            out.push(format!("Located in {}", location));
        }
    }
    if supplier.rating > 0.0 {
        out.push(format!("Rated {:.1}/5", supplier.rating));
    }
    if supplier.years_in_business > 0 {
        out.push(format!("{} years in business", supplier.years_in_business));
    }
    if b.verification > 0 {
        out.push("Verified supplier".to_string());
    }
    out
}

/// Score every candidate, sort by score descending and keep the top `limit`.
///
/// Equal scores fall back to rating (descending) and then supplier id so the
/// order is stable across calls.
pub fn rank_suppliers(
    criteria: &MatchCriteria,
    candidates: Vec<SupplierSummary>,
    limit: usize,
) -> Vec<SupplierMatch> {
    let limit = limit.clamp(1, MAX_MATCH_LIMIT);

    let mut matches: Vec<SupplierMatch> = candidates
        .into_iter()
        .map(|supplier| {
            let breakdown = score(criteria, &supplier);
            SupplierMatch {
                score: breakdown.total(),
                reasons: reasons(criteria, &supplier, &breakdown),
                breakdown,
                supplier,
            }
        })
        .collect();

    matches.sort_by(|a, b| match_order(a.score, &a.supplier, b.score, &b.supplier));
    matches.truncate(limit);
    matches
}

/// Ranking order: score descending, then rating descending, then id.
pub fn match_order(
    a_score: u32,
    a: &SupplierSummary,
    b_score: u32,
    b: &SupplierSummary,
) -> Ordering {
    b_score
        .cmp(&a_score)
        .then_with(|| b.rating.total_cmp(&a.rating))
        .then_with(|| a.id.cmp(&b.id))
}

/// SQL expression computing the same total as [`score`] over a `users` row.
///
/// Parameter `category_param` binds the normalized RFQ category and
/// `location_param` the normalized delivery location (NULL when absent).
/// Candidate fetches order by this, so a capped pool holds the best scores.
pub fn score_sql(category_param: u8, location_param: u8) -> String {
    const NORMALIZE: &str = "LOWER(REGEXP_REPLACE(BTRIM({}), '\\s+', ' ', 'g'))";
    let normalized = |column: &str| NORMALIZE.replace("{}", column);

    format!(
        "(CASE WHEN ${cat} <> '' AND EXISTS (\
            SELECT 1 FROM UNNEST(categories) AS c WHERE {c} = ${cat}) \
            THEN {category} ELSE 0 END \
         + CASE WHEN ${loc}::text IS NOT NULL AND {l} = ${loc} THEN {location} ELSE 0 END \
         + LEAST(ROUND(LEAST(GREATEST(rating, 0), 5)::numeric * 4), {rating}) \
         + CASE WHEN years_in_business >= {full_years} THEN {experience} \
                ELSE GREATEST(years_in_business, 0) * 2 END \
         + CASE WHEN verified THEN {verified} ELSE 0 END)",
        cat = category_param,
        loc = location_param,
        c = normalized("c"),
        l = normalized("location"),
        category = CATEGORY_POINTS,
        location = LOCATION_POINTS,
        rating = RATING_MAX_POINTS,
        full_years = EXPERIENCE_FULL_YEARS,
        experience = EXPERIENCE_POINTS,
        verified = VERIFIED_POINTS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn supplier(
        categories: &[&str],
        location: Option<&str>,
        rating: f64,
        years: i32,
        verified: bool,
    ) -> SupplierSummary {
        SupplierSummary {
            id: Uuid::new_v4(),
            name: "Supplier".into(),
            company_name: None,
            location: location.map(str::to_string),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            years_in_business: years,
            rating,
            verified,
        }
    }

    fn criteria() -> MatchCriteria {
        MatchCriteria::new("Steel", Some("Pune"))
    }

    #[test]
    fn perfect_supplier_scores_one_hundred() {
        let s = supplier(&["steel"], Some("pune"), 5.0, 20, true);
        let b = score(&criteria(), &s);
        assert_eq!(
            b,
            ScoreBreakdown {
                category: 40,
                location: 25,
                rating: 20,
                experience: 10,
                verification: 5,
            }
        );
        assert_eq!(b.total(), 100);
    }

    #[test]
    fn matching_is_case_and_space_insensitive() {
        let s = supplier(&["  STEEL "], Some(" PUNE"), 0.0, 0, false);
        let b = score(&criteria(), &s);
        assert_eq!(b.category, CATEGORY_POINTS);
        assert_eq!(b.location, LOCATION_POINTS);
    }

    #[test]
    fn missing_location_scores_zero_for_location() {
        let s = supplier(&["steel"], None, 0.0, 0, false);
        assert_eq!(score(&criteria(), &s).location, 0);

        let no_location = MatchCriteria::new("steel", None);
        let s = supplier(&["steel"], Some("pune"), 0.0, 0, false);
        assert_eq!(score(&no_location, &s).location, 0);
    }

    #[test]
    fn rating_and_experience_allocations() {
        assert_eq!(rating_points(4.4), 18);
        assert_eq!(rating_points(4.5), 18);
        assert_eq!(rating_points(4.6), 18);
        assert_eq!(rating_points(4.63), 19);
        assert_eq!(rating_points(9.0), 20);
        assert_eq!(rating_points(-1.0), 0);
        assert_eq!(rating_points(f64::NAN), 0);

        assert_eq!(experience_points(0), 0);
        assert_eq!(experience_points(3), 6);
        assert_eq!(experience_points(5), 10);
        assert_eq!(experience_points(-4), 0);
    }

    #[test]
    fn results_sorted_by_descending_score() {
        let candidates = vec![
            supplier(&["textiles"], Some("surat"), 3.0, 2, false),
            supplier(&["steel"], Some("pune"), 4.0, 8, true),
            supplier(&["steel"], Some("mumbai"), 4.8, 10, true),
            supplier(&["cement"], Some("pune"), 2.0, 1, false),
        ];

        let ranked = rank_suppliers(&criteria(), candidates, 10);
        assert_eq!(ranked.len(), 4);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(ranked[0].score, 40 + 25 + 16 + 10 + 5);
        assert_eq!(ranked[0].supplier.location.as_deref(), Some("pune"));
    }

    #[test]
    fn limit_truncates_after_sorting() {
        let candidates: Vec<_> = (0..10)
            .map(|i| supplier(&["steel"], None, f64::from(i) / 2.0, 0, false))
            .collect();

        let ranked = rank_suppliers(&criteria(), candidates, 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].supplier.rating, 4.5);
        assert_eq!(ranked[2].supplier.rating, 3.5);
    }

    #[test]
    fn ties_are_broken_deterministically() {
        let mut a = supplier(&["steel"], None, 4.5, 5, false);
        let mut b = supplier(&["steel"], None, 4.4, 5, false);
        // Same points (18 for both ratings), higher raw rating wins.
        a.id = Uuid::from_u128(2);
        b.id = Uuid::from_u128(1);
        let ranked = rank_suppliers(&criteria(), vec![b.clone(), a.clone()], 10);
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[0].supplier.id, a.id);

        // Identical rating: lower id first.
        let mut c = a.clone();
        c.id = Uuid::from_u128(0);
        let ranked = rank_suppliers(&criteria(), vec![a.clone(), c.clone()], 10);
        assert_eq!(ranked[0].supplier.id, c.id);
    }

    #[test]
    fn best_match_survives_a_small_candidate_pool() {
        let criteria = criteria();
        let mut candidates: Vec<_> = (1..=3)
            .map(|i| {
                let mut s = supplier(&["textiles"], Some("surat"), 5.0, 0, false);
                s.id = Uuid::from_u128(i);
                s
            })
            .collect();
        let mut steel = supplier(&["steel"], Some("Pune"), 0.0, 10, true);
        steel.id = Uuid::from_u128(4);
        candidates.push(steel);

        // Pool capped at 3, ordered the way the candidate query orders rows
        let mut pool = candidates;
        pool.sort_by(|a, b| {
            match_order(score(&criteria, a).total(), a, score(&criteria, b).total(), b)
        });
        pool.truncate(3);

        let ranked = rank_suppliers(&criteria, pool, 1);
        assert_eq!(ranked[0].supplier.id, Uuid::from_u128(4));
        assert_eq!(ranked[0].score, 40 + 25 + 10 + 5);
    }

    #[test]
    fn score_sql_uses_every_weight() {
        let sql = score_sql(2, 3);
        assert!(sql.contains("$2 <> ''"));
        assert!(sql.contains("$3::text IS NOT NULL"));
        for fragment in [
            format!("THEN {} ELSE 0", CATEGORY_POINTS),
            format!("THEN {} ELSE 0", LOCATION_POINTS),
            format!("* 4), {})", RATING_MAX_POINTS),
            format!(">= {} THEN {}", EXPERIENCE_FULL_YEARS, EXPERIENCE_POINTS),
            format!("verified THEN {} ELSE 0", VERIFIED_POINTS),
        ] {
            assert!(sql.contains(&fragment), "missing `{}` in {}", fragment, sql);
        }
        assert!(!sql.contains("{}"));
    }

    #[test]
    fn empty_candidates_yield_no_matches() {
        assert!(rank_suppliers(&criteria(), Vec::new(), 10).is_empty());
    }

    #[test]
    fn reasons_explain_points() {
        let s = supplier(&["steel"], Some("Pune"), 4.2, 7, true);
        let ranked = rank_suppliers(&criteria(), vec![s], 1);
        let reasons = &ranked[0].reasons;
        assert!(reasons.contains(&"Supplies steel".to_string()));
        assert!(reasons.contains(&"Located in Pune".to_string()));
        assert!(reasons.contains(&"Verified supplier".to_string()));
    }
}
