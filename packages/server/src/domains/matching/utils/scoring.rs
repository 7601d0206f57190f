//! Compatibility scoring for a (mentor, mentee) pair.
//!
//! Pure functions only: no I/O, no clock, no randomness.
//!
//! All arithmetic is integer so rounding is exact (half rounds up).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domains::member::models::{Member, MenteePriority};

/// Weights in percent; they always sum to 100.
pub const EXPERTISE_WEIGHT: i64 = 50;
pub const AVAILABILITY_WEIGHT: i64 = 25;
pub const INTERACTIONS_WEIGHT: i64 = 15;
pub const PRIORITY_WEIGHT: i64 = 10;

const NEUTRAL_EXPERTISE: i32 = 50;
const MISSING_EXPERTISE: i32 = 25;
const NEUTRAL_AVAILABILITY: i32 = 60;
const NEUTRAL_PRIORITY: i32 = 50;

const AFFINITY_BASE: i32 = 30;
const SAME_PROGRAM_BONUS: i32 = 40;
const SAME_DEPARTMENT_BONUS: i32 = 20;
const SHARED_INTEREST_MAX_BONUS: i64 = 30;

/// Per-dimension sub-scores, each 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub expertise: i32,
    pub availability: i32,
    pub interactions: i32,
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: i32,
    pub breakdown: ScoreBreakdown,
}

/// Score how well `mentee` fits `mentor`.
pub fn calculate_score(mentor: &Member, mentee: &Member) -> ScoreResult {
    let breakdown = ScoreBreakdown {
        expertise: expertise_score(mentor, mentee),
        availability: availability_score(mentor, mentee),
        interactions: interaction_score(mentor, mentee),
        priority: priority_score(mentee.priority()),
    };

    ScoreResult {
        score: weighted_total(&breakdown),
        breakdown,
    }
}

fn weighted_total(breakdown: &ScoreBreakdown) -> i32 {
    let weighted = i64::from(breakdown.expertise) * EXPERTISE_WEIGHT
        + i64::from(breakdown.availability) * AVAILABILITY_WEIGHT
        + i64::from(breakdown.interactions) * INTERACTIONS_WEIGHT
        + i64::from(breakdown.priority) * PRIORITY_WEIGHT;

    (round_div(weighted, 100) as i32).clamp(0, 100)
}

/// Mentor expertise against everything the mentee listed (skills + interests).
/// Missing data on one side scores 25.
pub fn expertise_score(mentor: &Member, mentee: &Member) -> i32 {
    let offered = normalize_tags(&mentor.expertise);
    let wanted = normalize_tags(mentee.skills.iter().chain(mentee.interests.iter()));

    match (offered.is_empty(), wanted.is_empty()) {
        (true, true) => NEUTRAL_EXPERTISE,
        (true, false) | (false, true) => MISSING_EXPERTISE,
        (false, false) => scaled_overlap(&offered, &wanted, 100) as i32,
    }
}

pub fn availability_score(mentor: &Member, mentee: &Member) -> i32 {
    let mentor_days = normalize_tags(&mentor.availability);
    let mentee_days = normalize_tags(&mentee.availability);

    if mentor_days.is_empty() && mentee_days.is_empty() {
        return NEUTRAL_AVAILABILITY;
    }

    scaled_overlap(&mentor_days, &mentee_days, 100) as i32
}

/// Affinity: shared program, shared department, shared interests.
pub fn interaction_score(mentor: &Member, mentee: &Member) -> i32 {
    let mut score = AFFINITY_BASE;

    if same_label(mentor.program.as_deref(), mentee.program.as_deref()) {
        score += SAME_PROGRAM_BONUS;
    }
    if same_label(mentor.department.as_deref(), mentee.department.as_deref()) {
        score += SAME_DEPARTMENT_BONUS;
    }

    let mentor_interests = normalize_tags(&mentor.interests);
    let mentee_interests = normalize_tags(&mentee.interests);
    score += scaled_overlap(&mentor_interests, &mentee_interests, SHARED_INTEREST_MAX_BONUS) as i32;

    score.min(100)
}

pub fn priority_score(priority: Option<&MenteePriority>) -> i32 {
    match priority {
        None => NEUTRAL_PRIORITY,
        Some(MenteePriority::Score(value)) => clamp_numeric(*value),
        Some(MenteePriority::Label(label)) => {
            let label = label.trim();
            if let Ok(value) = label.parse::<f64>() {
                return clamp_numeric(value);
            }
            match label.to_lowercase().as_str() {
                "high" | "urgent" => 90,
                "medium" => 60,
                "low" => 35,
                _ => NEUTRAL_PRIORITY,
            }
        }
    }
}

fn clamp_numeric(value: f64) -> i32 {
    if value.is_nan() {
        return NEUTRAL_PRIORITY;
    }
    value.round().clamp(0.0, 100.0) as i32
}

// =============================================================================
// Tag helpers
// =============================================================================

/// Trimmed, lowercased, de-duplicated tags. Blank entries are dropped.
pub fn normalize_tags<'a, I>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    tags.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// `scale * |a ∩ b| / |a ∪ b|`, rounded. Zero when both sets are empty.
fn scaled_overlap(a: &BTreeSet<String>, b: &BTreeSet<String>, scale: i64) -> i64 {
    let union = a.union(b).count() as i64;
    if union == 0 {
        return 0;
    }
    let shared = a.intersection(b).count() as i64;
    round_div(scale * shared, union)
}

fn same_label(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(str::trim), b.map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Round-half-up division for non-negative operands.
fn round_div(numerator: i64, denominator: i64) -> i64 {
    (2 * numerator + denominator) / (2 * denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::member::models::MemberRole;
    use sqlx::types::Json;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn mentor() -> Member {
        Member::builder().role(MemberRole::Mentor).build()
    }

    fn mentee() -> Member {
        Member::builder().role(MemberRole::Mentee).build()
    }

    #[test]
    fn expertise_is_intersection_over_union() {
        let mut m = mentor();
        m.expertise = tags(&["python", "ml"]);
        let mut e = mentee();
        e.skills = tags(&["ml", "data"]);

        assert_eq!(expertise_score(&m, &e), 33);
    }

    #[test]
    fn expertise_ignores_case_whitespace_and_duplicates() {
        let mut m = mentor();
        m.expertise = tags(&["Rust", " rust ", "GO"]);
        let mut e = mentee();
        e.skills = tags(&["rust"]);
        e.interests = tags(&["go"]);

        assert_eq!(expertise_score(&m, &e), 100);
    }

    #[test]
    fn expertise_missing_data_scores() {
        let mut with_tags = mentor();
        with_tags.expertise = tags(&["design"]);

        assert_eq!(expertise_score(&mentor(), &mentee()), 50);
        assert_eq!(expertise_score(&with_tags, &mentee()), 25);

        let mut e = mentee();
        e.skills = tags(&["design"]);
        assert_eq!(expertise_score(&mentor(), &e), 25);
    }

    #[test]
    fn blank_tags_count_as_missing() {
        let mut m = mentor();
        m.expertise = tags(&["", "   "]);
        assert_eq!(expertise_score(&m, &mentee()), 50);
    }

    #[test]
    fn availability_overlap_and_neutral_default() {
        assert_eq!(availability_score(&mentor(), &mentee()), 60);

        let mut m = mentor();
        m.availability = tags(&["monday", "wednesday"]);
        let mut e = mentee();
        e.availability = tags(&["Wednesday"]);
        assert_eq!(availability_score(&m, &e), 50);

        assert_eq!(availability_score(&m, &mentee()), 0);
    }

    #[test]
    fn interaction_bonuses_stack_and_cap() {
        assert_eq!(interaction_score(&mentor(), &mentee()), 30);

        let mut m = mentor();
        m.program = Some("Data Science".to_string());
        m.department = Some("CS".to_string());
        m.interests = tags(&["chess"]);
        let mut e = mentee();
        e.program = Some("data science".to_string());
        assert_eq!(interaction_score(&m, &e), 70);

        e.department = Some("cs".to_string());
        assert_eq!(interaction_score(&m, &e), 90);

        e.interests = tags(&["chess"]);
        assert_eq!(interaction_score(&m, &e), 100);
    }

    #[test]
    fn blank_program_never_matches() {
        let mut m = mentor();
        m.program = Some("  ".to_string());
        let mut e = mentee();
        e.program = Some("".to_string());
        assert_eq!(interaction_score(&m, &e), 30);
    }

    #[test]
    fn shared_interest_bonus_is_scaled() {
        let mut m = mentor();
        m.interests = tags(&["chess", "go"]);
        let mut e = mentee();
        e.interests = tags(&["chess"]);
        assert_eq!(interaction_score(&m, &e), 45);
    }

    #[test]
    fn priority_mapping() {
        assert_eq!(priority_score(None), 50);
        assert_eq!(priority_score(Some(&MenteePriority::Score(140.0))), 100);
        assert_eq!(priority_score(Some(&MenteePriority::Score(-3.0))), 0);
        assert_eq!(priority_score(Some(&MenteePriority::Score(72.4))), 72);
        assert_eq!(priority_score(Some(&MenteePriority::Score(f64::NAN))), 50);
        assert_eq!(priority_score(Some(&MenteePriority::Label("URGENT".into()))), 90);
        assert_eq!(priority_score(Some(&MenteePriority::Label("high".into()))), 90);
        assert_eq!(priority_score(Some(&MenteePriority::Label("medium".into()))), 60);
        assert_eq!(priority_score(Some(&MenteePriority::Label("low".into()))), 35);
        assert_eq!(priority_score(Some(&MenteePriority::Label("whenever".into()))), 50);
        assert_eq!(priority_score(Some(&MenteePriority::Label(" 80 ".into()))), 80);
    }

    #[test]
    fn final_score_uses_fixed_weights() {
        let mut m = mentor();
        m.expertise = tags(&["python", "ml"]);
        let mut e = mentee();
        e.skills = tags(&["ml", "data"]);

        // 33*.5 + 60*.25 + 30*.15 + 50*.1 = 41
        let result = calculate_score(&m, &e);
        assert_eq!(
            result.breakdown,
            ScoreBreakdown {
                expertise: 33,
                availability: 60,
                interactions: 30,
                priority: 50,
            }
        );
        assert_eq!(result.score, 41);
    }

    #[test]
    fn perfect_pair_scores_100() {
        let mut m = mentor();
        m.expertise = tags(&["rust"]);
        m.availability = tags(&["mon"]);
        m.program = Some("eng".into());
        m.department = Some("cs".into());
        m.interests = tags(&["rust"]);

        let mut e = mentee();
        e.skills = tags(&["rust"]);
        e.interests = tags(&["rust"]);
        e.availability = tags(&["mon"]);
        e.program = Some("eng".into());
        e.department = Some("cs".into());
        e.priority = Some(Json(MenteePriority::Score(100.0)));

        assert_eq!(calculate_score(&m, &e).score, 100);
    }

    #[test]
    fn weights_sum_to_one_hundred() {
        assert_eq!(
            EXPERTISE_WEIGHT + AVAILABILITY_WEIGHT + INTERACTIONS_WEIGHT + PRIORITY_WEIGHT,
            100
        );
    }
}
