//! Scoring behaviour across whole profiles.

mod common;

use common::*;
use mentorship_core::domains::matching::utils::calculate_score;
use mentorship_core::domains::member::models::{Member, MemberRole, MenteePriority};
use sqlx::types::Json;

fn mentee_with(skills: &[&str], availability: &[&str], priority: Option<MenteePriority>) -> Member {
    let mut mentee = approved_mentee("Grace", skills);
    mentee.availability = tags(availability);
    mentee.priority = priority.map(Json);
    mentee
}

#[test]
fn test_expertise_example_scores_one_third() {
    let mut mentor = approved_mentor("Ada");
    mentor.expertise = tags(&["python", "ml"]);
    let mentee = approved_mentee("Grace", &["ml", "data"]);

    let result = calculate_score(&mentor, &mentee);
    assert_eq!(result.breakdown.expertise, 33);
}

#[test]
fn test_score_is_deterministic() {
    let mentor = approved_mentor("Ada");
    let mentee = mentee_with(&["python"], &["monday"], Some(MenteePriority::Label("high".into())));

    let first = calculate_score(&mentor, &mentee);
    for _ in 0..10 {
        assert_eq!(calculate_score(&mentor, &mentee), first);
    }
}

#[test]
fn test_score_stays_in_range() {
    let skill_sets: [&[&str]; 4] = [&[], &["python"], &["python", "ml", "data"], &["cooking"]];
    let day_sets: [&[&str]; 3] = [&[], &["monday"], &["friday", "saturday"]];
    let priorities = [
        None,
        Some(MenteePriority::Score(-40.0)),
        Some(MenteePriority::Score(250.0)),
        Some(MenteePriority::Label("urgent".into())),
        Some(MenteePriority::Label("whenever".into())),
    ];

    let mut bare_mentor = Member::builder().role(MemberRole::Mentor).build();
    bare_mentor.full_name = "Bare".into();
    let mentors = [approved_mentor("Ada"), bare_mentor];

    for mentor in &mentors {
        for skills in skill_sets {
            for days in day_sets {
                for priority in &priorities {
                    let mentee = mentee_with(skills, days, priority.clone());
                    let result = calculate_score(mentor, &mentee);

                    assert!((0..=100).contains(&result.score), "score {} out of range", result.score);
                    for part in [
                        result.breakdown.expertise,
                        result.breakdown.availability,
                        result.breakdown.interactions,
                        result.breakdown.priority,
                    ] {
                        assert!((0..=100).contains(&part), "sub-score {} out of range", part);
                    }
                }
            }
        }
    }
}

#[test]
fn test_better_overlap_ranks_higher() {
    let mentor = approved_mentor("Ada");
    let close = approved_mentee("Close", &["python", "ml", "data"]);
    let far = approved_mentee("Far", &["pottery"]);

    assert!(calculate_score(&mentor, &close).score > calculate_score(&mentor, &far).score);
}
