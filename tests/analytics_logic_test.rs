use pretty_assertions::assert_eq;
use uuid::Uuid;

use mentortrack::models::CountyParticipantRow;
use mentortrack::services::assessment_service::{
    distribute, normalize_weights, rebalance_with_pinned, weighted_overall, PASS_MARK,
};
use mentortrack::services::kenya_heatmap_service::build_heatmap;
use mentortrack::services::training_insights_service::{build_recommendations, ratio};

fn county(code: i32, name: &str, participants: i64) -> CountyParticipantRow {
    CountyParticipantRow {
        county_id: Uuid::new_v4(),
        county_code: code,
        county_name: name.to_string(),
        participants,
    }
}

#[test]
fn heatmap_over_a_realistic_county_spread() {
    let heatmap = build_heatmap(vec![
        county(22, "Kiambu", 120),
        county(32, "Nakuru", 60),
        county(42, "Kisumu", 30),
        county(47, "Nairobi", 240),
        county(8, "Wajir", 0),
    ]);

    assert_eq!(heatmap.max_participants, 240);

    let by_name: Vec<(&str, f64)> = heatmap
        .counties
        .iter()
        .map(|c| (c.name.as_str(), c.intensity))
        .collect();

    assert_eq!(
        by_name,
        vec![
            ("Kiambu", 50.0),
            ("Nakuru", 25.0),
            ("Kisumu", 12.5),
            ("Nairobi", 100.0),
            ("Wajir", 0.0),
        ]
    );
}

#[test]
fn intensity_is_always_within_bounds() {
    let rows: Vec<CountyParticipantRow> = (1..=47)
        .map(|code| county(code, &format!("County {code}"), (code as i64 * 13) % 31))
        .collect();

    let heatmap = build_heatmap(rows);

    for entry in &heatmap.counties {
        assert!((0.0..=100.0).contains(&entry.intensity), "{entry:?}");
    }
    assert!(heatmap
        .counties
        .iter()
        .any(|entry| entry.intensity == 100.0));
}

#[test]
fn objective_weights_always_rebalance_to_100() {
    // Mirrors the admin flow: add objectives one by one, then pin a weight
    let mut weights: Vec<i32> = Vec::new();
    for _ in 0..5 {
        weights.push(0);
        weights = normalize_weights(&weights);
        assert_eq!(weights.iter().sum::<i32>(), 100);
    }

    let pinned = rebalance_with_pinned(&weights, 2, 40);
    assert_eq!(pinned[2], 40);
    assert_eq!(pinned.iter().sum::<i32>(), 100);
}

#[test]
fn distribute_is_exact_for_awkward_splits() {
    for n in 1..=12 {
        let parts = distribute(100, &vec![1; n]);
        assert_eq!(parts.iter().sum::<i32>(), 100, "n = {n}");
        let min = parts.iter().min().unwrap();
        let max = parts.iter().max().unwrap();
        assert!(max - min <= 1, "even shares stay within one point: {parts:?}");
    }
}

#[test]
fn pass_mark_interacts_with_weighted_scores() {
    // 70 on the heavy objective, 40 on the light one: passes at 60
    let overall = weighted_overall(&[(70.0, 70), (40.0, 30)]);
    assert_eq!(overall, 61.0);
    assert!(overall >= PASS_MARK);

    // Same scores with the weights flipped: fails
    let overall = weighted_overall(&[(70.0, 30), (40.0, 70)]);
    assert_eq!(overall, 49.0);
    assert!(overall < PASS_MARK);
}

#[test]
fn recommendations_follow_the_rates() {
    // Healthy training: single on-track message
    let recs = build_recommendations(40, ratio(30, 40), 85.0, 30, ratio(27, 30));
    assert_eq!(recs.len(), 1);
    assert!(recs[0].contains("on track"));

    // Struggling training: every threshold fires
    let recs = build_recommendations(40, ratio(10, 40), 45.0, 20, ratio(8, 20));
    assert_eq!(recs.len(), 3);
}
