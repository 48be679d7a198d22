// tests/risk_scoring.rs
//
// Worked examples and property sweeps for the public scoring API.
// Sweeps use a seeded RNG so failures are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vitalwatch::risk::{compute_risk_score, risk_breakdown, HealthProfile, HealthReading};
use vitalwatch::RiskLevel;

fn reading(sys: i32, dia: i32, glu: i32, weight: f64, smoking: i32) -> HealthReading {
    HealthReading {
        systolic_bp: sys,
        diastolic_bp: dia,
        glucose_level: glu,
        weight_kg: weight,
        smoking,
    }
}

fn random_reading(rng: &mut StdRng) -> HealthReading {
    reading(
        rng.random_range(60..260),
        rng.random_range(40..160),
        rng.random_range(50..400),
        rng.random_range(30.0..180.0),
        rng.random_range(0..40),
    )
}

fn random_profile(rng: &mut StdRng) -> Option<HealthProfile> {
    if rng.random_bool(0.2) {
        return None;
    }
    Some(HealthProfile {
        height_cm: if rng.random_bool(0.8) {
            Some(rng.random_range(140.0..200.0))
        } else {
            None
        },
        hypertension: rng.random_bool(0.3),
        diabetes: rng.random_bool(0.3),
        heart_disease: rng.random_bool(0.3),
        stroke_history: rng.random_bool(0.3),
    })
}

#[test]
fn severe_reading_with_hypertension_is_capped_at_100() {
    let r = reading(185, 125, 210, 90.0, 25);
    let p = HealthProfile {
        height_cm: Some(170.0),
        hypertension: true,
        ..Default::default()
    };
    let b = risk_breakdown(&r, Some(&p));
    // BMI 90 / 1.7^2 = 31.1 → obese band
    assert_eq!(b.bmi, 15);
    assert_eq!(b.raw, 30 + 20 + 25 + 20 + 15 + 10);
    assert_eq!(compute_risk_score(&r, Some(&p)), 100);
}

#[test]
fn healthy_reading_without_profile_scores_zero() {
    let r = reading(115, 75, 90, 60.0, 0);
    let score = compute_risk_score(&r, None);
    assert_eq!(score, 0);
    assert_eq!(RiskLevel::from_score(score), RiskLevel::Normal);
}

#[test]
fn light_smoker_with_hypertension_counts_every_band() {
    // BMI 70 / 1.75^2 = 22.9 adds nothing; 5 cigarettes/day is the 1–9 band.
    let r = reading(150, 95, 140, 70.0, 5);
    let p = HealthProfile {
        height_cm: Some(175.0),
        hypertension: true,
        ..Default::default()
    };
    let b = risk_breakdown(&r, Some(&p));
    assert_eq!(
        (b.systolic, b.diastolic, b.glucose, b.smoking, b.bmi, b.comorbidities),
        (20, 15, 15, 10, 0, 10)
    );
    assert_eq!(b.score, 70);
    assert_eq!(RiskLevel::from_score(b.score), RiskLevel::High);

    // The same reading as a non-smoker lands in the moderate level.
    let non_smoker = HealthReading { smoking: 0, ..r };
    let score = compute_risk_score(&non_smoker, Some(&p));
    assert_eq!(score, 60);
    assert_eq!(RiskLevel::from_score(score), RiskLevel::Moderate);
}

#[test]
fn systolic_180_contributes_only_the_top_band() {
    let b = risk_breakdown(&reading(180, 60, 80, 70.0, 0), None);
    assert_eq!(b.systolic, 30);
    assert_eq!(b.score, 30);
}

#[test]
fn absent_profile_adds_no_bmi_or_comorbidity_points() {
    // Underweight would add 5 with a height.
    let r = reading(110, 70, 90, 40.0, 0);
    let b = risk_breakdown(&r, None);
    assert_eq!((b.bmi, b.comorbidities), (0, 0));

    let no_height = HealthProfile::default();
    assert_eq!(risk_breakdown(&r, Some(&no_height)).bmi, 0);

    let with_height = HealthProfile {
        height_cm: Some(170.0),
        ..Default::default()
    };
    assert_eq!(risk_breakdown(&r, Some(&with_height)).bmi, 5);
}

#[test]
fn score_always_within_bounds() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..5_000 {
        let r = random_reading(&mut rng);
        let p = random_profile(&mut rng);
        let s = compute_risk_score(&r, p.as_ref());
        assert!(s <= 100, "score {s} out of range for {r:?} / {p:?}");
    }
}

#[test]
fn raising_systolic_never_lowers_the_score() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..1_000 {
        let r = random_reading(&mut rng);
        let p = random_profile(&mut rng);
        let mut prev = compute_risk_score(&r, p.as_ref());
        for sys in r.systolic_bp..r.systolic_bp + 120 {
            let s = compute_risk_score(
                &HealthReading {
                    systolic_bp: sys,
                    ..r
                },
                p.as_ref(),
            );
            assert!(s >= prev, "score dropped from {prev} to {s} at systolic {sys}");
            prev = s;
        }
    }
}

#[test]
fn level_follows_score_thresholds() {
    for score in 0..=100u8 {
        let expected = if score >= 70 {
            RiskLevel::High
        } else if score >= 40 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Normal
        };
        assert_eq!(RiskLevel::from_score(score), expected, "score {score}");
    }
}
