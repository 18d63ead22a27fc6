//! Intake answer parsing tests.

use repbyrep::mealplan::{
    has_enough_answers, split_answers, IntakeError, UserProfile, ANSWERS_PER_ROUND,
};

const PROFILE: &str = "Omar, male, 31, 182 lbs, 5'11, bulk, halal, none";
const LIFESTYLE: &str = "4 months, 10k steps, Active, none, yes, night shift, 4, 18%";

#[test]
fn full_rounds_build_a_profile() {
    let profile =
        UserProfile::from_answers(&split_answers(PROFILE), &split_answers(LIFESTYLE))
            .expect("profile");
    assert_eq!(profile.name, "Omar");
    assert_eq!(profile.gender, "male");
    assert_eq!(profile.age, 31);
    assert!((profile.weight_lbs - 182.0).abs() < f64::EPSILON);
    assert_eq!(profile.height_inches, 71);
    assert_eq!(profile.goal, "bulk");
    assert_eq!(profile.allergies, "none");
    assert_eq!(profile.duration, "4 months");
    assert_eq!(profile.job_demand, "Active");
    assert_eq!(profile.schedule, "night shift");
    assert_eq!(profile.meals_count, "4");
    assert_eq!(profile.body_fat, "18%");
}

#[test]
fn short_round_is_rejected() {
    let short = split_answers("Omar, male, 31");
    assert!(!has_enough_answers(&short));
    let err = UserProfile::from_answers(&short, &split_answers(LIFESTYLE))
        .expect_err("too few answers");
    assert_eq!(
        err,
        IntakeError::TooFewAnswers {
            expected: ANSWERS_PER_ROUND,
            got: 3
        }
    );
}

#[test]
fn extra_answers_are_tolerated() {
    let answers = split_answers(&format!("{PROFILE}, extra"));
    assert!(has_enough_answers(&answers));
    assert!(UserProfile::from_answers(&answers, &split_answers(LIFESTYLE)).is_ok());
}

#[test]
fn non_numeric_age_names_the_field() {
    let answers = split_answers("Omar, male, thirty, 182, 5'11, bulk, halal, none");
    let err = UserProfile::from_answers(&answers, &split_answers(LIFESTYLE))
        .expect_err("bad age");
    assert_eq!(
        err,
        IntakeError::InvalidNumber {
            field: "age",
            value: "thirty".to_owned()
        }
    );
}

#[test]
fn unreadable_height_is_rejected() {
    let answers = split_answers("Omar, male, 31, 182, tall, bulk, halal, none");
    let err = UserProfile::from_answers(&answers, &split_answers(LIFESTYLE))
        .expect_err("bad height");
    assert!(matches!(err, IntakeError::InvalidHeight(_)));
}
