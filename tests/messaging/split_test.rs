//! Message splitting tests.

use repbyrep::messaging::{split_message, SplitLimits, CONTINUED_MARKER};

fn small() -> SplitLimits {
    SplitLimits::new(60, 40).expect("valid limits")
}

#[test]
fn short_message_is_unchanged() {
    let parts = split_message("Break your fast with dates.", SplitLimits::TELEGRAM);
    assert_eq!(parts, vec!["Break your fast with dates.".to_owned()]);
}

#[test]
fn blank_message_yields_nothing() {
    assert!(split_message("  \n\n ", SplitLimits::TELEGRAM).is_empty());
}

#[test]
fn paragraphs_are_packed_without_crossing_the_limit() {
    let text = [
        "Suhoor: oats and eggs.",
        "Iftar: dates and soup.",
        "Snack: greek yogurt.",
        "Drink water between meals.",
    ]
    .join("\n\n");
    let limits = small();
    let parts = split_message(&text, limits);

    assert!(parts.len() > 1);
    for part in &parts {
        assert!(part.chars().count() <= limits.max_len(), "too long: {part:?}");
        assert!(!part.ends_with('\n'));
    }
    let rejoined = parts.join("\n\n");
    assert_eq!(rejoined, text);
}

#[test]
fn oversized_paragraph_is_cut_with_markers() {
    let paragraph = "x".repeat(100);
    let limits = small();
    let parts = split_message(&paragraph, limits);

    assert_eq!(parts.len(), 3);
    assert!(parts[0].ends_with(CONTINUED_MARKER));
    assert!(parts[1].ends_with(CONTINUED_MARKER));
    assert!(!parts[2].ends_with(CONTINUED_MARKER));
    for part in &parts {
        assert!(part.chars().count() <= limits.max_len());
    }
}

#[test]
fn multibyte_text_is_counted_in_chars() {
    let text = "🌙".repeat(50);
    let parts = split_message(&text, SplitLimits::TELEGRAM);
    assert_eq!(parts, vec![text]);

    let long = "🌙".repeat(90);
    let parts = split_message(&long, small());
    let total: usize = parts
        .iter()
        .map(|p| p.trim_end_matches(CONTINUED_MARKER).chars().count())
        .sum();
    assert_eq!(total, 90);
}

#[test]
fn limits_must_leave_room_for_the_marker() {
    assert!(SplitLimits::new(4096, 3900).is_some());
    assert!(SplitLimits::new(100, 95).is_none());
    assert_eq!(SplitLimits::default(), SplitLimits::TELEGRAM);
}
