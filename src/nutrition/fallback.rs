//! Built-in nutrition values for common Ramadan staples.
//!
//! Lookups match by substring of the lowercased query, first entry wins,
//! so `"boiled egg"` finds `egg`.

use super::{Macros, Micronutrients};

/// Macros per typical serving.
const MACROS: &[(&str, Macros)] = &[
    ("egg", Macros::new(6.0, 0.6, 5.0, 70.0)),
    ("bread", Macros::new(4.0, 20.0, 2.0, 110.0)),
    ("chicken breast", Macros::new(28.0, 0.0, 3.6, 144.0)),
    ("oatmeal", Macros::new(5.0, 27.0, 3.0, 150.0)),
    ("rice", Macros::new(4.3, 45.0, 0.4, 205.0)),
    ("milk", Macros::new(3.4, 5.0, 3.6, 65.0)),
    ("yogurt", Macros::new(10.0, 4.0, 0.4, 59.0)),
    ("banana", Macros::new(1.1, 27.0, 0.3, 105.0)),
    ("apple", Macros::new(0.3, 25.0, 0.2, 95.0)),
    ("dates", Macros::new(2.5, 75.0, 0.4, 282.0)),
    ("almonds", Macros::new(21.0, 22.0, 49.0, 579.0)),
    ("protein powder", Macros::new(24.0, 3.0, 1.5, 120.0)),
];

const fn micros(
    iron: f64,
    calcium: f64,
    vitamin_a: f64,
    vitamin_c: f64,
    vitamin_b12: f64,
    folates: f64,
    potassium: f64,
) -> Micronutrients {
    Micronutrients {
        iron,
        calcium,
        vitamin_a,
        vitamin_c,
        vitamin_b12,
        folates,
        potassium,
    }
}

const MICRONUTRIENTS: &[(&str, Micronutrients)] = &[
    ("egg", micros(1.2, 50.0, 160.0, 0.0, 0.6, 47.0, 126.0)),
    ("chicken breast", micros(0.7, 15.0, 40.0, 0.0, 0.3, 4.0, 256.0)),
    ("rice", micros(0.2, 10.0, 0.0, 0.0, 0.0, 3.0, 35.0)),
    ("apple", micros(0.1, 6.0, 54.0, 4.6, 0.0, 3.0, 107.0)),
    ("dates", micros(2.5, 75.0, 0.0, 0.0, 0.0, 6.0, 282.0)),
    ("almonds", micros(3.7, 269.0, 0.0, 0.0, 0.0, 44.0, 733.0)),
    ("protein powder", micros(4.0, 200.0, 0.0, 0.0, 1.0, 100.0, 150.0)),
];

/// Macros for the first table entry contained in `food`.
pub fn fallback_macros(food: &str) -> Option<Macros> {
    find(MACROS, food)
}

/// Micronutrients for the first table entry contained in `food`.
pub fn fallback_micronutrients(food: &str) -> Option<Micronutrients> {
    find(MICRONUTRIENTS, food)
}

fn find<T: Copy>(table: &[(&str, T)], food: &str) -> Option<T> {
    let lowered = food.to_lowercase();
    table
        .iter()
        .find(|(key, _)| lowered.contains(key))
        .map(|(key, value)| {
            tracing::info!(food, entry = key, "using fallback nutrition values");
            *value
        })
}
