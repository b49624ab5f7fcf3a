// src/grading/bands.rs
//
// Percentage-to-letter grade banding.

/// Ordered `(label, minimum percentage)` rules, checked high to low.
#[derive(Debug, Clone)]
pub struct GradeBands {
    bands: Vec<(String, f64)>,
}

impl GradeBands {
    /// Builds a table from arbitrary rules; they are sorted by threshold, highest first.
    pub fn new<I, S>(bands: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut bands: Vec<(String, f64)> = bands
            .into_iter()
            .map(|(label, min)| (label.into(), min))
            .collect();
        bands.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { bands }
    }

    /// The highest band whose threshold is at or below `percentage`.
    /// Falls back to the lowest band when nothing matches.
    pub fn grade_for(&self, percentage: f64) -> &str {
        self.bands
            .iter()
            .find(|(_, min)| percentage >= *min)
            .or_else(|| self.bands.last())
            .map(|(label, _)| label.as_str())
            .unwrap_or("F")
    }
}

impl Default for GradeBands {
    fn default() -> Self {
        Self::new([
            ("A+", 95.0),
            ("A", 90.0),
            ("B", 80.0),
            ("C", 70.0),
            ("D", 60.0),
            ("E", 50.0),
            ("F", 0.0),
        ])
    }
}

/// `awarded / max * 100` rounded to two decimals; 0 when nothing was available.
pub fn percentage(awarded: i64, max: i64) -> f64 {
    if max <= 0 {
        return 0.0;
    }
    round2(awarded as f64 / max as f64 * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
