/// `"train_loss"` → `"Train Loss"`.
pub fn metric_label(metric: &str) -> String {
    metric
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short human form of a metric value: `1.23M`, `4.57K`, `0.931` style for
/// magnitudes ≥ 1, scientific below.
pub fn compact_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else if magnitude >= 1.0 {
        format!("{value:.3}")
    } else {
        format!("{value:.2e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(metric_label("train_loss"), "Train Loss");
        assert_eq!(metric_label("accuracy"), "Accuracy");
    }

    #[test]
    fn values_are_compacted() {
        assert_eq!(compact_value(2_500_000.0), "2.50M");
        assert_eq!(compact_value(-1_234.0), "-1.23K");
        assert_eq!(compact_value(0.5), "5.00e-1");
        assert_eq!(compact_value(3.14159), "3.142");
    }
}
