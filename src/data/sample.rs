/// Default point budget per chart.
pub const DEFAULT_MAX_POINTS: usize = 25;

/// Pick at most `max_points` steps from an ascending, duplicate-free
/// sequence for display.
///
/// Sequences within budget come back unchanged. Longer ones keep the first
/// and last step and take every `interval`-th step in between, where
/// `interval = max(1, (n - 2) / (max_points - 2))`. The middle is capped at
/// `max_points - 2` picks so the result never exceeds the budget. A budget
/// below 2 is treated as 2 (first and last only).
///
/// ```text
/// 0..=999, budget 25  →  [0, 43, 86, ..., 989, 999]
/// ```
pub fn sample_steps<T: Copy + Ord>(steps: &[T], max_points: usize) -> Vec<T> {
    let budget = max_points.max(2);
    let n = steps.len();
    if n <= budget {
        return steps.to_vec();
    }

    let middle = budget - 2;
    let interval = ((n - 2) / middle.max(1)).max(1);

    let mut sampled = Vec::with_capacity(budget);
    sampled.push(steps[0]);
    sampled.extend(
        (interval..n - 1)
            .step_by(interval)
            .take(middle)
            .map(|i| steps[i]),
    );

    let last = steps[n - 1];
    if sampled.last() != Some(&last) {
        sampled.push(last);
    }

    sampled.sort_unstable();
    sampled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sequences_pass_through() {
        let steps: Vec<u64> = (0..25).collect();
        assert_eq!(sample_steps(&steps, 25), steps);
        assert!(sample_steps::<u64>(&[], 25).is_empty());
    }

    #[test]
    fn thousand_steps_keep_endpoints() {
        let steps: Vec<u64> = (0..1000).collect();
        let sampled = sample_steps(&steps, DEFAULT_MAX_POINTS);
        assert_eq!(sampled.first(), Some(&0));
        assert_eq!(sampled.last(), Some(&999));
        assert!(sampled.len() <= DEFAULT_MAX_POINTS);
        assert_eq!(sampled[1], 43);
    }

    #[test]
    fn one_over_budget_stays_within_budget() {
        let steps: Vec<u64> = (0..26).collect();
        let sampled = sample_steps(&steps, 25);
        assert_eq!(sampled.len(), 25);
        assert_eq!(sampled.first(), Some(&0));
        assert_eq!(sampled.last(), Some(&25));
    }

    #[test]
    fn tiny_budget_keeps_only_endpoints() {
        let steps = [3u64, 8, 20, 41];
        assert_eq!(sample_steps(&steps, 0), vec![3, 41]);
        assert_eq!(sample_steps(&steps, 2), vec![3, 41]);
    }

    #[test]
    fn sparse_steps_are_never_fabricated() {
        let steps: Vec<u64> = (0..200).map(|i| i * i).collect();
        let sampled = sample_steps(&steps, 10);
        assert!(sampled.iter().all(|s| steps.binary_search(s).is_ok()));
    }
}
