//! Regret matching and average-strategy normalization.

/// Strategy proportional to positive regret.
///
/// ```text
/// Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
/// ```
///
/// Falls back to uniform when no action has positive regret.
pub fn regret_match(regrets: &[f64]) -> Vec<f64> {
    let num_actions = regrets.len();
    let total: f64 = regrets.iter().filter(|&&r| r > 0.0).sum();

    if total > 0.0 {
        regrets.iter().map(|&r| r.max(0.0) / total).collect()
    } else {
        vec![1.0 / num_actions as f64; num_actions]
    }
}

/// Normalize a cumulative strategy into the average strategy.
///
/// A set that never accumulated any weight reports the uniform distribution.
pub fn normalize_average(cumulative: &[f64]) -> Vec<f64> {
    let num_actions = cumulative.len();
    let total: f64 = cumulative.iter().sum();

    if total > 0.0 {
        cumulative.iter().map(|&x| x / total).collect()
    } else {
        vec![1.0 / num_actions as f64; num_actions]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_proportional_to_positive_regret() {
        let strategy = regret_match(&[3.0, -2.0, 1.0]);
        assert_relative_eq!(strategy[0], 0.75);
        assert_eq!(strategy[1], 0.0);
        assert_relative_eq!(strategy[2], 0.25);
    }

    #[test]
    fn test_non_positive_regret_falls_back_to_uniform() {
        for regrets in [vec![0.0, 0.0, 0.0, 0.0], vec![-1.0, -5.0, 0.0, -0.5]] {
            let strategy = regret_match(&regrets);
            assert!(strategy.iter().all(|&p| p == 0.25));
        }
    }

    #[test]
    fn test_matched_strategy_is_distribution() {
        let strategy = regret_match(&[1e9, 3.5, -7.0, 1e-9, 12.0]);
        assert_relative_eq!(strategy.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(strategy.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_average_normalization() {
        assert_eq!(normalize_average(&[0.0, 0.0]), vec![0.5, 0.5]);

        let avg = normalize_average(&[2.0, 6.0, 0.0, 2.0]);
        assert_relative_eq!(avg.iter().sum::<f64>(), 1.0);
        assert_relative_eq!(avg[1], 0.6);
        assert_eq!(avg[2], 0.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(regret_match(&[]).is_empty());
        assert!(normalize_average(&[]).is_empty());
    }
}
