use super::constants::Bracket;

/// Tax owed on `taxable_income` under a width-based bracket table, rounded once to whole dollars.
///
/// Each bracket taxes `min(remaining, width)` at its rate; the walk stops as soon as no
/// income remains. Products are accumulated in basis points so a boundary that lands on
/// half a dollar (e.g. 11,925 × 10%) rounds the same way every time.
pub fn compute_tax(taxable_income: f64, brackets: &[Bracket]) -> i64 {
    let mut remaining = taxable_income.max(0.0);
    let mut accumulated_bps = 0.0;

    for bracket in brackets {
        if remaining <= 0.0 {
            break;
        }
        let portion = match bracket.width {
            Some(width) => remaining.min(width as f64),
            None => remaining,
        };
        accumulated_bps += portion * bracket.rate_bps as f64;
        remaining -= portion;
    }

    (accumulated_bps / 10_000.0).round() as i64
}

/// Marginal rate applied to the next dollar above `taxable_income`.
pub fn marginal_rate(taxable_income: f64, brackets: &[Bracket]) -> f64 {
    let mut floor = 0.0;
    for bracket in brackets {
        match bracket.width {
            Some(width) => {
                let ceiling = floor + width as f64;
                if taxable_income < ceiling {
                    return bracket.rate();
                }
                floor = ceiling;
            }
            None => return bracket.rate(),
        }
    }
    brackets.last().map(Bracket::rate).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOY: [Bracket; 3] = [
        Bracket::span(10_000, 1000),
        Bracket::span(20_000, 2000),
        Bracket::rest(3000),
    ];

    #[test]
    fn zero_and_negative_income_owe_nothing() {
        assert_eq!(compute_tax(0.0, &TOY), 0);
        assert_eq!(compute_tax(-5_000.0, &TOY), 0);
    }

    #[test]
    fn unbounded_segment_catches_remaining_income() {
        // 1,000 + 4,000 + 30% of 70,000
        assert_eq!(compute_tax(100_000.0, &TOY), 26_000);
    }

    #[test]
    fn marginal_rate_steps_at_boundaries() {
        assert_eq!(marginal_rate(9_999.0, &TOY), 0.10);
        assert_eq!(marginal_rate(10_000.0, &TOY), 0.20);
        assert_eq!(marginal_rate(29_999.0, &TOY), 0.20);
        assert_eq!(marginal_rate(1_000_000.0, &TOY), 0.30);
    }

    #[test]
    fn empty_table_owes_nothing() {
        assert_eq!(compute_tax(50_000.0, &[]), 0);
        assert_eq!(marginal_rate(50_000.0, &[]), 0.0);
    }
}
