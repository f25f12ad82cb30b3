//! Point arithmetic for voucher redemptions

/// Total cost of redeeming `quantity` units priced at `unit_cost` points each
pub fn compute_total(unit_cost: i64, quantity: i64) -> i64 {
    unit_cost * quantity
}

/// Balance left after paying `total` out of `current_points`
///
/// This can be negative; callers decide what to do with it.
pub fn remaining_balance(total: i64, current_points: i64) -> i64 {
    current_points - total
}

/// Whether a customer holding `current_points` can pay `total`
///
/// A redemption must leave a strictly positive balance: emptying the balance to zero is refused.
pub fn can_redeem(total: i64, current_points: i64) -> bool {
    remaining_balance(total, current_points) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    #[rstest]
    #[case(100, 3, 300)]
    #[case(0, 5, 0)]
    #[case(250, 1, 250)]
    fn test_compute_total(#[case] unit_cost: i64, #[case] quantity: i64, #[case] expected: i64) {
        assert_that!(compute_total(unit_cost, quantity)).is_equal_to(expected);
    }

    #[rstest]
    #[case(200, 1000, 800)]
    #[case(100, 100, 0)]
    #[case(50, 30, -20)]
    fn test_remaining_balance(#[case] total: i64, #[case] points: i64, #[case] expected: i64) {
        assert_that!(remaining_balance(total, points)).is_equal_to(expected);
    }

    #[rstest]
    #[case(200, 1000, true)]
    #[case(99, 100, true)]
    // Leaving the customer at exactly zero is refused
    #[case(100, 100, false)]
    #[case(50, 30, false)]
    fn test_can_redeem(#[case] total: i64, #[case] points: i64, #[case] expected: bool) {
        assert_that!(can_redeem(total, points)).is_equal_to(expected);
    }
}
