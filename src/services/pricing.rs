use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use time::PrimitiveDateTime;

use crate::db::models::Coupon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BundlePricing {
    pub(crate) total_price: Decimal,
    pub(crate) discount_percentage: Decimal,
    pub(crate) final_price: Decimal,
}

pub(crate) fn coupon_is_valid(coupon: &Coupon, now: PrimitiveDateTime) -> bool {
    coupon.is_active
        && coupon.valid_from <= now
        && now <= coupon.valid_to
        && coupon.used_count < coupon.max_uses
}

/// Percentage coupons take precedence over fixed-amount ones. A fixed amount
/// never exceeds the price it is applied to.
pub(crate) fn coupon_discount(coupon: &Coupon, amount: Decimal) -> Decimal {
    if let Some(percentage) = coupon.discount_percentage {
        return (amount * percentage / Decimal::ONE_HUNDRED).round_dp(2);
    }
    coupon.discount_amount.map(|fixed| fixed.min(amount)).unwrap_or(Decimal::ZERO)
}

pub(crate) fn final_amount(amount: Decimal, discount: Decimal) -> Decimal {
    (amount - discount).max(Decimal::ZERO)
}

pub(crate) fn bundle_discount_percentage(course_count: usize) -> Decimal {
    if course_count > 3 {
        Decimal::TEN
    } else {
        Decimal::new(5, 0)
    }
}

pub(crate) fn bundle_pricing(effective_prices: &[Decimal]) -> BundlePricing {
    let total_price: Decimal = effective_prices.iter().copied().sum();
    let discount_percentage = bundle_discount_percentage(effective_prices.len());
    let final_price =
        (total_price * (Decimal::ONE_HUNDRED - discount_percentage) / Decimal::ONE_HUNDRED)
            .round_dp(2);

    BundlePricing { total_price, discount_percentage, final_price }
}

/// Rupees to paise for the gateway.
pub(crate) fn to_paise(amount: Decimal) -> i64 {
    (amount * Decimal::ONE_HUNDRED).round().to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn coupon(percentage: Option<Decimal>, amount: Option<Decimal>) -> Coupon {
        Coupon {
            id: "coupon-1".to_string(),
            code: "SAVE".to_string(),
            description: String::new(),
            discount_percentage: percentage,
            discount_amount: amount,
            max_uses: 2,
            used_count: 0,
            valid_from: datetime!(2025-01-01 0:00),
            valid_to: datetime!(2025-12-31 23:59),
            is_active: true,
            created_at: datetime!(2025-01-01 0:00),
            updated_at: datetime!(2025-01-01 0:00),
        }
    }

    #[test]
    fn coupon_validity_window_and_usage() {
        let now = datetime!(2025-06-01 12:00);
        let mut c = coupon(Some(Decimal::TEN), None);
        assert!(coupon_is_valid(&c, now));

        c.used_count = c.max_uses;
        assert!(!coupon_is_valid(&c, now));

        c.used_count = 0;
        assert!(!coupon_is_valid(&c, datetime!(2026-01-01 0:00)));
        assert!(!coupon_is_valid(&c, datetime!(2024-12-31 23:00)));

        c.is_active = false;
        assert!(!coupon_is_valid(&c, now));
    }

    #[test]
    fn percentage_and_fixed_discounts() {
        let price = Decimal::new(99900, 2);
        assert_eq!(coupon_discount(&coupon(Some(Decimal::TEN), None), price), Decimal::new(9990, 2));
        assert_eq!(
            coupon_discount(&coupon(None, Some(Decimal::new(200, 0))), price),
            Decimal::new(200, 0)
        );
        assert_eq!(coupon_discount(&coupon(None, Some(Decimal::new(5000, 0))), price), price);
        assert_eq!(final_amount(price, Decimal::new(5000, 0)), Decimal::ZERO);
    }

    #[test]
    fn bundle_discount_steps_above_three_courses() {
        let three = [Decimal::new(100, 0), Decimal::new(200, 0), Decimal::new(300, 0)];
        let pricing = bundle_pricing(&three);
        assert_eq!(pricing.total_price, Decimal::new(600, 0));
        assert_eq!(pricing.discount_percentage, Decimal::new(5, 0));
        assert_eq!(pricing.final_price, Decimal::new(57000, 2));

        let four = [Decimal::new(9999, 2); 4];
        let pricing = bundle_pricing(&four);
        assert_eq!(pricing.discount_percentage, Decimal::TEN);
        assert_eq!(pricing.final_price, Decimal::new(35996, 2));
    }

    #[test]
    fn paise_conversion_rounds() {
        assert_eq!(to_paise(Decimal::new(49950, 2)), 49950);
        assert_eq!(to_paise(Decimal::new(1, 3)), 0);
    }
}
