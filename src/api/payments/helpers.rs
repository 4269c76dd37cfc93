use rust_decimal::Decimal;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Coupon, Payment, User};
use crate::repositories;
use crate::services::pricing;

pub(super) const PAYMENT_NOT_FOUND: &str = "Payment not found";

/// What a checkout is paying for.
pub(super) enum PurchaseItem {
    Course { id: String, title: String, price: Decimal },
    Bundle { id: String, name: String, price: Decimal },
}

impl PurchaseItem {
    pub(super) fn price(&self) -> Decimal {
        match self {
            Self::Course { price, .. } | Self::Bundle { price, .. } => *price,
        }
    }

    pub(super) fn course_id(&self) -> Option<&str> {
        match self {
            Self::Course { id, .. } => Some(id),
            Self::Bundle { .. } => None,
        }
    }

    pub(super) fn bundle_id(&self) -> Option<&str> {
        match self {
            Self::Bundle { id, .. } => Some(id),
            Self::Course { .. } => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Resolves `course_id` or `bundle_id` to a priced item. A course wins when
/// both are sent. Bundles must belong to the buyer.
pub(super) async fn resolve_item(
    state: &AppState,
    user: &User,
    course_id: Option<&str>,
    bundle_id: Option<&str>,
) -> Result<Option<PurchaseItem>, ApiError> {
    if let Some(course_id) = non_empty(course_id) {
        let course = repositories::courses::find_by_id(state.db(), course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
            .filter(|course| course.is_published)
            .ok_or_else(|| ApiError::not_found("Course not found"))?;
        return Ok(Some(PurchaseItem::Course {
            price: course.effective_price(),
            id: course.id,
            title: course.title,
        }));
    }

    if let Some(bundle_id) = non_empty(bundle_id) {
        let bundle = repositories::bundles::find_for_student(state.db(), bundle_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch bundle"))?
            .ok_or_else(|| ApiError::not_found("Bundle not found"))?;
        return Ok(Some(PurchaseItem::Bundle {
            id: bundle.id,
            name: bundle.name,
            price: bundle.final_price,
        }));
    }

    Ok(None)
}

/// Looks a coupon up by code and checks it is currently redeemable.
pub(super) async fn usable_coupon(state: &AppState, code: &str) -> Result<Coupon, ApiError> {
    let coupon = repositories::payments::find_coupon_by_code(state.db(), code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch coupon"))?
        .ok_or_else(|| ApiError::bad_request("Invalid coupon code"))?;

    if !pricing::coupon_is_valid(&coupon, primitive_now_utc()) {
        return Err(ApiError::bad_request("Coupon is expired or invalid"));
    }
    Ok(coupon)
}

pub(super) async fn fetch_own_payment(
    state: &AppState,
    user: &User,
    payment_id: &str,
) -> Result<Payment, ApiError> {
    repositories::payments::find_by_id(state.db(), payment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch payment"))?
        .filter(|payment| payment.user_id == user.id)
        .ok_or_else(|| ApiError::not_found(PAYMENT_NOT_FOUND))
}
