use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::compact_date;
use crate::db::models::{Course, Payment, PaymentReceipt, User};
use crate::db::types::{NotificationPriority, NotificationType};
use crate::repositories;
use crate::repositories::enrollments::EnrollOutcome;
use crate::repositories::notifications::NewNotification;
use crate::services::mailer;

/// Enrolls a student, bumping the course counter and notifying the student
/// when the enrollment is new or reactivated.
pub(crate) async fn enroll_in_course(
    conn: &mut sqlx::PgConnection,
    student_id: &str,
    course: &Course,
    payment_id: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<EnrollOutcome, sqlx::Error> {
    let outcome = repositories::enrollments::enroll(
        &mut *conn,
        &Uuid::new_v4().to_string(),
        student_id,
        &course.id,
        payment_id,
        now,
    )
    .await?;

    if outcome.created {
        repositories::courses::increment_enrollment_count(&mut *conn, &course.id).await?;
        let message = format!("You are now enrolled in {}.", course.title);
        repositories::notifications::create(
            &mut *conn,
            &Uuid::new_v4().to_string(),
            NewNotification {
                recipient_id: student_id,
                title: "Enrollment confirmed",
                message: &message,
                notification_type: NotificationType::CourseEnrollment,
                priority: NotificationPriority::Medium,
                course_id: Some(&course.id),
                action_url: Some(&format!("/courses/{}", course.slug)),
            },
            now,
        )
        .await?;
    }

    Ok(outcome)
}

pub(crate) fn receipt_number(gateway_payment_id: &str, now: PrimitiveDateTime) -> String {
    format!("RCP-{gateway_payment_id}-{}", compact_date(now.date()))
}

pub(crate) struct CompletedPayment {
    pub(crate) payment: Payment,
    pub(crate) receipt: PaymentReceipt,
    pub(crate) item_title: String,
}

/// Moves a locked pending payment to completed inside the caller's
/// transaction: enrolls every purchased course, issues the receipt and
/// records a payment notification.
pub(crate) async fn complete_payment(
    conn: &mut sqlx::PgConnection,
    payment: &Payment,
    buyer: &User,
    gateway_payment_id: &str,
    gateway_signature: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<CompletedPayment, sqlx::Error> {
    let completed = repositories::payments::mark_completed(
        &mut *conn,
        &payment.id,
        gateway_payment_id,
        gateway_signature,
        now,
    )
    .await?;

    let (course_ids, item_title) = match (&payment.course_id, &payment.bundle_id) {
        (_, Some(bundle_id)) => {
            let name = repositories::bundles::find_by_id(&mut *conn, bundle_id)
                .await?
                .map(|bundle| bundle.name)
                .unwrap_or_else(|| "Course bundle".to_string());
            (repositories::bundles::course_ids(&mut *conn, bundle_id).await?, name)
        }
        (Some(course_id), None) => (vec![course_id.clone()], String::new()),
        (None, None) => (Vec::new(), String::new()),
    };

    let courses = repositories::courses::find_many(&mut *conn, &course_ids).await?;
    for course in &courses {
        enroll_in_course(&mut *conn, &payment.user_id, course, Some(&payment.id), now).await?;
    }

    let item_title = if item_title.is_empty() {
        courses.first().map(|course| course.title.clone()).unwrap_or_default()
    } else {
        item_title
    };

    let number = receipt_number(gateway_payment_id, now);
    let receipt = repositories::payments::issue_receipt(
        &mut *conn,
        repositories::payments::CreateReceipt {
            id: &Uuid::new_v4().to_string(),
            payment_id: &payment.id,
            receipt_number: &number,
            billing_name: &buyer.full_name(),
            billing_email: &buyer.email,
            amount: completed.final_amount,
            now,
        },
    )
    .await?;

    let message =
        format!("Your payment of INR {} for {item_title} was successful.", completed.final_amount);
    repositories::notifications::create(
        &mut *conn,
        &Uuid::new_v4().to_string(),
        NewNotification {
            recipient_id: &payment.user_id,
            title: "Payment successful",
            message: &message,
            notification_type: NotificationType::Payment,
            priority: NotificationPriority::High,
            course_id: payment.course_id.as_deref(),
            action_url: Some(&format!("/payments/{}", payment.id)),
        },
        now,
    )
    .await?;

    Ok(CompletedPayment { payment: completed, receipt, item_title })
}

/// Emails the buyer after the completing transaction has committed.
pub(crate) fn send_confirmation(state: &AppState, buyer: &User, completed: &CompletedPayment) {
    metrics::counter!(crate::core::metrics::PAYMENTS_COMPLETED).increment(1);
    state.mailer().dispatch(mailer::payment_confirmation_mail(
        &buyer.email,
        &completed.item_title,
        &completed.receipt.receipt_number,
        &completed.payment.final_amount.to_string(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn receipt_number_embeds_gateway_id_and_date() {
        assert_eq!(
            receipt_number("pay_ABC123", datetime!(2024-03-07 10:15:00)),
            "RCP-pay_ABC123-20240307"
        );
    }
}
