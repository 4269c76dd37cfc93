use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::metrics::LIVE_CLASS_TRANSITIONS;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

const LIVE_STATUS_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles = vec![tokio::spawn(live_status_loop(state.clone(), shutdown_rx.clone()))];

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn live_status_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(LIVE_STATUS_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = sync_live_statuses(&state).await {
                    tracing::error!(error = %err, "Live class status sync failed");
                }
            }
        }
    }
}

/// One scheduler tick: scheduled classes inside their window go live, and
/// anything past its end completes.
pub(crate) async fn sync_live_statuses(state: &AppState) -> Result<u64, sqlx::Error> {
    let moved = repositories::live_classes::sync_statuses(state.db(), primitive_now_utc()).await?;
    if moved > 0 {
        metrics::counter!(LIVE_CLASS_TRANSITIONS).increment(moved);
        tracing::info!(moved, "Live class statuses updated");
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use time::Duration as TimeDuration;

    use crate::core::time::primitive_now_utc;
    use crate::test_support;

    #[tokio::test]
    async fn tick_moves_due_classes_and_skips_cancelled() {
        let ctx = test_support::setup_test_context().await;
        let now = primitive_now_utc();
        let admin = test_support::insert_admin(ctx.db(), "admin@example.com", "admin-pass-1").await;
        let course = test_support::insert_published_course(
            ctx.db(),
            "Live Rust",
            rust_decimal::Decimal::ZERO,
        )
        .await;

        for (id, status, start, end) in [
            ("due", "scheduled", now - TimeDuration::minutes(5), now + TimeDuration::hours(1)),
            ("over", "live", now - TimeDuration::hours(2), now - TimeDuration::hours(1)),
            ("later", "scheduled", now + TimeDuration::hours(1), now + TimeDuration::hours(2)),
            ("off", "cancelled", now - TimeDuration::minutes(5), now + TimeDuration::hours(1)),
        ] {
            sqlx::query(
                "INSERT INTO live_classes
                    (id, course_id, title, scheduled_start, scheduled_end, meeting_id,
                     meeting_url, status, created_by, created_at, updated_at)
                 VALUES ($1, $2, $1, $3, $4, $1, 'https://meet.jit.si/' || $1,
                         $5::liveclassstatus, $6, $7, $7)",
            )
            .bind(id)
            .bind(&course.id)
            .bind(start)
            .bind(end)
            .bind(status)
            .bind(&admin.id)
            .bind(now)
            .execute(ctx.db())
            .await
            .expect("insert live class");
        }

        let moved = super::sync_live_statuses(&ctx.state).await.expect("sync");
        assert_eq!(moved, 2);

        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, status::text FROM live_classes ORDER BY id")
                .fetch_all(ctx.db())
                .await
                .expect("statuses");
        let status = |id: &str| -> String {
            rows.iter().find(|(row_id, _)| row_id == id).map(|(_, s)| s.clone()).expect("row")
        };
        assert_eq!(status("due"), "live");
        assert_eq!(status("over"), "completed");
        assert_eq!(status("later"), "scheduled");
        assert_eq!(status("off"), "cancelled");

        let moved = super::sync_live_statuses(&ctx.state).await.expect("second sync");
        assert_eq!(moved, 0);
    }
}
