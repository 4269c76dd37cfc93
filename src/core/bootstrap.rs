use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserType;
use crate::repositories;

pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let email = admin.first_superuser_email.trim();
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_email(state.db(), email).await? {
        let password_matches =
            security::verify_password(&admin.first_superuser_password, &user.hashed_password)
                .unwrap_or(false);

        if password_matches && user.is_admin() && user.is_active && user.is_verified {
            tracing::info!("Default superuser already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            user.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_superuser_password)?
        };
        repositories::users::promote_admin(state.db(), &user.id, &hashed_password, now).await?;

        tracing::info!(email = %email, "Updated default superuser");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;
    let username = email.split('@').next().filter(|part| !part.is_empty()).unwrap_or("admin");

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email,
            username,
            hashed_password,
            first_name: "Super",
            last_name: "Admin",
            user_type: UserType::Admin,
            phone: None,
            is_verified: true,
            now,
        },
    )
    .await?;

    tracing::info!(email = %email, "Created default superuser");
    Ok(())
}
