use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::{Certificate, CertificateTemplate};
use crate::db::types::CertificateType;

const COLUMNS: &str = "\
    id, user_id, certificate_type, course_id, bundle_id, template_id, certificate_number, \
    title, description, issue_date, completion_date, verification_url, \
    (certificate_file IS NOT NULL) AS has_file, is_valid, created_at, updated_at";
const TEMPLATE_COLUMNS: &str =
    "id, name, description, layout_svg, is_active, created_at, updated_at";

pub(crate) async fn list_valid_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates
         WHERE user_id = $1 AND is_valid = TRUE
         ORDER BY issue_date DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_valid_for_user(pool: &PgPool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM certificates WHERE user_id = $1 AND is_valid = TRUE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_valid(pool: &PgPool, id: &str) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE id = $1 AND is_valid = TRUE"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// The course or bundle certificate already issued to a user, if any.
pub(crate) async fn find_issued(
    pool: &PgPool,
    user_id: &str,
    certificate_type: CertificateType,
    target_id: &str,
) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates
         WHERE user_id = $1 AND certificate_type = $2
           AND (course_id = $3 OR bundle_id = $3)
         LIMIT 1"
    ))
    .bind(user_id)
    .bind(certificate_type)
    .bind(target_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn certificate_number_taken(
    pool: &PgPool,
    number: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM certificates WHERE certificate_number = $1)",
    )
    .bind(number)
    .fetch_one(pool)
    .await
}

pub(crate) struct CreateCertificate<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) certificate_type: CertificateType,
    pub(crate) course_id: Option<&'a str>,
    pub(crate) bundle_id: Option<&'a str>,
    pub(crate) template_id: &'a str,
    pub(crate) certificate_number: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) completion_date: PrimitiveDateTime,
    pub(crate) verification_url: &'a str,
    pub(crate) qr_code: Option<&'a [u8]>,
    pub(crate) certificate_file: Option<&'a [u8]>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateCertificate<'_>,
) -> Result<Certificate, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "INSERT INTO certificates (
            id, user_id, certificate_type, course_id, bundle_id, template_id, certificate_number,
            title, description, issue_date, completion_date, verification_url, qr_code,
            certificate_file, is_valid, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,TRUE,$10,$10)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.certificate_type)
    .bind(params.course_id)
    .bind(params.bundle_id)
    .bind(params.template_id)
    .bind(params.certificate_number)
    .bind(params.title)
    .bind(params.description)
    .bind(params.now)
    .bind(params.completion_date)
    .bind(params.verification_url)
    .bind(params.qr_code)
    .bind(params.certificate_file)
    .fetch_one(pool)
    .await
}

#[derive(Debug, FromRow)]
pub(crate) struct CertificateFile {
    pub(crate) certificate_number: String,
    pub(crate) certificate_file: Option<Vec<u8>>,
}

pub(crate) async fn file_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<Option<CertificateFile>, sqlx::Error> {
    sqlx::query_as::<_, CertificateFile>(
        "SELECT certificate_number, certificate_file FROM certificates
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn record_verification(
    pool: &PgPool,
    id: &str,
    certificate_id: &str,
    ip_address: Option<&str>,
    user_agent: &str,
    verified_by: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO certificate_verifications (
            id, certificate_id, verified_at, ip_address, user_agent, verified_by
         ) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(certificate_id)
    .bind(now)
    .bind(ip_address)
    .bind(user_agent)
    .bind(verified_by)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn list_active_templates(
    pool: &PgPool,
) -> Result<Vec<CertificateTemplate>, sqlx::Error> {
    sqlx::query_as::<_, CertificateTemplate>(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM certificate_templates
         WHERE is_active = TRUE
         ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await
}

/// Oldest active template; used for every generated certificate.
pub(crate) async fn default_template(
    pool: &PgPool,
) -> Result<Option<CertificateTemplate>, sqlx::Error> {
    sqlx::query_as::<_, CertificateTemplate>(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM certificate_templates
         WHERE is_active = TRUE
         ORDER BY created_at
         LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

pub(crate) async fn create_template(
    pool: &PgPool,
    id: &str,
    name: &str,
    description: &str,
    layout_svg: &str,
    is_active: bool,
    now: PrimitiveDateTime,
) -> Result<CertificateTemplate, sqlx::Error> {
    sqlx::query_as::<_, CertificateTemplate>(&format!(
        "INSERT INTO certificate_templates (
            id, name, description, layout_svg, is_active, created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $6)
         RETURNING {TEMPLATE_COLUMNS}",
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(layout_svg)
    .bind(is_active)
    .bind(now)
    .fetch_one(pool)
    .await
}
