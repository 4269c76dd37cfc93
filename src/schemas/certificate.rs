use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Certificate, CertificateTemplate};
use crate::db::types::CertificateType;

#[derive(Debug, Serialize)]
pub(crate) struct CertificateResponse {
    pub(crate) id: String,
    pub(crate) certificate_type: CertificateType,
    pub(crate) course_id: Option<String>,
    pub(crate) bundle_id: Option<String>,
    pub(crate) certificate_number: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) issue_date: String,
    pub(crate) completion_date: String,
    pub(crate) verification_url: String,
    pub(crate) has_file: bool,
    pub(crate) is_valid: bool,
}

impl CertificateResponse {
    pub(crate) fn from_db(certificate: Certificate) -> Self {
        Self {
            id: certificate.id,
            certificate_type: certificate.certificate_type,
            course_id: certificate.course_id,
            bundle_id: certificate.bundle_id,
            certificate_number: certificate.certificate_number,
            title: certificate.title,
            description: certificate.description,
            issue_date: format_primitive(certificate.issue_date),
            completion_date: format_primitive(certificate.completion_date),
            verification_url: certificate.verification_url,
            has_file: certificate.has_file,
            is_valid: certificate.is_valid,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExistingCertificateResponse {
    pub(crate) message: &'static str,
    pub(crate) certificate_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerificationResponse {
    pub(crate) valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) certificate: Option<CertificateResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<&'static str>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct ShareRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub(crate) email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TemplateCreate {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[validate(length(min = 1, message = "layout_svg must not be empty"))]
    pub(crate) layout_svg: String,
    #[serde(default = "default_true")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct TemplateResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) layout_svg: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl TemplateResponse {
    pub(crate) fn from_db(template: CertificateTemplate) -> Self {
        Self {
            id: template.id,
            name: template.name,
            description: template.description,
            layout_svg: template.layout_svg,
            is_active: template.is_active,
            created_at: format_primitive(template.created_at),
        }
    }
}

fn default_true() -> bool {
    true
}
