mod generate;
mod records;
mod templates;

pub(super) use generate::{generate_bundle, generate_course};
pub(super) use records::{
    download_certificate, get_certificate, list_certificates, share_certificate,
    verify_certificate,
};
pub(super) use templates::{create_template, list_templates};
