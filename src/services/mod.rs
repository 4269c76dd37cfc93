pub(crate) mod certificate_render;
pub(crate) mod codes;
pub(crate) mod enrollment;
pub(crate) mod grading;
pub(crate) mod jitsi;
pub(crate) mod mailer;
pub(crate) mod pricing;
pub(crate) mod progress;
pub(crate) mod progress_calc;
pub(crate) mod razorpay;
pub(crate) mod slugs;
pub(crate) mod storage;
