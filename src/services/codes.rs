use rand::Rng;

const UPPER_ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MIXED_ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub(crate) const OTP_TTL_MINUTES: i64 = 10;

/// Six decimal digits, zero padded.
pub(crate) fn generate_otp() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{value:06}")
}

pub(crate) fn generate_reset_token() -> String {
    random_from(MIXED_ALNUM, 32)
}

/// `CERT-{year}-{6 uppercase alphanumerics}`.
pub(crate) fn generate_certificate_number(year: i32) -> String {
    format!("CERT-{year}-{}", random_from(UPPER_ALNUM, 6))
}

fn random_from(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(len);
    for _ in 0..len {
        let index = rng.gen_range(0..alphabet.len());
        output.push(alphabet[index] as char);
    }
    output
}
