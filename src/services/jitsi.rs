use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;
use crate::db::models::User;

const MAX_ROOM_LEN: usize = 50;

#[derive(Debug, Serialize)]
struct JitsiUser<'a> {
    id: &'a str,
    name: String,
    email: &'a str,
    moderator: bool,
}

#[derive(Debug, Serialize)]
struct JitsiContext<'a> {
    user: JitsiUser<'a>,
}

#[derive(Debug, Serialize)]
struct JitsiClaims<'a> {
    iss: &'a str,
    aud: &'a str,
    sub: &'a str,
    room: &'a str,
    exp: i64,
    nbf: i64,
    context: JitsiContext<'a>,
}

/// Builds a room from the title, a unix timestamp and a random suffix.
pub(crate) fn new_room_name(title: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    room_name(title, OffsetDateTime::now_utc().unix_timestamp(), &format!("{suffix:08x}"))
}

pub(crate) fn room_name(title: &str, unix_ts: i64, hex_suffix: &str) -> String {
    let raw = format!("{title}-{unix_ts}-{hex_suffix}");

    let mut room = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let mapped = if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { '-' };
        if mapped == '-' && room.ends_with('-') {
            continue;
        }
        room.push(mapped);
    }

    let trimmed = room.trim_matches('-');
    let truncated: String = trimmed.chars().take(MAX_ROOM_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}

pub(crate) fn meeting_url(domain: &str, room: &str) -> String {
    format!("https://{domain}/{room}")
}

/// Signed room token, or `None` when no app credentials are configured.
pub(crate) fn room_token(
    settings: &Settings,
    room: &str,
    user: &User,
) -> Result<Option<String>, jsonwebtoken::errors::Error> {
    let jitsi = settings.jitsi();
    if !jitsi.jwt_enabled() {
        return Ok(None);
    }

    let now = OffsetDateTime::now_utc();
    let claims = JitsiClaims {
        iss: &jitsi.app_id,
        aud: &jitsi.app_id,
        sub: &jitsi.domain,
        room,
        exp: (now + Duration::hours(24)).unix_timestamp(),
        nbf: (now - Duration::minutes(5)).unix_timestamp(),
        context: JitsiContext {
            user: JitsiUser {
                id: &user.id,
                name: user.full_name(),
                email: &user.email,
                moderator: user.is_admin(),
            },
        },
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(jitsi.app_secret.as_bytes()))
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_name_is_lowercase_single_dashed() {
        let room = room_name("Intro to Rust: Ownership & Borrowing!", 1_700_000_000, "deadbeef");
        assert!(room.len() <= MAX_ROOM_LEN);
        assert!(room.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        assert!(!room.contains("--"));
        assert!(!room.starts_with('-') && !room.ends_with('-'));
        assert!(room.starts_with("intro-to-rust-ownership-borrowing-"));
    }

    #[test]
    fn short_titles_keep_timestamp_and_suffix() {
        assert_eq!(room_name("Q&A", 42, "0a1b2c3d"), "q-a-42-0a1b2c3d");
    }

    #[test]
    fn generated_rooms_are_bounded() {
        let room = new_room_name(&"very long title ".repeat(10));
        assert!(room.len() <= MAX_ROOM_LEN);
        assert_eq!(meeting_url("meet.jit.si", "abc"), "https://meet.jit.si/abc");
    }
}
