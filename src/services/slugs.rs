/// Lowercase ASCII slug with single dashes. Falls back to `item` when nothing
/// alphanumeric survives.
pub(crate) fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// Appends `-1`, `-2`, ... until `taken` reports the candidate free.
pub(crate) async fn unique_slug<F, Fut, E>(base: &str, mut taken: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = Result<bool, E>>,
{
    let base = slugify(base);
    if !taken(base.clone()).await? {
        return Ok(base);
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken(candidate.clone()).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Rust for Beginners!! "), "rust-for-beginners");
        assert_eq!(slugify("C++ / Systems"), "c-systems");
        assert_eq!(slugify("***"), "item");
    }

    #[tokio::test]
    async fn unique_slug_appends_counter() {
        let existing = ["python", "python-1"];
        let slug = unique_slug("Python", |candidate| async move {
            Ok::<_, std::convert::Infallible>(existing.contains(&candidate.as_str()))
        })
        .await
        .unwrap();
        assert_eq!(slug, "python-2");
    }
}
