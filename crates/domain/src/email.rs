//! Email shape check shared by trainers and clients.

/// Loose structural check: one `@`, a non-empty local part and a dotted
/// domain, no whitespace. Deliverability is not our concern.
pub(crate) fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
