//! Phone number handling for mobile-money subscribers.
//!
//! The gateway identifies subscribers by their international number without a leading `+`, e.g. `254712345678`.
//! Tenants are often captured with the local form (`0712345678`), so lookups need to consider both.

/// Normalises a subscriber number to international form, digits only.
///
/// * Non-digit characters (spaces, dashes, a leading `+`) are dropped.
/// * A local leading `0` is replaced with `country_code`.
/// * A bare 9-digit subscriber number is prefixed with `country_code`.
///
/// Returns `None` if there are no digits at all.
pub fn normalize_phone(phone: &str, country_code: &str) -> Option<String> {
    let digits = phone.chars().filter(char::is_ascii_digit).collect::<String>();
    if digits.is_empty() {
        return None;
    }
    let normalized = if let Some(local) = digits.strip_prefix('0') {
        format!("{country_code}{local}")
    } else if digits.len() == 9 && !digits.starts_with(country_code) {
        format!("{country_code}{digits}")
    } else {
        digits
    };
    Some(normalized)
}

/// The forms a number might have been stored under: as given, international, and local (leading `0`).
/// Duplicates are removed; order is as listed.
pub fn phone_variants(phone: &str, country_code: &str) -> Vec<String> {
    let mut variants = vec![phone.trim().to_string()];
    if let Some(international) = normalize_phone(phone, country_code) {
        if let Some(subscriber) = international.strip_prefix(country_code) {
            variants.push(format!("0{subscriber}"));
            variants.push(format!("+{international}"));
        }
        variants.insert(1, international);
    }
    variants.retain(|v| !v.is_empty());
    let mut seen = Vec::with_capacity(variants.len());
    for v in variants {
        if !seen.contains(&v) {
            seen.push(v);
        }
    }
    seen
}
