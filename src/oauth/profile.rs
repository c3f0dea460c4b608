// src/oauth/profile.rs
//! Normalizes provider user-info payloads into a single profile shape.

use serde::Deserialize;

/// Fields we care about in any provider payload
#[derive(Debug, Clone, Default, Deserialize)]
struct RawProfile {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    /// GitHub `/user/emails`
    #[serde(default)]
    verified: Option<bool>,
    /// Google userinfo
    #[serde(default)]
    verified_email: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Trimmed and lowercased
    pub email: String,
    pub name: Option<String>,
}

/// Accepts either a single profile object or an array of them (GitHub
/// `/user/emails`). The single-object shape is tried first. The first entry
/// with a non-empty email wins; entries the provider marks unverified are
/// skipped.
pub fn parse_profile(body: &[u8]) -> Option<ProviderProfile> {
    if let Ok(single) = serde_json::from_slice::<RawProfile>(body) {
        if let Some(profile) = to_profile(single) {
            return Some(profile);
        }
    }

    serde_json::from_slice::<Vec<RawProfile>>(body)
        .ok()?
        .into_iter()
        .find_map(to_profile)
}

fn to_profile(raw: RawProfile) -> Option<ProviderProfile> {
    if raw.verified == Some(false) || raw.verified_email == Some(false) {
        return None;
    }
    let email = raw.email?.trim().to_lowercase();
    if email.is_empty() {
        return None;
    }
    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Some(ProviderProfile { email, name })
}

/// Display name for a new account: the provider's name if it has one,
/// otherwise the local part of the email. Whitespace becomes `_` and
/// anything other than letters, digits, `_`, `-` and `.` is dropped.
pub fn display_name(profile: &ProviderProfile) -> String {
    let from_name = profile.name.as_deref().map(sanitize).unwrap_or_default();
    if !from_name.is_empty() {
        return from_name;
    }
    let local_part = profile.email.split('@').next().unwrap_or_default();
    let from_email = sanitize(local_part);
    if from_email.is_empty() {
        "user".to_string()
    } else {
        from_email
    }
}

fn sanitize(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(32)
        .collect()
}
