//! Timezone selection for GQI sessions.

/// Host value asking for the local timezone.
pub const BROWSER: &str = "browser";

/// Timezone to send to the agent for a requested `timezone`.
///
/// Empty and `browser` resolve to the local timezone; any other value is
/// passed through.
#[must_use]
pub fn resolve(requested: &str, configured: Option<&str>) -> String {
    if requested.is_empty() || requested == BROWSER {
        local_timezone(configured)
    } else {
        requested.to_string()
    }
}

/// Name of the local timezone.
///
/// Tries the configured name, `TZ`, the system setting and falls back to
/// `UTC`.
#[must_use]
pub fn local_timezone(configured: Option<&str>) -> String {
    pick(
        configured,
        std::env::var("TZ").ok(),
        iana_time_zone::get_timezone().ok(),
    )
}

fn pick(configured: Option<&str>, env: Option<String>, system: Option<String>) -> String {
    configured
        .filter(|tz| !tz.is_empty())
        .map(str::to_string)
        .or_else(|| from_env(env))
        .or_else(|| system.filter(|tz| !tz.is_empty()))
        .unwrap_or_else(|| "UTC".to_string())
}

fn from_env(tz: Option<String>) -> Option<String> {
    // POSIX allows a leading colon.
    tz.map(|tz| tz.trim_start_matches(':').to_string())
        .filter(|tz| !tz.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_timezone_passes_through() {
        assert_eq!(resolve("Europe/Brussels", Some("UTC")), "Europe/Brussels");
    }

    #[test]
    fn test_browser_uses_configured() {
        assert_eq!(resolve(BROWSER, Some("America/New_York")), "America/New_York");
        assert_eq!(resolve("", Some("Asia/Tokyo")), "Asia/Tokyo");
    }

    #[test]
    fn test_local_timezone_is_never_empty() {
        assert!(!local_timezone(None).is_empty());
        assert!(!local_timezone(Some("")).is_empty());
    }

    #[test]
    fn test_lookup_order() {
        let system = || Some("Asia/Tokyo".to_string());
        assert_eq!(pick(Some("UTC"), Some("Europe/Paris".into()), system()), "UTC");
        assert_eq!(pick(None, Some("Europe/Paris".into()), system()), "Europe/Paris");
        assert_eq!(pick(Some(""), None, system()), "Asia/Tokyo");
        assert_eq!(pick(None, Some(":".into()), system()), "Asia/Tokyo");
        assert_eq!(pick(None, None, Some(String::new())), "UTC");
        assert_eq!(pick(None, None, None), "UTC");
    }

    #[test]
    fn test_env_colon_prefix() {
        assert_eq!(from_env(Some(":Europe/Paris".into())).as_deref(), Some("Europe/Paris"));
        assert!(from_env(Some(String::new())).is_none());
        assert!(from_env(None).is_none());
    }
}
