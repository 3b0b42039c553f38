/// Helper utilities for the backrest CLI

/// Mask a credential for display, keeping nothing recoverable
pub fn mask_secret(value: &str) -> &'static str {
    if value.is_empty() {
        "<not set>"
    } else {
        "****"
    }
}

/// True for configuration keys whose values must never be printed
pub fn is_sensitive_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    upper.contains("PASSWORD") || upper.contains("SECRET") || upper.contains("KEY")
}
