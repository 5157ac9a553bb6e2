//! Deterministic unique-identifier generation.

/// Default identifier namespace for this layer.
pub const DOMAIN: &str = "hausbus";

/// Derive a stable unique identifier from a channel address.
///
/// The result only depends on its inputs, so the same device and
/// channel map to the same identifier across process restarts.
pub fn generate_unique_id(domain: &str, address: &str) -> String {
    let sanitized: String = address
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{domain}_{sanitized}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_is_deterministic() {
        let a = generate_unique_id(DOMAIN, "VCU1234567:4");
        let b = generate_unique_id(DOMAIN, "VCU1234567:4");
        assert_eq!(a, b);
        assert_eq!(a, "hausbus_vcu1234567_4");
    }

    #[test]
    fn test_unique_id_differs_per_channel() {
        assert_ne!(
            generate_unique_id(DOMAIN, "VCU1234567:4"),
            generate_unique_id(DOMAIN, "VCU1234567:5")
        );
    }
}
