//! Traceability code minting.
//!
//! Codes are assigned exactly once, at first persistence, and never
//! regenerated. Uniqueness comes from the millisecond timestamp plus a
//! random suffix, backed by a unique index on the column.

use chrono::Utc;
use rand::Rng;

fn rand_suffix() -> u32 {
    rand::rng().random_range(0..1000)
}

/// Mint a batch code: `BATCH-{millis}-{rand}`.
pub fn batch_code() -> String {
    format!("BATCH-{}-{}", Utc::now().timestamp_millis(), rand_suffix())
}

/// Mint a package code: `PKG-{batch_id}-{millis}-{rand}`.
pub fn package_code(batch_id: i32) -> String {
    format!(
        "PKG-{batch_id}-{}-{}",
        Utc::now().timestamp_millis(),
        rand_suffix()
    )
}

/// Tracking URL embedded in a package's QR payload.
pub fn tracking_url(base_url: &str, package_id: i32) -> String {
    format!("{}/package/{package_id}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_code_shape() {
        let code = batch_code();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts[0], "BATCH");
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].parse::<u32>().unwrap() < 1000);
    }

    #[test]
    fn package_code_embeds_batch_id() {
        let code = package_code(17);
        assert!(code.starts_with("PKG-17-"));
    }

    #[test]
    fn tracking_url_embeds_package_id() {
        assert_eq!(
            tracking_url("https://traceability-app.com/", 5),
            "https://traceability-app.com/package/5"
        );
    }
}
