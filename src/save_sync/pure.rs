// Remote key construction
//
// canonical: <identity>/<prefix>.zip
// upload:    <identity>/<prefix>/upl_<MM_dd-mm_ss>.zip
//
// Identity and prefix never contain '/', so an upload key always has one
// more path segment than the canonical key.

use chrono::{DateTime, Local};

/// Matches the `MM_dd-mm_ss` stamps already present in existing buckets
pub fn timestamp_label(at: &DateTime<Local>) -> String {
    at.format("%m_%d-%M_%S").to_string()
}

/// The fixed object downloads read from
pub fn canonical_key(identity: &str, prefix: &str) -> String {
    format!("{}/{}.zip", identity, prefix)
}

/// A fresh object name for one upload
pub fn upload_key(identity: &str, prefix: &str, at: &DateTime<Local>) -> String {
    format!("{}/{}/upl_{}.zip", identity, prefix, timestamp_label(at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn test_timestamp_label_format() {
        assert_eq!(timestamp_label(&at(15, 9, 26)), "03_14-09_26");
    }

    #[test]
    fn test_canonical_key() {
        assert_eq!(
            canonical_key("76561198000000000", "world1"),
            "76561198000000000/world1.zip"
        );
    }

    #[test]
    fn test_same_tick_same_key_next_tick_new_key() {
        let t = at(12, 30, 0);
        assert_eq!(upload_key("id", "world1", &t), upload_key("id", "world1", &t));
        assert_ne!(
            upload_key("id", "world1", &t),
            upload_key("id", "world1", &(t + Duration::seconds(1)))
        );
    }

    #[test]
    fn test_upload_key_never_canonical() {
        // Prefixes shaped like an upload stamp still can't collide
        for prefix in ["world1", "upl_03_14-09_26", ""] {
            let upload = upload_key("id", prefix, &at(15, 9, 26));
            assert_ne!(upload, canonical_key("id", prefix));
            assert!(upload.contains(prefix));
        }
    }
}
