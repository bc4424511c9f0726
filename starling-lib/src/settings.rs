use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime-tunable knobs. Held in `GLOBALS.settings` behind a RwLock;
/// subsystems re-read on use so changes take effect on the fly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Host name of this instance, punycode. Never a valid limit target.
    pub instance_host: String,
    /// Preferred languages of this instance, best first.
    pub instance_languages: Vec<String>,

    // Remote fetch
    pub fetch_connect_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Size ceiling for remote media attachments, bytes.
    pub media_max_bytes: u64,
    /// Size ceiling for remote emoji images, bytes.
    pub emoji_max_bytes: u64,
    /// Base directory for locally cached artefact bytes.
    pub media_base_dir: PathBuf,
    /// Remote media untouched for this long becomes a candidate for
    /// uncaching by the cleaner.
    pub media_remote_cache_days: u64,

    // Timeline caches
    pub timeline_capacity: usize,
    pub boost_dedup_window: usize,
    pub home_timeline_ttl_secs: u64,
    pub list_timeline_ttl_secs: u64,
    pub tag_timeline_ttl_secs: u64,

    // Filter caches
    pub mute_cache_capacity: u64,
    pub mute_cache_ttl_secs: u64,
    pub domain_limit_cache_capacity: u64,

    // Worker queue
    pub worker_count: usize,
    pub worker_queue_capacity: usize,
    pub worker_shutdown_deadline_secs: u64,

    // Surfaces
    pub rss_feed_length: usize,
    pub robots_deny_nodeinfo: bool,
}

impl Settings {
    /// Load settings from a JSON document; missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Settings, crate::error::Error> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        let defaults = serde_json::to_value(Settings::default())?;
        if let (Some(map), Some(default_map)) = (value.as_object_mut(), defaults.as_object()) {
            for (key, default) in default_map {
                map.entry(key.clone()).or_insert_with(|| default.clone());
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl Default for Settings {
    fn default() -> Settings {
        let media_base_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("starling")
            .join("media");

        Settings {
            instance_host: "localhost".to_owned(),
            instance_languages: vec!["en".to_owned()],
            fetch_connect_timeout_secs: 15,
            fetch_timeout_secs: 60,
            media_max_bytes: 40 * 1024 * 1024,
            emoji_max_bytes: 100 * 1024,
            media_base_dir,
            media_remote_cache_days: 7,
            timeline_capacity: 800,
            boost_dedup_window: 40,
            home_timeline_ttl_secs: 30 * 60,
            list_timeline_ttl_secs: 30 * 60,
            tag_timeline_ttl_secs: 10 * 60,
            mute_cache_capacity: 50_000,
            mute_cache_ttl_secs: 5 * 60,
            domain_limit_cache_capacity: 10_000,
            worker_count: 4,
            worker_queue_capacity: 1024,
            worker_shutdown_deadline_secs: 30,
            rss_feed_length: 20,
            robots_deny_nodeinfo: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json_partial_overrides() {
        let settings = Settings::from_json(
            r#"{"instance_host": "fedi.example", "worker_count": 8}"#,
        )
        .unwrap();
        assert_eq!(settings.instance_host, "fedi.example");
        assert_eq!(settings.worker_count, 8);
        // Unstated fields keep their defaults.
        assert_eq!(settings.boost_dedup_window, 40);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(Settings::from_json("not json").is_err());
    }
}
