use super::*;

impl Default for JuicenetConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://jbv1-api.emotorwerks.com".to_string(),
            client_device_id: "juicenet-influxdb".to_string(),
            request_timeout_secs: 30,
            plot_intervals: 1_000_000,
        }
    }
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            username: String::new(),
            password: String::new(),
            database: "juicenet".to_string(),
            ssl: true,
            gzip: true,
            verify_ssl: true,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            timezone: "US/Eastern".to_string(),
            max_gap_seconds: crate::merge::DEFAULT_MAX_GAP_SECONDS,
            checkpoint_file: "last_run.txt".to_string(),
            fetch_power_samples: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/juicesync.log".to_string(),
            backup_count: 5,
            file_output: true,
            console_output: true,
            json_format: false,
        }
    }
}
