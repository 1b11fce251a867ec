use super::*;
use std::collections::HashMap;

/// Parse `key = value` lines; lines without exactly one `=` are ignored
pub fn parse_key_value(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('=').collect();
            match fields.as_slice() {
                [key, value] => Some((key.trim().to_string(), value.trim().to_string())),
                _ => None,
            }
        })
        .collect()
}

fn required(map: &HashMap<String, String>, file: &str, key: &str) -> Result<String> {
    map.get(key).cloned().ok_or_else(|| {
        JuicesyncError::config(format!("Missing key '{}' in {} config", key, file))
    })
}

pub(super) fn config_from_maps(
    juicenet: &HashMap<String, String>,
    influx: &HashMap<String, String>,
) -> Result<Config> {
    let port_raw = required(influx, "influx", "port")?;
    let port = port_raw
        .parse::<u16>()
        .map_err(|e| JuicesyncError::validation("influx.port", format!("{}: {}", port_raw, e)))?;

    let mut config = Config::default();
    config.juicenet.api_key = required(juicenet, "juicenet", "api_key")?;
    config.location.general = required(juicenet, "juicenet", "location_general")?;
    config.location.specific = required(juicenet, "juicenet", "location_specific")?;

    config.influx.host = required(influx, "influx", "url")?;
    config.influx.port = port;
    config.influx.username = required(influx, "influx", "username")?;
    config.influx.password = required(influx, "influx", "password")?;
    config.influx.database = required(influx, "influx", "database")?;
    Ok(config)
}
