//! Maps each upstream's JSON schema into the canonical `StatusResult`.

use super::errors::StatusError;
use super::motd::{self, MotdNode};
use blockpulse_config::UpstreamSchema;
use blockpulse_models::{ServerQuery, StatusResult};
use serde_json::Value;

type Result<T> = std::result::Result<T, StatusError>;

/// Decodes a raw upstream body with the decoder matching the source's
/// configured schema. The icon reference is attached later by the service.
pub fn normalize(body: &[u8], schema: UpstreamSchema, query: &ServerQuery) -> Result<StatusResult> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| StatusError::malformed(format!("invalid JSON: {}", err), body))?;

    let mut status = match schema {
        UpstreamSchema::Simple => decode_simple(&value, body)?,
        UpstreamSchema::Rich => decode_rich(&value, body)?,
    };

    // Always echo the queried address so offline servers still show
    // connection details.
    status.server_address = Some(query.address.clone());
    status.fill_offline_defaults();

    Ok(status)
}

/// Flat schema: `online`, nested `players.online/max/list`, a `motd` object
/// with parallel `html` and `clean` line arrays.
fn decode_simple(value: &Value, raw: &[u8]) -> Result<StatusResult> {
    let online = value
        .get("online")
        .and_then(Value::as_bool)
        .ok_or_else(|| StatusError::malformed("missing 'online' field", raw))?;

    let mut status = StatusResult {
        online,
        ..Default::default()
    };

    if let Some(players) = value.get("players") {
        status.players_online = players.get("online").and_then(as_count);
        status.players_max = players.get("max").and_then(as_count);
        status.player_list = players.get("list").map(player_names);
    }

    status.version = value.get("version").map(version_name);

    if let Some(motd) = value.get("motd") {
        let html_lines = string_lines(motd.get("html"));
        let clean_lines = string_lines(motd.get("clean"));
        if let Some(lines) = &html_lines {
            status.motd_html = Some(lines.join("<br>"));
        }
        if let Some(lines) = clean_lines {
            status.motd = Some(lines.join(" "));
        } else if let Some(lines) = html_lines {
            status.motd = Some(strip_tags(&lines.join(" ")));
        }
    }

    status.hostname = value
        .get("hostname")
        .and_then(Value::as_str)
        .map(str::to_string);
    status.ip_address = value.get("ip").and_then(Value::as_str).map(str::to_string);

    Ok(status)
}

/// Rich schema: `motd` is a recursive styled node tree (an object, or a JSON
/// string encoding one, or a flat legacy-coded string); version and player
/// entries may be strings or objects.
fn decode_rich(value: &Value, raw: &[u8]) -> Result<StatusResult> {
    let online = value
        .get("online")
        .and_then(Value::as_bool)
        .ok_or_else(|| StatusError::malformed("missing 'online' field", raw))?;

    let mut status = StatusResult {
        online,
        ..Default::default()
    };

    if let Some(players) = value.get("players") {
        status.players_online = players.get("online").and_then(as_count);
        status.players_max = players.get("max").and_then(as_count);
        status.player_list = players.get("list").map(player_names);
    }

    status.version = value
        .get("version")
        .map(version_name)
        .filter(|name| !name.is_empty());

    if let Some(motd) = value.get("motd") {
        let decoded = match motd {
            Value::Object(_) => {
                let node: MotdNode = serde_json::from_value(motd.clone()).map_err(|err| {
                    StatusError::malformed(format!("invalid MOTD node tree: {}", err), raw)
                })?;
                Some(motd::decode_tree(&node))
            }
            Value::String(text) => {
                // A string MOTD is either a JSON-encoded node tree or flat
                // text with legacy codes.
                match serde_json::from_str::<MotdNode>(text) {
                    Ok(node) => Some(motd::decode_tree(&node)),
                    Err(_) => Some(motd::decode_legacy(text)),
                }
            }
            _ => None,
        };
        if let Some(decoded) = decoded {
            status.motd = Some(decoded.plain);
            status.motd_html = Some(decoded.html);
        }
    }

    status.hostname = value
        .get("hostname")
        .and_then(Value::as_str)
        .map(str::to_string);
    status.ip_address = value
        .get("ip")
        .or_else(|| value.get("ip_address"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(status)
}

/// Counts are clamped at zero; upstreams occasionally report -1 for unknown.
fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            let n = number.as_i64()?;
            Some(n.max(0) as u32)
        }
        _ => None,
    }
}

/// Player list entries arrive as strings, as `{name}` objects, or as one
/// comma-delimited string.
fn player_names(value: &Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.clone()),
                Value::Object(map) => map
                    .get("name")
                    .or_else(|| map.get("name_clean"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        Value::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn version_name(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("name_clean"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        other => other.to_string(),
    }
}

fn string_lines(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|lines| {
        lines
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// Drops HTML tags when only the html MOTD variant is available and a plain
/// fallback is needed.
fn strip_tags(html: &str) -> String {
    let mut plain = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            other if !in_tag => plain.push(other),
            _ => {}
        }
    }
    plain
}
