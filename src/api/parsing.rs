use serde_json::Value;

use crate::errors::BotError;
use crate::slack::command_parser::{SlackCommandEvent, decode_url_component, parse_form_data};

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

/// Request path from an API Gateway v2 (`rawPath`) or v1 (`path`) event.
pub fn request_path(payload: &Value) -> Option<&str> {
    v_str(payload, &["rawPath"]).or_else(|| v_str(payload, &["path"]))
}

/// Query parameter from `rawQueryString`, falling back to `queryStringParameters`.
pub fn query_param(payload: &Value, name: &str) -> Option<String> {
    let from_raw = v_str(payload, &["rawQueryString"]).and_then(|q| {
        q.split('&').find_map(|kv| {
            let (key, value) = kv.split_once('=')?;
            if key == name {
                decode_url_component(value).ok()
            } else {
                None
            }
        })
    });

    from_raw
        .or_else(|| v_str(payload, &["queryStringParameters", name]).map(ToString::to_string))
        .filter(|v| !v.is_empty())
}

/// Cookie value from the v2 `cookies` array or the v1 `Cookie` header.
pub fn cookie_value(payload: &Value, name: &str) -> Option<String> {
    let mut pairs: Vec<&str> = payload
        .get("cookies")
        .and_then(Value::as_array)
        .map(|cookies| cookies.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if let Some(header) = payload.get("headers").and_then(|h| get_header_value(h, "Cookie")) {
        pairs.extend(header.split(';'));
    }

    pairs.into_iter().find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

pub fn parse_slack_event(payload: &str) -> Result<SlackCommandEvent, BotError> {
    parse_form_data(payload)
        .map_err(|e| BotError::ParseError(format!("Failed to parse form data: {e}")))
}
