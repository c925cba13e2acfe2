use anyhow::Context as _;
use serde_json::{Value, json};
use std::time::Duration;

/// POST one JSON-RPC request to a stateless `/mcp` endpoint and return the response message.
///
/// The endpoint answers with an event stream that closes after the response, so the whole body
/// is read and the first JSON `data:` payload is returned.
pub async fn mcp_request(
    base_url: &str,
    id: u64,
    method: &str,
    params: Value,
    timeout_dur: Duration,
) -> anyhow::Result<Value> {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/mcp", base_url.trim_end_matches('/')))
        .header("Accept", "application/json, text/event-stream")
        .header("Content-Type", "application/json")
        .json(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .send()
        .await
        .context("POST /mcp")?
        .error_for_status()
        .context("POST /mcp status")?;

    let is_json = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let body = tokio::time::timeout(timeout_dur, resp.text())
        .await
        .context("timeout reading /mcp response")?
        .context("read /mcp response")?;

    if is_json {
        return serde_json::from_str(&body).context("parse /mcp JSON response");
    }
    first_event_stream_json_message(&body)
}

fn first_event_stream_json_message(body: &str) -> anyhow::Result<Value> {
    let mut data_lines: Vec<&str> = Vec::new();
    for line in body.lines().chain(std::iter::once("")) {
        let line = line.trim_end();
        if line.is_empty() {
            if !data_lines.is_empty() {
                let data = data_lines.join("\n");
                data_lines.clear();
                if let Ok(v) = serde_json::from_str::<Value>(&data)
                    && v.get("jsonrpc").is_some()
                {
                    return Ok(v);
                }
            }
            continue;
        }
        if let Some(v) = line.strip_prefix("data:") {
            let v = v.trim();
            if !v.is_empty() {
                data_lines.push(v);
            }
        }
    }

    anyhow::bail!("event-stream ended without a JSON-RPC message")
}

/// Parse `result.content[0].text` of a `tools/call` response as JSON.
///
/// # Errors
///
/// Returns an error if the message is not a successful tool result with JSON text content.
pub fn tool_call_text_json(msg: &Value) -> anyhow::Result<Value> {
    let text = msg
        .get("result")
        .context("tools/call missing result")?
        .get("content")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("text"))
        .and_then(Value::as_str)
        .context("tools/call missing result.content[0].text")?;
    serde_json::from_str(text).context("tools/call text is not JSON")
}
