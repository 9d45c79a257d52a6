//! Mock MISP instance built on wiremock

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::MOCK_API_KEY;

/// Attribute JSON as MISP returns it (string event ids)
pub fn attribute(value: &str, event_id: u64) -> Value {
    json!({
        "id": format!("{}", event_id * 100),
        "type": "sha256",
        "category": "Payload delivery",
        "to_ids": true,
        "value": value,
        "event_id": event_id.to_string(),
    })
}

/// `count` attributes for `page`, values `<type>-p<page>-<i>`
pub fn page_of(type_attribute: &str, page: u32, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| attribute(&format!("{type_attribute}-p{page}-{i}"), u64::from(page)))
        .collect()
}

/// Answer `page` of a `type_attribute` search with the enveloped `attributes`
pub async fn mount_page(
    server: &MockServer,
    type_attribute: &str,
    page: u32,
    attributes: Vec<Value>,
) {
    Mock::given(method("POST"))
        .and(path("/attributes/restSearch"))
        .and(header("Authorization", MOCK_API_KEY))
        .and(body_partial_json(json!({"type": type_attribute, "page": page})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": {"Attribute": attributes}})),
        )
        .mount(server)
        .await;
}

/// Fail `page` of a `type_attribute` search with HTTP `status`
pub async fn mount_failing_page(server: &MockServer, type_attribute: &str, page: u32, status: u16) {
    Mock::given(method("POST"))
        .and(path("/attributes/restSearch"))
        .and(body_partial_json(json!({"type": type_attribute, "page": page})))
        .respond_with(ResponseTemplate::new(status).set_body_string("Internal Server Error"))
        .mount(server)
        .await;
}

/// Page numbers the server has been asked for, sorted
pub async fn requested_pages(server: &MockServer, type_attribute: &str) -> Vec<u64> {
    let mut pages: Vec<u64> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
        .filter(|body| body["type"] == type_attribute)
        .filter_map(|body| body["page"].as_u64())
        .collect();
    pages.sort_unstable();
    pages
}

/// Sorted lines of a written list file
pub fn sorted_lines(path: &std::path::Path) -> Vec<String> {
    let mut lines: Vec<String> = std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}
