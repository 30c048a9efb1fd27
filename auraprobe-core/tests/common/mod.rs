// Stub Salesforce site shared by the core integration tests

#![allow(dead_code)]

use auraprobe_core::Auditor;
use auraprobe_scanner::{Target, TransportConfig};
use serde_json::{Value, json};
use wiremock::{
    Match, Mock, MockServer, Request, ResponseTemplate,
    matchers::{method, path},
};

pub const ENDPOINT_PATH: &str = "/s/sfsites/aura";

pub const LANDING_PAGE: &str = r#"<html><script>
var cfg = {"fwuid":"fw-stub","app":"siteforce:communityApp",
"loaded":{"APPLICATION@markup://siteforce:communityApp":"stub-hash"}};
</script></html>"#;

/// Params of the single action inside the form-encoded `message` field.
pub fn action(request: &Request) -> Option<Value> {
    let message = url::form_urlencoded::parse(&request.body)
        .find(|(key, _)| key == "message")?
        .1
        .into_owned();
    let envelope: Value = serde_json::from_str(&message).ok()?;
    Some(envelope["actions"][0].clone())
}

/// Matches the discovery probe: a POST without the action query string.
pub struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

/// Matches an action by the tail of its descriptor, e.g. `getItems`.
pub struct ActionNamed(pub &'static str);

impl Match for ActionNamed {
    fn matches(&self, request: &Request) -> bool {
        action(request)
            .and_then(|a| a["descriptor"].as_str().map(|d| d.ends_with(self.0)))
            .unwrap_or(false)
    }
}

/// Matches `getItems` for one object and, optionally, one page.
pub struct ItemsPage {
    pub object: &'static str,
    pub page: Option<u64>,
}

impl Match for ItemsPage {
    fn matches(&self, request: &Request) -> bool {
        let Some(action) = action(request) else {
            return false;
        };
        let params = &action["params"];
        params["entityNameOrId"] == self.object
            && self
                .page
                .is_none_or(|page| params["currentPage"].as_u64() == Some(page))
    }
}

pub fn records(count: usize, prefix: &str) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"record": {"Id": format!("{}{:06}", prefix, i), "Name": format!("row {}", i)}}))
        .collect()
}

pub fn success(return_value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "actions": [{"id": "pwn", "state": "SUCCESS", "returnValue": return_value, "error": []}]
    }))
}

pub fn page_of(records: Vec<Value>, total: usize) -> ResponseTemplate {
    success(json!({"result": records, "totalCount": total}))
}

pub fn action_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "actions": [{"id": "pwn", "state": "ERROR", "returnValue": null, "error": [{"message": message}]}]
    }))
}

/// Mount discovery and bootstrap stubs and return an auditor ready to send
/// actions to the stub endpoint.
pub async fn ready_auditor(server: &MockServer) -> Auditor {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(NoQuery)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"event":{"descriptor":"markup://aura:invalidSession"}}"#),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LANDING_PAGE))
        .mount(server)
        .await;

    let target = Target::parse(&server.uri()).unwrap();
    let mut auditor = Auditor::new(target, &TransportConfig::default()).unwrap();
    assert!(auditor.find_endpoint().await.is_some());
    assert!(auditor.load_context().await.is_some());
    auditor
}

pub fn items_mock(object: &'static str, page: Option<u64>, response: ResponseTemplate) -> Mock {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(ActionNamed("getItems"))
        .and(ItemsPage { object, page })
        .respond_with(response)
}
