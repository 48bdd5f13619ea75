use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::auth;
use super::{ProblemStore, StoredProblem};
use crate::error::{Result, SyncError};
use crate::parser::Problem;
use crate::settings::ServiceAccount;

const DEFAULT_UNIVERSE: &str = "googleapis.com";
const PAGE_SIZE: &str = "300";
// The emulator accepts this fixed token and skips IAM checks
const EMULATOR_TOKEN: &str = "owner";

/// Firestore REST (v1) client bound to one project's default database.
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    /// Build a client from service account settings. Against the emulator
    /// no token exchange happens.
    pub fn connect(account: &ServiceAccount, emulator_host: Option<&str>) -> Result<Self> {
        let client = Client::new();
        let project_id = account.project_id()?.to_string();

        if let Some(host) = emulator_host {
            info!("Using Firestore emulator at {}", host);
            let base_url = format!("http://{}/v1", host);
            return Ok(Self::with_endpoint(client, base_url, project_id, EMULATOR_TOKEN.to_string()));
        }

        let creds = account.signing()?;
        let token = auth::fetch_access_token(&client, &creds)?;
        let universe = account
            .universe_domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_UNIVERSE);
        let base_url = format!("https://firestore.{}/v1", universe);
        info!(project_id = %project_id, "Connected to Firestore");
        Ok(Self::with_endpoint(client, base_url, project_id, token))
    }

    pub fn with_endpoint(client: Client, base_url: String, project_id: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            token,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, collection
        )
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| SyncError::store(format!("{}: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(SyncError::store(format!("{}: HTTP {}: {}", what, status, body.trim())))
    }
}

impl ProblemStore for FirestoreStore {
    fn list(&self, collection: &str) -> Result<Vec<StoredProblem>> {
        let url = self.collection_url(collection);
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: ListResponse = self
                .send(request, "list documents")?
                .json()
                .map_err(|e| SyncError::store(format!("malformed list response: {}", e)))?;

            debug!(collection, documents = page.documents.len(), "Listed page");
            out.extend(page.documents.iter().map(decode_document));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(out)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = format!("{}/{}", self.collection_url(collection), id);
        self.send(self.client.delete(&url), "delete document")?;
        Ok(())
    }

    fn insert(&self, collection: &str, problem: &Problem) -> Result<String> {
        let request = self
            .client
            .post(self.collection_url(collection))
            .json(&encode_problem(problem));
        let doc: Document = self
            .send(request, "create document")?
            .json()
            .map_err(|e| SyncError::store(format!("malformed create response: {}", e)))?;
        Ok(document_id(&doc.name).to_string())
    }
}

/// Problem → Firestore document body with typed string values.
pub fn encode_problem(problem: &Problem) -> Value {
    json!({
        "fields": {
            "topic": { "stringValue": problem.topic },
            "question": { "stringValue": problem.question },
            "link": { "stringValue": problem.link },
        }
    })
}

fn decode_document(doc: &Document) -> StoredProblem {
    let field = |name: &str| -> String {
        doc.fields
            .get(name)
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    StoredProblem {
        id: document_id(&doc.name).to_string(),
        problem: Problem {
            topic: field("topic"),
            question: field("question"),
            link: field("link"),
        },
    }
}

/// Last path segment of a full document name.
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
