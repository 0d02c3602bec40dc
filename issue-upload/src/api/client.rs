//! Salesforce REST client
//!
//! One `reqwest::Client` and one session per run. Calls are issued one at a
//! time by the caller; there is no retry or rate limiting here.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::auth::{self, LoginCredentials, Session};
use super::error::ApiError;
use super::query::Query;
use super::store::{Record, RecordStore};

/// One page of a query result
#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(rename = "totalSize", default)]
    total_size: usize,
    done: bool,
    #[serde(default)]
    records: Vec<Record>,
    #[serde(rename = "nextRecordsUrl")]
    next_records_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SalesforceClient {
    http: reqwest::Client,
    session: Session,
}

impl SalesforceClient {
    /// Log in and build a client bound to the resulting session
    pub async fn connect(credentials: &LoginCredentials) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("issue-upload/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let session = auth::login(&http, credentials).await?;
        Ok(Self { http, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn instance_url(&self) -> String {
        format!("https://{}", self.session.instance)
    }

    fn data_url(&self) -> String {
        format!(
            "{}/services/data/v{}",
            self.instance_url(),
            self.session.version
        )
    }

    fn query_url(&self, query: &Query) -> String {
        format!(
            "{}/query/?q={}",
            self.data_url(),
            urlencoding::encode(&query.to_soql())
        )
    }

    fn record_url(&self, object: &str, id: &str) -> String {
        format!(
            "{}/sobjects/{}/{}",
            self.data_url(),
            object,
            urlencoding::encode(id)
        )
    }

    async fn get_page(&self, url: &str) -> Result<QueryPage, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.session.session_id)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<QueryPage>().await?)
    }
}

/// Map a non-success response onto the error taxonomy
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    log::debug!("{} returned {}: {}", url, status, body);
    Err(ApiError::from_status(status.as_u16(), &url, &body))
}

#[async_trait]
impl RecordStore for SalesforceClient {
    async fn query_all(&self, query: &Query) -> Result<Vec<Record>, ApiError> {
        log::debug!("query: {}", query);

        let mut page = self.get_page(&self.query_url(query)).await?;
        let total = page.total_size;
        let mut records = std::mem::take(&mut page.records);

        while !page.done {
            let next = page.next_records_url.take().ok_or_else(|| {
                ApiError::InvalidResponse("query page not done but has no nextRecordsUrl".into())
            })?;
            page = self
                .get_page(&format!("{}{}", self.instance_url(), next))
                .await?;
            records.append(&mut page.records);
        }

        log::info!("query returned {} of {} records", records.len(), total);
        Ok(records)
    }

    async fn update(
        &self,
        object: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), ApiError> {
        let url = self.record_url(object, id);
        log::debug!("PATCH {} {}", url, Value::Object(fields.clone()));

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.session.session_id)
            .json(fields)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::query::Filter;

    fn client() -> SalesforceClient {
        SalesforceClient {
            http: reqwest::Client::new(),
            session: Session {
                session_id: "sid".into(),
                instance: "eu12.salesforce.com".into(),
                version: "38.0".into(),
            },
        }
    }

    #[test]
    fn test_record_url() {
        assert_eq!(
            client().record_url("Shopper_Inspection__c", "a3wD0000001DApaIAG"),
            "https://eu12.salesforce.com/services/data/v38.0/sobjects/Shopper_Inspection__c/a3wD0000001DApaIAG"
        );
    }

    #[test]
    fn test_query_url_is_encoded() {
        let query = Query::new("Account")
            .select(["Id"])
            .filter(Filter::gt("Name", "A&B"));
        assert_eq!(
            client().query_url(&query),
            "https://eu12.salesforce.com/services/data/v38.0/query/?q=SELECT%20Id%20FROM%20Account%20WHERE%20Name%20%3E%20%27A%26B%27"
        );
    }

    #[test]
    fn test_query_page_deserialization() {
        let body = r#"{
            "totalSize": 3,
            "done": false,
            "nextRecordsUrl": "/services/data/v38.0/query/01gD0000002HU6KIAW-2000",
            "records": [
                {"attributes": {"type": "Shopper_Inspection__c"}, "Id": "a1", "Shopper_Contract__c": "c1"},
                {"attributes": {"type": "Shopper_Inspection__c"}, "Id": "a2", "Shopper_Contract__c": null}
            ]
        }"#;
        let page: QueryPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_size, 3);
        assert!(!page.done);
        assert_eq!(page.records.len(), 2);
        assert_eq!(
            page.next_records_url.as_deref(),
            Some("/services/data/v38.0/query/01gD0000002HU6KIAW-2000")
        );
    }
}
