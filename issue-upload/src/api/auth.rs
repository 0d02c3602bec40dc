//! Salesforce session login
//!
//! Uses the partner SOAP `login` call, which only needs a username,
//! password and security token (no connected app). The returned session id
//! is then used as a bearer token against the REST API.

use quick_xml::escape::escape;

use super::error::ApiError;

/// Credentials and endpoint selection for the login call
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
    pub security_token: String,
    /// Log in against test.salesforce.com instead of login.salesforce.com
    pub sandbox: bool,
    /// API version, e.g. "38.0"
    pub version: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("security_token", &"<redacted>")
            .field("sandbox", &self.sandbox)
            .field("version", &self.version)
            .finish()
    }
}

/// An authenticated session, reused for every call of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    /// Instance host, e.g. "eu12.salesforce.com"
    pub instance: String,
    pub version: String,
}

/// Open a session with the given credentials
pub async fn login(
    http: &reqwest::Client,
    credentials: &LoginCredentials,
) -> Result<Session, ApiError> {
    let url = login_url(credentials.sandbox, &credentials.version);
    let body = login_envelope(
        &credentials.username,
        &format!("{}{}", credentials.password, credentials.security_token),
    );

    log::debug!("logging in as {} via {}", credentials.username, url);

    let response = http
        .post(&url)
        .header("Content-Type", "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(parse_login_fault(&text));
    }

    let (session_id, server_url) = parse_login_response(&text)?;
    let instance = instance_from_server_url(&server_url).ok_or_else(|| {
        ApiError::InvalidResponse(format!("login returned unusable serverUrl '{}'", server_url))
    })?;

    log::info!("logged in to instance {}", instance);

    Ok(Session {
        session_id,
        instance,
        version: credentials.version.clone(),
    })
}

fn login_url(sandbox: bool, version: &str) -> String {
    let domain = if sandbox { "test" } else { "login" };
    format!("https://{}.salesforce.com/services/Soap/u/{}", domain, version)
}

fn login_envelope(username: &str, password: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope
        xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
        xmlns:urn="urn:partner.soap.sforce.com">
    <env:Header>
        <urn:CallOptions>
            <urn:client>issue-upload</urn:client>
            <urn:defaultNamespace>sf</urn:defaultNamespace>
        </urn:CallOptions>
    </env:Header>
    <env:Body>
        <n1:login xmlns:n1="urn:partner.soap.sforce.com">
            <n1:username>{}</n1:username>
            <n1:password>{}</n1:password>
        </n1:login>
    </env:Body>
</env:Envelope>"#,
        escape(username),
        escape(password)
    )
}

/// Text of the first element with the given local name
fn element_text(doc: &roxmltree::Document, name: &str) -> Option<String> {
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
}

/// Extract (sessionId, serverUrl) from a successful login response
fn parse_login_response(body: &str) -> Result<(String, String), ApiError> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| ApiError::InvalidResponse(format!("login response is not XML: {}", e)))?;

    let session_id = element_text(&doc, "sessionId")
        .ok_or_else(|| ApiError::InvalidResponse("login response has no sessionId".into()))?;
    let server_url = element_text(&doc, "serverUrl")
        .ok_or_else(|| ApiError::InvalidResponse("login response has no serverUrl".into()))?;

    Ok((session_id, server_url))
}

/// Turn a SOAP fault into an authentication error
fn parse_login_fault(body: &str) -> ApiError {
    let (code, message) = match roxmltree::Document::parse(body) {
        Ok(doc) => (
            element_text(&doc, "exceptionCode")
                .or_else(|| element_text(&doc, "faultcode"))
                .unwrap_or_else(|| "UNKNOWN_EXCEPTION".to_string()),
            element_text(&doc, "exceptionMessage")
                .or_else(|| element_text(&doc, "faultstring"))
                .unwrap_or_else(|| body.trim().to_string()),
        ),
        Err(_) => ("UNKNOWN_EXCEPTION".to_string(), body.trim().to_string()),
    };
    ApiError::Authentication { code, message }
}

fn instance_from_server_url(server_url: &str) -> Option<String> {
    let url = reqwest::Url::parse(server_url).ok()?;
    url.host_str().map(|h| h.to_string())
}
