//! Carrier gateway operations
//!
//! One engine for every carrier: each operation looks up its (carrier,
//! operation) descriptor in the registry and runs the shared request
//! pipeline - validate, normalize, merge into the endpoint's body template,
//! clean, encode, dispatch. Carrier differences live entirely in the
//! catalogue; this module has no per-carrier branches.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clean::clean_payload;
use crate::encode::encode_body;
use crate::error::{Error, Result};
use crate::http::{CarrierTransport, PreparedRequest};
use crate::merge::merge_template;
use crate::normalize::normalize_payload;
use crate::registry::{EndpointRegistry, RegisteredEndpoint};
use crate::validate::validate_request;

/// Operation names as they appear in catalogue documents.
pub mod operations {
    pub const AUTH: &str = "auth";
    pub const CREATE_RATE_QUOTE: &str = "createRateQuote";
    pub const CREATE_BILL_OF_LADING: &str = "createBillOfLading";
    pub const CREATE_PICKUP_REQUEST: &str = "createPickupRequest";
    pub const GET_SHIPMENT_HISTORY: &str = "getShipmentHistory";
    pub const DOWNLOAD_BOL_PDF: &str = "downloadBolPdf";
}

/// The gateway engine. Cheap to clone and share; the registry is immutable
/// and the transport is injected.
#[derive(Clone)]
pub struct CarrierGateway {
    registry: Arc<EndpointRegistry>,
    transport: Arc<dyn CarrierTransport>,
}

impl CarrierGateway {
    pub fn new(registry: Arc<EndpointRegistry>, transport: Arc<dyn CarrierTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Exchange credentials for a carrier token.
    ///
    /// Credentials are merged into the auth template as-is: no trimming or
    /// normalization, a password is opaque. The carrier's declared content
    /// type decides JSON versus form encoding.
    pub async fn authenticate(
        &self,
        carrier: &str,
        username: &str,
        password: &str,
    ) -> Result<Value> {
        let endpoint = self.require_endpoint(carrier, operations::AUTH)?;
        let credentials = json!({"username": username, "password": password});
        let body = match endpoint.blank_body() {
            Some(blank) => merge_template(&blank, &credentials),
            None => credentials,
        };
        let encoded = encode_body(&body, endpoint.config.content_type())?;

        let mut request =
            PreparedRequest::new(&endpoint.config.method, endpoint.config.require_url()?);
        request.headers = endpoint.config.headers.clone();
        request.body = Some(encoded);

        tracing::info!(carrier = %endpoint.config.carrier, "authenticating against carrier");
        self.transport.execute(request).await
    }

    pub async fn create_rate_quote(
        &self,
        carrier: &str,
        bearer: Option<&str>,
        payload: &Value,
    ) -> Result<Value> {
        self.execute_body_operation(carrier, operations::CREATE_RATE_QUOTE, bearer, payload)
            .await
    }

    pub async fn create_bill_of_lading(
        &self,
        carrier: &str,
        bearer: Option<&str>,
        payload: &Value,
    ) -> Result<Value> {
        self.execute_body_operation(carrier, operations::CREATE_BILL_OF_LADING, bearer, payload)
            .await
    }

    pub async fn create_pickup_request(
        &self,
        carrier: &str,
        bearer: Option<&str>,
        payload: &Value,
    ) -> Result<Value> {
        self.execute_body_operation(carrier, operations::CREATE_PICKUP_REQUEST, bearer, payload)
            .await
    }

    /// Query shipment history by correlation keys.
    ///
    /// Only parameters the endpoint declares are sent, so one canonical key
    /// map serves every carrier. At least one declared key must survive the
    /// filter. `interlinePro` travels as `interline-pro` on the wire.
    pub async fn get_shipment_history(
        &self,
        carrier: &str,
        bearer: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> Result<Value> {
        let endpoint = self.require_endpoint(carrier, operations::GET_SHIPMENT_HISTORY)?;

        let declared = endpoint.config.query_parameter_names();
        let query: Vec<(String, String)> = params
            .iter()
            .filter(|(name, value)| declared.contains(&name.as_str()) && !value.is_empty())
            .map(|(name, value)| (wire_param_name(name).to_string(), value.clone()))
            .collect();

        if query.is_empty() {
            return Err(Error::validation(
                "correlation",
                "at least one tracking identifier is required",
            ));
        }

        let mut request =
            PreparedRequest::new(&endpoint.config.method, endpoint.config.require_url()?);
        request.headers = endpoint.config.headers.clone();
        request.query = query;
        apply_bearer(&mut request, bearer);

        self.transport.execute(request).await
    }

    /// Fetch a generated BOL document by the `pdfUri` the carrier returned
    /// from bill-of-lading creation (XPO answers with a JSON envelope
    /// carrying the PDF base64-encoded).
    ///
    /// The catalogue entry holds only the carrier's document base URL; the
    /// relative URI is joined onto it here. Carriers without a
    /// `downloadBolPdf` entry answer not-found.
    pub async fn download_bol_pdf(
        &self,
        carrier: &str,
        bearer: Option<&str>,
        pdf_uri: &str,
    ) -> Result<Value> {
        let endpoint = self.require_endpoint(carrier, operations::DOWNLOAD_BOL_PDF)?;

        let uri = pdf_uri.trim();
        if uri.is_empty() {
            return Err(Error::validation("pdfUri", "a document URI is required"));
        }
        let base = endpoint.config.require_url()?.trim_end_matches('/');
        let url = if uri.starts_with('/') {
            format!("{base}{uri}")
        } else {
            format!("{base}/{uri}")
        };

        let mut request = PreparedRequest::new(&endpoint.config.method, url);
        request.headers = endpoint.config.headers.clone();
        apply_bearer(&mut request, bearer);

        tracing::debug!(carrier = %endpoint.config.carrier, uri, "fetching BOL document");
        self.transport.execute(request).await
    }

    async fn execute_body_operation(
        &self,
        carrier: &str,
        operation: &str,
        bearer: Option<&str>,
        payload: &Value,
    ) -> Result<Value> {
        let endpoint = self.require_endpoint(carrier, operation)?;

        validate_request(&endpoint.config.carrier, operation, payload)?;
        let normalized = normalize_payload(payload);
        let merged = match endpoint.blank_body() {
            Some(blank) => merge_template(&blank, &normalized),
            None => normalized,
        };
        let cleaned = clean_payload(&merged);
        let encoded = encode_body(&cleaned, endpoint.config.content_type())?;

        let mut request =
            PreparedRequest::new(&endpoint.config.method, endpoint.config.require_url()?);
        request.headers = endpoint.config.headers.clone();
        request.body = Some(encoded);
        apply_bearer(&mut request, bearer);

        tracing::debug!(
            carrier = %endpoint.config.carrier,
            operation,
            "dispatching carrier operation"
        );
        self.transport.execute(request).await
    }

    fn require_endpoint(&self, carrier: &str, operation: &str) -> Result<&RegisteredEndpoint> {
        self.registry.lookup(carrier, operation).ok_or_else(|| {
            Error::not_found(format!(
                "carrier {carrier} has no {operation} endpoint configured"
            ))
        })
    }
}

/// Catalogue key → wire parameter name.
fn wire_param_name(name: &str) -> &str {
    if name == "interlinePro" {
        "interline-pro"
    } else {
        name
    }
}

fn apply_bearer(request: &mut PreparedRequest, bearer: Option<&str>) {
    if let Some(token) = bearer {
        // A catalogue-configured Authorization header (XPO's Basic auth)
        // takes precedence.
        let configured = request
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("authorization"));
        if !configured {
            request
                .headers
                .insert("Authorization".to_string(), format!("Bearer {token}"));
        }
    }
}

/// Pull the bearer token out of a carrier auth response. Estes returns
/// `{token}`, XPO's OAuth flow returns `{access_token}`.
pub fn token_from_auth_response(response: &Value) -> Option<String> {
    let body = response.get("data").unwrap_or(response);
    for field in ["token", "access_token", "accessToken"] {
        if let Some(token) = body.get(field).and_then(Value::as_str) {
            if !token.trim().is_empty() {
                return Some(token.trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentType;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Transport double that records requests and replays scripted responses.
    struct ScriptedTransport {
        requests: Mutex<Vec<PreparedRequest>>,
        responses: Mutex<Vec<Result<Value>>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<Value>>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses),
            })
        }

        async fn recorded(&self) -> Vec<PreparedRequest> {
            self.requests.lock().await.clone()
        }
    }

    #[async_trait]
    impl CarrierTransport for ScriptedTransport {
        async fn execute(&self, request: PreparedRequest) -> Result<Value> {
            self.requests.lock().await.push(request);
            let mut responses = self.responses.lock().await;
            if responses.is_empty() {
                Ok(json!({}))
            } else {
                responses.remove(0)
            }
        }
    }

    fn catalogue() -> Vec<Value> {
        vec![
            json!({
                "carrier": "estes",
                "endpoints": {
                    "auth": {
                        "url": "https://estes.test/authenticate",
                        "method": "POST",
                        "headers": {"Content-Type": "application/json", "apikey": "k"},
                        "bodyTemplate": {"username": null, "password": null}
                    },
                    "createRateQuote": {
                        "url": "https://estes.test/rates",
                        "method": "POST",
                        "headers": {"Content-Type": "application/json"},
                        "bodyTemplate": {"quoteRequest": {"shipDate": null, "phone": null}}
                    },
                    "getShipmentHistory": {
                        "url": "https://estes.test/history",
                        "method": "GET",
                        "headers": {},
                        "queryParameters": {"pro": null, "bol": null, "interlinePro": null}
                    }
                }
            }),
            json!({
                "carrier": "xpo",
                "endpoints": {
                    "auth": {
                        "url": "https://xpo.test/token",
                        "method": "POST",
                        "headers": {
                            "Content-Type": "application/x-www-form-urlencoded",
                            "Authorization": "Basic abc123"
                        },
                        "bodyTemplate": {"grant_type": "password", "username": null, "password": null}
                    },
                    "downloadBolPdf": {
                        "url": "https://xpo.test/",
                        "method": "GET",
                        "headers": {"Accept": "application/json"}
                    }
                }
            }),
        ]
    }

    fn gateway_with(responses: Vec<Result<Value>>) -> (CarrierGateway, Arc<ScriptedTransport>) {
        let registry = Arc::new(EndpointRegistry::from_documents(&catalogue()).unwrap());
        let transport = ScriptedTransport::new(responses);
        (
            CarrierGateway::new(registry, transport.clone()),
            transport,
        )
    }

    #[tokio::test]
    async fn test_authenticate_merges_credentials_into_template() {
        let (gateway, transport) = gateway_with(vec![Ok(json!({"token": "t-1"}))]);
        gateway.authenticate("estes", "ops", "s3cret").await.unwrap();

        let requests = transport.recorded().await;
        assert_eq!(requests.len(), 1);
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body.content_type, ContentType::Json);
        let sent: Value = serde_json::from_str(&body.payload).unwrap();
        assert_eq!(sent, json!({"username": "ops", "password": "s3cret"}));
        assert_eq!(requests[0].headers["apikey"], "k");
    }

    #[tokio::test]
    async fn test_authenticate_form_encodes_for_xpo() {
        let (gateway, transport) = gateway_with(vec![Ok(json!({"access_token": "t"}))]);
        gateway.authenticate("XPO", "ops", "p w").await.unwrap();

        let requests = transport.recorded().await;
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body.content_type, ContentType::FormUrlEncoded);
        assert!(body.payload.contains("grant_type=password"));
        assert!(body.payload.contains("username=ops"));
        assert!(body.payload.contains("password=p+w"));
        assert_eq!(requests[0].headers["Authorization"], "Basic abc123");
    }

    fn quote_payload() -> Value {
        json!({
            "quoteRequest": {
                "shipDate": "  2026-09-01 ",
                "phone": "(804) 353-1900",
                "noise": null,
                "origin": {"address": {"postalCode": "90670"}},
                "destination": {"address": {"postalCode": "08505"}}
            },
            "commodity": {"handlingUnits": [{"count": 1}]}
        })
    }

    #[tokio::test]
    async fn test_body_operation_runs_full_pipeline() {
        let (gateway, transport) = gateway_with(vec![Ok(json!({"quoteId": "Q-1"}))]);
        gateway
            .create_rate_quote("estes", Some("tok"), &quote_payload())
            .await
            .unwrap();

        let requests = transport.recorded().await;
        let sent: Value = serde_json::from_str(&requests[0].body.as_ref().unwrap().payload).unwrap();
        // Trimmed, phone normalized, null leaf pruned, unknown keys kept
        assert_eq!(
            sent,
            json!({
                "quoteRequest": {
                    "shipDate": "2026-09-01",
                    "phone": "804-3531900",
                    "origin": {"address": {"postalCode": "90670"}},
                    "destination": {"address": {"postalCode": "08505"}}
                },
                "commodity": {"handlingUnits": [{"count": 1}]}
            })
        );
        assert_eq!(requests[0].headers["Authorization"], "Bearer tok");
    }

    #[tokio::test]
    async fn test_invalid_body_never_reaches_transport() {
        let (gateway, transport) = gateway_with(vec![]);
        let err = gateway
            .create_rate_quote("estes", None, &json!({"quoteRequest": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(transport.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_carrier_is_not_found() {
        let (gateway, _) = gateway_with(vec![]);
        let err = gateway
            .create_rate_quote("fedex", None, &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_history_filters_to_declared_params_and_renames() {
        let (gateway, transport) = gateway_with(vec![Ok(json!({"status": "IN_TRANSIT"}))]);
        let mut params = BTreeMap::new();
        params.insert("pro".to_string(), "439-1".to_string());
        params.insert("interlinePro".to_string(), "439-2".to_string());
        params.insert("referenceNumbers".to_string(), "439-1".to_string());
        gateway
            .get_shipment_history("estes", Some("tok"), &params)
            .await
            .unwrap();

        let requests = transport.recorded().await;
        let mut query = requests[0].query.clone();
        query.sort();
        assert_eq!(
            query,
            vec![
                ("interline-pro".to_string(), "439-2".to_string()),
                ("pro".to_string(), "439-1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_history_without_usable_params_is_validation_error() {
        let (gateway, transport) = gateway_with(vec![]);
        let mut params = BTreeMap::new();
        params.insert("referenceNumbers".to_string(), "x".to_string());
        let err = gateway
            .get_shipment_history("estes", None, &params)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(transport.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn test_carrier_error_passes_through() {
        let (gateway, _) = gateway_with(vec![Err(Error::Carrier {
            message: "postal code unknown".into(),
            status_code: Some(400),
        })]);
        let err = gateway
            .create_rate_quote("estes", None, &quote_payload())
            .await
            .unwrap_err();
        match err {
            Error::Carrier { message, .. } => assert_eq!(message, "postal code unknown"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bol_pdf_joins_uri_onto_document_base() {
        let (gateway, transport) = gateway_with(vec![
            Ok(json!({"code": "200", "data": {"pdf": "JVBERi0="}})),
            Ok(json!({"code": "200", "data": {"pdf": "JVBERi0="}})),
        ]);
        gateway
            .download_bol_pdf(
                "xpo",
                Some("tok"),
                "/billoflading/1.0/billsoflading/7231049604370/pdf",
            )
            .await
            .unwrap();
        // Missing leading slash is tolerated
        gateway
            .download_bol_pdf("xpo", Some("tok"), "billoflading/1.0/x/pdf")
            .await
            .unwrap();

        let requests = transport.recorded().await;
        assert_eq!(
            requests[0].url,
            "https://xpo.test/billoflading/1.0/billsoflading/7231049604370/pdf"
        );
        assert_eq!(requests[1].url, "https://xpo.test/billoflading/1.0/x/pdf");
        assert_eq!(requests[0].headers["Authorization"], "Bearer tok");
        assert_eq!(requests[0].method, "GET");
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_bol_pdf_requires_a_uri() {
        let (gateway, transport) = gateway_with(vec![]);
        let err = gateway
            .download_bol_pdf("xpo", Some("tok"), "  ")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(transport.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn test_bol_pdf_unconfigured_carrier_is_not_found() {
        let (gateway, _) = gateway_with(vec![]);
        let err = gateway
            .download_bol_pdf("estes", Some("tok"), "/some/pdf")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_token_extraction_shapes() {
        assert_eq!(
            token_from_auth_response(&json!({"token": "a"})).as_deref(),
            Some("a")
        );
        assert_eq!(
            token_from_auth_response(&json!({"access_token": "b"})).as_deref(),
            Some("b")
        );
        assert_eq!(
            token_from_auth_response(&json!({"data": {"accessToken": " c "}})).as_deref(),
            Some("c")
        );
        assert_eq!(token_from_auth_response(&json!({"nope": 1})), None);
    }
}
