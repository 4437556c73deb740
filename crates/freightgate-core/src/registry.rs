//! Endpoint registry
//!
//! The catalogue of (carrier, operation) request descriptors. Dispatch is
//! data-driven: adding a carrier means adding a catalogue document, never
//! touching call sites. Lookup is case-insensitive on the carrier name and
//! exact on the operation name, backed by a map whose keys are normalized at
//! insertion, and a miss is `None`, not an error - callers decide whether to
//! surface 404.
//!
//! Loading is where all the validation happens: duplicate (carrier,
//! operation) pairs are rejected, `${ENV:VAR}` placeholders in URLs and
//! header values are expanded, and every body template is parsed into a
//! tagged schema tree so malformed templates fail here instead of at merge
//! time.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::TemplateSchema;
use crate::types::EndpointConfig;

/// A catalogue entry: the endpoint descriptor plus its validated template.
#[derive(Debug, Clone)]
pub struct RegisteredEndpoint {
    pub config: EndpointConfig,
    template: Option<TemplateSchema>,
}

impl RegisteredEndpoint {
    /// Fresh placeholder body for this endpoint, or `None` for body-less
    /// operations (shipment history).
    pub fn blank_body(&self) -> Option<Value> {
        self.template.as_ref().map(TemplateSchema::blank)
    }
}

/// Immutable catalogue of carrier endpoints.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<(String, String), RegisteredEndpoint>,
}

impl EndpointRegistry {
    /// Build a registry from catalogue documents.
    ///
    /// Each document describes one carrier:
    /// `{carrier, description?, baseUrl?, endpoints: {operation: descriptor}}`.
    pub fn from_documents(documents: &[Value]) -> Result<Self> {
        let mut registry = Self::default();
        for doc in documents {
            registry.load_document(doc)?;
        }
        Ok(registry)
    }

    /// Load a catalogue from a JSON file holding an array of documents.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: format!("failed to read catalogue {}", path.display()),
            source: e,
        })?;
        let documents: Vec<Value> = serde_json::from_str(&raw)?;
        Self::from_documents(&documents)
    }

    fn load_document(&mut self, doc: &Value) -> Result<()> {
        let carrier = doc
            .get("carrier")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Configuration {
                message: "catalogue document missing \"carrier\" name".into(),
                source: None,
            })?
            .to_ascii_lowercase();

        let endpoints = doc
            .get("endpoints")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Configuration {
                message: format!("carrier {carrier} has no \"endpoints\" map"),
                source: None,
            })?;

        for (operation, descriptor) in endpoints {
            let mut config: EndpointConfig =
                serde_json::from_value(descriptor.clone()).map_err(|e| Error::Configuration {
                    message: format!("invalid descriptor for {carrier}/{operation}: {e}"),
                    source: None,
                })?;
            config.carrier = carrier.clone();
            config.operation = operation.clone();
            config.url = expand_env_vars(&config.url);
            for value in config.headers.values_mut() {
                *value = expand_env_vars(value);
            }

            let template = match &config.body_template {
                Some(raw) => Some(TemplateSchema::parse(raw).map_err(|e| Error::Configuration {
                    message: format!("invalid body template for {carrier}/{operation}: {e}"),
                    source: None,
                })?),
                None => None,
            };

            let key = (carrier.clone(), operation.clone());
            if self.endpoints.contains_key(&key) {
                return Err(Error::Configuration {
                    message: format!("duplicate endpoint config for {carrier}/{operation}"),
                    source: None,
                });
            }
            self.endpoints
                .insert(key, RegisteredEndpoint { config, template });
        }
        Ok(())
    }

    /// Look up the descriptor for `(carrier, operation)`.
    pub fn lookup(&self, carrier: &str, operation: &str) -> Option<&RegisteredEndpoint> {
        self.endpoints
            .get(&(carrier.to_ascii_lowercase(), operation.to_string()))
    }

    /// Carrier names with at least one registered operation.
    pub fn carriers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .endpoints
            .keys()
            .map(|(carrier, _)| carrier.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Expand `${ENV:VAR_NAME}` placeholders. Unset variables expand to the
/// empty string, matching how deployments without a given carrier leave its
/// base URL unset; the affected endpoints then fail fast on dispatch.
fn expand_env_vars(value: &str) -> String {
    let re = Regex::new(r"\$\{ENV:([^}]+)\}").expect("valid env placeholder pattern");
    re.replace_all(value, |caps: &regex::Captures<'_>| {
        let var = &caps[1];
        std::env::var(var).unwrap_or_else(|_| {
            tracing::warn!(variable = var, "catalogue references unset env var");
            String::new()
        })
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn sample_documents() -> Vec<Value> {
        vec![json!({
            "carrier": "Estes",
            "description": "Estes Express Lines",
            "endpoints": {
                "auth": {
                    "url": "https://api.example.com/authenticate",
                    "method": "POST",
                    "headers": {"Content-Type": "application/json", "apikey": "k"},
                    "bodyTemplate": {"username": null, "password": null}
                },
                "getShipmentHistory": {
                    "url": "https://api.example.com/v1/shipments/history",
                    "method": "GET",
                    "headers": {"apikey": "k"},
                    "queryParameters": {"pro": null, "bol": null}
                }
            }
        })]
    }

    #[test]
    fn test_lookup_is_case_insensitive_on_carrier() {
        let registry = EndpointRegistry::from_documents(&sample_documents()).unwrap();
        let upper = registry.lookup("ESTES", "auth").unwrap();
        let lower = registry.lookup("estes", "auth").unwrap();
        assert_eq!(upper.config.url, lower.config.url);
        assert_eq!(upper.config.carrier, "estes");
    }

    #[test]
    fn test_unknown_operation_is_none_not_error() {
        let registry = EndpointRegistry::from_documents(&sample_documents()).unwrap();
        assert!(registry.lookup("estes", "doesNotExist").is_none());
        assert!(registry.lookup("fedex", "auth").is_none());
        // Operation matching is exact, including case
        assert!(registry.lookup("estes", "AUTH").is_none());
    }

    #[test]
    fn test_duplicate_endpoint_rejected() {
        let mut docs = sample_documents();
        docs.push(docs[0].clone());
        let err = EndpointRegistry::from_documents(&docs).unwrap_err();
        assert!(err.to_string().contains("duplicate endpoint config"));
    }

    #[test]
    fn test_malformed_template_fails_at_load() {
        let docs = vec![json!({
            "carrier": "estes",
            "endpoints": {
                "auth": {
                    "url": "https://api.example.com/authenticate",
                    "method": "POST",
                    "bodyTemplate": {"bad": [{"a": null}, {"a": null}]}
                }
            }
        })];
        let err = EndpointRegistry::from_documents(&docs).unwrap_err();
        assert!(err.to_string().contains("invalid body template"));
    }

    #[test]
    fn test_blank_body_for_templated_endpoint() {
        let registry = EndpointRegistry::from_documents(&sample_documents()).unwrap();
        let auth = registry.lookup("estes", "auth").unwrap();
        assert_eq!(
            auth.blank_body().unwrap(),
            json!({"username": null, "password": null})
        );
        let history = registry.lookup("estes", "getShipmentHistory").unwrap();
        assert!(history.blank_body().is_none());
    }

    #[test]
    fn test_env_expansion_in_url_and_headers() {
        std::env::set_var("FREIGHTGATE_TEST_BASE", "https://carrier.test");
        std::env::set_var("FREIGHTGATE_TEST_KEY", "sekrit");
        let docs = vec![json!({
            "carrier": "demo",
            "endpoints": {
                "auth": {
                    "url": "${ENV:FREIGHTGATE_TEST_BASE}/token",
                    "method": "POST",
                    "headers": {"apikey": "${ENV:FREIGHTGATE_TEST_KEY}"},
                    "bodyTemplate": {"username": null}
                }
            }
        })];
        let registry = EndpointRegistry::from_documents(&docs).unwrap();
        let ep = &registry.lookup("demo", "auth").unwrap().config;
        assert_eq!(ep.url, "https://carrier.test/token");
        assert_eq!(ep.headers["apikey"], "sekrit");
        std::env::remove_var("FREIGHTGATE_TEST_BASE");
        std::env::remove_var("FREIGHTGATE_TEST_KEY");
    }

    #[test]
    fn test_from_path_loads_catalogue_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!(sample_documents())).unwrap();
        let registry = EndpointRegistry::from_path(file.path()).unwrap();
        assert_eq!(registry.carriers(), vec!["estes"]);
    }

    #[test]
    fn test_document_without_carrier_rejected() {
        let docs = vec![json!({"endpoints": {}})];
        assert!(EndpointRegistry::from_documents(&docs).is_err());
    }
}
