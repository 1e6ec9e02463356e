//! ViaCEP-backed postal-code resolver.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::LookupError;

use super::{PostalCodeResolver, ResolvedAddress};

/// Public ViaCEP endpoint.
pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br";

/// Resolver backed by the ViaCEP web service.
pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    /// Build a client with a bounded request timeout so a slow or
    /// unreachable service cannot hang the Infrastructure step.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn lookup_url(&self, code: &str) -> String {
        format!("{}/ws/{code}/json/", self.base_url)
    }
}

/// Wire shape of a ViaCEP reply. Unknown codes answer `{"erro": true}`
/// with HTTP 200; malformed codes answer HTTP 400.
#[derive(Debug, Deserialize)]
struct ViaCepPayload {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

impl ViaCepPayload {
    fn into_address(self) -> Option<ResolvedAddress> {
        if self.erro.is_some() {
            return None;
        }
        Some(ResolvedAddress {
            street: self.logradouro,
            district: self.bairro,
            city: self.localidade,
            state: self.uf,
        })
    }
}

#[async_trait]
impl PostalCodeResolver for ViaCepClient {
    async fn resolve(&self, code: &str) -> Result<Option<ResolvedAddress>, LookupError> {
        let response = self
            .client
            .get(self.lookup_url(code))
            .send()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))?;

        if response.status() == StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LookupError::Request(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let payload: ViaCepPayload = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;
        Ok(payload.into_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_success_payload() {
        let payload: ViaCepPayload = serde_json::from_str(
            r#"{
                "cep": "01310-100",
                "logradouro": "Avenida Paulista",
                "bairro": "Bela Vista",
                "localidade": "São Paulo",
                "uf": "SP"
            }"#,
        )
        .unwrap();
        let address = payload.into_address().unwrap();
        assert_eq!(address.street, "Avenida Paulista");
        assert_eq!(address.district, "Bela Vista");
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.state, "SP");
    }

    #[test]
    fn decodes_not_found_payload() {
        let payload: ViaCepPayload = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert!(payload.into_address().is_none());

        // Some deployments answer with a string instead of a bool.
        let payload: ViaCepPayload = serde_json::from_str(r#"{"erro": "true"}"#).unwrap();
        assert!(payload.into_address().is_none());
    }

    #[test]
    fn lookup_url_shape() {
        let client = ViaCepClient::new("https://viacep.com.br/", Duration::from_secs(4)).unwrap();
        assert_eq!(
            client.lookup_url("01310100"),
            "https://viacep.com.br/ws/01310100/json/"
        );
    }
}
