// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mainframe API collaborators and their registry.
//!
//! The profile engine only needs four things from an API: a status probe,
//! the name of the token type it issues, login, and logout. Everything else
//! about the REST wire format stays behind [`CommonApi`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;

use crate::error::ApiError;
use crate::profile::Profile;
use crate::secure::{is_gateway_token, GATEWAY_TOKEN_PREFIX};
use crate::tree::TreeKind;

/// Connection parameters for one API call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub hostname: String,
    pub port: u16,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip)]
    pub token_value: Option<String>,
    pub reject_unauthorized: bool,
}

impl Session {
    pub fn from_profile(profile: &Profile) -> Self {
        let attrs = &profile.attrs;
        Self {
            hostname: attrs.host.clone().unwrap_or_default(),
            port: attrs.port.unwrap_or(443),
            protocol: attrs.protocol.clone().unwrap_or_else(|| "https".to_owned()),
            base_path: attrs.base_path.clone().filter(|p| !p.is_empty()),
            user: attrs.user.clone(),
            password: attrs.password.clone(),
            token_type: attrs.token_type.clone(),
            token_value: attrs.token_value.clone(),
            reject_unauthorized: attrs.reject_unauthorized.unwrap_or(true),
        }
    }

    /// Root URL of the service, including any gateway base path.
    pub fn base_url(&self) -> String {
        let base = self.base_path.as_deref().unwrap_or("").trim_end_matches('/');
        format!("{}://{}:{}{}", self.protocol, self.hostname, self.port, base)
    }
}

/// Operations the profile engine needs from a mainframe API.
#[async_trait]
pub trait CommonApi: Send + Sync {
    /// Whether [`CommonApi::get_status`] is implemented.
    fn supports_status(&self) -> bool {
        false
    }

    /// Probe the profile's host. `Some("active")` or `Some("inactive")`,
    /// `None` when the API cannot tell.
    async fn get_status(&self, _profile: &Profile, _profile_type: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    /// Name of the token type this API issues for `profile`.
    async fn token_type_name(&self, _profile: &Profile) -> anyhow::Result<String> {
        Err(ApiError::new("token authentication is not supported").with_status(501).into())
    }

    /// Log in and return the issued token value.
    async fn login(&self, _session: &Session) -> anyhow::Result<String> {
        Err(ApiError::new("login is not supported").with_status(501).into())
    }

    async fn logout(&self, _session: &Session) -> anyhow::Result<()> {
        Err(ApiError::new("logout is not supported").with_status(501).into())
    }
}

/// Registered APIs keyed by profile type, and the trees each type appears in.
#[derive(Default)]
pub struct ApiRegister {
    apis: RwLock<HashMap<String, Arc<dyn CommonApi>>>,
    trees: RwLock<HashMap<TreeKind, Vec<String>>>,
}

impl std::fmt::Debug for ApiRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRegister").field("types", &self.registered_types()).finish()
    }
}

impl ApiRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `api` for `profile_type` in the given trees.
    pub fn register(&self, profile_type: &str, api: Arc<dyn CommonApi>, kinds: &[TreeKind]) {
        self.apis.write().insert(profile_type.to_owned(), api);
        let mut trees = self.trees.write();
        for kind in kinds {
            let types = trees.entry(*kind).or_default();
            if !types.iter().any(|t| t == profile_type) {
                types.push(profile_type.to_owned());
            }
        }
        tracing::debug!(profile_type, "registered api");
    }

    pub fn common_api(&self, profile_type: &str) -> Option<Arc<dyn CommonApi>> {
        self.apis.read().get(profile_type).cloned()
    }

    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.apis.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Profile types shown in trees of `kind`.
    pub fn types_for(&self, kind: TreeKind) -> Vec<String> {
        self.trees.read().get(&kind).cloned().unwrap_or_default()
    }
}

const CSRF_HEADER: &str = "X-CSRF-ZOSMF-HEADER";
const LTPA_TOKEN: &str = "LtpaToken2";

/// z/OSMF over HTTPS, optionally behind the API gateway.
#[derive(Debug, Clone)]
pub struct HttpCommonApi {
    timeout: Duration,
}

impl Default for HttpCommonApi {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpCommonApi {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client(&self, session: &Session) -> anyhow::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if !session.reject_unauthorized {
            builder = builder.use_preconfigured_tls(insecure::client_config()?);
        }
        Ok(builder.build()?)
    }

    fn authorize(request: reqwest::RequestBuilder, session: &Session) -> reqwest::RequestBuilder {
        match (&session.token_type, &session.token_value) {
            (Some(ty), Some(value)) => {
                request.header(reqwest::header::COOKIE, format!("{ty}={value}"))
            }
            _ => match session.user {
                Some(ref user) => request.basic_auth(user, session.password.as_ref()),
                None => request,
            },
        }
    }

    async fn check(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let mut err = ApiError::new(format!("Rest API failure with HTTP(S) status {}", status.as_u16()))
            .with_status(status.as_u16());
        if !body.is_empty() {
            err = err.with_details(body);
        }
        Err(err.into())
    }
}

#[async_trait]
impl CommonApi for HttpCommonApi {
    fn supports_status(&self) -> bool {
        true
    }

    async fn get_status(&self, profile: &Profile, profile_type: &str) -> anyhow::Result<Option<String>> {
        if profile_type != "zosmf" {
            return Ok(None);
        }
        let session = Session::from_profile(profile);
        if session.hostname.is_empty() {
            anyhow::bail!("Required parameter 'hostname' must not be blank");
        }
        let url = format!("{}/zosmf/info", session.base_url());
        let request = self.client(&session)?.get(url).header(CSRF_HEADER, "true");
        let response = Self::authorize(request, &session).send().await?;
        Self::check(response).await?;
        Ok(Some("active".to_owned()))
    }

    async fn token_type_name(&self, profile: &Profile) -> anyhow::Result<String> {
        match profile.attrs.base_path {
            Some(ref path) if !path.is_empty() => Ok(GATEWAY_TOKEN_PREFIX.to_owned()),
            _ => Ok(LTPA_TOKEN.to_owned()),
        }
    }

    async fn login(&self, session: &Session) -> anyhow::Result<String> {
        let token_type = session.token_type.clone().unwrap_or_else(|| LTPA_TOKEN.to_owned());
        let client = self.client(session)?;
        let request = if is_gateway_token(&token_type) {
            let url = format!("{}://{}:{}/gateway/api/v1/auth/login", session.protocol, session.hostname, session.port);
            client.post(url).json(&serde_json::json!({
                "username": session.user,
                "password": session.password,
            }))
        } else {
            let url = format!("{}/zosmf/services/authenticate", session.base_url());
            let user = session.user.clone().unwrap_or_default();
            client.post(url).header(CSRF_HEADER, "true").basic_auth(user, session.password.as_ref())
        };
        let response = Self::check(request.send().await?).await?;
        let prefix = format!("{token_type}=");
        response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|cookie| {
                let pair = cookie.split(';').next()?.trim();
                pair.strip_prefix(&prefix).map(str::to_owned)
            })
            .ok_or_else(|| {
                ApiError::new(format!("Token type {token_type} was not returned by the login")).into()
            })
    }

    async fn logout(&self, session: &Session) -> anyhow::Result<()> {
        let token_type = session.token_type.clone().unwrap_or_else(|| LTPA_TOKEN.to_owned());
        let client = self.client(session)?;
        let request = if is_gateway_token(&token_type) {
            let url = format!("{}://{}:{}/gateway/api/v1/auth/logout", session.protocol, session.hostname, session.port);
            client.post(url)
        } else {
            let url = format!("{}/zosmf/services/authenticate", session.base_url());
            client.delete(url).header(CSRF_HEADER, "true")
        };
        Self::check(Self::authorize(request, session).send().await?).await?;
        Ok(())
    }
}

/// TLS settings for profiles with `rejectUnauthorized: false`.
mod insecure {
    use std::sync::Arc;

    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::crypto::CryptoProvider;
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, SignatureScheme};

    #[derive(Debug)]
    struct AcceptAnyCert(Arc<CryptoProvider>);

    impl ServerCertVerifier for AcceptAnyCert {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            rustls::crypto::verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            rustls::crypto::verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.0.signature_verification_algorithms.supported_schemes()
        }
    }

    pub(super) fn client_config() -> anyhow::Result<rustls::ClientConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = rustls::ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth();
        Ok(config)
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
