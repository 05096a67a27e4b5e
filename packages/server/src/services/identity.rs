use std::fmt;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, instrument, warn};

use super::error::{ServiceError, ServiceResult};
use crate::config::IdentityConfig;

/// The caller's `Authorization` header value, forwarded verbatim to the
/// remote services. It is never parsed here.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(header_value: impl Into<String>) -> Self {
        Self(header_value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Existence checks against the services that own users and devices.
///
/// `Ok(false)` is an ordinary answer ("no such id"). Anything the remote side
/// cannot answer cleanly is `ServiceError::Dependency`.
#[async_trait]
pub trait IdentityValidator: Send + Sync {
    async fn owner_exists(&self, owner_id: &str, credential: &Credential) -> ServiceResult<bool>;

    async fn device_exists(&self, device_id: &str, credential: &Credential)
    -> ServiceResult<bool>;
}

/// Run both checks concurrently and fold them into a single verdict.
///
/// A definite "not found" from either side wins over a dependency failure on
/// the other, since the request is invalid regardless of what the other
/// service would have said.
pub async fn validate_references(
    validator: &dyn IdentityValidator,
    owner_id: &str,
    device_id: &str,
    credential: &Credential,
) -> ServiceResult<()> {
    let (owner, device) = tokio::join!(
        validator.owner_exists(owner_id, credential),
        validator.device_exists(device_id, credential),
    );

    match (owner, device) {
        (Ok(false), _) => {
            warn!(owner_id, "Owner not found in owner directory");
            Err(ServiceError::Validation("owner not found".into()))
        }
        (_, Ok(false)) => {
            warn!(device_id, "Device not found in device registry");
            Err(ServiceError::Validation("device not found".into()))
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
        (Ok(true), Ok(true)) => Ok(()),
    }
}

/// [`IdentityValidator`] that issues `GET {base}/{id}` to each remote service.
pub struct HttpIdentityValidator {
    client: Client,
    owner_base: Url,
    device_base: Url,
}

impl HttpIdentityValidator {
    pub fn new(config: &IdentityConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build identity HTTP client")?;

        Ok(Self {
            client,
            owner_base: parse_base(&config.owner_lookup_url)?,
            device_base: parse_base(&config.device_lookup_url)?,
        })
    }

    #[instrument(skip(self, base, credential))]
    async fn lookup(
        &self,
        kind: &'static str,
        base: &Url,
        id: &str,
        credential: &Credential,
    ) -> ServiceResult<bool> {
        let url = resource_url(base, id);

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, credential.as_str())
            .send()
            .await
            .map_err(|e| {
                warn!("{kind} lookup failed: {e}");
                ServiceError::Dependency(format!("{kind} lookup failed: {e}"))
            })?;

        let status = response.status();
        debug!(%status, "{kind} lookup answered");
        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => {
                warn!(%other, "{kind} lookup returned an unexpected status");
                Err(ServiceError::Dependency(format!(
                    "{kind} lookup returned {other}"
                )))
            }
        }
    }
}

#[async_trait]
impl IdentityValidator for HttpIdentityValidator {
    async fn owner_exists(&self, owner_id: &str, credential: &Credential) -> ServiceResult<bool> {
        self.lookup("owner", &self.owner_base, owner_id, credential)
            .await
    }

    async fn device_exists(
        &self,
        device_id: &str,
        credential: &Credential,
    ) -> ServiceResult<bool> {
        self.lookup("device", &self.device_base, device_id, credential)
            .await
    }
}

fn parse_base(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid lookup URL '{raw}'"))?;
    if url.cannot_be_a_base() {
        bail!("lookup URL '{raw}' cannot carry a path");
    }
    Ok(url)
}

/// Append `id` as one percent-encoded path segment.
fn resource_url(base: &Url, id: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(id);
    }
    url
}
