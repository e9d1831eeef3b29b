use crate::client::errors::ApiError;
use crate::client::json;
use crate::client::traits::{AvailabilityService, PropertySource};
use crate::client::types::SearchParams;
use crate::client::wire::{
    AvailabilityPayload, Envelope, LoginBody, LoginResponse, PropertyWire, UpsertRangeBody,
};
use crate::config::Config;
use crate::models::{AvailabilitySnapshot, Property, RangeUpdate, UserProfile};
use crate::session::SessionContext;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Whether a request must carry the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Attach the token when there is one
    Optional,
    /// Fail with [`ApiError::MissingToken`] before sending when there is none
    Required,
}

/// HTTP client for the brokerage REST API
pub struct RentalClient {
    client: Client,
    base: Url,
    session: SessionContext,
}

impl RentalClient {
    /// Create a client from the application config
    pub fn new(config: &Config, session: SessionContext) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Self::with_client(client, &config.api_base(), session)
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(client: Client, base_url: &str, session: SessionContext) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("Invalid API base URL: {base_url}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry paths: {base_url}");
        }

        Ok(Self {
            client,
            base,
            session,
        })
    }

    /// Log in and store the token and profile in the session.
    ///
    /// Any previous session is cleared first, so a failed login leaves the
    /// user logged out.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        self.session.logout();

        let url = self.endpoint(&["Usuario", "IniciarSesion"]);
        info!(email, "Logging in");
        let request = self.client.post(url).json(&LoginBody {
            correo: email,
            contrasena_hash: password,
        });

        let response: LoginResponse = self.execute(request, Auth::Optional).await?;
        match (response.status, response.token) {
            (true, Some(token)) => {
                let user = response.value.unwrap_or_default();
                info!(role = user.role().display_name(), "Logged in");
                self.session.establish(token, Some(user.clone()));
                Ok(user)
            }
            _ => Err(ApiError::Rejected {
                message: response.message.or_else(|| Some("Login failed".to_string())),
            }),
        }
    }

    /// `{base}/seg1/seg2/...` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder, auth: Auth) -> Result<RequestBuilder, ApiError> {
        match (self.session.token(), auth) {
            (Some(token), _) => Ok(request.bearer_auth(token)),
            (None, Auth::Optional) => Ok(request),
            (None, Auth::Required) => Err(ApiError::MissingToken),
        }
    }

    /// Send a request and return the body of a successful response.
    ///
    /// A 401 clears the session. Other non-2xx responses become
    /// [`ApiError::Remote`] carrying the server's message, or the status line
    /// when the body has none.
    async fn send(&self, request: RequestBuilder, auth: Auth) -> Result<(StatusCode, String, String), ApiError> {
        let request = self.authorize(request, auth)?.header("Accept", "application/json");

        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "Request could not be sent");
            ApiError::Transport(err)
        })?;

        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;
        debug!(status = status.as_u16(), %url, bytes = body.len(), "Response received");

        if status == StatusCode::UNAUTHORIZED {
            warn!(%url, "Server rejected the session token");
            self.session.invalidate();
            return Err(ApiError::SessionExpired);
        }

        if !status.is_success() {
            let message = json::failure_message(status, &body);
            warn!(status = status.as_u16(), %url, %message, "Request failed");
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: Some(message),
            });
        }

        Ok((status, url, body))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, auth: Auth) -> Result<T, ApiError> {
        let (status, url, body) = self.send(request, auth).await?;
        json::decode(&body).map_err(|source| {
            warn!(status = status.as_u16(), %url, error = %source, "Unreadable response body");
            ApiError::Decode {
                status: status.as_u16(),
                url,
                source,
            }
        })
    }

    async fn availability_call(&self, request: RequestBuilder, auth: Auth) -> Result<AvailabilitySnapshot, ApiError> {
        let envelope: Envelope<AvailabilityPayload> = self.execute(request, auth).await?;
        Ok(unwrap_envelope(envelope)?.into_snapshot())
    }
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
    match envelope.value {
        Some(value) if envelope.status => Ok(value),
        _ => Err(ApiError::Rejected {
            message: envelope.message,
        }),
    }
}

#[async_trait]
impl AvailabilityService for RentalClient {
    async fn fetch_availability(&self, property_id: &str) -> Result<AvailabilitySnapshot, ApiError> {
        debug!(property_id, "Fetching availability");
        let url = self.endpoint(&["Propiedad", "Disponibilidad", property_id]);
        self.availability_call(self.client.get(url), Auth::Optional).await
    }

    async fn upsert_range(
        &self,
        property_id: &str,
        update: &RangeUpdate,
    ) -> Result<AvailabilitySnapshot, ApiError> {
        debug!(
            property_id,
            status = %update.status,
            start = %update.start_date,
            end = %update.end_date,
            "Upserting range"
        );
        let url = self.endpoint(&["Propiedad", "Disponibilidad", property_id]);
        let request = self.client.put(url).json(&UpsertRangeBody::from(update));
        self.availability_call(request, Auth::Required).await
    }

    async fn delete_range(&self, property_id: &str, range_id: &str) -> Result<(), ApiError> {
        debug!(property_id, range_id, "Deleting range");
        let url = self.endpoint(&["Propiedad", "Disponibilidad", property_id, range_id]);
        let (_, _, body) = self.send(self.client.delete(url), Auth::Required).await?;

        // The body is optional here; only an explicit `status: false` counts.
        match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
            Ok(envelope) if !envelope.status => Err(ApiError::Rejected {
                message: envelope.message,
            }),
            _ => Ok(()),
        }
    }

    async fn toggle_day(
        &self,
        property_id: &str,
        date: NaiveDate,
    ) -> Result<AvailabilitySnapshot, ApiError> {
        let day = date.format("%Y-%m-%d").to_string();
        debug!(property_id, %day, "Toggling single day");
        let url = self.endpoint(&["Propiedad", "Disponibilidad", property_id, "date", &day]);
        self.availability_call(self.client.delete(url), Auth::Required).await
    }
}

#[async_trait]
impl PropertySource for RentalClient {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Property>, ApiError> {
        let query = params.to_query();
        debug!(?query, "Searching properties");
        let url = self.endpoint(&["Propiedad", "Buscar"]);
        let request = self.client.get(url).query(&query);

        let envelope: Envelope<Vec<PropertyWire>> = self.execute(request, Auth::Optional).await?;
        let properties: Vec<Property> = unwrap_envelope(envelope)?
            .into_iter()
            .filter_map(PropertyWire::into_property)
            .collect();

        info!(count = properties.len(), "Fetched properties");
        Ok(properties)
    }

    async fn property(&self, property_id: &str) -> Result<Property, ApiError> {
        debug!(property_id, "Fetching property");
        let url = self.endpoint(&["Propiedad", "Obtener", property_id]);
        let envelope: Envelope<PropertyWire> = self.execute(self.client.get(url), Auth::Optional).await?;

        unwrap_envelope(envelope)?
            .into_property()
            .ok_or_else(|| ApiError::Rejected {
                message: Some(format!("Property {property_id} has no id")),
            })
    }
}
