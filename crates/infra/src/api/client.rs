//! REST client for the CivicReport API
//!
//! Implements the session's [`AuthApi`] port and exposes the ticket and
//! tenant endpoints screens consume. All calls go through
//! [`AuthenticatedFetch`], so every authenticated request gets the
//! refresh-once-on-401 behaviour.

use std::sync::Arc;

use async_trait::async_trait;
use civicreport_core::AuthApi;
use civicreport_domain::constants::{DEFAULT_LOGIN_PATH, DEFAULT_REGISTER_PATH, DEFAULT_USER_PATH};
use civicreport_domain::{
    list_from_response, AssignRequest, Assignment, CivicError, LoginRequest, LoginResponse,
    NewReply, NewTicket, ProfilePayload, RegisterRequest, RegisterResponse, Reply, Result, Tenant,
    Ticket,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::errors::ApiError;
use super::fetch::{ApiRequest, ApiResponse, AuthenticatedFetch};

/// API client
#[derive(Clone)]
pub struct CivicApiClient {
    fetch: Arc<AuthenticatedFetch>,
}

impl CivicApiClient {
    pub fn new(fetch: Arc<AuthenticatedFetch>) -> Self {
        Self { fetch }
    }

    /// `GET /tickets`
    #[instrument(skip(self))]
    pub async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let body = self.get_json::<Value>("/tickets").await?;
        let tickets = decode_list(body, "tickets")?;
        debug!(count = tickets.len(), "Tickets loaded");
        Ok(tickets)
    }

    /// `GET /tickets/:id`
    #[instrument(skip(self))]
    pub async fn get_ticket(&self, ticket_id: &str) -> Result<Ticket> {
        let body = self.get_json::<Value>(&format!("/tickets/{ticket_id}")).await?;
        decode_record(body, "ticket")
    }

    /// `POST /tickets`
    #[instrument(skip(self, ticket), fields(title = %ticket.title))]
    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket> {
        let body = self.post_json::<_, Value>("/tickets", ticket).await?;
        let created: Ticket = decode_record(body, "ticket")?;
        info!(ticket_id = %created.id, "Ticket created");
        Ok(created)
    }

    /// `GET /tickets/:id/replies`
    #[instrument(skip(self))]
    pub async fn list_replies(&self, ticket_id: &str) -> Result<Vec<Reply>> {
        let body = self.get_json::<Value>(&format!("/tickets/{ticket_id}/replies")).await?;
        decode_list(body, "replies")
    }

    /// `POST /tickets/:id/replies`
    #[instrument(skip(self, reply))]
    pub async fn add_reply(&self, ticket_id: &str, reply: &NewReply) -> Result<Reply> {
        let body = self.post_json::<_, Value>(&format!("/tickets/{ticket_id}/replies"), reply).await?;
        decode_record(body, "reply")
    }

    /// `POST /tickets/:id/assign`
    #[instrument(skip(self, assignment), fields(operator_id = %assignment.operator_id))]
    pub async fn assign_ticket(
        &self,
        ticket_id: &str,
        assignment: &AssignRequest,
    ) -> Result<Assignment> {
        let body =
            self.post_json::<_, Value>(&format!("/tickets/{ticket_id}/assign"), assignment).await?;
        let assigned: Assignment = decode_record(body, "assignment")?;
        info!(ticket_id, "Ticket assigned");
        Ok(assigned)
    }

    /// `GET /tenants`
    #[instrument(skip(self))]
    pub async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let body = self.get_json::<Value>("/tenants").await?;
        decode_list(body, "tenants")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.fetch.send(&ApiRequest::get(path)).await?;
        Ok(response.error_for_status()?.json()?)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(path, body)?;
        let response = self.fetch.send(&request).await?;
        Ok(response.error_for_status()?.json()?)
    }

    async fn post_public(&self, path: &str, body: &impl serde::Serialize) -> Result<ApiResponse> {
        let request = ApiRequest::post(path, body)?;
        Ok(self.fetch.send_public(&request).await?)
    }
}

#[async_trait]
impl AuthApi for CivicApiClient {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let response = self.post_public(DEFAULT_LOGIN_PATH, request).await?;
        let response = response.error_for_status()?;
        Ok(response.json()?)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        let response = self.post_public(DEFAULT_REGISTER_PATH, request).await?;
        let response = response.error_for_status()?;
        Ok(response.json()?)
    }

    #[instrument(skip(self))]
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfilePayload> {
        let body = self.get_json::<Value>(&format!("{DEFAULT_USER_PATH}/{user_id}")).await?;
        ProfilePayload::from_response(body)
            .ok_or_else(|| CivicError::Decode("profile response is not an object".into()))
    }
}

fn decode_list<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>> {
    list_from_response(body, key)
        .map_err(|e| CivicError::from(ApiError::Decode(format!("invalid {key} list: {e}"))))
}

/// Decode a record that is either bare or wrapped as `{key: {...}}`.
fn decode_record<T: DeserializeOwned>(body: Value, key: &str) -> Result<T> {
    let inner = match body {
        Value::Object(mut map) => match map.remove(key) {
            Some(record @ Value::Object(_)) => record,
            Some(other) => {
                map.insert(key.to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    };
    serde_json::from_value(inner)
        .map_err(|e| CivicError::from(ApiError::Decode(format!("invalid {key}: {e}"))))
}
