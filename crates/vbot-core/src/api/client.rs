use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    api::types::{
        ConfigUpdate, GuildStats, LogEntry, LogsEnvelope, ManualVerification, MemberRecord,
        MembersEnvelope, RestoreRequest, StatsEnvelope, UsersEnvelope, VerifyUrlEnvelope,
    },
    domain::GuildId,
    errors::{ApiError, Error},
    ports::{ApiResult, VerificationApi},
    Result,
};

/// Longest slice of an error body carried into `ApiError::message`.
const ERROR_BODY_PREVIEW: usize = 200;

/// HTTP client for the verification API.
///
/// Cheap to clone; `reqwest::Client` pools connections internally.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::network(format!("GET {path} failed: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::network(format!("GET {path} body read failed: {e}")))?;

        decode_body(status, &body)
    }

    async fn post_json<B>(&self, path: &str, body: &B) -> ApiResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::network(format!("POST {path} failed: {e}")))?;

        let status = resp.status().as_u16();
        if is_success(status) {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(status_error(status, &text))
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn status_error(status: u16, body: &str) -> ApiError {
    let preview = body.trim().chars().take(ERROR_BODY_PREVIEW).collect::<String>();
    if preview.is_empty() {
        ApiError::status(status, format!("API returned HTTP {status}"))
    } else {
        ApiError::status(status, format!("API returned HTTP {status}: {preview}"))
    }
}

/// Normalize a response into success-with-payload, success-empty or failure.
///
/// An empty 2xx body decodes to `T::default()` (an empty list for the
/// envelope types), never to an error.
pub(crate) fn decode_body<T>(status: u16, body: &str) -> ApiResult<T>
where
    T: DeserializeOwned + Default,
{
    if !is_success(status) {
        return Err(status_error(status, body));
    }
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(body)
        .map_err(|e| ApiError::status(status, format!("invalid API response: {e}")))
}

#[async_trait]
impl VerificationApi for ApiClient {
    async fn verification_url(&self, guild: GuildId) -> String {
        match self
            .get_json::<VerifyUrlEnvelope>(&format!("/api/verify/{guild}"), &[])
            .await
        {
            Ok(env) => match env.verification_url.filter(|u| !u.trim().is_empty()) {
                Some(url) => url,
                None => format!("{}/verify/{guild}", self.base_url),
            },
            Err(e) if e.status.is_some() => {
                tracing::warn!(%guild, error = %e, "verification url lookup rejected");
                format!("{}/oauth/callback?guild_id={guild}", self.base_url)
            }
            Err(e) => {
                tracing::error!(%guild, error = %e, "failed to get verification url");
                format!("{}/verify/{guild}", self.base_url)
            }
        }
    }

    async fn source_members(&self, source: GuildId) -> ApiResult<Vec<MemberRecord>> {
        let env: MembersEnvelope = self
            .get_json(&format!("/api/dashboard/server/{source}/members"), &[])
            .await?;
        Ok(env.members)
    }

    async fn verified_users(&self, guild: GuildId) -> ApiResult<Vec<MemberRecord>> {
        let env: UsersEnvelope = self
            .get_json(&format!("/api/bot/guild/{guild}/verified"), &[])
            .await?;
        Ok(env.users)
    }

    async fn mark_restored(&self, guild: GuildId, req: &RestoreRequest) -> ApiResult<()> {
        self.post_json(&format!("/api/bot/guild/{guild}/restore"), req)
            .await
    }

    async fn verify_manual(&self, record: &ManualVerification) -> ApiResult<()> {
        self.post_json("/api/bot/verify-manual", record).await
    }

    async fn update_config(&self, guild: GuildId, update: &ConfigUpdate) -> ApiResult<()> {
        self.post_json(&format!("/api/dashboard/server/{guild}/config"), update)
            .await
    }

    async fn stats(&self, guild: GuildId) -> ApiResult<GuildStats> {
        let env: StatsEnvelope = self
            .get_json(&format!("/api/dashboard/server/{guild}/stats"), &[])
            .await?;
        Ok(env.stats)
    }

    async fn logs(
        &self,
        guild: GuildId,
        limit: u32,
        log_type: Option<&str>,
    ) -> ApiResult<Vec<LogEntry>> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(t) = log_type {
            query.push(("log_type", t.to_string()));
        }
        let env: LogsEnvelope = self
            .get_json(&format!("/api/dashboard/server/{guild}/logs"), &query)
            .await?;
        Ok(env.logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_success_status_becomes_typed_failure() {
        let err = decode_body::<MembersEnvelope>(503, "upstream down").unwrap_err();
        assert_eq!(err.status, Some(503));
        assert!(err.message.contains("upstream down"));

        let err = decode_body::<MembersEnvelope>(404, "").unwrap_err();
        assert_eq!(err.status, Some(404));
        assert_eq!(err.message, "API returned HTTP 404");
    }

    #[test]
    fn empty_success_is_an_empty_list() {
        let env = decode_body::<UsersEnvelope>(200, "").unwrap();
        assert!(env.users.is_empty());

        let env = decode_body::<UsersEnvelope>(200, "{}").unwrap();
        assert!(env.users.is_empty());
    }

    #[test]
    fn payload_decodes_records_in_order() {
        let body = r#"{"members":[{"discord_id":"1","username":"a"},{"discord_id":"2","username":"b","restored":true}]}"#;
        let env = decode_body::<MembersEnvelope>(200, body).unwrap();
        let ids: Vec<_> = env.members.iter().map(|m| m.discord_id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert!(env.members[1].restored);
    }

    #[test]
    fn record_without_id_does_not_reject_the_list() {
        let body = r#"{"members":[{"discord_id":"1"},{"username":"no-id"},{"discord_id":null},{"discord_id":"3"}]}"#;
        let env = decode_body::<MembersEnvelope>(200, body).unwrap();
        let ids: Vec<_> = env.members.iter().map(|m| m.discord_id.as_str()).collect();
        assert_eq!(ids, ["1", "", "", "3"]);
    }

    #[test]
    fn malformed_success_body_is_a_failure_not_a_panic() {
        let err = decode_body::<StatsEnvelope>(200, "<html>").unwrap_err();
        assert_eq!(err.status, Some(200));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let err = status_error(500, &body);
        assert!(err.message.len() < 300);
    }

    #[tokio::test]
    async fn unreachable_api_is_a_network_failure() {
        // Port 1 on loopback refuses connections.
        let client = ApiClient::new("http://127.0.0.1:1/", Duration::from_secs(2)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:1");

        let err = client.verified_users(GuildId(5)).await.unwrap_err();
        assert_eq!(err.status, None);

        let url = client.verification_url(GuildId(5)).await;
        assert_eq!(url, "http://127.0.0.1:1/verify/5");
    }
}
