use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::error::ChannelError;
use super::{PanelDocument, PanelTarget, PublishTarget};

/// Bearer-token client for one live thread.
pub struct LiveThreadClient {
    access_token: String,
    thread_id: String,
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AboutResponse {
    data: AboutData,
}

#[derive(Debug, Deserialize)]
struct AboutData {
    title: Option<String>,
    description: Option<String>,
    resources: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    json: Option<ActionJson>,
}

#[derive(Debug, Deserialize)]
struct ActionJson {
    #[serde(default)]
    errors: Vec<Vec<serde_json::Value>>,
}

impl LiveThreadClient {
    /// Fails when `user_agent` is not a valid header value.
    pub fn with_base_url(
        access_token: String,
        thread_id: String,
        user_agent: &str,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(ChannelError::ClientBuild)?;
        Ok(Self {
            access_token,
            thread_id,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.access_token)
    }

    async fn check_status(response: Response) -> Result<Response, ChannelError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(ChannelError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    /// A 2xx action response may still carry a list of errors.
    async fn check_action(response: Response) -> Result<(), ChannelError> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let parsed: ActionResponse =
            serde_json::from_str(&body).map_err(|e| ChannelError::Malformed(e.to_string()))?;
        let errors = parsed.json.map(|j| j.errors).unwrap_or_default();
        if errors.is_empty() {
            return Ok(());
        }
        let joined = errors
            .iter()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(": ")
            })
            .collect::<Vec<_>>()
            .join("; ");
        Err(ChannelError::Rejected(joined))
    }

    pub async fn add_update(&self, body: &str) -> Result<(), ChannelError> {
        let url = format!("{}/api/live/{}/update", self.base_url, self.thread_id);
        let response = self
            .authorized(self.client.post(&url))
            .form(&[("api_type", "json"), ("body", body)])
            .send()
            .await?;
        Self::check_action(response).await
    }

    pub async fn about(&self) -> Result<PanelDocument, ChannelError> {
        let url = format!("{}/live/{}/about", self.base_url, self.thread_id);
        let response = self
            .authorized(self.client.get(&url))
            .query(&[("raw_json", "1")])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        let about: AboutResponse =
            serde_json::from_str(&body).map_err(|e| ChannelError::Malformed(e.to_string()))?;
        Ok(PanelDocument {
            title: about.data.title.unwrap_or_default(),
            description: about.data.description.unwrap_or_default(),
            resources: about.data.resources.unwrap_or_default(),
        })
    }

    pub async fn edit_settings(&self, document: &PanelDocument) -> Result<(), ChannelError> {
        let url = format!("{}/api/live/{}/edit", self.base_url, self.thread_id);
        let response = self
            .authorized(self.client.post(&url))
            .form(&[
                ("api_type", "json"),
                ("title", document.title.as_str()),
                ("description", document.description.as_str()),
                ("resources", document.resources.as_str()),
            ])
            .send()
            .await?;
        Self::check_action(response).await
    }
}

impl PublishTarget for LiveThreadClient {
    async fn publish(&self, body: &str) -> Result<(), ChannelError> {
        self.add_update(body).await
    }
}

impl PanelTarget for LiveThreadClient {
    async fn read_panel(&self) -> Result<PanelDocument, ChannelError> {
        self.about().await
    }

    async fn write_panel(&self, document: &PanelDocument) -> Result<(), ChannelError> {
        self.edit_settings(document).await
    }
}
