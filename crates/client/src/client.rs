use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    ChallengeCompletion, ChallengeId, CompleteChallengeRequest, Error, ErrorResponse,
    LeaderboardEntry, LoginRequest, LoginResponse, MessageResponse, Record, RecordInput,
    RegisterRequest, UploadResponse,
};

#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub async fn health(&self) -> Result<String, Error> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(self.handle_error_response(response).await)
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, Error> {
        let url = format!("{}/api/register", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        match response.status() {
            StatusCode::CREATED => Ok(response.json().await?),
            _ => Err(self.handle_error_response(response).await),
        }
    }

    /// Keeps the returned token for the authenticated calls that follow.
    pub async fn login(
        &mut self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<LoginResponse, Error> {
        let url = format!("{}/api/login", self.base_url);
        let request = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        let response = self.client.post(&url).json(&request).send().await?;

        let login: LoginResponse = self.parse(response).await?;
        tracing::debug!(user_id = login.user.id, "logged_in");
        self.token = Some(login.token.clone());
        Ok(login)
    }

    pub async fn create_record(&self, input: &RecordInput) -> Result<Record, Error> {
        let url = format!("{}/api/records", self.base_url);
        let response = self.authed(self.client.post(&url))?.json(input).send().await?;

        match response.status() {
            StatusCode::CREATED => Ok(response.json().await?),
            _ => Err(self.handle_error_response(response).await),
        }
    }

    pub async fn list_records(&self) -> Result<Vec<Record>, Error> {
        let url = format!("{}/api/records", self.base_url);
        let response = self.authed(self.client.get(&url))?.send().await?;
        self.parse(response).await
    }

    pub async fn get_record(&self, id: u64) -> Result<Record, Error> {
        let url = format!("{}/api/records/{}", self.base_url, id);
        let response = self.authed(self.client.get(&url))?.send().await?;
        self.parse(response).await
    }

    pub async fn update_record(&self, id: u64, input: &RecordInput) -> Result<Record, Error> {
        let url = format!("{}/api/records/{}", self.base_url, id);
        let response = self.authed(self.client.put(&url))?.json(input).send().await?;
        self.parse(response).await
    }

    pub async fn delete_record(&self, id: u64) -> Result<MessageResponse, Error> {
        let url = format!("{}/api/records/{}", self.base_url, id);
        let response = self.authed(self.client.delete(&url))?.send().await?;
        self.parse(response).await
    }

    pub async fn complete_challenge(
        &self,
        challenge_id: impl Into<ChallengeId>,
    ) -> Result<ChallengeCompletion, Error> {
        let url = format!("{}/api/challenges/complete", self.base_url);
        let request = CompleteChallengeRequest {
            challenge_id: challenge_id.into(),
        };
        let response = self
            .authed(self.client.post(&url))?
            .json(&request)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(response.json().await?),
            _ => Err(self.handle_error_response(response).await),
        }
    }

    pub async fn list_challenges(&self) -> Result<Vec<ChallengeCompletion>, Error> {
        let url = format!("{}/api/challenges", self.base_url);
        let response = self.authed(self.client.get(&url))?.send().await?;
        self.parse(response).await
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, Error> {
        let url = format!("{}/api/challenges/leaderboard", self.base_url);
        let response = self.client.get(&url).send().await?;
        self.parse(response).await
    }

    pub async fn upload_pdf(
        &self,
        file_name: impl Into<String>,
        content: Vec<u8>,
    ) -> Result<UploadResponse, Error> {
        let url = format!("{}/api/records/upload-pdf", self.base_url);
        let part = reqwest::multipart::Part::bytes(content)
            .file_name(file_name.into())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("pdf", part);

        let response = self
            .authed(self.client.post(&url))?
            .multipart(form)
            .send()
            .await?;
        self.parse(response).await
    }

    pub async fn list_pdfs(&self) -> Result<Vec<String>, Error> {
        let url = format!("{}/api/records/list-pdfs", self.base_url);
        let response = self.authed(self.client.get(&url))?.send().await?;
        self.parse(response).await
    }

    pub async fn download_pdf(&self, filename: &str) -> Result<bytes::Bytes, Error> {
        let url = self.url_with_segment("api/records/download-pdf", filename)?;
        let response = self.authed(self.client.get(url))?.send().await?;

        if response.status().is_success() {
            Ok(response.bytes().await?)
        } else {
            Err(self.handle_error_response(response).await)
        }
    }

    // `segment` is percent-encoded as a single path segment.
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<reqwest::Url, Error> {
        let mut url = reqwest::Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url.clone()))?
            .push(segment);

        Ok(url)
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, Error> {
        let token = self.token.as_ref().ok_or(Error::NotAuthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    async fn parse<T: DeserializeOwned>(&self, response: Response) -> Result<T, Error> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.handle_error_response(response).await)
        }
    }

    async fn handle_error_response(&self, response: Response) -> Error {
        let status = response.status().as_u16();

        if let Ok(error_response) = response.json::<ErrorResponse>().await {
            Error::ServerError {
                status,
                message: error_response.error,
            }
        } else {
            Error::UnexpectedResponse
        }
    }
}
