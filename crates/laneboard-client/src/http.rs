use std::time::Duration;

use laneboard_core::board::BoardSnapshot;
use laneboard_core::intent::{MoveIntent, MoveOutcome};
use laneboard_core::ErrorKind;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::BoardApi;
use crate::error::ClientError;
use crate::Result;

/// Header carrying the caller's identity to the server.
pub const USER_HEADER: &str = "x-laneboard-user";

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    kind: Option<ErrorKind>,
}

/// [`BoardApi`] over the laneboard HTTP endpoints.
#[derive(Clone)]
pub struct HttpBoardClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
}

impl HttpBoardClient {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
        })
    }

    fn board_url(&self, board_id: &str) -> String {
        format!("{}/api/board/{board_id}", self.base_url)
    }
}

/// Decode a success body, or turn an error body back into a typed error.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error,
            kind: Some(kind),
        }) => Err(ClientError::Rejected {
            kind,
            message: error,
        }),
        _ => Err(ClientError::Unexpected {
            status: status.as_u16(),
            body,
        }),
    }
}

impl BoardApi for HttpBoardClient {
    async fn fetch_snapshot(&self, board_id: &str) -> Result<BoardSnapshot> {
        let resp = self
            .http
            .get(self.board_url(board_id))
            .header(USER_HEADER, &self.user_id)
            .send()
            .await?;
        decode(resp).await
    }

    async fn submit_move(&self, board_id: &str, intent: &MoveIntent) -> Result<MoveOutcome> {
        let resp = self
            .http
            .post(format!("{}/move", self.board_url(board_id)))
            .header(USER_HEADER, &self.user_id)
            .json(intent)
            .send()
            .await?;
        decode(resp).await
    }
}
