//! GitHub contents-API implementation of [`BlobStore`]
//!
//! Objects are files committed to a branch of a GitHub Pages repository.
//! The file's git blob SHA doubles as the revision token: the contents API
//! requires it on update and delete, which gives us the optimistic
//! concurrency the trait demands for free.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;

use super::{Blob, BlobStore, DeleteOutcome, Revision, StoreError};

const API_BASE: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("bulletin-sync/", env!("CARGO_PKG_VERSION"));

/// Response body for a contents GET.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

/// Response body for a contents PUT.
#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

/// Blob store backed by the GitHub contents API.
pub struct GitHubStore {
    client: reqwest::blocking::Client,
    owner: String,
    repo: String,
    branch: String,
    token: String,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl GitHubStore {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        token: impl Into<String>,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            token: token.into(),
            read_timeout,
            write_timeout,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            API_BASE, self.owner, self.repo, path
        )
    }

    /// GET the contents record for `path`, or `None` on 404.
    fn get_contents(&self, path: &str) -> Result<Option<ContentsResponse>, StoreError> {
        let resp = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.branch.as_str())])
            .bearer_auth(&self.token)
            .header("Accept", ACCEPT)
            .timeout(self.read_timeout)
            .send()
            .map_err(|source| StoreError::Transport {
                op: "get",
                path: path.to_string(),
                source,
            })?;

        match resp.status().as_u16() {
            404 => Ok(None),
            s if (200..300).contains(&s) => {
                let body: ContentsResponse =
                    resp.json().map_err(|e| StoreError::BadResponse {
                        path: path.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Some(body))
            }
            s => Err(StoreError::Http {
                op: "get",
                path: path.to_string(),
                status: s,
                detail: String::new(),
            }),
        }
    }
}

impl BlobStore for GitHubStore {
    fn get_revision(&self, path: &str) -> Result<Option<Revision>, StoreError> {
        Ok(self.get_contents(path)?.map(|c| Revision(c.sha)))
    }

    fn get(&self, path: &str) -> Result<Option<Blob>, StoreError> {
        let Some(contents) = self.get_contents(path)? else {
            return Ok(None);
        };
        // The contents API omits `content` for files over 1 MB; surface
        // that instead of decoding an empty payload.
        let Some(encoded) = contents.content else {
            return Err(StoreError::BadResponse {
                path: path.to_string(),
                reason: "response carries a sha but no content (file too large?)".to_string(),
            });
        };
        // The API wraps base64 payloads with newlines.
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| StoreError::BadResponse {
                path: path.to_string(),
                reason: format!("base64 decode: {}", e),
            })?;
        Ok(Some(Blob {
            revision: Revision(contents.sha),
            bytes,
        }))
    }

    fn put(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        let mut payload = serde_json::json!({
            "message": message,
            "content": BASE64.encode(bytes),
            "branch": self.branch,
        });
        if let Some(rev) = expected {
            payload["sha"] = serde_json::Value::String(rev.0.clone());
        }

        let resp = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", ACCEPT)
            .timeout(self.write_timeout)
            .json(&payload)
            .send()
            .map_err(|source| StoreError::Transport {
                op: "put",
                path: path.to_string(),
                source,
            })?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: PutResponse = resp.json().map_err(|e| StoreError::BadResponse {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Revision(body.content.sha))
            }
            // Missing or stale sha for an existing file.
            409 | 422 => Err(StoreError::Conflict {
                path: path.to_string(),
            }),
            s => {
                let detail = resp
                    .text()
                    .map(|t| format!(" {}", t.trim()))
                    .unwrap_or_default();
                Err(StoreError::Http {
                    op: "put",
                    path: path.to_string(),
                    status: s,
                    detail,
                })
            }
        }
    }

    fn delete(
        &self,
        path: &str,
        revision: &Revision,
        message: &str,
    ) -> Result<DeleteOutcome, StoreError> {
        let payload = serde_json::json!({
            "message": message,
            "sha": revision.0,
            "branch": self.branch,
        });

        let resp = self
            .client
            .delete(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", ACCEPT)
            .timeout(self.write_timeout)
            .json(&payload)
            .send()
            .map_err(|source| StoreError::Transport {
                op: "delete",
                path: path.to_string(),
                source,
            })?;

        match resp.status().as_u16() {
            200 | 204 => Ok(DeleteOutcome::Deleted),
            404 => Ok(DeleteOutcome::AlreadyAbsent),
            s => {
                let detail = resp
                    .text()
                    .map(|t| format!(" {}", t.trim()))
                    .unwrap_or_default();
                Err(StoreError::Http {
                    op: "delete",
                    path: path.to_string(),
                    status: s,
                    detail,
                })
            }
        }
    }
}
