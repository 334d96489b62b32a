//! Microsoft Graph client
//!
//! Async HTTP client using `reqwest` with bearer token authentication.
//! Implements the DriveStore trait from cx-core.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use cx_core::config::DEFAULT_GRAPH_URL;
use cx_core::{AccessToken, DriveStore, ObjectStream, RemoteEntity, Result};

use crate::error::GraphError;
use crate::models::{Collection, Drive, DriveItem};

/// Graph API client bound to one access token
pub struct GraphClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GraphClient {
    /// Create a client against the public Graph endpoint
    pub fn new(token: &AccessToken) -> std::result::Result<Self, GraphError> {
        Self::with_base_url(token, DEFAULT_GRAPH_URL)
    }

    /// Create a client against a custom Graph base URL
    pub fn with_base_url(
        token: &AccessToken,
        base_url: &str,
    ) -> std::result::Result<Self, GraphError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.secret()))
            .map_err(|_| GraphError::Auth("access token is not a valid header value".into()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url =
            Url::parse(base_url).map_err(|_| GraphError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GraphError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self { http, base_url })
    }

    /// Base URL joined with percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, GraphError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GraphError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> std::result::Result<T, GraphError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "graph GET");

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GraphError::from_response(response).await);
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn items(&self, segments: &[&str]) -> std::result::Result<Vec<RemoteEntity>, GraphError> {
        let page: Collection<DriveItem> = self.get_json(segments).await?;
        Ok(page.value.into_iter().map(DriveItem::into_entity).collect())
    }
}

#[async_trait]
impl DriveStore for GraphClient {
    async fn list_root_children(&self) -> Result<Vec<RemoteEntity>> {
        Ok(self.items(&["me", "drive", "root", "children"]).await?)
    }

    async fn list_drives(&self) -> Result<Vec<RemoteEntity>> {
        let drives: Collection<Drive> = self.get_json(&["me", "drives"]).await?;
        Ok(drives.value.into_iter().map(Drive::into_entity).collect())
    }

    async fn list_children(&self, drive_id: &str, folder_id: &str) -> Result<Vec<RemoteEntity>> {
        Ok(self
            .items(&["me", "drives", drive_id, "items", folder_id, "children"])
            .await?)
    }

    async fn download(&self, drive_id: &str, item_id: &str) -> Result<ObjectStream> {
        let url = self.endpoint(&["me", "drives", drive_id, "items", item_id, "content"])?;
        tracing::debug!(%url, "graph download");

        let response = self.http.get(url).send().await.map_err(GraphError::from)?;
        if !response.status().is_success() {
            return Err(GraphError::from_response(response).await.into());
        }

        let content_length = response.content_length();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes_stream()
            .map_err(|e| cx_core::Error::Network(e.to_string()))
            .boxed();

        Ok(ObjectStream::new(body, content_length).with_content_type(content_type))
    }

    async fn upload(
        &self,
        drive_id: &str,
        folder_id: &str,
        name: &str,
        stream: ObjectStream,
    ) -> Result<RemoteEntity> {
        let parent = format!("{folder_id}:");
        let file = format!("{name}:");
        let url = self.endpoint(&["me", "drives", drive_id, "items", &parent, &file, "content"])?;
        tracing::debug!(%url, length = ?stream.content_length, "graph upload");

        let mut request = self.http.put(url);
        if let Some(len) = stream.content_length {
            request = request.header(CONTENT_LENGTH, len);
        }
        if let Some(ct) = &stream.content_type {
            request = request.header(CONTENT_TYPE, ct.as_str());
        }

        let response = request
            .body(reqwest::Body::wrap_stream(stream.body))
            .send()
            .await
            .map_err(GraphError::from)?;

        if !response.status().is_success() {
            return Err(GraphError::from_response(response).await.into());
        }

        let body = response.bytes().await.map_err(GraphError::from)?;
        let item: DriveItem = serde_json::from_slice(&body)?;
        Ok(item.into_entity())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use tokio::net::TcpListener;

    use super::*;
    use cx_core::EntityKind;

    #[derive(Clone, Default)]
    struct Recorded {
        uploads: Arc<Mutex<Vec<(String, Option<String>, Vec<u8>)>>>,
        auth: Arc<Mutex<Option<String>>>,
    }

    async fn serve(router: Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        (url, handle)
    }

    fn client(url: &str) -> GraphClient {
        GraphClient::with_base_url(&AccessToken::new("test-token"), url).unwrap()
    }

    fn graph_router(state: Recorded) -> Router {
        Router::new()
            .route(
                "/me/drive/root/children",
                get(|State(s): State<Recorded>, headers: HeaderMap| async move {
                    *s.auth.lock().unwrap() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    axum::Json(serde_json::json!({"value":[
                        {"id":"F1","name":"Documents","folder":{"childCount":1}},
                        {"id":"I1","name":"a.txt","file":{},"size":3}
                    ]}))
                }),
            )
            .route(
                "/me/drives",
                get(|| async {
                    axum::Json(serde_json::json!({"value":[
                        {"id":"b!1","name":"OneDrive","driveType":"personal"}
                    ]}))
                }),
            )
            .route(
                "/me/drives/{drive}/items/{item}/children",
                get(|Path((drive, item)): Path<(String, String)>| async move {
                    if drive != "b!1" {
                        return (
                            StatusCode::NOT_FOUND,
                            r#"{"error":{"code":"itemNotFound"}}"#,
                        )
                            .into_response();
                    }
                    axum::Json(serde_json::json!({"value":[
                        {"id": format!("{item}-sub"), "name":"Sub","folder":{}},
                        {"id":"I9","name":"report.pdf","file":{"mimeType":"application/pdf"},"size":10}
                    ]}))
                    .into_response()
                }),
            )
            .route(
                "/me/drives/{drive}/items/{item}/content",
                get(|| async { ([("content-type", "text/plain")], "hello world") }),
            )
            .route(
                "/me/drives/{drive}/items/{item}/{file}/content",
                axum::routing::put(
                    |State(s): State<Recorded>,
                     Path((_, _, file)): Path<(String, String, String)>,
                     headers: HeaderMap,
                     body: Body| async move {
                        let data = to_bytes(body, usize::MAX).await.unwrap().to_vec();
                        let name = file.trim_end_matches(':').to_string();
                        let length = headers
                            .get("content-length")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let size = data.len();
                        s.uploads.lock().unwrap().push((name.clone(), length, data));
                        (
                            StatusCode::CREATED,
                            axum::Json(serde_json::json!({
                                "id":"NEW1","name": name,"size": size,"file":{}
                            })),
                        )
                    },
                ),
            )
            .with_state(state)
    }

    #[tokio::test]
    async fn test_list_root_children_sends_bearer() {
        let state = Recorded::default();
        let (url, handle) = serve(graph_router(state.clone())).await;

        let items = client(&url).list_root_children().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, EntityKind::Folder);
        assert_eq!(items[1].kind, EntityKind::File);
        assert_eq!(
            state.auth.lock().unwrap().as_deref(),
            Some("Bearer test-token")
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_list_drives() {
        let (url, handle) = serve(graph_router(Recorded::default())).await;

        let drives = client(&url).list_drives().await.unwrap();
        assert_eq!(drives.len(), 1);
        assert_eq!(drives[0].id, "b!1");
        assert_eq!(drives[0].name, "OneDrive");

        handle.abort();
    }

    #[tokio::test]
    async fn test_list_children_of_folder() {
        let (url, handle) = serve(graph_router(Recorded::default())).await;

        let children = client(&url).list_children("b!1", "root").await.unwrap();
        assert_eq!(children[0].id, "root-sub");
        assert_eq!(children[1].name, "report.pdf");

        handle.abort();
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let (url, handle) = serve(graph_router(Recorded::default())).await;

        let err = client(&url).list_children("other", "root").await.unwrap_err();
        assert!(matches!(err, cx_core::Error::NotFound(ref m) if m.contains("itemNotFound")));

        handle.abort();
    }

    #[tokio::test]
    async fn test_download_streams_content() {
        let (url, handle) = serve(graph_router(Recorded::default())).await;

        let stream = client(&url).download("b!1", "I1").await.unwrap();
        assert_eq!(stream.content_length, Some(11));
        assert_eq!(stream.content_type.as_deref(), Some("text/plain"));
        assert_eq!(stream.collect().await.unwrap(), b"hello world");

        handle.abort();
    }

    #[tokio::test]
    async fn test_upload_puts_named_content() {
        let state = Recorded::default();
        let (url, handle) = serve(graph_router(state.clone())).await;

        let stream = ObjectStream::from_bytes(b"a,b\n1,2\n".to_vec());
        let created = client(&url)
            .upload("b!1", "root", "summary.csv", stream)
            .await
            .unwrap();

        assert_eq!(created.id, "NEW1");
        assert_eq!(created.size_bytes, Some(8));

        let uploads = state.uploads.lock().unwrap();
        assert_eq!(uploads[0].0, "summary.csv");
        assert_eq!(uploads[0].1.as_deref(), Some("8"));
        assert_eq!(uploads[0].2, b"a,b\n1,2\n");

        handle.abort();
    }

    #[tokio::test]
    async fn test_upload_zero_bytes() {
        let state = Recorded::default();
        let (url, handle) = serve(graph_router(state.clone())).await;

        let created = client(&url)
            .upload("b!1", "root", "empty.txt", ObjectStream::from_bytes(Vec::new()))
            .await
            .unwrap();
        assert_eq!(created.size_bytes, Some(0));
        assert!(state.uploads.lock().unwrap()[0].2.is_empty());

        handle.abort();
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("https://graph.example.com/v1.0");
        let url = client
            .endpoint(&["me", "drives", "b!1", "items", "root:", "my file#1.txt:", "content"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.example.com/v1.0/me/drives/b!1/items/root:/my%20file%231.txt:/content"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(GraphClient::with_base_url(&AccessToken::new("t"), "not a url").is_err());
    }
}
