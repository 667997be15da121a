//! Loading HTML into a document element.

use http::Method;
use std::sync::Arc;

use crate::callback::CompleteCallback;
use crate::dom::{set_content, Document, Target};
use crate::transport::Transport;
use crate::{Client, Payload, RequestHandle, RequestOptions, ResponseType};

impl<T: Transport> Client<T> {
    /// Requests `url` and replaces the content of `target` with the response.
    ///
    /// Sends a POST when a payload is given and a GET otherwise. The response
    /// is always requested as HTML. `on_complete` runs after the content was
    /// assigned, or after the error when the request failed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use xhrkit::dom::memory::MemoryDocument;
    /// use xhrkit::Client;
    ///
    /// # async fn example() -> Result<(), xhrkit::Error> {
    /// let document = Arc::new(MemoryDocument::new());
    /// document.insert_element("news", "div");
    ///
    /// let client = Client::new();
    /// let handle = client
    ///     .load_into(document.clone(), "news", "https://example.com/news.html", None, None)
    ///     .await;
    /// handle.wait().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_into<D: Document>(
        &self,
        document: Arc<D>,
        target: impl Into<Target<D::Node>>,
        url: impl Into<String>,
        payload: Option<Payload>,
        on_complete: Option<CompleteCallback>,
    ) -> RequestHandle {
        let element = match target.into() {
            Target::Element(node) => Ok(node),
            Target::Id(id) => document.get_element_by_id(&id).ok_or(id),
        };
        let method = if payload.is_some() {
            Method::POST
        } else {
            Method::GET
        };

        let options = RequestOptions::new()
            .url(url)
            .method(method)
            .response_type(ResponseType::Html)
            .payload(payload)
            .on_success(move |_settings, body, _status, handle| {
                let html = body.as_text().unwrap_or_default();
                match &element {
                    Ok(element) => {
                        if let Err(e) = set_content(document.as_ref(), element, html) {
                            tracing::error!(
                                error = %e,
                                url = %handle.url(),
                                "Failed to assign loaded content"
                            );
                        }
                    }
                    Err(id) => {
                        tracing::error!(
                            id = %id,
                            url = %handle.url(),
                            "No element to load content into"
                        );
                    }
                }
            });

        let options = RequestOptions {
            on_complete: Some(on_complete),
            ..options
        };
        self.request(options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryDocument;
    use crate::transport::OutgoingRequest;
    use crate::{RawResponse, Result, Settings};
    use http::header::ACCEPT;
    use http::{HeaderMap, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct HtmlTransport {
        status: u16,
        html: String,
        sent: Mutex<Vec<OutgoingRequest>>,
    }

    impl HtmlTransport {
        fn new(status: u16, html: &str) -> Self {
            Self {
                status,
                html: html.to_string(),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> OutgoingRequest {
            self.sent.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for HtmlTransport {
        async fn send(&self, request: OutgoingRequest) -> Result<RawResponse> {
            self.sent.lock().unwrap().push(request);
            Ok(RawResponse::new(
                StatusCode::from_u16(self.status).unwrap(),
                HeaderMap::new(),
                self.html.clone(),
                Duration::ZERO,
            ))
        }
    }

    #[tokio::test]
    async fn test_load_without_payload_is_html_get() {
        let client = Client::with_transport(HtmlTransport::new(200, "<p>new</p>"));
        let document = Arc::new(MemoryDocument::new());
        let panel = document.insert_element("panel", "div");
        document.set_inner_html(&panel, "<p>old</p>").unwrap();

        client
            .load_into(document.clone(), "panel", "/fragment", None, None)
            .await
            .wait()
            .await
            .unwrap();

        let sent = client.transport().last();
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.body, None);
        assert_eq!(sent.headers.get(ACCEPT).unwrap(), "text/html");
        assert_eq!(document.inner_html(&panel), "<p>new</p>");
    }

    #[tokio::test]
    async fn test_load_with_payload_is_post() {
        let client = Client::with_transport(HtmlTransport::new(200, "<b>saved</b>"));
        let document = Arc::new(MemoryDocument::new());
        let panel = document.insert_element("panel", "div");

        client
            .load_into(
                document.clone(),
                Target::Element(panel),
                "/save",
                Some(Payload::new().with("title", "x y")),
                None,
            )
            .await
            .wait()
            .await
            .unwrap();

        let sent = client.transport().last();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url, "/save");
        assert_eq!(sent.body.as_deref(), Some("title=x%20y"));
        assert_eq!(document.inner_html(&panel), "<b>saved</b>");
    }

    #[tokio::test]
    async fn test_load_falls_back_when_assignment_rejected() {
        let client =
            Client::with_transport(HtmlTransport::new(200, "<tr><td>1</td></tr><tr><td>2</td></tr>"));
        let document = Arc::new(MemoryDocument::new());
        let table = document.insert_element("grid", "table");
        let stale = document.create_element("tr").unwrap();
        document.append_child(&table, &stale).unwrap();
        document.reject_inner_html("table");

        client
            .load_into(document.clone(), "grid", "/rows", None, None)
            .await
            .wait()
            .await
            .unwrap();

        assert_eq!(
            document.inner_html(&table),
            "<tr><td>1</td></tr><tr><td>2</td></tr>"
        );
        assert_eq!(document.parent(&stale), None);
    }

    #[tokio::test]
    async fn test_complete_is_forwarded() {
        let client = Client::with_transport(HtmlTransport::new(500, "oops"));
        let document = Arc::new(MemoryDocument::new());
        let panel = document.insert_element("panel", "div");
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = completed.clone();

        let handle = client
            .load_into(
                document.clone(),
                "panel",
                "/broken",
                None,
                Some(Box::new(move |settings: &Settings, _handle: &RequestHandle, status: u16| {
                    assert_eq!(settings.response_type, ResponseType::Html);
                    assert_eq!(status, 500);
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .await;

        assert_eq!(handle.wait().await.unwrap(), 500);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(document.inner_html(&panel), "");
    }

    #[tokio::test]
    async fn test_missing_target_still_completes() {
        let client = Client::with_transport(HtmlTransport::new(200, "<p>x</p>"));
        let document = Arc::new(MemoryDocument::new());
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = completed.clone();

        client
            .load_into(
                document,
                "nowhere",
                "/x",
                None,
                Some(Box::new(move |_: &Settings, _: &RequestHandle, _: u16| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .await
            .wait()
            .await
            .unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }
}
