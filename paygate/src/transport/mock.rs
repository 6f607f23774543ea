//! In-memory transport for unit tests.

use std::{collections::VecDeque, sync::Mutex};

use serde_json::Value;

use crate::{
    auth::ApiKey,
    error::{PaygateError, Result},
    transport::{Method, RequestContext, Transport, TransportResponse, sealed},
};

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub authorization: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

/// Replays queued responses and records every request.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<TransportResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: &Value) {
        self.push(TransportResponse {
            status,
            body: serde_json::to_vec(body).unwrap(),
            headers: vec![("content-type".to_owned(), "application/json".to_owned())],
        });
    }

    pub fn push(&self, response: TransportResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    fn record(
        &self,
        key: &ApiKey,
        ctx: &RequestContext<'_>,
        method: Method,
        body: Option<&[u8]>,
    ) -> Result<TransportResponse> {
        let body = body
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| serde_json::from_slice(bytes).unwrap());
        let mut headers: Vec<(String, String)> =
            ctx.headers.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        if let Some(content_type) = ctx.content_type {
            headers.push(("Content-Type".to_owned(), content_type.to_owned()));
        }

        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: ctx.path.to_owned(),
            query: ctx.query.to_vec(),
            headers,
            body,
            authorization: key.authorization(ctx.auth_scheme),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PaygateError::Transport("mock transport has no queued response".into()))
    }
}

impl sealed::private::Sealed for MockTransport {}

impl Transport for MockTransport {
    async fn get<'a>(&'a self, key: &'a ApiKey, ctx: RequestContext<'a>) -> Result<TransportResponse> {
        self.record(key, &ctx, Method::Get, None)
    }

    async fn post<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        self.record(key, &ctx, Method::Post, Some(body))
    }

    async fn patch<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        self.record(key, &ctx, Method::Patch, Some(body))
    }

    async fn delete<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
    ) -> Result<TransportResponse> {
        self.record(key, &ctx, Method::Delete, None)
    }

    fn protocol_name(&self) -> &'static str {
        "mock"
    }
}
