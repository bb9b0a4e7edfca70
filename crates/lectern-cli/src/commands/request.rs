//! Raw API requests through the session's interceptor.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use lectern_http::ApiRequest;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Endpoint path, e.g. /courses
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query", value_parser = parse_pair)]
    pub query: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Endpoint path, e.g. /courses
    pub path: String,

    /// JSON request body
    #[arg(short, long, default_value = "{}")]
    pub data: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query", value_parser = parse_pair)]
    pub query: Vec<(String, String)>,
}

fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

pub async fn get(global: &GlobalArgs, args: ReadArgs) -> Result<()> {
    send(global, with_query(ApiRequest::get(args.path), args.query)).await
}

pub async fn delete(global: &GlobalArgs, args: ReadArgs) -> Result<()> {
    send(global, with_query(ApiRequest::delete(args.path), args.query)).await
}

pub async fn post(global: &GlobalArgs, args: WriteArgs) -> Result<()> {
    let request = with_body(ApiRequest::post(&args.path), &args.data)?;
    send(global, with_query(request, args.query)).await
}

pub async fn put(global: &GlobalArgs, args: WriteArgs) -> Result<()> {
    let request = with_body(ApiRequest::put(&args.path), &args.data)?;
    send(global, with_query(request, args.query)).await
}

fn with_query(request: ApiRequest, query: Vec<(String, String)>) -> ApiRequest {
    query
        .into_iter()
        .fold(request, |request, (key, value)| request.with_query(key, value))
}

fn with_body(request: ApiRequest, data: &str) -> Result<ApiRequest> {
    let body: Value = serde_json::from_str(data).context("Request body is not valid JSON")?;
    request
        .with_json(&body)
        .context("Failed to encode request body")
}

async fn send(global: &GlobalArgs, request: ApiRequest) -> Result<()> {
    let session = CliSession::open(global, false)?;
    let path = request.path().to_string();

    let result = session
        .manager
        .client()
        .send_envelope::<Value>(request)
        .await;
    session.persist().context("Failed to save session")?;

    let envelope = result.with_context(|| format!("Request to {} failed", path))?;
    match envelope.data {
        Some(data) => output::json_pretty(&data),
        None => {
            if let Some(message) = envelope.message {
                output::success(&message);
            }
            Ok(())
        }
    }
}
