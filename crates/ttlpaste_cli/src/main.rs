//! Command-line client for the ttlpaste API.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::Value;
use std::io::{self, Read};
use std::time::{Duration, Instant};
use ttlpaste_core::DEFAULT_CLI_SERVER_URL;


#[derive(Parser)]
#[command(name = "tpaste", about = "ttlpaste CLI", version)]
struct Cli {
    /// Server URL (can also be set via TP_SERVER env var)
    #[arg(short, long, env = "TP_SERVER")]
    server: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Print timing for API requests
    #[arg(long, global = true)]
    timing: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Create a paste from a file or stdin
    New {
        #[arg(short, long)]
        file: Option<String>,
        /// Expire the paste this many seconds after creation
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        ttl: Option<u64>,
        /// Stop serving the paste after this many views
        #[arg(short = 'm', long, value_parser = clap::value_parser!(u64).range(1..))]
        max_views: Option<u64>,
    },
    /// Print a paste (counts as one view)
    Get { id: String },
    /// Replace the content of a paste from a file or stdin
    Edit {
        id: String,
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Check server and store connectivity
    Health,
}

fn log_timing(timing: bool, label: &str, request: Duration, parse: Duration) {
    if !timing {
        return;
    }
    let total = request + parse;
    eprintln!(
        "[timing] {}: request {:.1} ms, parse {:.1} ms, total {:.1} ms",
        label,
        request.as_secs_f64() * 1000.0,
        parse.as_secs_f64() * 1000.0,
        total.as_secs_f64() * 1000.0
    );
}

fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

async fn ensure_success_or_exit(res: reqwest::Response, action: &str) -> reqwest::Response {
    let status = res.status();
    if status.is_success() {
        return res;
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    let message = error_message_for_response(status, &body);
    eprintln!("{} failed ({}): {}", action, status, message);
    std::process::exit(1);
}

fn exit_with(action: &str, result: Result<String, String>) -> String {
    match result {
        Ok(output) => output,
        Err(message) => {
            eprintln!("{} failed: {}", action, message);
            std::process::exit(1);
        }
    }
}

fn pretty(value: &Value) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("response encoding error: {}", err))
}

fn str_field<'a>(value: &'a Value, field: &str) -> Result<&'a str, String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("response missing '{}' field", field))
}

fn create_body(content: String, ttl: Option<u64>, max_views: Option<u64>) -> Value {
    let mut body = serde_json::json!({ "content": content });
    if let Some(ttl) = ttl {
        body["ttl_seconds"] = ttl.into();
    }
    if let Some(max_views) = max_views {
        body["max_views"] = max_views.into();
    }
    body
}

fn format_created_output(created: &Value, json: bool) -> Result<String, String> {
    if json {
        return pretty(created);
    }
    let id = str_field(created, "id")?;
    let url = str_field(created, "url")?;
    Ok(format!("Created: {} ({})", url, id))
}

fn format_get_output(paste: &Value, json: bool) -> Result<String, String> {
    if json {
        return pretty(paste);
    }
    str_field(paste, "content").map(str::to_string)
}

/// One-line summary of the limits a fetched paste reports.
fn format_limits(paste: &Value) -> Option<String> {
    let views = paste
        .get("remaining_views")
        .and_then(Value::as_u64)
        .map(|left| format!("{} view(s) left", left));
    let expiry = paste
        .get("expires_at")
        .and_then(Value::as_str)
        .map(|at| format!("expires {}", at));
    match (views, expiry) {
        (Some(views), Some(expiry)) => Some(format!("{}, {}", views, expiry)),
        (views, expiry) => views.or(expiry),
    }
}

fn format_edit_output(id: &str, response: &Value, json: bool) -> Result<String, String> {
    if json {
        return pretty(response);
    }
    str_field(response, "content")?;
    Ok(format!("Updated paste: {}", id))
}

fn format_health_output(health: &Value, json: bool) -> Result<String, String> {
    if json {
        return pretty(health);
    }
    let store = str_field(health, "store")?;
    let message = health
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Ok(format!("store: {}\n{}", store, message).trim_end().to_string())
}

fn api_url(server: &str, segments: &[&str]) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(server)
        .map_err(|err| format!("Invalid server URL '{}': {}", server, err))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| "Server URL cannot be used as an API base".to_string())?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

fn api_url_or_exit(server: &str, action: &str, segments: &[&str]) -> reqwest::Url {
    match api_url(server, segments) {
        Ok(url) => url,
        Err(message) => {
            eprintln!("{} failed: {}", action, message);
            std::process::exit(1);
        }
    }
}

fn normalize_server(server: String) -> String {
    if let Ok(mut url) = reqwest::Url::parse(&server) {
        let should_normalize_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if should_normalize_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return server;
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    server
}

fn resolve_server(server: Option<String>) -> String {
    server
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CLI_SERVER_URL.to_string())
}

fn read_content(file: Option<String>) -> io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        server,
        json,
        timing,
        timeout,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?;
    let server = normalize_server(resolve_server(server));

    match command {
        Commands::Completions { .. } => {}
        Commands::New {
            file,
            ttl,
            max_views,
        } => {
            let endpoint = api_url_or_exit(&server, "New", &["api", "pastes"]);
            let body = create_body(read_content(file)?, ttl, max_views);

            let request_start = Instant::now();
            let res = client.post(endpoint).json(&body).send().await?;
            let request_elapsed = request_start.elapsed();
            let res = ensure_success_or_exit(res, "New").await;

            let parse_start = Instant::now();
            let created: Value = res.json().await?;
            log_timing(timing, "new", request_elapsed, parse_start.elapsed());
            println!("{}", exit_with("New", format_created_output(&created, json)));
        }
        Commands::Get { id } => {
            let endpoint = api_url_or_exit(&server, "Get", &["api", "pastes", id.as_str()]);
            let request_start = Instant::now();
            let res = client.get(endpoint).send().await?;
            let request_elapsed = request_start.elapsed();
            let res = ensure_success_or_exit(res, "Get").await;

            let parse_start = Instant::now();
            let paste: Value = res.json().await?;
            log_timing(timing, "get", request_elapsed, parse_start.elapsed());
            println!("{}", exit_with("Get", format_get_output(&paste, json)));
            if !json {
                if let Some(limits) = format_limits(&paste) {
                    eprintln!("({})", limits);
                }
            }
        }
        Commands::Edit { id, file } => {
            let endpoint = api_url_or_exit(&server, "Edit", &["api", "pastes", id.as_str()]);
            let body = serde_json::json!({ "content": read_content(file)? });

            let request_start = Instant::now();
            let res = client.put(endpoint).json(&body).send().await?;
            let request_elapsed = request_start.elapsed();
            let res = ensure_success_or_exit(res, "Edit").await;

            let parse_start = Instant::now();
            let response: Value = res.json().await?;
            log_timing(timing, "edit", request_elapsed, parse_start.elapsed());
            println!(
                "{}",
                exit_with("Edit", format_edit_output(&id, &response, json))
            );
        }
        Commands::Health => {
            let endpoint = api_url_or_exit(&server, "Health", &["api", "healthz"]);
            let request_start = Instant::now();
            let res = client.get(endpoint).send().await?;
            let request_elapsed = request_start.elapsed();
            let res = ensure_success_or_exit(res, "Health").await;

            let parse_start = Instant::now();
            let health: Value = res.json().await?;
            log_timing(timing, "health", request_elapsed, parse_start.elapsed());
            println!("{}", exit_with("Health", format_health_output(&health, json)));
            if health.get("store").and_then(Value::as_str) != Some("connected") {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
