use clap::{Parser, ValueEnum};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

use refergrow_gateway::client::{ApiBody, ApiClient, ApiError};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Send requests through the ReferGrow edge gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Pretend to be this client (sets x-forwarded-for).
    #[arg(long)]
    forwarded_for: Option<String>,

    /// JSON request body.
    #[arg(short, long)]
    data: Option<String>,

    /// Repeat the request, useful to watch the rate limiter kick in.
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: u32,

    #[arg(value_enum)]
    method: Verb,

    /// Path under the gateway, e.g. /api/services
    path: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<Verb> for Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    if let Some(ip) = &cli.forwarded_for {
        headers.insert(HeaderName::from_static("x-forwarded-for"), HeaderValue::from_str(ip)?);
    }
    let body: Option<Value> = cli.data.as_deref().map(serde_json::from_str).transpose()?;

    let client = ApiClient::new(&cli.url, headers)?;
    for attempt in 1..=cli.repeat {
        match client.request(cli.method.into(), &cli.path, body.as_ref()).await {
            Ok(body) => print_body(&body)?,
            Err(ApiError::Status { status, message, .. }) => {
                eprintln!("[{}] Error {}: {}", attempt, status, message);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn print_body(body: &ApiBody) -> Result<(), Box<dyn std::error::Error>> {
    match body.as_json() {
        Some(json) => println!("{}", serde_json::to_string_pretty(json)?),
        None => println!("{}", body.raw()),
    }
    Ok(())
}
