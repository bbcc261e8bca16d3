use anyhow::Result;
use clap::Parser;
use request_service::{Hook, HookPayload, HookRegistry, RequestOptions, RequestService, ServiceConfig};

/// fetch - issue one request through a RequestService
///
/// Prints every response (status and headers) from a global response hook,
/// then the final status.
///
/// If REQUEST_SERVICE_TOKEN is set, it is sent as a bearer token.
///
/// Examples:
///   cargo run --example fetch -- https://example.com /path
#[derive(Parser, Debug)]
#[command(about)]
struct Cli {
    /// Base URL, e.g. https://example.com
    #[arg(value_name = "BASE_URL")]
    base_url: String,

    /// Path appended verbatim to the base URL
    #[arg(value_name = "PATH", default_value = "")]
    path: String,

    /// Extra header, as NAME:VALUE (repeatable)
    #[arg(long = "header", short = 'H', value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Do not follow redirects
    #[arg(long)]
    no_redirects: bool,
}

fn print_response(payload: &HookPayload<'_>) {
    if let HookPayload::Response(response) = payload {
        println!("{} {:?}", response.status(), response.headers());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut service = RequestService::from_config(&ServiceConfig::from_env(&cli.base_url))?;
    service.register_global_hooks(
        HookRegistry::new().with("response", Hook::named("print_response", print_response)),
    );

    let headers = cli
        .headers
        .iter()
        .map(|h| {
            h.split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
                .ok_or_else(|| anyhow::anyhow!("Invalid header '{}'. Expected NAME:VALUE.", h))
        })
        .collect::<Result<Vec<_>>>()?;
    service.add_headers(headers)?;

    let options = RequestOptions::new().allow_redirects(!cli.no_redirects);
    let response = service.get(&cli.path, None, None, options).await?;
    println!("{}", response.status());
    Ok(())
}
