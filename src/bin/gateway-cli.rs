use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the inter-service gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered services
    Registry,
    /// Register a service (or update its address)
    Register {
        name: String,
        address: String,
    },
    /// Remove a service from the registry
    Deregister {
        name: String,
    },
    /// Show health status (all services, or one)
    Health {
        name: Option<String>,
    },
    /// Show recorded errors (all services, or one)
    Errors {
        name: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Forward a request through the gateway
    Proxy {
        service: String,
        endpoint: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// JSON payload (query params for GET/DELETE, body for POST/PUT)
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Registry => {
            let res = client.get(format!("{}/registry", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Register { name, address } => {
            let res = client
                .post(format!("{}/registry/{}", cli.url, name))
                .query(&[("url", address)])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Deregister { name } => {
            let res = client
                .delete(format!("{}/registry/{}", cli.url, name))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health { name } => {
            let path = match name {
                Some(name) => format!("{}/health/{}", cli.url, name),
                None => format!("{}/health", cli.url),
            };
            let res = client.get(path).send().await?;
            print_response(res).await?;
        }
        Commands::Errors { name, limit } => {
            let path = match name {
                Some(name) => format!("{}/errors/{}", cli.url, name),
                None => format!("{}/errors", cli.url),
            };
            let mut req = client.get(path);
            if let Some(limit) = limit {
                req = req.query(&[("limit", limit)]);
            }
            let res = req.send().await?;
            print_response(res).await?;
        }
        Commands::Proxy {
            service,
            endpoint,
            method,
            data,
        } => {
            let data: Option<Value> = match data {
                Some(raw) => Some(serde_json::from_str(&raw)?),
                None => None,
            };
            let body = serde_json::json!({
                "target_service": service,
                "endpoint": endpoint,
                "method": method,
                "data": data,
            });
            let res = client
                .post(format!("{}/proxy", cli.url))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
