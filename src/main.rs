use kimaaka::cli::{Cli, Command};
use kimaaka::config::Config;
use kimaaka::core::network::{mask_api_key, SelectionPolicy};
use kimaaka::core::KimaakaClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    if cli.init {
        let path = Config::init()?;
        println!("Created config at {}", path.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env_overrides()?;
            config
        }
        None => Config::load()?,
    };

    if cli.print {
        config.print()?;
        return Ok(());
    }

    if cli.check {
        config.check()?;
        println!("✓ Configuration valid");
        return Ok(());
    }

    let command = match cli.command {
        Some(command) => command,
        None => {
            eprintln!("No command given; see --help");
            std::process::exit(2);
        }
    };

    let client = KimaakaClient::new(config).await?;

    match command {
        Command::Servers => {
            for (i, url) in client.candidates().iter().enumerate() {
                println!("{}. {}", i + 1, url);
            }
        }
        Command::Resolve { random } => {
            let policy = if random {
                SelectionPolicy::Random
            } else {
                SelectionPolicy::Sequential
            };
            println!("{}", client.resolve_server(policy).await?);
        }
        Command::Key => {
            let lease = client.get_cached_api_key().await?;
            let source = if lease.from_cache { "cache" } else { "server" };
            println!("{} (from {})", mask_api_key(&lease.key), source);
        }
        Command::RefreshKey => {
            let lease = client.refresh_api_key().await?;
            println!("{}", mask_api_key(&lease.key));
        }
        Command::Analyze { image, strict } => {
            let png = tokio::fs::read(&image).await?;
            let answer = if strict {
                client.analyze_strict(&png).await?
            } else {
                client.analyze(&png).await
            };
            println!("{}", answer);
        }
        Command::Stats { token } => {
            let stats = client.admin_stats(token.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Status => {
            let statuses = client.check_all_servers().await;
            let online = statuses.iter().filter(|s| s.online).count();
            for status in &statuses {
                let state = if status.online { "ONLINE" } else { "OFFLINE" };
                println!(
                    "Server {} ({}): {} {}ms",
                    status.index, status.identifier, state, status.response_time_ms
                );
                if let Some(details) = &status.details {
                    println!(
                        "    database: {}  uptime: {}s  admin keys: {}  donated keys: {}",
                        details.database.as_deref().unwrap_or("Unknown"),
                        details.uptime_secs.unwrap_or(0.0).floor(),
                        details.admin_keys_count.unwrap_or(0),
                        details.donated_keys_count.unwrap_or(0)
                    );
                }
                if let Some(error) = &status.error {
                    println!("    error: {}", error);
                }
            }
            println!("{}/{} online", online, statuses.len());
        }
        Command::DonationServer => {
            let server = client.donation_server().await?;
            println!("{}", server.server_url);
            if let Some(warning) = server.warning {
                eprintln!("warning: {}", warning);
            }
        }
        Command::Reset => {
            client.reset().await;
            println!("Sticky server and quarantine cleared");
        }
    }

    Ok(())
}
