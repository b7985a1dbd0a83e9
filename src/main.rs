//! tuplectl binary entry point.

use clap::Parser;
use tuplectl::api::ApiClient;
use tuplectl::cli::{self, AuthCommands, Cli, Commands};
use tuplectl::config::Config;
use tuplectl::error::Result;

const BUILD_COMMIT: Option<&str> = option_env!("TUPLECTL_BUILD_COMMIT");
const BUILD_DATE: Option<&str> = option_env!("TUPLECTL_BUILD_DATE");

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    let config = Config::from_env();
    cli::init_logging(args.debug || config.debug);

    let result = match args.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login => cli::auth::handle_login(&config).await,
            AuthCommands::Status => cli::auth::handle_status(&config).await,
            AuthCommands::Logout => cli::auth::handle_logout(&config),
        },
        Commands::Status => handle_platform_status(&config).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", cli::errors::format_error_help(&e));
        std::process::exit(1);
    }
}

async fn handle_platform_status(config: &Config) -> Result<()> {
    config.validate()?;
    let service = cli::auth::build_service(config);
    let credential = cli::auth::authenticate(
        config,
        &service,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await?;

    let client = ApiClient::new(&config.api_base_url, credential)?;
    if client.platform_status().await? {
        println!("All systems are operational");
    } else {
        println!("Platform is experiencing issues");
    }
    Ok(())
}

fn print_version() {
    println!("tuplectl {}", env!("CARGO_PKG_VERSION"));
    if let Some(commit) = BUILD_COMMIT {
        println!("commit: {commit}");
    }
    if let Some(date) = BUILD_DATE {
        println!("built: {date}");
    }
}
