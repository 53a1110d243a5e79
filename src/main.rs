use clap::Parser;
use toolwarden::cli::{self, Cli};
use toolwarden::config::WardenConfig;
use toolwarden::hook::{self, HookOutput, EXIT_MALFORMED_INPUT};
use toolwarden::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_dir = match WardenConfig::default_dir() {
        Ok(dir) => dir,
        Err(err) => {
            if cli.command.is_none() {
                // Hook mode must always answer; no config dir means no
                // cache and no policy state, so the safe answer is deny.
                println!("{}", HookOutput::deny(err.to_string()).to_json());
                std::process::exit(EXIT_MALFORMED_INPUT);
            }
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    // A failed logging setup must not block a decision
    let _guard = logging::init(&config_dir).ok();

    let code = match cli.command {
        None => hook::run(&config_dir).await,
        Some(command) => match cli::execute(command, &config_dir) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("error: {}", err);
                1
            }
        },
    };
    std::process::exit(code);
}
