//! rondo server - Background daemon
//!
//! Usage: `rondo-server [--socket PATH] [--foreground]`

use std::path::PathBuf;

use tracing::{error, info};

use rondo_utils::{LogConfig, Result, RondoError};

mod config;
mod dispatcher;
mod registry;
mod server;
mod status;

use config::ConfigLoader;
use server::Server;

/// Command line options
#[derive(Debug, Default)]
struct Options {
    socket: Option<PathBuf>,
    /// Log to stderr instead of the log file
    foreground: bool,
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-S" | "--socket" => {
                    let path = args
                        .next()
                        .ok_or_else(|| RondoError::config(format!("{} needs a path", arg)))?;
                    options.socket = Some(PathBuf::from(path));
                }
                "-f" | "--foreground" => options.foreground = true,
                other => {
                    return Err(RondoError::config(format!("unknown argument: {}", other)));
                }
            }
        }

        Ok(options)
    }
}

/// Run the main server daemon
async fn run_daemon(options: Options) -> Result<()> {
    info!("rondo server starting");

    let app_config = ConfigLoader::load_and_validate()?;
    let socket = options.socket.unwrap_or_else(rondo_utils::socket_path);

    Server::new(socket, app_config).run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::parse(std::env::args().skip(1))?;

    let log_config = if options.foreground {
        LogConfig::foreground()
    } else {
        LogConfig::server()
    };
    rondo_utils::init_logging_with_config(log_config)?;

    let result = run_daemon(options).await;
    if let Err(e) = &result {
        error!("Server failed: {}", e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_options_parse() {
        let options = Options::parse(args(&["-S", "/tmp/x.sock", "--foreground"])).unwrap();
        assert_eq!(options.socket, Some(PathBuf::from("/tmp/x.sock")));
        assert!(options.foreground);

        let options = Options::parse(Vec::new()).unwrap();
        assert!(options.socket.is_none());
        assert!(!options.foreground);
    }

    #[test]
    fn test_options_parse_errors() {
        assert!(Options::parse(args(&["--socket"])).is_err());
        assert!(Options::parse(args(&["--bogus"])).is_err());
    }
}
