//! A terminal client for a card game lobby.
//!
//! The client connects to a lobby host over WebSocket, claims a seat and
//! shows the roster as the host pushes changes.

use anyhow::Result;
use pico_args::Arguments;

use cl_client::websocket_client::LobbyClient;

const DEFAULT_SERVER: &str = "ws://127.0.0.1:6969/ws";

const HELP: &str = "\
Join a card game lobby

USAGE:
  cl_client [OPTIONS]

OPTIONS:
  --server URL          Lobby WebSocket URL  [default: ws://127.0.0.1:6969/ws]
  --name NAME           Display name  [default: $USER]
  --avatar N            Avatar index  [default: 0]

FLAGS:
  -h, --help            Print help information
";

struct Args {
    server_url: String,
    name: String,
    avatar_index: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = parse_args(pargs)?;
    run(args).await
}

/// Read options, rejecting malformed values instead of using the default.
fn parse_args(mut pargs: Arguments) -> Result<Args> {
    Ok(Args {
        server_url: pargs
            .opt_value_from_str("--server")?
            .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
        name: pargs
            .opt_value_from_str("--name")?
            .unwrap_or_else(whoami::username),
        avatar_index: pargs.opt_value_from_str("--avatar")?.unwrap_or(0),
    })
}

async fn run(args: Args) -> Result<()> {
    println!("Connecting to {}...", args.server_url);

    match LobbyClient::join(&args.server_url, &args.name, args.avatar_index).await? {
        Some(client) => {
            println!("Seated as {} in seat {}\n", args.name, client.slot_index());
            client.run().await
        }
        None => {
            println!("The lobby is full.");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    #[test]
    fn test_parse_args_defaults() {
        let parsed = parse_args(args(&[])).unwrap();
        assert_eq!(parsed.server_url, DEFAULT_SERVER);
        assert_eq!(parsed.avatar_index, 0);
    }

    #[test]
    fn test_parse_args_values() {
        let parsed = parse_args(args(&[
            "--server",
            "ws://10.0.0.2:7000/ws",
            "--name",
            "Bob",
            "--avatar",
            "4",
        ]))
        .unwrap();
        assert_eq!(parsed.server_url, "ws://10.0.0.2:7000/ws");
        assert_eq!(parsed.name, "Bob");
        assert_eq!(parsed.avatar_index, 4);
    }

    #[test]
    fn test_parse_args_rejects_bad_avatar() {
        assert!(parse_args(args(&["--avatar", "blue"])).is_err());
        assert!(parse_args(args(&["--avatar", "-1"])).is_err());
    }
}
