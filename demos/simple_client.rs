//! Simple IRC client example
//!
//! Connects to a server, registers, joins a channel, and prints the
//! engine's events as they arrive. Pass the server, port, and channel
//! on the command line, or accept the Libera defaults.
//!
//! Run with: `cargo run --example simple_client -- irc.libera.chat 6667 "#rust"`

use irc_session::{Client, Config, Event};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let server = args.next().unwrap_or_else(|| "irc.libera.chat".to_string());
    let port: u16 = args.next().as_deref().unwrap_or("6667").parse()?;
    let channel = args.next().unwrap_or_else(|| "#irc-session-demo".to_string());

    let config = Config {
        nickname: "session_demo".to_string(),
        alternate: "session_demo_".to_string(),
        realname: "irc-session demo".to_string(),
        ..Config::new(server, port)
    };

    let (client, mut events) = Client::connect(config).await?;

    while let Some(event) = events.recv().await {
        match event {
            Event::Connected { server, port } => {
                println!("* connected to {}:{}", server, port);
            }
            Event::Registered { .. } => {
                println!("* registered, joining {}", channel);
                client.join(&channel, None)?;
            }
            Event::NickCollision { old, new } => {
                println!("* nickname {} taken, now {}", old, new);
            }
            Event::Public { nickname, text } => {
                println!("<{}> {}", nickname, text);
            }
            Event::Private { nickname, text } => {
                println!("[{}] {}", nickname, text);
            }
            Event::Action { nickname, text } => {
                println!("* {} {}", nickname, text);
            }
            Event::UserList { channel, users } => {
                let names = irc_session::sort_by_privilege(&users);
                println!("* users on {}: {}", channel, names.join(" "));
            }
            Event::UserJoin { nickname, channel, .. } => {
                println!("* {} joined {}", nickname, channel);
            }
            Event::UserPart { nickname, channel, .. } => {
                println!("* {} left {}", nickname, channel);
            }
            Event::Motd { text } => {
                for line in text.lines() {
                    println!("motd| {}", line);
                }
            }
            Event::ProtocolError { code, targets, reason } => {
                eprintln!("! error {} {:?}: {}", code, targets, reason);
            }
            Event::Disconnected { reason } => {
                println!("* disconnected: {}", reason);
                break;
            }
            _ => {}
        }
    }

    Ok(())
}
