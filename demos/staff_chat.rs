use std::error::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use staff_chat::{ChatClient, ChatConfig, ChatEvent};

/// Interactive chat from the terminal. Hosts and port come from CHAT_HOSTS and
/// CHAT_PORT (or a .env file); the display name is the first argument.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let name = std::env::args().nth(1).unwrap_or_default();
    let client = ChatClient::new(ChatConfig::default().with_user_name(&name))?;
    println!(
        "Chatting as {} via {:?}",
        client.user_name(),
        client.config().endpoints()
    );

    let mut events = client.event_receiver();
    let me = client.user_name();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ChatEvent::Message(line) if line.system => println!("*** {}", line.raw),
                ChatEvent::Message(line) if line.is_own(&me) => println!("  (me) {}", line.body),
                ChatEvent::Message(line) => match line.author {
                    Some(author) => println!("<{}> {}", author, line.body),
                    None => println!("{}", line.body),
                },
                ChatEvent::Connected { endpoint } => println!("--- connected to {}", endpoint),
                ChatEvent::Disconnected { reason } => {
                    println!("--- disconnected {}", reason.unwrap_or_default())
                }
                ChatEvent::ReconnectScheduled { attempt, delay } => {
                    println!("--- retry #{} in {:?}", attempt, delay)
                }
                _ => {}
            }
        }
    });

    client.set_open(true);
    client.connect();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = stdin.next_line() => match line? {
                Some(line) if line.trim() == "/quit" => break,
                Some(line) if line.trim() == "/reset" => client.reset(),
                Some(line) => client.send(&line),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.shutdown().await?;
    Ok(())
}
