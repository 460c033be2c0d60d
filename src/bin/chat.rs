use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use smart_kissan::config::TransportKind;
use smart_kissan::conversations::{image_data_url_from_path, ChatEvent, TranscriptMessage};
use smart_kissan::webhook::{FarmerContext, RelayClient, TransportFactory};
use smart_kissan::{ChatSession, Config};

const HELP: &str = "Commands: /lang  /image <path>  /voice  /export [dir]  /health  /reset  /quit";

fn render(message: &TranscriptMessage) {
    println!("\nSmart Kissan: {}", message.content);
    if let Some(analysis) = &message.analysis {
        if let Some(disease) = &analysis.disease {
            println!("  disease: {}", disease);
        }
        if let (Some(severity), Some(confidence)) = (analysis.severity, analysis.confidence) {
            println!("  severity: {}%  confidence: {}%", severity, confidence);
        }
        for recommendation in &analysis.recommendations {
            println!("  - {}", recommendation);
        }
        if let Some(weather) = &analysis.weather {
            println!("  weather: {}", weather);
        }
        if let Some(irrigation) = &analysis.irrigation {
            println!("  irrigation: {}", irrigation);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smart_kissan=info")),
        )
        .init();

    let config = Config::discover().client_config;
    let transport = TransportFactory::create(&config);
    let context = FarmerContext {
        farmer_name: config.farmer_name.clone(),
        crop: config.crop.clone(),
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let session = Arc::new(ChatSession::new(transport, context).with_events(events_tx));

    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if event == ChatEvent::LoadingChanged(true) {
                eprintln!("...");
            }
        }
    });

    for message in session.transcript().await {
        render(&message);
    }
    println!("\n{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!("\n[{}] {}", session.language().await.label(), session.placeholder().await);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "/quit" => break,
            "/lang" => {
                session.toggle_language().await;
                for message in session.transcript().await {
                    render(&message);
                }
            }
            "/reset" => {
                session.reset().await;
                for message in session.transcript().await {
                    render(&message);
                }
            }
            "/image" => match image_data_url_from_path(arg.trim()) {
                Ok(image) => {
                    if let Some(reply) = session.submit_image(image).await {
                        render(&reply);
                    }
                }
                Err(e) => eprintln!("Could not read image: {}", e),
            },
            "/voice" => {
                if !session.can_listen() {
                    eprintln!("Speech recognition is not available here; type your question instead.");
                } else if let Some(reply) = session.submit_voice().await {
                    render(&reply);
                } else {
                    eprintln!("Didn't catch that; try again or type your question.");
                }
            }
            "/export" => {
                let dir = if arg.trim().is_empty() { "." } else { arg.trim() };
                match session.write_report(dir).await {
                    Ok(path) => println!("Report saved to {}", path.display()),
                    Err(e) => eprintln!("Could not save report: {}", e),
                }
            }
            "/health" => {
                if config.transport == TransportKind::Relay {
                    let healthy = RelayClient::new(config.relay_url.clone()).check_health().await;
                    println!("Relay {}", if healthy { "online" } else { "offline" });
                } else {
                    println!("Direct transport in use; no relay to check.");
                }
            }
            _ if command.starts_with('/') => println!("{}", HELP),
            _ => {
                if let Some(reply) = session.submit_text(line).await {
                    render(&reply);
                }
            }
        }
    }

    Ok(())
}
