//! Callwire CLI Application

use anyhow::{Context, Result};
use callwire_core::prelude::*;
use callwire_core::{CallSettings, IceConfiguration, MediaStream, StaticSettings};
use clap::{Parser, Subcommand};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Identity of the local peer (e.g., "alpha-bravo")
    #[arg(short, long, env = "CALLWIRE_IDENTITY")]
    identity: Option<String>,

    /// JSON configuration file
    #[arg(short, long, env = "CALLWIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the gathering timeout
    #[arg(long, env = "CALLWIRE_GATHERING_TIMEOUT_MS")]
    gathering_timeout_ms: Option<u64>,

    /// ICE server configuration JSON, as handed out by the settings API
    #[arg(long, env = "CALLWIRE_ICE_SERVERS", default_value = r#"{"iceServers":[]}"#)]
    ice_servers: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a second in-process peer over an in-memory signaling channel
    Loopback {
        /// Name of the remote peer
        #[arg(long, default_value = "loopback-peer")]
        peer: String,

        /// Skip camera/microphone capture
        #[arg(long)]
        no_media: bool,

        /// How long to wait for the connection to come up
        #[arg(long, default_value = "15")]
        wait_secs: u64,
    },

    /// Print the media constraint profiles in priority order
    Profiles,

    /// Show the effective configuration
    Status,
}

/// Prints attachments instead of rendering video
struct TerminalSink {
    label: &'static str,
}

impl VideoSink for TerminalSink {
    fn attach(&self, stream: Option<Arc<MediaStream>>) {
        match stream {
            Some(stream) => println!(
                "📺 {} video: stream {} ({} tracks)",
                self.label,
                stream.id(),
                stream.tracks().len()
            ),
            None => println!("📺 {} video: detached", self.label),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("callwire=info,callwire_core=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.gathering_timeout_ms)?;

    let identity = cli.identity.clone().unwrap_or_else(generate_random_identity);

    match cli.command {
        Commands::Loopback {
            peer,
            no_media,
            wait_secs,
        } => {
            handle_loopback(
                config,
                &cli.ice_servers,
                PeerId::new(identity),
                PeerId::new(peer),
                !no_media,
                Duration::from_secs(wait_secs),
            )
            .await?;
        }
        Commands::Profiles => {
            handle_profiles(&config)?;
        }
        Commands::Status => {
            handle_status(&config, &cli.ice_servers)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>, gathering_timeout_ms: Option<u64>) -> Result<CallConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            CallConfig::from_json(&raw).with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => CallConfig::default(),
    };
    if let Some(ms) = gathering_timeout_ms {
        config = config.with_gathering_timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

fn build_service(
    transport: ChannelTransport,
    config: &CallConfig,
    ice_servers: &str,
) -> Result<Arc<ConnectionService<ChannelTransport>>> {
    let settings = StaticSettings(CallSettings {
        ice_server_configuration: ice_servers.to_string(),
    });
    let service = ConnectionService::builder(Arc::new(SignalingHandler::new(Arc::new(transport))))
        .with_config(config.clone())
        .with_peer_factory(Arc::new(WebRtcBackendFactory::default()))
        .with_media_devices(Arc::new(SyntheticMediaDevices::new()))
        .with_settings(Arc::new(settings))
        .build()?;
    let service = Arc::new(service);
    service.start();
    Ok(service)
}

/// Answer every incoming call and route signaling until the channel closes
async fn run_callee(service: Arc<ConnectionService<ChannelTransport>>, with_media: bool) {
    let mut events = service.subscribe_events();
    loop {
        tokio::select! {
            res = service.receive_and_process() => {
                if let Err(e) = res {
                    tracing::debug!("Callee signaling stopped: {}", e);
                    break;
                }
            }
            event = events.recv() => {
                let Ok(ServiceEvent::IncomingCall { call_id, peer, payload }) = event else {
                    continue;
                };
                println!("📞 Incoming call {} from {}", call_id, peer);
                let media = with_media.then(|| MediaSinks {
                    local: Arc::new(TerminalSink { label: "callee local" }),
                    remote: Arc::new(TerminalSink { label: "callee remote" }),
                });
                if let Err(e) = service.handle_incoming_call(peer, call_id, &payload, media).await {
                    tracing::error!("Failed to answer call: {}", e);
                }
            }
        }
    }
}

async fn handle_loopback(
    config: CallConfig,
    ice_servers: &str,
    identity: PeerId,
    peer: PeerId,
    with_media: bool,
    wait: Duration,
) -> Result<()> {
    let (caller_transport, callee_transport) = ChannelTransport::pair(identity, peer.clone());
    println!("🔗 Using identity: {}", caller_transport.local_peer());
    let caller = build_service(caller_transport, &config, ice_servers)?;
    let callee = build_service(callee_transport, &config, ice_servers)?;
    println!("✅ Both peers started");

    let callee_task = tokio::spawn(run_callee(Arc::clone(&callee), with_media));
    let mut events = caller.subscribe_events();

    let media = with_media.then(|| MediaSinks {
        local: Arc::new(TerminalSink { label: "caller local" }),
        remote: Arc::new(TerminalSink { label: "caller remote" }),
    });
    println!("📞 Calling {}...", peer);
    let call_id = caller.start_outgoing_call(peer.clone(), media).await?;
    println!("📞 Offer sent for call {}", call_id);

    let established = tokio::time::timeout(wait, async {
        loop {
            tokio::select! {
                res = caller.receive_and_process() => res?,
                event = events.recv() => match event {
                    Ok(ServiceEvent::OfferSent { summary, .. }) => {
                        println!(
                            "   Gathering: {} ms, {} candidates, complete: {}",
                            summary.gathering_ms, summary.candidates, summary.collected_all
                        );
                    }
                    Ok(ServiceEvent::CallEstablished { .. }) => return Ok::<_, anyhow::Error>(true),
                    Ok(ServiceEvent::ConnectionFailed { .. }) => return Ok(false),
                    Ok(other) => tracing::debug!("Received event: {:?}", other),
                    Err(e) => anyhow::bail!("Event stream error: {}", e),
                },
            }
        }
    })
    .await;

    match established {
        Ok(Ok(true)) => println!("✅ Call established"),
        Ok(Ok(false)) => println!("❌ Connection failed"),
        Ok(Err(e)) => return Err(e),
        Err(_) => println!("⚠️  Connection not established within {}s", wait.as_secs()),
    }

    let diagnostics = caller.manager().get_diagnostics();
    println!("{}", serde_json::to_string_pretty(&diagnostics)?);

    caller.shutdown().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    callee.shutdown().await;
    callee_task.abort();

    println!("📞 Call ended");
    Ok(())
}

fn handle_profiles(config: &CallConfig) -> Result<()> {
    println!("🎥 Media constraint profiles (most specific first)");
    for (i, profile) in config.constraint_profiles.iter().enumerate() {
        println!("  {}. {}", i + 1, serde_json::to_string(profile)?);
    }
    Ok(())
}

fn handle_status(config: &CallConfig, ice_servers: &str) -> Result<()> {
    println!("📊 Callwire CLI Status");
    println!("=====================");
    println!("{}", serde_json::to_string_pretty(config)?);
    match IceConfiguration::from_json(ice_servers) {
        Ok(ice) => println!(
            "✅ ICE servers: {} configured (relay: {})",
            ice.ice_servers.len(),
            ice.has_relay()
        ),
        Err(e) => println!("⚠️  ICE servers: {}", e),
    }
    let requirement = config.gathering_requirement;
    println!(
        "🧊 Early completion needs {} candidates (host {}, srflx {}, relay {})",
        requirement.minimum_count(),
        requirement.host,
        requirement.srflx,
        requirement.relay
    );
    println!();
    println!("Available commands:");
    println!("  callwire loopback [options]  - Call an in-process peer");
    println!("  callwire profiles            - List media constraint profiles");
    println!("  callwire status              - Show this status");
    println!();
    println!("Use 'callwire --help' for detailed options");

    Ok(())
}

fn generate_random_identity() -> String {
    const WORDS: &[&str] = &[
        "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india",
        "juliet", "kilo", "lima", "mike", "november", "oscar", "papa", "quebec", "romeo", "sierra",
        "tango", "uniform", "victor", "whiskey", "xray", "yankee", "zulu",
    ];

    let mut rng = rand::thread_rng();
    format!(
        "{}-{}",
        WORDS[rng.gen_range(0..WORDS.len())],
        WORDS[rng.gen_range(0..WORDS.len())]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_identity_shape() {
        let id = generate_random_identity();
        assert_eq!(id.split('-').count(), 2);
    }

    #[test]
    fn test_cli_parses_loopback() {
        let cli = Cli::try_parse_from(["callwire", "--gathering-timeout-ms", "750", "loopback", "--no-media"]).unwrap();
        assert_eq!(cli.gathering_timeout_ms, Some(750));
        assert!(matches!(cli.command, Commands::Loopback { no_media: true, .. }));

        let config = load_config(None, cli.gathering_timeout_ms).unwrap();
        assert_eq!(config.gathering_timeout_ms, 750);
    }
}
