use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use alira::actuator::relay::HttpRelay;
use alira::actuator::DeviceActuator;
use alira::event::PresenceEvent;
use alira::knowledge::StaticKnowledge;
use alira::transcript::StdinTranscript;
use alira::{CommandLoop, Config, EventBus, IntentRouter, SessionMonitor};

fn load_config() -> anyhow::Result<Config> {
    match std::env::var("ALIRA_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            let config: Config =
                serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;
            Ok(config)
        }
        Err(_) => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = load_config()?;
    config.validate().context("invalid configuration")?;
    info!(target = %config.target_subject, "command core booting");

    let (bus, receivers) = EventBus::new();

    let transport = Arc::new(HttpRelay::new(&config)?);
    let actuator = Arc::new(DeviceActuator::new(&config, transport)?);
    let kb = Arc::new(StaticKnowledge::seed());
    let router = IntentRouter::from_config(&config, actuator, kb);

    let monitor = Arc::new(SessionMonitor::new(
        bus.session.clone(),
        &config.target_subject,
        config.session_timeout(),
        config.watchdog_poll(),
    ));

    let consumer = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.run_consumer(receivers.presence_rx).await })
    };
    let watchdog = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.run_watchdog().await })
    };
    let drain = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.run_detection_drain(receivers.detection_rx).await })
    };

    let command_loop = CommandLoop::new(
        bus.session.clone(),
        router,
        Arc::new(StdinTranscript::new()),
        config.capture_window(),
    );
    let commands = tokio::spawn(async move { command_loop.run().await });

    // Opt-in stand-in for the external perception feed: confirm the target
    // once at boot so the loop is usable from a terminal. Without the flag
    // the session only opens on real presence pushed onto bus.presence_tx.
    if std::env::var("ALIRA_DEMO_PRESENCE").is_ok() {
        let _ = bus
            .presence_tx
            .send(PresenceEvent::now(&config.target_subject, 1.0));
    }

    info!("command core active; ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    consumer.abort();
    watchdog.abort();
    drain.abort();
    commands.abort();
    Ok(())
}
