//! TailBeat demo host
//!
//! Runs a [`Session`] against the companion with a fixed environment and
//! in-memory preferences. Logs a heartbeat every second and captures stdin
//! lines as stdout output. Ctrl-C stops the session.

use std::sync::Arc;
use std::time::Duration;

use tailbeat::prelude::*;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Applies companion commands by logging them.
struct PrintingHandler;

impl CommandHandler for PrintingHandler {
    fn preferences_requested(&self) -> Result<(), HandlerError> {
        info!("companion requested preferences");
        Ok(())
    }

    fn language_change(&self, locale: &str) -> Result<(), HandlerError> {
        info!(%locale, "language change");
        Ok(())
    }

    fn appearance_change(&self, appearance: Appearance) -> Result<(), HandlerError> {
        info!(?appearance, "appearance change");
        Ok(())
    }

    fn window_resize(&self, request: &WindowResizeRequest) -> Result<(), HandlerError> {
        if request.window_number != 1 {
            return Err(HandlerError::NotFound(format!("window {}", request.window_number)));
        }
        info!(frame = ?request.frame, "window resize");
        Ok(())
    }

    fn window_activate(&self, window_number: i64) -> Result<(), HandlerError> {
        info!(window_number, "window activate");
        Ok(())
    }

    fn preferences_patched(&self, patches: &[PreferencePatch]) -> Result<(), HandlerError> {
        info!(count = patches.len(), "preferences patched");
        Ok(())
    }
}

fn environment() -> StaticEnvironment {
    StaticEnvironment {
        info: AppInfo::new(
            "TailBeat Demo",
            Some("dev.tailbeat.demo".to_owned()),
            env!("CARGO_PKG_VERSION"),
            "1",
            vec!["en".to_owned(), "de".to_owned()],
        ),
        environment: AppEnvironment::new(Some("en".to_owned()), Some(Appearance::Light)),
        windows: vec![AppWindow::new(1, "Main", Rect::new(0.0, 0.0, 1024.0, 768.0))],
    }
}

#[tokio::main]
async fn main() -> Result<(), TailbeatError> {
    let filter = EnvFilter::try_from_env("TAILBEAT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let preferences = MemoryPreferences::with_entries([
        ("theme".to_owned(), PreferenceValue::from("light")),
        ("launchCount".to_owned(), PreferenceValue::from(1_i64)),
    ]);
    let session = Session::new(
        ClientConfig::from_env()?,
        Arc::new(environment()),
        Arc::new(preferences),
        Arc::new(PrintingHandler),
    )?;
    session.start().await;

    let logger = session.logger();
    let capture_logger = logger.clone();
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(err) = capture_lines(stdin, Origin::Stdout, &capture_logger).await {
            tracing::warn!(error = %err, "stdin capture failed");
        }
    });

    let mut heartbeat = tokio::time::interval(Duration::from_secs(1));
    let mut beats = 0u64;
    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                beats += 1;
                tailbeat::log!(logger, Level::Debug, "heartbeat", "beat {}", beats);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    logger.lifecycle(EventKind::AppExited, "TailBeat Demo exited");
    session.stop().await;
    info!(dropped = session.bus().dropped(), "host stopped");
    Ok(())
}
