//! Session core walkthrough against a running gateway.
//!
//! Run with:
//! ```bash
//! GATEWAY_API_URL=http://localhost:8000 cargo run -p core-session --features desktop-shims --example session_demo
//!
//! # JSON logs, custom filter
//! GATEWAY_API_URL=http://localhost:8000 cargo run -p core-session --features desktop-shims --example session_demo -- json "core_session=trace"
//! ```

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_session::{GuardDecision, SessionController, VerificationOutcome};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some(_) => LogFormat::Pretty,
        None => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_pii_redaction(true)
        .with_target(true);
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }
    init_logging(config).expect("Failed to initialize logging");

    let controller = match SessionController::from_env() {
        Ok(controller) => controller,
        Err(e) => {
            error!(error = %e, "Cannot start without a gateway");
            std::process::exit(1);
        }
    };

    let mut events = controller.subscribe_events();
    let scope = controller.mount();

    match controller.bootstrap(&scope).await {
        VerificationOutcome::Authenticated(user) => {
            info!(email = %user.redacted_email(), name = user.display_name(), "Signed in")
        }
        VerificationOutcome::Anonymous => info!("Not signed in"),
        VerificationOutcome::Discarded => info!("Verification discarded"),
    }

    for route in ["/", "/login", "/dashboard"] {
        match controller.guard(route) {
            GuardDecision::Render => info!(route, "render"),
            GuardDecision::ShowLoading => info!(route, "loading"),
            GuardDecision::Redirect { to } => info!(route, to = %to, "redirect"),
        }
    }

    while let Some(Ok(event)) = events.try_recv() {
        info!(event = event.description(), severity = ?event.severity(), "Event");
    }
}
