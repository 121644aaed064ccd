use anyhow::Result;
use tracing::{error, info};

use sitecheck::checker::EndpointChecker;
use sitecheck::cli;
use sitecheck::config::Config;
use sitecheck::escalate::Escalator;
use sitecheck::monitor;
use sitecheck::redact;
use sitecheck::tls;
use sitecheck::voice::TwilioClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = cli::parse_args();

    if args.help {
        cli::print_help();
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sitecheck=info".parse()?),
        )
        .init();

    info!("SiteCheck v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Alert phone: {}", redact::phone_number(&config.alert_phone));
    info!("  Twilio account: {}", redact::sid(&config.twilio_account_sid));
    info!("  URLs: {}", config.urls.len());

    // Handle --validate mode
    if args.validate {
        info!("Validating configuration...");
        match config.validate() {
            Ok(()) => {
                info!("Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let trust_anchor = tls::install_certificate(config.certificate_pem.as_deref(), &config.cert_path)?;
    let client = tls::build_probe_client(trust_anchor.as_deref())?;

    let checker = EndpointChecker::new(client);
    let escalator = Escalator::with_defaults(TwilioClient::new(&config));

    monitor::run_once(&config, &checker, &escalator).await;

    Ok(())
}
