use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use racepay::application::flow::PaymentFlow;
use racepay::application::gateway::GatewayAdapter;
use racepay::application::session::SessionContext;
use racepay::config::{Config, ConfigArgs};
use racepay::domain::payment::PaymentPhase;
use racepay::domain::ports::{PaymentBackend, PaymentBackendRef, SessionStoreRef};
use racepay::domain::registration::{NewRegistration, Participant};
use racepay::infrastructure::http::HttpBackend;
use racepay::infrastructure::in_memory::InMemorySessionStore;
#[cfg(feature = "session-rocksdb")]
use racepay::infrastructure::rocksdb::RocksDBSessionStore;
use racepay::infrastructure::terminal_checkout::ScriptLoader;
use racepay::interfaces::csv::registration_writer::RegistrationWriter;
use racepay::telemetry;
use std::io;
use std::sync::Arc;
use tokio::sync::watch;
#[cfg(not(feature = "session-rocksdb"))]
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a participant and pay the registration fee
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Race category, one of the configured categories
        #[arg(long)]
        category: String,
        #[arg(long)]
        shirt_size: String,
        #[arg(long)]
        coupon: Option<String>,
    },
    /// Pay for an existing registration, or retry an abandoned or failed payment
    Pay {
        /// Defaults to the registration cached by the last run
        #[arg(long)]
        registration_id: Option<String>,
        #[arg(long)]
        coupon: Option<String>,
    },
    /// Print the payment status of a registration
    Status {
        #[arg(long)]
        registration_id: String,
    },
    /// Write registrations as CSV to stdout
    Export {
        #[arg(long = "registration-id", required = true)]
        registration_ids: Vec<String>,
    },
}

enum Journey {
    Register(NewRegistration),
    Retry {
        registration_id: Option<String>,
        coupon: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level);

    let config = Config::load(cli.config).into_diagnostic()?;
    let backend: PaymentBackendRef = Arc::new(
        HttpBackend::new(&config.api_base, config.request_timeout).into_diagnostic()?,
    );

    match cli.command {
        Command::Status { registration_id } => {
            let status = backend
                .payment_status(&registration_id)
                .await
                .into_diagnostic()?;
            println!("{registration_id},{status}");
            Ok(())
        }
        Command::Export { registration_ids } => {
            let mut registrations = Vec::with_capacity(registration_ids.len());
            for registration_id in &registration_ids {
                registrations.push(
                    backend
                        .fetch_registration(registration_id)
                        .await
                        .into_diagnostic()?,
                );
            }
            let stdout = io::stdout();
            RegistrationWriter::new(stdout.lock())
                .write_registrations(&registrations)
                .into_diagnostic()?;
            Ok(())
        }
        Command::Register {
            name,
            email,
            phone,
            category,
            shirt_size,
            coupon,
        } => {
            let registration = NewRegistration {
                participant: Participant {
                    name,
                    email,
                    phone,
                    race_category: category,
                    shirt_size,
                },
                coupon_code: coupon,
            };
            pay(&config, backend, Journey::Register(registration)).await
        }
        Command::Pay {
            registration_id,
            coupon,
        } => {
            pay(
                &config,
                backend,
                Journey::Retry {
                    registration_id,
                    coupon,
                },
            )
            .await
        }
    }
}

async fn pay(config: &Config, backend: PaymentBackendRef, journey: Journey) -> Result<()> {
    let session = SessionContext::restore(session_store(config)?)
        .await
        .into_diagnostic()?;
    let loader = Arc::new(
        ScriptLoader::new(config.checkout_script_url.clone(), config.request_timeout)
            .into_diagnostic()?,
    );
    let gateway = GatewayAdapter::new(loader, config.gateway_key.clone())
        .with_theme_color(config.theme_color.clone());
    let mut flow = PaymentFlow::new(
        backend,
        gateway,
        session,
        config.categories.clone(),
        config.poll_interval,
    )
    .into_diagnostic()?;

    let renderer = tokio::spawn(render_phases(flow.phases()));
    let attempt = async {
        match journey {
            Journey::Register(registration) => flow.register(registration).await,
            Journey::Retry {
                registration_id: Some(registration_id),
                coupon,
            } => flow.retry(&registration_id, coupon.as_deref()).await,
            Journey::Retry {
                registration_id: None,
                coupon,
            } => flow.checkout(coupon.as_deref()).await,
        }
    };

    // Leaving the select drops the attempt, which stops any status polling.
    let outcome = tokio::select! {
        phase = attempt => Some(phase),
        _ = tokio::signal::ctrl_c() => None,
    };
    renderer.abort();

    match outcome {
        Some(PaymentPhase::Paid) => {
            println!("Payment confirmed. See you at the start line!");
            Ok(())
        }
        Some(PaymentPhase::Ready) => {
            println!("Payment cancelled. Run `racepay pay` to try again.");
            Ok(())
        }
        Some(PaymentPhase::Failed { message }) => Err(miette!("{message}")),
        Some(other) => Err(miette!("Payment stopped while {other}")),
        None => {
            eprintln!("Interrupted. Check back later with `racepay status`.");
            Ok(())
        }
    }
}

fn session_store(config: &Config) -> Result<SessionStoreRef> {
    match &config.session_db {
        #[cfg(feature = "session-rocksdb")]
        Some(path) => Ok(Arc::new(RocksDBSessionStore::open(path).into_diagnostic()?)),
        #[cfg(not(feature = "session-rocksdb"))]
        Some(path) => {
            warn!(
                path = %path.display(),
                "session database requested but the 'session-rocksdb' feature is not enabled, falling back to in-memory session cache"
            );
            Ok(Arc::new(InMemorySessionStore::new()))
        }
        None => Ok(Arc::new(InMemorySessionStore::new())),
    }
}

async fn render_phases(mut phases: watch::Receiver<PaymentPhase>) {
    while phases.changed().await.is_ok() {
        let phase = phases.borrow_and_update().clone();
        match phase {
            PaymentPhase::Processing => eprintln!("Processing..."),
            PaymentPhase::Verifying => {
                eprintln!("Payment received, waiting for confirmation from the gateway...")
            }
            _ => {}
        }
    }
}
