use std::sync::Once;
use tracing_subscriber::{field::MakeExt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the logging subscriber once for the whole process.
///
/// `RUST_LOG` wins when set; otherwise a sane default is applied.
pub fn init_tracing(name: &str) {
    INIT.call_once(|| init(name));
}

fn init(name: &str) {
    const RUST_LOG: &str = "info";

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        eprintln!("RUST_LOG is unset, using default: '{RUST_LOG}'");
        EnvFilter::new(RUST_LOG)
    });

    log::debug!("initializing logging for {name}");

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .map_fmt_fields(|f| f.debug_alt())
                .with_ansi(true)
                .with_level(true)
                .compact(),
        )
        .try_init();

    if let Err(err) = result {
        eprintln!("Error initializing logging: {:?}", err);
    }
}
