//! File logging
//!
//! The TUI owns the terminal, so tracing output goes to a daily
//! rotated file under the data directory instead of stderr.

use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::{ RollingFileAppender, Rotation };
use tracing_subscriber::{ fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter };


const LOG_FILE_PREFIX: &str = "cadence.log";

const DEFAULT_FILTER: &str = "cadence=debug,cadence_core=debug,warn";


/// Initializes logging into `log_dir`.
///
/// The level follows `RUST_LOG` when set.
pub fn init( log_dir: &Path ) -> Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all( log_dir )?;
    }

    let appender = RollingFileAppender::new( Rotation::DAILY, log_dir, LOG_FILE_PREFIX );
    let ( writer, guard ) = tracing_appender::non_blocking( appender );

    // Flushes on drop; must live until the process exits
    Box::leak( Box::new( guard ) );

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else( |_| EnvFilter::new( DEFAULT_FILTER ) );

    let fmt_layer = fmt::layer()
        .with_writer( writer )
        .with_ansi( false )
        .with_target( true );

    tracing_subscriber::registry()
        .with( filter )
        .with( fmt_layer )
        .try_init()?;

    tracing::info!( "Logging to {}", log_dir.display() );
    Ok(())
}
