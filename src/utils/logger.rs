use std::sync::Once;

use log::info;

static INIT: Once = Once::new();

/// Installs `env_logger` for the process, defaulting to `warn` when
/// `RUST_LOG` is unset. Later calls do nothing, and an already installed
/// logger (e.g. from a host application) is left in place.
pub fn init_logging() {
    INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("warn");
        if env_logger::Builder::from_env(env).try_init().is_ok() {
            info!("flann-shim logging initialised");
        }
    });
}
