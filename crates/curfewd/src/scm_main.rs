//! Entry point when started by the Windows Service Control Manager

use curfew_config::GuardConfig;
use curfew_core::{FAILURE_EXIT_CODE, ServiceLifecycleAdapter, run_service};
use curfew_host::ScmReporter;
use std::ffi::OsString;
use std::sync::OnceLock;
use tracing::{error, info, warn};
use windows_service::{define_windows_service, service_dispatcher};

use crate::{build_guard, build_runtime};

/// Name the service is registered under
pub const SERVICE_NAME: &str = "curfewd";

static SERVICE_CONFIG: OnceLock<GuardConfig> = OnceLock::new();

define_windows_service!(ffi_service_main, service_main);

/// Hand the main thread to the SCM dispatcher.
///
/// Returns `false` when the process was not started by the SCM, in which
/// case the caller runs in the console instead.
pub fn dispatch(config: &GuardConfig) -> bool {
    let _ = SERVICE_CONFIG.set(config.clone());

    match service_dispatcher::start(SERVICE_NAME, ffi_service_main) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Not started by the service control manager, running in console");
            false
        }
    }
}

fn service_main(_arguments: Vec<OsString>) {
    let Some(config) = SERVICE_CONFIG.get() else {
        error!("Service started without configuration");
        return;
    };

    let (reporter, controls) = match ScmReporter::register(SERVICE_NAME) {
        Ok(registered) => registered,
        Err(e) => {
            error!(error = %e, "Failed to register with the service control manager");
            return;
        }
    };

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            let mut lifecycle = ServiceLifecycleAdapter::new(reporter);
            if let Err(e) = lifecycle.stopped(FAILURE_EXIT_CODE) {
                error!(error = %e, "Failed to report stopped status");
            }
            return;
        }
    };

    let result = runtime.block_on(run_service(reporter, move || {
        let guard = build_guard(config, false)?;
        Ok((guard, controls))
    }));

    match result {
        Ok(reason) => info!(reason = %reason, "curfewd service exiting"),
        Err(e) => error!(error = %e, "curfewd service failed"),
    }
}
