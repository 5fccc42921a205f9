// capmc and the KNL nodes it manages only exist on Linux (Cray) systems
#[cfg(not(unix))]
fn main() {
    eprintln!("knl-provision-hook is only supported on Unix systems.");
    std::process::exit(1);
}

#[cfg(unix)]
mod event;
#[cfg(unix)]
mod logging;

#[cfg(unix)]
mod unix_main {
    use anyhow::{Result, bail};
    use clap::{Parser, builder::styling, error::ErrorKind};
    use dotenvy::dotenv;
    use knl_provision::{
        HookConfig, Outcome, ProcessRunner, ProvisionRequest, Provisioner, ThreadSleeper,
    };
    use log::{debug, info};
    use std::path::PathBuf;

    use crate::event::StdoutEvent;
    use crate::logging::init_logging;

    const STYLES: styling::Styles = styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default().bold())
        .usage(styling::AnsiColor::Green.on_default().bold())
        .literal(styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(styling::AnsiColor::Cyan.on_default());

    #[derive(Parser, Debug)]
    #[command(name = "knl-provision-hook")]
    #[command(about = "Reconfigure a KNL node into the requested AOE through capmc", long_about = None)]
    #[command(styles = STYLES)]
    pub(crate) struct Args {
        /// Vnode to provision, e.g. nid_1042
        #[arg(env = "KNL_PROVISION_VNODE")]
        pub vnode: String,

        /// Requested AOE as <numa_mode>_<cache_percent>, e.g. a2a_50
        #[arg(env = "KNL_PROVISION_AOE")]
        pub aoe: String,

        /// Read configuration from this file instead of the standard locations
        #[arg(short, long, env = "KNL_PROVISION_CONFIG")]
        pub config: Option<PathBuf>,

        /// Directory containing the capmc binary
        #[arg(long, env = "KNL_PROVISION_CAPMC_DIR")]
        pub capmc_dir: Option<PathBuf>,

        /// Name or path of the capmc binary
        #[arg(long, env = "KNL_PROVISION_CAPMC_BIN")]
        pub capmc_bin: Option<String>,

        /// Maximum number of node_status checks after the reboot
        #[arg(long, env = "KNL_PROVISION_POLL_ATTEMPTS")]
        pub poll_attempts: Option<u32>,

        /// Seconds to wait before each node_status check
        #[arg(long, env = "KNL_PROVISION_POLL_INTERVAL")]
        pub poll_interval: Option<u64>,

        /// Log level (error, warn, info, debug, trace)
        #[arg(short, long, env = "KNL_PROVISION_LOG_LEVEL")]
        pub log_level: Option<String>,

        /// Append logs to this file instead of stderr
        #[arg(long, env = "KNL_PROVISION_LOG_FILE")]
        pub log_file: Option<PathBuf>,
    }

    /// Load file configuration and apply command-line overrides on top
    pub(crate) fn load_config(args: &Args) -> Result<HookConfig> {
        let mut config = match &args.config {
            Some(path) => HookConfig::load_from_files(std::slice::from_ref(path))?,
            None => HookConfig::load()?,
        };

        if let Some(dir) = &args.capmc_dir {
            config.capmc.bin_dir = dir.clone();
        }
        if let Some(bin) = &args.capmc_bin {
            config.capmc.executable = bin.clone();
        }
        if let Some(attempts) = args.poll_attempts {
            config.poll.max_attempts = attempts;
        }
        if let Some(interval) = args.poll_interval {
            config.poll.interval_secs = interval;
        }
        if let Some(level) = &args.log_level {
            config.log_level = level.clone();
        }

        if let Err(errors) = config.validate() {
            bail!("Invalid configuration: {}", errors.join("; "));
        }
        Ok(config)
    }

    fn run(args: &Args) -> Result<Outcome> {
        let config = load_config(args)?;
        init_logging(&config.log_level, args.log_file.as_deref())?;

        info!("Provisioning {} with aoe {}", args.vnode, args.aoe);
        debug!("Configuration: {:?}", config);

        let request = ProvisionRequest::new(args.vnode.clone(), args.aoe.clone());
        let runner = match ProcessRunner::new(&config.capmc.bin_dir) {
            Ok(runner) => runner,
            Err(e) => return Ok(e.into_outcome()),
        };
        let sleeper = ThreadSleeper;

        let provisioner = Provisioner::new(&config.capmc, &config.poll, &runner, &sleeper);
        Ok(provisioner.provision(&request))
    }

    /// Decision for arguments clap refused. Help and version requests are not
    /// provisioning runs and get no decision.
    pub(crate) fn argument_error_outcome(err: &clap::Error) -> Option<Outcome> {
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
            _ => Some(Outcome::Rejected {
                message: format!("Caught exception : {}", err.to_string().trim_end()),
                code: None,
            }),
        }
    }

    fn finish(outcome: Outcome) -> ! {
        let accepted = outcome.is_accepted();
        outcome.deliver(&mut StdoutEvent::stdout());
        std::process::exit(if accepted { 0 } else { 1 });
    }

    pub fn main() {
        dotenv().ok();
        let args = match Args::try_parse() {
            Ok(args) => args,
            Err(e) => match argument_error_outcome(&e) {
                Some(outcome) => {
                    eprintln!("Error: {}", e.to_string().trim_end());
                    finish(outcome)
                }
                None => e.exit(),
            },
        };

        let outcome = run(&args).unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            Outcome::Rejected {
                message: format!("Caught exception : {:#}", e),
                code: None,
            }
        });
        finish(outcome)
    }

}

#[cfg(unix)]
fn main() {
    unix_main::main();
}
