//! vmhost launcher
//!
//! Loads the configuration, provisions bundled assets, sets the engine up and hands the
//! session to either the window host or the stdin-driven headless host. The process
//! exits once the session is torn down.

mod app;
mod cli;
mod headless;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use vmhost_core::assets::sync_assets;
use vmhost_core::config::{self, Config};
use vmhost_core::{Engine, Frontend, HeadlessVm, SessionController, VmHandle};

use cli::Cli;

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();

    let mut config = config::load();
    for warning in config::validate_keybindings(&config) {
        tracing::warn!("Keybinding conflict: {}", warning);
    }
    if let Some(backend) = args.backend {
        config.session.render_backend = backend;
    }
    if let Some(slot) = args.slot {
        config.session.save_slot = slot;
    }

    let data_dir = config
        .storage
        .resolve_data_dir()
        .context("could not determine a data directory; set storage.data_dir")?;
    if let Some(source) = &config.storage.asset_source {
        // Failures are logged by the sync; the engine decides whether it can cope
        sync_assets(source, &data_dir, &config.storage.asset_dirs);
    }

    let launch = Launch {
        rom: args.rom,
        data_dir,
        headless: args.headless,
        config,
    };

    match args.core {
        #[cfg(feature = "native")]
        Some(path) => {
            // SAFETY: the user explicitly chose this library as a vmhost core
            let core = unsafe { vmhost_core::NativeCore::load(&path) }?;
            launch.run(Engine::new(core))
        }
        #[cfg(not(feature = "native"))]
        Some(_) => anyhow::bail!("this build has no native core support"),
        None => {
            tracing::info!("No core given, using the headless engine");
            launch.run(Engine::new(HeadlessVm::new()))
        }
    }
}

struct Launch {
    rom: Option<PathBuf>,
    data_dir: PathBuf,
    headless: bool,
    config: Config,
}

impl Launch {
    fn run<V: VmHandle>(self, engine: Arc<Engine<V>>) -> Result<()> {
        let session_config = &self.config.session;
        let mut session = SessionController::new(engine, session_config.join_policy());

        if let Err(e) = session.initialize(&self.data_dir, session_config.platform_version) {
            // The session stays degraded; surface attach will not start anything
            tracing::error!("{}", e);
        }
        session.set_render_backend(session_config.render_backend);
        session.set_aspect_ratio(session_config.aspect_ratio);
        if let Some(rom) = self.rom {
            session.select_rom(rom);
        }

        #[cfg(feature = "gamepad")]
        session.attach_device_manager(Box::new(vmhost_core::input::GamepadManager::new()));

        let frontend = Frontend::new(session, &self.config.input);
        let report = if self.headless {
            headless::run(frontend, session_config.save_slot)?
        } else {
            app::run(frontend, &self.config)?
        };

        if let Err(e) = report.join {
            tracing::error!("Session did not shut down cleanly: {}", e);
            std::process::exit(1);
        }
        tracing::info!("Session ended");
        Ok(())
    }
}
