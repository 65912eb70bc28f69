//! Command line arguments

use std::path::PathBuf;

use clap::Parser;
use vmhost_core::RenderBackend;

/// vmhost - emulator front-end
#[derive(Parser, Debug)]
#[command(name = "vmhost")]
#[command(about = "Run a disc image on a native or headless emulation core")]
#[command(version)]
pub struct Cli {
    /// ROM to boot (boots the firmware when omitted)
    pub rom: Option<PathBuf>,

    /// Native core library (headless engine when omitted)
    #[arg(long)]
    pub core: Option<PathBuf>,

    /// Render backend: opengl, software, vulkan
    #[arg(long, value_parser = parse_backend)]
    pub backend: Option<RenderBackend>,

    /// Save slot used by the save/load hotkeys
    #[arg(long)]
    pub slot: Option<i32>,

    /// No window; read commands from stdin
    #[arg(long)]
    pub headless: bool,
}

fn parse_backend(name: &str) -> Result<RenderBackend, String> {
    RenderBackend::parse(name).ok_or_else(|| format!("unknown render backend '{}'", name))
}
