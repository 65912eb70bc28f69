//! Windowless mode
//!
//! Attaches an offscreen surface and drives the frontend from line commands on stdin.
//! End of input tears the session down like `quit`.

use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use vmhost_core::frontend::{self, EventSender, Frontend, HostEvent};
use vmhost_core::input::TouchAction;
use vmhost_core::{
    AspectRatio, ButtonCode, RenderBackend, SurfaceHandle, TeardownReport, TouchControl,
    VmHandle,
};

const OFFSCREEN_SURFACE: SurfaceHandle = SurfaceHandle::from_raw(1);
const OFFSCREEN_SIZE: (u32, u32) = (640, 480);
const POLL_INTERVAL: Duration = Duration::from_millis(8);

pub const COMMANDS: &str = "\
pause | resume | save [slot] | load [slot] | restart <rom> | backend <name> |
aspect <n> | press <button> | release <button> | quit";

pub fn run<V: VmHandle>(mut frontend: Frontend<V>, slot: i32) -> Result<TeardownReport> {
    let (events, receiver) = frontend::channel(32);

    let (width, height) = OFFSCREEN_SIZE;
    frontend.handle(HostEvent::SurfaceChanged {
        surface: Some(OFFSCREEN_SURFACE),
        width,
        height,
    });

    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || read_commands(events, slot))
        .context("failed to spawn stdin reader")?;

    tracing::info!("Headless session running. Commands: {}", COMMANDS);
    Ok(frontend.run(&receiver, POLL_INTERVAL))
}

fn read_commands(events: EventSender, slot: i32) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("stdin read failed: {}", e);
                break;
            }
        };
        match parse_command(&line, slot) {
            Ok(Some(event)) => {
                let quit = event == HostEvent::Destroy;
                if !events.send(event) || quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("{} (commands: {})", e, COMMANDS),
        }
    }
    events.send(HostEvent::Destroy);
}

/// Parse one command line. Blank lines yield `None`.
pub fn parse_command(line: &str, default_slot: i32) -> Result<Option<HostEvent>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let slot = || -> Result<i32> {
        match argument {
            Some(n) => n.parse().with_context(|| format!("invalid slot '{}'", n)),
            None => Ok(default_slot),
        }
    };
    let button = || -> Result<TouchControl> {
        let name = argument.context("missing button name")?;
        let code = ButtonCode::from_name(name)
            .with_context(|| format!("unknown button '{}'", name))?;
        Ok(TouchControl::Button(code))
    };

    let event = match command {
        "pause" => HostEvent::ForegroundExit,
        "resume" => HostEvent::ForegroundEnter,
        "save" => HostEvent::SaveState(slot()?),
        "load" => HostEvent::LoadState(slot()?),
        "restart" => HostEvent::Restart(PathBuf::from(argument.context("missing ROM path")?)),
        "backend" => {
            let name = argument.context("missing backend name")?;
            HostEvent::SetRenderBackend(
                RenderBackend::parse(name)
                    .with_context(|| format!("unknown render backend '{}'", name))?,
            )
        }
        "aspect" => {
            let ratio = argument.context("missing aspect ratio")?;
            HostEvent::SetAspectRatio(AspectRatio(
                ratio
                    .parse()
                    .with_context(|| format!("invalid aspect ratio '{}'", ratio))?,
            ))
        }
        "press" => HostEvent::Touch {
            control: button()?,
            action: TouchAction::Down,
        },
        "release" => HostEvent::Touch {
            control: button()?,
            action: TouchAction::Up,
        },
        "quit" | "exit" => HostEvent::Destroy,
        other => bail!("unknown command '{}'", other),
    };
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("", 0).unwrap(), None);
        assert_eq!(
            parse_command("pause", 0).unwrap(),
            Some(HostEvent::ForegroundExit)
        );
        assert_eq!(
            parse_command("save", 2).unwrap(),
            Some(HostEvent::SaveState(2))
        );
        assert_eq!(
            parse_command("load 5", 2).unwrap(),
            Some(HostEvent::LoadState(5))
        );
        assert_eq!(
            parse_command("restart  disc2.iso", 0).unwrap(),
            Some(HostEvent::Restart(PathBuf::from("disc2.iso")))
        );
        assert_eq!(
            parse_command("backend vk", 0).unwrap(),
            Some(HostEvent::SetRenderBackend(RenderBackend::VULKAN))
        );
        assert_eq!(
            parse_command("press Cross", 0).unwrap(),
            Some(HostEvent::Touch {
                control: TouchControl::Button(ButtonCode::CROSS),
                action: TouchAction::Down
            })
        );
        assert_eq!(parse_command("quit", 0).unwrap(), Some(HostEvent::Destroy));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("restart", 0).is_err());
        assert!(parse_command("save x", 0).is_err());
        assert!(parse_command("press turbo", 0).is_err());
        assert!(parse_command("dance", 0).is_err());
    }
}
