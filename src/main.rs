use std::error::Error;
use std::path::Path;
use std::time::Duration;

use a2pace::audio::Mute;
use a2pace::config::Config;
use a2pace::control::{Command, ControlInput, KeyboardControl};
use a2pace::display::TermStatusDisplay;
use a2pace::engine::FreeRunner;
use a2pace::peripheral::{DiskDrive, SoundCard};
use a2pace::session::{Machine, Session};

const STATE_FILE: &str = "a2pace.state";

/// keys: space pause/resume, r reboot, s/l save/load state, x swap disks,
/// q or Esc to quit
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = Config::default();
    let mut session = Session::new(
        config,
        Box::new(|_config| {
            Ok(Machine {
                engine: Box::new(FreeRunner::new()),
                peripherals: vec![
                    Box::new(DiskDrive::new("master.dsk", "blank.dsk")),
                    Box::new(SoundCard::new()),
                ],
                audio: Box::new(Mute::new()),
                display: Box::new(TermStatusDisplay::new()?),
            })
        }),
    )?;

    let mut control = KeyboardControl::new();
    session.start()?;

    'main: loop {
        for command in control.poll_commands()? {
            match command {
                Command::PauseResume => {
                    if session.is_running() {
                        session.pause()?;
                    } else {
                        session.start()?;
                    }
                }
                Command::Reboot => session.reboot()?,
                Command::SaveState => session.save_state(Path::new(STATE_FILE))?,
                Command::LoadState => session.load_state(Path::new(STATE_FILE))?,
                Command::SwapMedia => session.swap_media(0)?,
                Command::Quit => break 'main,
            }
        }

        if session.is_running() {
            session.wait_tick();
            session.tick()?;
        } else {
            // nothing to pace while paused; just poll the keyboard slowly
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    session.pause()?;

    // shove some junk on stdout to stop the cli messing up the status panel
    for _ in 0..8 {
        println!();
    }
    Ok(())
}
