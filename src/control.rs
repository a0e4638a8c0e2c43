use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

/// session-control commands a frontend can issue between ticks
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    PauseResume,
    Reboot,
    SaveState,
    LoadState,
    SwapMedia,
    Quit,
}

/// default key bindings
const CONTROL_KEYMAP: [(char, Command); 6] = [
    (' ', Command::PauseResume),
    ('r', Command::Reboot),
    ('s', Command::SaveState),
    ('l', Command::LoadState),
    ('x', Command::SwapMedia),
    ('q', Command::Quit),
];

/// reads session commands
pub trait ControlInput {
    /// collect any commands issued since the last poll, without blocking
    fn poll_commands(&mut self) -> Result<Vec<Command>, io::Error>;
}

/// simple implementation of ControlInput, using the keyboard
pub struct KeyboardControl {
    keymap: HashMap<char, Command>,
}

impl KeyboardControl {
    pub fn new() -> Self {
        terminal::enable_raw_mode().unwrap();
        KeyboardControl {
            keymap: HashMap::from(CONTROL_KEYMAP),
        }
    }
}

impl Drop for KeyboardControl {
    fn drop(&mut self) {
        terminal::disable_raw_mode().unwrap();
    }
}

impl ControlInput for KeyboardControl {
    fn poll_commands(&mut self) -> Result<Vec<Command>, io::Error> {
        let mut commands = Vec::new();
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Char(key) => {
                        if let Some(command) = self.keymap.get(&key) {
                            commands.push(*command);
                        }
                    }
                    KeyCode::Esc => commands.push(Command::Quit),
                    _ => {}
                },
                _ => {}
            }
        }
        Ok(commands)
    }
}

/// dummy ControlInput implementation for testing
pub struct ScriptedControl {
    commands: Vec<Command>,
}

impl ScriptedControl {
    pub fn new(commands: &[Command]) -> Self {
        ScriptedControl {
            commands: Vec::from(commands),
        }
    }
}

impl ControlInput for ScriptedControl {
    fn poll_commands(&mut self) -> Result<Vec<Command>, io::Error> {
        Ok(std::mem::take(&mut self.commands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_control_drains_once() -> Result<(), io::Error> {
        let mut c = ScriptedControl::new(&[Command::Reboot, Command::Quit]);
        assert_eq!(c.poll_commands()?, vec![Command::Reboot, Command::Quit]);
        assert_eq!(c.poll_commands()?, vec![]);
        Ok(())
    }

    #[test]
    fn test_keymap_covers_every_command() {
        let bound: Vec<Command> = CONTROL_KEYMAP.iter().map(|(_, c)| *c).collect();
        for command in [
            Command::PauseResume,
            Command::Reboot,
            Command::SaveState,
            Command::LoadState,
            Command::SwapMedia,
            Command::Quit,
        ] {
            assert!(bound.contains(&command));
        }
    }
}
