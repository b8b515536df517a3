//! Command system for user actions

use std::collections::HashMap;

/// Viewer commands. Their effect depends on the current view mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Next,
    Previous,
    /// Close the single view, or stop a running slideshow
    Exit,
    ToggleFullscreen,
    Delete,
    ToggleSlideshow,
    TogglePause,
    Faster,
    Slower,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::Next,
        Command::Previous,
        Command::Exit,
        Command::ToggleFullscreen,
        Command::Delete,
        Command::ToggleSlideshow,
        Command::TogglePause,
        Command::Faster,
        Command::Slower,
    ];

    /// Stable identifier used in the keybinding table
    pub fn id(self) -> &'static str {
        match self {
            Command::Next => "nav.next",
            Command::Previous => "nav.previous",
            Command::Exit => "view.exit",
            Command::ToggleFullscreen => "view.toggle_fullscreen",
            Command::Delete => "file.delete",
            Command::ToggleSlideshow => "slideshow.toggle",
            Command::TogglePause => "slideshow.pause",
            Command::Faster => "slideshow.faster",
            Command::Slower => "slideshow.slower",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.id() == id)
    }
}

/// Maps key names to commands
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    bindings: HashMap<String, Command>,
}

impl KeyMap {
    /// Build from the config table (command id -> keys)
    pub fn new(bindings: &HashMap<String, Vec<String>>) -> Self {
        // Invert the bindings map: command -> keys becomes key -> command
        let mut key_to_command = HashMap::new();

        for (id, keys) in bindings {
            let Some(command) = Command::from_id(id) else {
                tracing::warn!("Unknown command in keybindings: {}", id);
                continue;
            };
            for key in keys {
                key_to_command.insert(key.clone(), command);
            }
        }

        Self {
            bindings: key_to_command,
        }
    }

    /// Resolve a key name. Names are case-sensitive so `q` and `Q` can differ.
    pub fn resolve(&self, key: &str) -> Option<Command> {
        let key = match key {
            " " => "Space",
            other => other,
        };
        let command = self.bindings.get(key).copied();
        tracing::debug!("Key pressed: {} -> {:?}", key, command);
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;

    #[test]
    fn test_ids_round_trip() {
        for cmd in Command::ALL {
            assert_eq!(Command::from_id(cmd.id()), Some(cmd));
        }
        assert_eq!(Command::from_id("app.quit"), None);
    }

    #[test]
    fn test_default_bindings() {
        let keys = KeyMap::new(&AppConfig::default().keybindings);
        assert_eq!(keys.resolve("ArrowRight"), Some(Command::Next));
        assert_eq!(keys.resolve("ArrowLeft"), Some(Command::Previous));
        assert_eq!(keys.resolve("Escape"), Some(Command::Exit));
        assert_eq!(keys.resolve("Q"), Some(Command::Exit));
        assert_eq!(keys.resolve("Backspace"), Some(Command::Delete));
        assert_eq!(keys.resolve(" "), Some(Command::TogglePause));
        assert_eq!(keys.resolve("z"), None);
    }
}
