#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    Space,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Canvas,
    TextInput,
    TextArea,
}

impl Focus {
    fn is_text_entry(self) -> bool {
        matches!(self, Focus::TextInput | Focus::TextArea)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StepForward,
    StepBackward,
    TogglePlay,
    Reset,
}

// Keys typed into form fields are never bound.
pub fn command_for(key: Key, focus: Focus) -> Option<Command> {
    if focus.is_text_entry() {
        return None;
    }
    match key {
        Key::ArrowRight => Some(Command::StepForward),
        Key::ArrowLeft => Some(Command::StepBackward),
        Key::Space => Some(Command::TogglePlay),
        Key::Char('r') => Some(Command::Reset),
        Key::Char(_) => None,
    }
}
