use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Represents the result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Quit the application
    Quit,
    /// Keep the current item
    Keep,
    /// Mark the current item for deletion
    Delete,
    /// Undo last decision
    Undo,
    /// Send the deletion batch to the trash
    Finish,
    /// Start the review over
    Reset,
    /// Toggle help overlay
    Help,
    ConfirmFinish,
    CancelFinish,
    /// No action
    None,
}

/// Maps keyboard events to actions
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Quit: q, Esc or Ctrl+C
        (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::Quit,

        // Keep: Right arrow or k
        (KeyCode::Right, KeyModifiers::NONE) => KeyAction::Keep,
        (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::Keep,

        // Delete: Left arrow or d
        (KeyCode::Left, KeyModifiers::NONE) => KeyAction::Delete,
        (KeyCode::Char('d'), KeyModifiers::NONE) => KeyAction::Delete,

        // Undo: u or Ctrl+Z
        (KeyCode::Char('u'), KeyModifiers::NONE) => KeyAction::Undo,
        (KeyCode::Char('z'), KeyModifiers::CONTROL) => KeyAction::Undo,

        (KeyCode::Char('f'), KeyModifiers::NONE) => KeyAction::Finish,
        (KeyCode::Char('r'), KeyModifiers::NONE) => KeyAction::Reset,

        // Help: ?
        (KeyCode::Char('?'), KeyModifiers::NONE) => KeyAction::Help,
        (KeyCode::Char('?'), KeyModifiers::SHIFT) => KeyAction::Help,

        _ => KeyAction::None,
    }
}

/// Maps keyboard events to confirmation actions
/// Used when ViewState is ConfirmFinish
pub fn handle_confirm_input(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Confirm: y or Enter
        (KeyCode::Char('y'), KeyModifiers::NONE) => KeyAction::ConfirmFinish,
        (KeyCode::Char('Y'), _) => KeyAction::ConfirmFinish,
        (KeyCode::Enter, KeyModifiers::NONE) => KeyAction::ConfirmFinish,

        // Cancel: n or Esc
        (KeyCode::Char('n'), KeyModifiers::NONE) => KeyAction::CancelFinish,
        (KeyCode::Char('N'), _) => KeyAction::CancelFinish,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::CancelFinish,

        _ => KeyAction::None,
    }
}

/// Progress of a mouse drag across the card
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeUpdate {
    /// Button still held; horizontal displacement so far in columns
    Dragging(f32),
    /// Button released; final displacement to classify
    Released(f32),
    Idle,
}

/// Turns left-button press, drag and release into a horizontal displacement
#[derive(Debug, Default)]
pub struct SwipeTracker {
    origin: Option<u16>,
    offset: f32,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displacement of the drag in progress, if any
    pub fn offset(&self) -> Option<f32> {
        self.origin.map(|_| self.offset)
    }

    pub fn handle(&mut self, event: MouseEvent) -> SwipeUpdate {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.origin = Some(event.column);
                self.offset = 0.0;
                SwipeUpdate::Dragging(0.0)
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.origin {
                Some(origin) => {
                    self.offset = f32::from(event.column) - f32::from(origin);
                    SwipeUpdate::Dragging(self.offset)
                }
                None => SwipeUpdate::Idle,
            },
            MouseEventKind::Up(MouseButton::Left) => match self.origin.take() {
                Some(origin) => {
                    let displacement = f32::from(event.column) - f32::from(origin);
                    self.offset = 0.0;
                    SwipeUpdate::Released(displacement)
                }
                None => SwipeUpdate::Idle,
            },
            _ => SwipeUpdate::Idle,
        }
    }

    pub fn cancel(&mut self) {
        self.origin = None;
        self.offset = 0.0;
    }
}
