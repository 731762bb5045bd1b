use glam::Vec2;

/// A discrete input event delivered by the host between frames.
///
/// Hosts translate their native events (winit, DOM, ...) into these; the
/// chart never sees raw platform events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed at a surface position.
    PointerDown(Vec2),
    /// Pointer moved to a surface position.
    PointerMove(Vec2),
    /// Primary button released.
    PointerUp,
    /// Pointer left the surface.
    PointerLeave,
    /// Scroll with a vertical delta in pixels; positive scrolls down.
    Wheel { delta_y: f32 },
    /// Container resized to the given physical size.
    Resize { width: u32, height: u32 },
}

/// Kind of event a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    Wheel,
    Resize,
}

impl ListenerKind {
    /// Every kind a mounted chart subscribes to.
    pub const ALL: [ListenerKind; 6] = [
        ListenerKind::PointerDown,
        ListenerKind::PointerMove,
        ListenerKind::PointerUp,
        ListenerKind::PointerLeave,
        ListenerKind::Wheel,
        ListenerKind::Resize,
    ];
}

impl InputEvent {
    pub fn kind(&self) -> ListenerKind {
        match self {
            InputEvent::PointerDown(_) => ListenerKind::PointerDown,
            InputEvent::PointerMove(_) => ListenerKind::PointerMove,
            InputEvent::PointerUp => ListenerKind::PointerUp,
            InputEvent::PointerLeave => ListenerKind::PointerLeave,
            InputEvent::Wheel { .. } => ListenerKind::Wheel,
            InputEvent::Resize { .. } => ListenerKind::Resize,
        }
    }
}
