//! winit event translation

use crate::input::Key;

/// Touchpad pixels that count as one wheel line.
const PIXELS_PER_LINE: f32 = 20.0;

/// Map a winit logical key to a key the application reacts to.
pub fn key_from_winit(key: &winit::keyboard::Key) -> Option<Key> {
    use winit::keyboard::{Key as WKey, NamedKey};

    match key {
        WKey::Character(c) => match c.chars().next()?.to_ascii_lowercase() {
            'w' => Some(Key::W),
            'a' => Some(Key::A),
            's' => Some(Key::S),
            'd' => Some(Key::D),
            _ => None,
        },
        WKey::Named(NamedKey::Escape) => Some(Key::Escape),
        _ => None,
    }
}

/// Vertical scroll amount of a wheel event, in lines.
pub fn scroll_lines(delta: &winit::event::MouseScrollDelta) -> f32 {
    match delta {
        winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
        winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::{Key as WKey, NamedKey};

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_from_winit(&WKey::Character("W".into())), Some(Key::W));
        assert_eq!(key_from_winit(&WKey::Character("d".into())), Some(Key::D));
        assert_eq!(key_from_winit(&WKey::Named(NamedKey::Escape)), Some(Key::Escape));
        assert_eq!(key_from_winit(&WKey::Character("q".into())), None);
    }

    #[test]
    fn test_scroll_lines() {
        let line = winit::event::MouseScrollDelta::LineDelta(0.0, -1.0);
        assert_eq!(scroll_lines(&line), -1.0);
        let position = winit::dpi::PhysicalPosition::new(0.0, 40.0);
        let pixels = winit::event::MouseScrollDelta::PixelDelta(position);
        assert_eq!(scroll_lines(&pixels), 2.0);
    }
}
