//! Scripted controller input for BGB's demo playback.
//!
//! A demo file is one joypad byte per frame. Every logical press is held for two frames and followed by a fixed idle
//! gap, and every demo ends in a long tail of harmless presses so the emulator never runs out of input before it
//! halts.

pub const IDLE_FRAMES: usize = 12;
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    None,
    A,
    B,
    Right,
    Left,
    Up,
    Down,
}

impl Button {
    pub fn joypad(self) -> u8 {
        match self {
            Button::None => 0x00,
            Button::A => 0x01,
            Button::B => 0x02,
            Button::Right => 0x10,
            Button::Left => 0x20,
            Button::Up => 0x40,
            Button::Down => 0x80,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Demo(Vec<u8>);

impl Demo {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn write(&self, path: &std::path::Path) -> std::io::Result<()> {
        std::fs::write(path, &self.0)
    }
}

impl std::ops::Add for Demo {
    type Output = Demo;

    fn add(mut self, rhs: Demo) -> Demo {
        self.0.extend_from_slice(&rhs.0);
        self
    }
}

fn press_into(buf: &mut Vec<u8>, button: Button) {
    let b = button.joypad();
    buf.extend_from_slice(&[b, b]);
    buf.extend(std::iter::repeat(0).take(IDLE_FRAMES));
}

pub fn encode(buttons: &[Button], buffer_button: Button, buffer_size: usize) -> Demo {
    let mut buf = Vec::with_capacity((buttons.len() + buffer_size) * (2 + IDLE_FRAMES));
    for &button in buttons {
        press_into(&mut buf, button);
    }
    for _ in 0..buffer_size {
        press_into(&mut buf, buffer_button);
    }
    Demo(buf)
}

/// Encodes with the usual tail of B presses, which back out of anything the script overshoots.
pub fn encode_default(buttons: &[Button]) -> Demo {
    encode(buttons, Button::B, DEFAULT_BUFFER_SIZE)
}

/// Moves a vertical menu cursor from `current` to `target`.
pub fn menu_navigate(current: u8, target: u8) -> Vec<Button> {
    if target >= current {
        vec![Button::Down; (target - current) as usize]
    } else {
        vec![Button::Up; (current - target) as usize]
    }
}

/// From the battle menu, opens FIGHT and picks move slot `target`.
pub fn select_move(current: u8, target: u8) -> Demo {
    let mut buttons = vec![Button::B, Button::Up, Button::Left, Button::A, Button::None, Button::None];
    buttons.extend(menu_navigate(current, target));
    buttons.push(Button::A);
    encode_default(&buttons)
}

/// From the party menu, picks party slot `target` and confirms.
pub fn choose_pokemon(current: u8, target: u8) -> Demo {
    let mut buttons = vec![Button::None; 5];
    buttons.extend(menu_navigate(current, target));
    buttons.push(Button::A);
    buttons.extend([Button::None; 5]);
    buttons.push(Button::A);
    encode_default(&buttons)
}

/// From the battle menu, opens PKMN. Meant to be followed by [`choose_pokemon`].
pub fn select_switch() -> Demo {
    encode(&[Button::B, Button::Up, Button::Right, Button::A], Button::None, 1)
}

/// The bag holds a single item, so using it is just picking its target from the party menu.
pub fn select_item(current: u8, target: u8) -> Demo {
    choose_pokemon(current, target)
}

/// Pages through the opening text of a probe save until the AI routine runs.
pub fn ai_demo() -> Demo {
    use Button::{A, B, Down};
    encode_default(&[
        B, B, B, B, A, A, B, B, A, Down, A, B, B, A, Down, A, B, B, A, Down, A,
    ])
}
