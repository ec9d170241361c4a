use std::collections::VecDeque;

use bitflags::bitflags;

use islet_shared::inventory::ResourceKind;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputFlags: u8 {
        const FORWARD    = 0b0000_0001;
        const BACKWARD   = 0b0000_0010;
        const TURN_LEFT  = 0b0000_0100;
        const TURN_RIGHT = 0b0000_1000;
        const JUMP       = 0b0001_0000;
        const SPRINT     = 0b0010_0000;
        const DIVE       = 0b0100_0000;
    }
}

impl InputFlags {
    /// Any walk or turn key counts as moving for the swim transition.
    pub fn is_moving(self) -> bool {
        self.intersects(
            InputFlags::FORWARD | InputFlags::BACKWARD | InputFlags::TURN_LEFT | InputFlags::TURN_RIGHT,
        )
    }
}

/// One-shot requests consumed by the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Mine,
    Place,
    ToggleBuildMode,
    Select(ResourceKind),
    Look { pitch: f32 },
    Teleport { x: f32, y: f32, z: f32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub flags: InputFlags,
    pub actions: Vec<Action>,
}

/// Held flags with a tick budget plus queued actions.
#[derive(Debug, Default)]
pub struct InputState {
    held: InputFlags,
    held_ticks: u32,
    pulse: InputFlags,
    pending: VecDeque<Action>,
}

impl InputState {
    pub fn hold(&mut self, flags: InputFlags, ticks: u32) {
        self.held = flags;
        self.held_ticks = ticks;
    }

    /// Flags applied for exactly one tick on top of whatever is held.
    pub fn pulse(&mut self, flags: InputFlags) {
        self.pulse |= flags;
    }

    pub fn push_action(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    pub fn release(&mut self) {
        self.held = InputFlags::empty();
        self.held_ticks = 0;
    }

    pub fn is_idle(&self) -> bool {
        self.held_ticks == 0 && self.pulse.is_empty() && self.pending.is_empty()
    }

    pub fn next_frame(&mut self) -> FrameInput {
        let mut flags = std::mem::take(&mut self.pulse);
        if self.held_ticks > 0 {
            flags |= self.held;
            self.held_ticks -= 1;
            if self.held_ticks == 0 {
                self.held = InputFlags::empty();
            }
        }
        FrameInput {
            flags,
            actions: self.pending.drain(..).collect(),
        }
    }
}
