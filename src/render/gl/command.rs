// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! The deferred command log. Drawing and state-change calls append
//! commands during the frame; swap replays them in order exactly once,
//! then resets the length. The backing storage is an amortized-growth
//! arena: capacity is never given back between frames.

use crate::render::gl::color::Color;
use crate::render::gl::shader::Program;
use crate::render::gl::vertex::VertexFormat;
use crate::render::gl::view::View;
use crate::util::handle::Handle;

/// which framebuffer a SetSurface command binds
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SurfaceTarget {
    /// the window's default framebuffer
    Default,
    /// rebind whatever is current, refreshing viewport and projection
    /// (used after a display resize)
    Current,
    /// an offscreen surface
    Surface(Handle),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Command {
    Clear {
        color: Color,
    },
    Draw {
        color: Color,
        /// Handle::NONE for untextured geometry
        texture: Handle,
        program: Program,
        format: VertexFormat,
        /// gl primitive topology
        mode: u32,
        /// first vertex index in the staging buffer
        first: i32,
        count: i32,
    },
    SetSurface {
        target: SurfaceTarget,
    },
    ResetSurface,
    SetView {
        view: View,
    },
    ResetView,
    PushMatrix,
    PopMatrix,
    Translate {
        x: f32,
        y: f32,
    },
    Scale {
        x: f32,
        y: f32,
    },
    Rotate {
        degrees: f32,
    },
    Resize {
        width: i32,
        height: i32,
    },
}

pub struct CommandBuffer {
    items: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self { items: vec![] }
    }

    pub fn push(&mut self, command: Command) {
        self.items.push(command);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.items.iter()
    }

    /// drop the recorded commands, keeping the allocation
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// hand the recorded commands out for replay,
    /// leaving an empty log behind
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.items)
    }

    /// give the replayed storage back so its capacity survives
    pub fn restore(&mut self, mut items: Vec<Command>) {
        items.clear();
        items.append(&mut self.items);
        self.items = items;
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_keeps_commands_in_order() {
        let mut cb = CommandBuffer::new();
        cb.push(Command::PushMatrix);
        cb.push(Command::Translate { x: 1.0, y: 2.0 });
        cb.push(Command::PopMatrix);
        let kinds: Vec<_> = cb.iter().collect();
        assert!(matches!(kinds[0], Command::PushMatrix));
        assert!(matches!(kinds[1], Command::Translate { .. }));
        assert!(matches!(kinds[2], Command::PopMatrix));
    }

    #[test]
    fn take_and_restore_keep_capacity() {
        let mut cb = CommandBuffer::new();
        for _ in 0..100 {
            cb.push(Command::PushMatrix);
        }
        let taken = cb.take();
        assert_eq!(taken.len(), 100);
        let cap = taken.capacity();
        cb.restore(taken);
        assert_eq!(cb.len(), 0);
        assert!(cb.capacity() >= cap);
    }

    #[test]
    fn restore_preserves_commands_recorded_during_replay() {
        let mut cb = CommandBuffer::new();
        cb.push(Command::PushMatrix);
        let taken = cb.take();
        // the next frame may already be re-armed before restore
        cb.push(Command::ResetSurface);
        cb.restore(taken);
        assert_eq!(cb.len(), 1);
        assert!(matches!(cb.iter().next(), Some(Command::ResetSurface)));
    }
}
