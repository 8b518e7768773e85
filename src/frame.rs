pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// The monochrome display surface. Written only by the clear and draw
/// instructions; everything else sees it through `FrameSnapshot`.
pub struct FrameBuffer {
    cells: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> FrameBuffer {
        FrameBuffer {
            cells: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.cells = [[false; SCREEN_WIDTH]; SCREEN_HEIGHT];
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.cells[y][x]
    }

    /// XOR a sprite in at (x, y), one byte per 8-pixel row. Start
    /// coordinates wrap; once a row reaches the right edge, or the
    /// sprite reaches the bottom edge, the remainder of that row / of
    /// the sprite is clipped rather than wrapped. Returns whether any
    /// lit pixel was erased.
    pub fn blit(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut collision = false;
        for (row, bits) in rows.iter().enumerate() {
            let cy = (y as usize + row) % SCREEN_HEIGHT;
            for col in 0..8 {
                let cx = (x as usize + col) % SCREEN_WIDTH;
                if bits & (0x80 >> col) != 0 {
                    if self.cells[cy][cx] {
                        self.cells[cy][cx] = false;
                        collision = true;
                    } else {
                        self.cells[cy][cx] = true;
                    }
                }
                if cx == SCREEN_WIDTH - 1 {
                    break;
                }
            }
            if cy == SCREEN_HEIGHT - 1 {
                break;
            }
        }
        collision
    }
}

/// Everything the execution engine and the timer driver both touch:
/// the two countdown timers, the framebuffer and the redraw flag.
/// Always lives behind one lock, so a timer decrement and an engine
/// access can never interleave mid-update.
pub struct Peripherals {
    pub delay: u8,
    pub sound: u8,
    pub fb: FrameBuffer,
    pub redraw: bool,
}

impl Peripherals {
    pub fn new() -> Peripherals {
        Peripherals {
            delay: 0,
            sound: 0,
            fb: FrameBuffer::new(),
            // paint the empty screen on the first tick
            redraw: true,
        }
    }

    /// one 60 Hz tick: step both timers toward zero and ask for a repaint
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
        self.redraw = true;
    }

    /// consume the pending redraw, if any. The copy is taken under the
    /// caller's lock so the pixels and the sound state are consistent.
    pub fn take_snapshot(&mut self) -> Option<FrameSnapshot> {
        if !self.redraw {
            return None;
        }
        self.redraw = false;
        Some(FrameSnapshot {
            pixels: self.fb.cells,
            sound_active: self.sound > 0,
        })
    }
}

/// A consistent copy of the display state, handed to the renderer.
pub struct FrameSnapshot {
    pub pixels: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
    pub sound_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_resets_every_cell() {
        let mut fb = FrameBuffer::new();
        fb.blit(0, 0, &[0xff]);
        fb.clear();
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                assert!(!fb.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_blit_sets_pixels_without_collision() {
        let mut fb = FrameBuffer::new();
        let collision = fb.blit(4, 2, &[0xff]);
        assert!(!collision);
        for x in 4..12 {
            assert!(fb.pixel(x, 2));
        }
        assert!(!fb.pixel(3, 2));
        assert!(!fb.pixel(12, 2));
    }

    #[test]
    fn test_blit_collision_erases_and_reports() {
        let mut fb = FrameBuffer::new();
        fb.blit(4, 2, &[0xff]);
        let collision = fb.blit(4, 2, &[0xff]);
        assert!(collision);
        for x in 4..12 {
            assert!(!fb.pixel(x, 2));
        }
    }

    #[test]
    fn test_blit_zero_bits_leave_cells_alone() {
        let mut fb = FrameBuffer::new();
        fb.blit(0, 0, &[0xff]);
        let collision = fb.blit(0, 0, &[0x00]);
        assert!(!collision);
        for x in 0..8 {
            assert!(fb.pixel(x, 0));
        }
    }

    #[test]
    fn test_blit_start_coordinates_wrap() {
        let mut fb = FrameBuffer::new();
        fb.blit(64 + 4, 32 + 2, &[0x80]);
        assert!(fb.pixel(4, 2));
    }

    #[test]
    fn test_blit_clips_at_right_edge() {
        let mut fb = FrameBuffer::new();
        fb.blit(60, 0, &[0xff]);
        for x in 60..64 {
            assert!(fb.pixel(x, 0));
        }
        // nothing wrapped around to the left side
        for x in 0..4 {
            assert!(!fb.pixel(x, 0));
        }
    }

    #[test]
    fn test_blit_clips_at_bottom_edge() {
        let mut fb = FrameBuffer::new();
        fb.blit(0, 31, &[0x80, 0x80, 0x80]);
        assert!(fb.pixel(0, 31));
        // rows past the bottom were dropped, not wrapped to the top
        assert!(!fb.pixel(0, 0));
        assert!(!fb.pixel(0, 1));
    }

    #[test]
    fn test_tick_clamps_at_zero() {
        let mut p = Peripherals::new();
        p.delay = 2;
        p.sound = 1;
        for _ in 0..5 {
            p.tick();
        }
        assert_eq!(p.delay, 0);
        assert_eq!(p.sound, 0);
    }

    #[test]
    fn test_tick_requests_redraw() {
        let mut p = Peripherals::new();
        p.take_snapshot();
        assert!(!p.redraw);
        p.tick();
        assert!(p.redraw);
    }

    #[test]
    fn test_snapshot_consumes_redraw() {
        let mut p = Peripherals::new();
        p.sound = 3;
        let frame = p.take_snapshot().unwrap();
        assert!(frame.sound_active);
        assert!(p.take_snapshot().is_none());
    }
}
