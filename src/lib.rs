//! ## Design
//!
//! * a fetch-decode-execute machine for the classic 35-opcode, 4K,
//!   64x32 instruction set
//! * decoding is a pure, total function onto a closed enum; anything
//!   unassigned comes back as an explicit invalid marker and stops the
//!   run with the offending address and word
//! * the interpreter owns registers, index, pc, sp and memory outright.
//!   The two countdown timers, the framebuffer and the redraw flag are
//!   shared with the timer driver behind a single mutex, so:
//!    - a 60 Hz decrement and an engine timer access never interleave
//!      mid-update
//!    - the renderer always gets pixels + sound state from one moment
//! * the timer driver owns the display; the engine never draws, it only
//!   marks the framebuffer dirty
//! * key input is line-buffered and blocking, and blocks only the
//!   engine's thread; timers keep running while a program waits
//! * collaborators (display, input) sit behind traits so tests swap in
//!   dummies, same as any other screen or key source could be
//! * halting is data, not control flow: stepping returns a halt reason
//!   (breakpoint, jump-to-self) or a fatal error, and the caller
//!   decides what to do with it
pub mod display;
pub mod frame;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod monitor;
pub mod timer;
