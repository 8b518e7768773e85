use crate::frame::Peripherals;
use crate::input::Input;
use crate::instruction::{decode, Instruction, Opcode};
use crate::memory::{AddressSpace, Ram, FONT_ADDR, GLYPH_HEIGHT};
use log::{debug, trace};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Fatal engine failures. Every instruction either fully applies its
/// effects or the run stops with one of these.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("invalid instruction {word:#06x} at {addr:#05x}")]
    InvalidInstruction { addr: u16, word: u16 },

    #[error("key input failed: {0}")]
    InputFailed(#[from] io::Error),
}

/// Terminal, non-error reasons for the run loop to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// a jump targeted its own address; reported only while the
    /// halt-on-spin switch is set
    SelfJump { addr: u16 },
    /// the program counter landed on a caller-supplied breakpoint
    Breakpoint { addr: u16 },
}

/// The fetch-decode-execute engine.
///
/// Registers, index, program counter, stack pointer and memory are owned
/// here outright; the timers, framebuffer and redraw flag are shared
/// with the timer driver behind a mutex, taken briefly per instruction
/// and never held across the blocking key read.
pub struct Interpreter<'a> {
    memory: Ram,
    v: [u8; 16],
    i: u16,
    pc: u16,
    sp: u16,
    peripherals: Arc<Mutex<Peripherals>>,
    input: &'a mut dyn Input,
    halt_on_spin: bool,
}

impl<'a> Interpreter<'a> {
    pub fn new(input: &'a mut dyn Input, peripherals: Arc<Mutex<Peripherals>>) -> Interpreter<'a> {
        let memory = Ram::new();
        let pc = memory.program_addr;
        let sp = memory.stack_addr;
        Interpreter {
            memory,
            v: [0; 16],
            i: 0,
            pc,
            sp,
            peripherals,
            input,
            halt_on_spin: true,
        }
    }

    /// toggle the halt heuristic for jumps that target themselves
    pub fn set_halt_on_spin(&mut self, on: bool) {
        self.halt_on_spin = on;
    }

    /// load a program image at the load address
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<(), io::Error> {
        self.memory.load_program(reader)
    }

    // read-only surface for the monitor and other onlookers

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }
    pub fn pc(&self) -> u16 {
        self.pc
    }
    pub fn sp(&self) -> u16 {
        self.sp
    }
    pub fn index(&self) -> u16 {
        self.i
    }
    pub fn timers(&self) -> (u8, u8) {
        let p = self.lock();
        (p.delay, p.sound)
    }
    pub fn ram(&self, addr: u16, len: usize) -> &[u8] {
        self.memory.slice(addr, len)
    }

    /// ask the renderer for a repaint on its next pass
    pub fn request_redraw(&self) {
        self.lock().redraw = true;
    }

    fn lock(&self) -> MutexGuard<'_, Peripherals> {
        self.peripherals.lock().expect("peripheral state poisoned")
    }

    fn fetch(&mut self) -> u16 {
        let word = self.memory.read_word(self.pc);
        self.pc = self.pc.wrapping_add(2);
        word
    }

    fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    fn push_return_addr(&mut self) {
        self.sp = self.sp.wrapping_sub(2);
        self.memory.write_byte(self.sp, (self.pc >> 8) as u8);
        self.memory.write_byte(self.sp.wrapping_add(1), (self.pc & 0x00ff) as u8);
    }

    fn pop_return_addr(&mut self) -> u16 {
        let addr = self.memory.read_word(self.sp);
        self.sp = self.sp.wrapping_add(2);
        addr
    }

    /// one fetch-decode-execute cycle. `Ok(None)` means keep going.
    pub fn step(&mut self, breakpoints: &[u16]) -> Result<Option<Halt>, VmError> {
        let origin = self.pc;
        let word = self.fetch();
        let ins = decode(word, origin);
        trace!("{}", ins);
        if let Some(halt) = self.execute(&ins)? {
            debug!("halted: {:?}", halt);
            return Ok(Some(halt));
        }
        if breakpoints.contains(&self.pc) {
            debug!("breakpoint at {:#05x}", self.pc);
            return Ok(Some(Halt::Breakpoint { addr: self.pc }));
        }
        Ok(None)
    }

    /// free-run until something stops us
    pub fn run(&mut self, breakpoints: &[u16]) -> Result<Halt, VmError> {
        loop {
            if let Some(halt) = self.step(breakpoints)? {
                return Ok(halt);
            }
        }
    }

    fn execute(&mut self, ins: &Instruction) -> Result<Option<Halt>, VmError> {
        let (x, y) = (ins.x(), ins.y());
        let (n, nn, nnn) = (ins.n(), ins.nn(), ins.nnn());
        match ins.op {
            Opcode::ClearScreen => {
                let mut p = self.lock();
                p.fb.clear();
                p.redraw = true;
            }
            Opcode::Return => self.pc = self.pop_return_addr(),
            Opcode::Jump => {
                // a jump to its own address can never make progress; by
                // this point pc has already moved past the instruction
                if self.halt_on_spin && self.pc == nnn.wrapping_add(2) {
                    self.lock().redraw = true;
                    return Ok(Some(Halt::SelfJump { addr: ins.addr }));
                }
                self.pc = nnn;
            }
            Opcode::Call => {
                self.push_return_addr();
                self.pc = nnn;
            }
            Opcode::SkipEqImm => {
                if self.v[x] == nn {
                    self.skip();
                }
            }
            Opcode::SkipNeImm => {
                if self.v[x] != nn {
                    self.skip();
                }
            }
            Opcode::SkipEqReg => {
                if self.v[x] == self.v[y] {
                    self.skip();
                }
            }
            Opcode::SetImm => self.v[x] = nn,
            Opcode::AddImm => self.v[x] = self.v[x].wrapping_add(nn),
            Opcode::Copy => self.v[x] = self.v[y],
            Opcode::Or => self.v[x] |= self.v[y],
            Opcode::And => self.v[x] &= self.v[y],
            Opcode::Xor => self.v[x] ^= self.v[y],
            Opcode::Add => {
                // flag first, sum second: when x is the flag register
                // the sum wins
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[0xf] = carry as u8;
                self.v[x] = sum;
            }
            Opcode::Sub => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[0xf] = (vx >= vy) as u8;
                self.v[x] = vx.wrapping_sub(vy);
            }
            Opcode::ShiftRight => {
                self.v[0xf] = self.v[x] & 0x01;
                self.v[x] >>= 1;
            }
            Opcode::SubRev => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[0xf] = (vy >= vx) as u8;
                self.v[x] = vy.wrapping_sub(vx);
            }
            Opcode::ShiftLeft => {
                // the flag keeps the raw masked bit, 0x80 or 0, not 0/1
                self.v[0xf] = self.v[x] & 0x80;
                self.v[x] <<= 1;
            }
            Opcode::SkipNeReg => {
                if self.v[x] != self.v[y] {
                    self.skip();
                }
            }
            Opcode::SetIndex => self.i = nnn,
            Opcode::JumpOffset => self.pc = (self.v[0] as u16).wrapping_add(nnn),
            Opcode::Random => self.v[x] = rand::random::<u8>() & nn,
            Opcode::Draw => {
                let rows: Vec<u8> = (0..n as u16)
                    .map(|row| self.memory.read_byte(self.i.wrapping_add(row)))
                    .collect();
                let (vx, vy) = (self.v[x], self.v[y]);
                let collision = {
                    let mut p = self.lock();
                    let collision = p.fb.blit(vx, vy, &rows);
                    p.redraw = true;
                    collision
                };
                if collision {
                    self.v[0xf] = 1;
                }
            }
            // key state is unobservable with line-buffered input
            Opcode::SkipKeyDown => {}
            Opcode::SkipKeyUp => {}
            Opcode::ReadDelay => {
                let delay = self.lock().delay;
                self.v[x] = delay;
            }
            Opcode::WaitKey => self.v[x] = self.input.read_key()?,
            Opcode::SetDelay => self.lock().delay = self.v[x],
            Opcode::SetSound => self.lock().sound = self.v[x],
            Opcode::AddIndex => self.i = self.i.wrapping_add(self.v[x] as u16),
            Opcode::GlyphAddr => {
                self.i = FONT_ADDR + (self.v[x] & 0x0f) as u16 * GLYPH_HEIGHT;
            }
            Opcode::StoreDigits => {
                let value = self.v[x];
                self.memory.write_byte(self.i, value / 100);
                self.memory.write_byte(self.i.wrapping_add(1), value / 10 % 10);
                self.memory.write_byte(self.i.wrapping_add(2), value % 10);
            }
            Opcode::StoreRegs => {
                for r in 0..=x {
                    self.memory.write_byte(self.i.wrapping_add(r as u16), self.v[r]);
                }
            }
            Opcode::LoadRegs => {
                for r in 0..=x {
                    self.v[r] = self.memory.read_byte(self.i.wrapping_add(r as u16));
                }
            }
            Opcode::Invalid => {
                return Err(VmError::InvalidInstruction {
                    addr: ins.addr,
                    word: ins.word,
                })
            }
        }
        Ok(None)
    }
}
