use crate::interpreter::{Interpreter, VmError};
use std::io;
use std::io::{BufRead, Write};

/// bytes of memory shown around a dump cursor
const DUMP_WINDOW: usize = 32;
const BYTES_PER_LINE: usize = 16;

/// format the register file, one register per line, flag pairs aligned
pub fn dump_registers(vm: &Interpreter) -> String {
    let mut out = String::from("   === registers ===\n");
    out += &format!("pc = {:#05x}\n", vm.pc());
    out += &format!("i  = {:#05x}\n", vm.index());
    let (delay, sound) = vm.timers();
    out += &format!("dt = {:#04x}\n", delay);
    out += &format!("st = {:#04x}\n", sound);
    out += &format!("sp = {:#05x}\n", vm.sp());
    let v = vm.registers();
    for r in 0..8 {
        out += &format!("v{:x} = {:#04x}\tv{:x} = {:#04x}\n", r, v[r], r + 8, v[r + 8]);
    }
    out
}

/// format a hex window of memory starting at base
pub fn dump_memory(vm: &Interpreter, base: u16) -> String {
    let mut out = String::new();
    for (i, line) in vm.ram(base, DUMP_WINDOW).chunks(BYTES_PER_LINE).enumerate() {
        out += &format!("{:#05x} |", base as usize + i * BYTES_PER_LINE);
        for byte in line {
            out += &format!(" {:02x}", byte);
        }
        out.push('\n');
    }
    out
}

/// the full picture: registers plus memory around pc and sp
pub fn dump(vm: &Interpreter) -> String {
    let mut out = dump_registers(vm);
    out.push_str("=== memory (code) ===\n");
    out += &dump_memory(vm, vm.pc());
    out.push_str("=== memory (stack) ===\n");
    out += &dump_memory(vm, vm.sp());
    out
}

/// Interactive stepping loop over the engine's debug surface. Anything
/// that isn't a known command single-steps and dumps.
pub struct Monitor<'a, 'b> {
    vm: &'a mut Interpreter<'b>,
    breakpoints: Vec<u16>,
}

impl<'a, 'b> Monitor<'a, 'b> {
    pub fn new(vm: &'a mut Interpreter<'b>) -> Monitor<'a, 'b> {
        Monitor {
            vm,
            breakpoints: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<(), VmError> {
        loop {
            print!("(s)tep, (c)ontinue, (d)ump, dra(w), (b)reak addr, (q)uit > ");
            io::stdout().flush().ok();
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).unwrap_or(0) == 0 {
                return Ok(()); // out of input
            }
            let cmd: Vec<&str> = line.split_whitespace().collect();
            match cmd.first().copied() {
                Some("q") => return Ok(()),
                Some("c") => {
                    let halt = self.vm.run(&self.breakpoints)?;
                    println!("{:?}", halt);
                }
                Some("d") => print!("{}", dump(self.vm)),
                Some("w") => self.vm.request_redraw(),
                Some("b") => match cmd.get(1).map(|a| parse_addr(a)) {
                    Some(Some(addr)) => self.breakpoints.push(addr),
                    _ => println!("specify a hex address"),
                },
                _ => {
                    if let Some(halt) = self.vm.step(&self.breakpoints)? {
                        println!("{:?}", halt);
                    }
                    print!("{}", dump(self.vm));
                }
            }
        }
    }
}

fn parse_addr(arg: &str) -> Option<u16> {
    u16::from_str_radix(arg.trim_start_matches("0x"), 16).ok()
}
