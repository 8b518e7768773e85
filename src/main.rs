use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use log::{debug, info};

use ocho::display::MonoTermDisplay;
use ocho::frame::Peripherals;
use ocho::input::StdinInput;
use ocho::interpreter::Interpreter;
use ocho::monitor::{self, Monitor};
use ocho::timer::TimerDriver;

/// CHIP-8 virtual machine with a terminal front end
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// ROM image, loaded verbatim at the program address
    rom: PathBuf,

    /// halt when the program counter reaches this hex address (repeatable)
    #[arg(short = 'b', long = "break", value_parser = parse_hex_addr)]
    breakpoints: Vec<u16>,

    /// keep running when a jump targets its own address
    #[arg(long)]
    no_halt_on_loop: bool,

    /// drop into the interactive monitor instead of free-running
    #[arg(long)]
    monitor: bool,
}

fn parse_hex_addr(arg: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(arg.trim_start_matches("0x"), 16)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    // initialise
    let peripherals = Arc::new(Mutex::new(Peripherals::new()));
    let display = MonoTermDisplay::new()?;
    let mut input = StdinInput::new();
    let mut vm = Interpreter::new(&mut input, peripherals.clone());
    vm.set_halt_on_spin(!args.no_halt_on_loop);

    // load a program
    let mut rom = File::open(&args.rom)?;
    vm.load_program(&mut rom)?;
    info!("loaded {}", args.rom.display());

    let mut timer = TimerDriver::spawn(peripherals, Box::new(display));

    let outcome = if args.monitor {
        Monitor::new(&mut vm).run()
    } else {
        vm.run(&args.breakpoints).map(|halt| debug!("{:?}", halt))
    };

    // flush the last frame, then push the shell prompt clear of it
    timer.stop();
    for _ in 0..12 {
        println!();
    }

    if let Err(e) = outcome {
        eprint!("{}", monitor::dump(&vm));
        return Err(e.into());
    }
    Ok(())
}
