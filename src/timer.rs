use crate::display::Display;
use crate::frame::Peripherals;
use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// sixty ticks per real-time second
const TICK: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Steps the countdown timers and repaints the display at a fixed rate,
/// independent of how fast the engine gets through instructions.
///
/// The driver runs on its own thread for the lifetime of the machine;
/// `stop` (or dropping the driver) signals it, waits for a last pending
/// frame to flush, and joins the thread.
pub struct TimerDriver {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TimerDriver {
    pub fn spawn(
        peripherals: Arc<Mutex<Peripherals>>,
        mut display: Box<dyn Display + Send>,
    ) -> TimerDriver {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::spawn(move || loop {
            let stopping = stop_flag.load(Ordering::Relaxed);
            // tick and snapshot under the lock, render outside it
            let snapshot = {
                let mut p = peripherals.lock().expect("peripheral state poisoned");
                if !stopping {
                    p.tick();
                }
                p.take_snapshot()
            };
            if let Some(frame) = snapshot {
                if let Err(e) = display.draw(&frame) {
                    warn!("display refresh failed: {}", e);
                }
            }
            if stopping {
                break;
            }
            spin_sleep::sleep(TICK);
        });
        TimerDriver {
            stop,
            handle: Some(handle),
        }
    }

    /// signal the driver, let it flush any pending frame, wait for it
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameSnapshot;
    use std::io;
    use std::sync::atomic::AtomicUsize;

    /// counts frames so the tests can watch the driver work
    struct CountingDisplay {
        frames: Arc<AtomicUsize>,
    }

    impl Display for CountingDisplay {
        fn draw(&mut self, _frame: &FrameSnapshot) -> Result<(), io::Error> {
            self.frames.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_driver_ticks_timers_down() {
        let shared = Arc::new(Mutex::new(Peripherals::new()));
        shared.lock().unwrap().delay = 255;
        shared.lock().unwrap().sound = 255;
        let frames = Arc::new(AtomicUsize::new(0));
        let display = CountingDisplay { frames: frames.clone() };

        let mut driver = TimerDriver::spawn(shared.clone(), Box::new(display));
        thread::sleep(Duration::from_millis(100));
        driver.stop();

        let p = shared.lock().unwrap();
        assert!(p.delay < 255);
        assert_eq!(p.delay, p.sound);
        assert!(frames.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_stop_flushes_pending_frame_and_joins() {
        let shared = Arc::new(Mutex::new(Peripherals::new()));
        let frames = Arc::new(AtomicUsize::new(0));
        let display = CountingDisplay { frames: frames.clone() };

        let mut driver = TimerDriver::spawn(shared.clone(), Box::new(display));
        shared.lock().unwrap().redraw = true;
        driver.stop();

        // the pending frame went out before the thread exited
        assert!(frames.load(Ordering::SeqCst) > 0);
        assert!(!shared.lock().unwrap().redraw);
    }

    #[test]
    fn test_drop_stops_the_driver() {
        let shared = Arc::new(Mutex::new(Peripherals::new()));
        let frames = Arc::new(AtomicUsize::new(0));
        let display = CountingDisplay { frames: frames.clone() };
        {
            let _driver = TimerDriver::spawn(shared.clone(), Box::new(display));
        }
        // dropped driver no longer ticks
        let before = shared.lock().unwrap().redraw;
        thread::sleep(Duration::from_millis(40));
        assert_eq!(shared.lock().unwrap().redraw, before);
    }
}
