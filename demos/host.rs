use std::cell::Cell;

use log::LevelFilter;
use simple_logger::SimpleLogger;

use coop_sched::{
    platform::StdClock,
    DefaultScheduler,
    Scheduler,
};

fn main() {
    SimpleLogger::new().with_level(LevelFilter::Debug).init().unwrap();
    log::info!("Init");

    let blinks = Cell::new(0u32);
    let led = Cell::new(false);

    let scheduler: DefaultScheduler<'_, StdClock> = Scheduler::new(StdClock::new());

    let blink = || {
        led.set(!led.get());
        blinks.set(blinks.get() + 1);
        log::info!("led {}", if led.get() { "on" } else { "off" });
    };
    let blink_init = || log::info!("configuring led pin");

    let report = || {
        log::info!("blinked {} times", blinks.get());
        if blinks.get() >= 10 {
            log::info!("enough blinking");
            if let Some(task) = scheduler.find_by_name("blink") {
                if let Err(e) = scheduler.delete(task) {
                    log::warn!("could not stop blink: {}", e);
                }
            }
        }
    };

    scheduler.create("blink", &blink, Some(&blink_init), 100).unwrap();
    scheduler.create("report", &report, None, 250).unwrap();
    scheduler.show();

    while scheduler.find_by_name("blink").is_some() {
        scheduler.schedule();
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    scheduler.execute_by_name("report").unwrap();
    scheduler.schedule();
    scheduler.show();
}
