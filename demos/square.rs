use ardumouse::MouseController;
use std::thread::sleep;
use std::time::Duration;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        eprintln!("Check that the sketch is flashed and the RawHID interface is visible.");
        std::process::exit(1);
    }
}

fn run() -> ardumouse::Result<()> {
    let mouse = MouseController::open()?;

    for (dx, dy) in [(10, 0), (0, 10), (-10, 0), (0, -10)] {
        mouse.move_by(dx, dy)?;
        sleep(Duration::from_millis(500));
    }

    for _ in 0..100 {
        mouse.click();
        sleep(Duration::from_millis(1));
    }

    mouse.wheel(3);
    sleep(Duration::from_millis(500));
    mouse.wheel(-3);

    mouse.close();
    Ok(())
}
