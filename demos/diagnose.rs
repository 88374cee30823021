use ardumouse::backends::hid::HidApiBackend;
use ardumouse::{DeviceIdentity, HidBackend};

fn main() {
    let mut backend = HidApiBackend::new().expect("init hidapi");
    let identity = DeviceIdentity::default();
    let devices = backend.enumerate().expect("enumerate HID devices");
    for (i, info) in devices.iter().enumerate() {
        let mark = if identity.matches(info) { "  <- RawHID" } else { "" };
        println!("{i}: {info} path={}{mark}", info.path.as_deref().unwrap_or("?"));
    }
}
