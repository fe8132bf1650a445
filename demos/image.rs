use posify_serial::img::Rgb565Buffer;
use posify_serial::prefs::MemoryPreferences;
use posify_serial::printer::{ImageEncoding, ImageOptions, Printer, PrinterModel, Settings};
use posify_serial::transport::{SerialTransport, StdDelay};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let path = args.next().unwrap_or_else(|| "rust.png".to_string());

    let logo = Rgb565Buffer::from(image::open(path)?);

    let transport = SerialTransport::open(&port, 9600)?;
    let mut printer = Printer::new(
        PrinterModel::Ftp628Mcl101,
        port,
        transport,
        MemoryPreferences::new(),
        StdDelay,
        Settings::default(),
    );
    printer.initialize(115200)?;

    let options = ImageOptions {
        encoding: ImageEncoding::Vertical,
        center: true,
    };
    printer.print_image_with(&logo.as_bitmap()?, options)?;
    Ok(())
}
