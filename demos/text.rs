use std::error::Error;

use posify_serial::prefs::{FilePreferences, NAMESPACE};
use posify_serial::printer::{PaperStatus, Printer, PrinterModel, Settings};
use posify_serial::transport::{SerialTransport, StdDelay};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let port = std::env::args().nth(1).unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let transport = SerialTransport::open(&port, 9600)?;
    let prefs = FilePreferences::open(std::env::temp_dir(), NAMESPACE)?;

    let mut printer = Printer::new(
        PrinterModel::Ftp628Mcl101,
        port,
        transport,
        prefs,
        StdDelay,
        Settings::default(),
    );
    printer.begin()?;

    if printer.query_paper_status()? == PaperStatus::Absent {
        println!("Out of paper");
        return Ok(());
    }

    printer.set_baud_rate(115200, true)?;
    printer.print_text("The quick brown fox jumps over the lazy dog", true)?;
    printer.feed_lines(4)?;
    Ok(())
}
