//! # posify-serial
//!
//! Driver for serial thermal receipt printers of the FTP-628 family.
//!
//! - **Session handling**: every job is wrapped in the firmware's serial
//!   session bracket, and the bracket is closed again on every error path.
//! - **Baud negotiation**: the printer powers up at 9600 baud; the driver
//!   moves both ends of the link to a faster rate and can remember it.
//! - **Images**: RGB565 bitmaps are scaled to the 384 dot head and sent as
//!   raster or Floyd–Steinberg dithered 24-dot bit images.
//!
//! ```no_run
//! use posify_serial::printer::{Printer, PrinterModel, Settings};
//! use posify_serial::prefs::{FilePreferences, NAMESPACE};
//! use posify_serial::transport::{SerialTransport, StdDelay};
//!
//! let transport = SerialTransport::open("/dev/ttyUSB0", 9600)?;
//! let prefs = FilePreferences::open("/var/lib/printer", NAMESPACE)?;
//! let mut printer = Printer::new(
//!     PrinterModel::Ftp628Mcl101,
//!     "/dev/ttyUSB0",
//!     transport,
//!     prefs,
//!     StdDelay,
//!     Settings::default(),
//! );
//!
//! printer.begin()?;
//! printer.print_text("Hello", true)?;
//! printer.feed_lines(3)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod baud;
pub mod command;
pub mod consts;
pub mod img;
pub mod prefs;
pub mod printer;
pub mod transport;

pub use printer::{Error, Printer};
