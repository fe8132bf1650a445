use std::io;
use std::time::Duration;

use encoding::all::UTF_8;
use encoding::types::{EncoderTrap, EncodingRef};

use crate::baud;
use crate::command::{self, Align};
use crate::consts;
use crate::img::{self, Bitmap, Grayscale};
use crate::prefs::{self, Preferences};
use crate::transport::{Delay, StdDelay, Transport};

/// Timeout for reading a status reply, in milliseconds
pub const TIMEOUT: u64 = 200;
/// Timeout for draining the transmit buffer, in milliseconds
pub const TX_TIMEOUT: u64 = 100;

// Settle times the firmware needs, in milliseconds
const INIT_SETTLE_MS: u64 = 20;
const SESSION_SETTLE_MS: u64 = 5;
const SELFTEST_SETTLE_MS: u64 = 10;
const BAUD_SETTLE_MS: u64 = 50;

/// Printers this driver knows the command set of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrinterModel {
    /// FTP-628MCL101, 50mm paper, 384 dot head
    Ftp628Mcl101,
}

impl PrinterModel {
    /// Dots across the print head
    pub fn width_dots(&self) -> usize {
        match self {
            PrinterModel::Ftp628Mcl101 => img::MAX_WIDTH,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Printer not initialized or busy")]
    InvalidState,

    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Operation timeout")]
    Timeout,

    #[error("Unexpected response: {0:02x?}")]
    InvalidResponse([u8; 3]),
}

impl Error {
    /// True for failed or partial transport writes and reads.
    pub fn is_io_failure(&self) -> bool {
        matches!(self, Error::Io(_) | Error::ShortWrite { .. })
    }
}

/// Device state. Commands are only accepted in `Idle` and `SessionOpen`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Idle,
    SessionOpen,
    /// Bring-up failed or the link lost sync, [`Printer::initialize`] again.
    Failed,
}

/// Where the link rate stands relative to the power-on rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Negotiation {
    AtPowerOnRate,
    Negotiating,
    AtTargetRate,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaperStatus {
    Present,
    Absent,
}

/// Wire format for [`Printer::print_image_with`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageEncoding {
    /// GS v 0, whole image in one command, thresholded
    #[default]
    Raster,
    /// ESC * in 24-dot passes, dithered
    Vertical,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageOptions {
    pub encoding: ImageEncoding,
    /// Center the image on the paper, alignment goes back to left afterwards
    pub center: bool,
}

/// Printer configuration. A persisted baud rate takes precedence over
/// `baud_rate` when the printer is created.
#[derive(Clone, Copy)]
pub struct Settings {
    /// Link rate to negotiate at start-up
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub tx_timeout: Duration,
    /// Text encoding for [`Printer::print_text`]
    pub codec: EncodingRef,
    pub trap: EncoderTrap,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            baud_rate: baud::POWER_ON_BAUD,
            read_timeout: Duration::from_millis(TIMEOUT),
            tx_timeout: Duration::from_millis(TX_TIMEOUT),
            codec: UTF_8 as EncodingRef,
            trap: EncoderTrap::Replace,
        }
    }
}

/// Allows for printing over a [`Transport`]
///
/// Not reentrant: every method takes `&mut self`, share it behind a `Mutex`
/// if more than one thread needs to print.
pub struct Printer<T, P, D = StdDelay> {
    pub model: PrinterModel,
    /// Port name, only used in log output
    port: String,
    transport: T,
    prefs: P,
    delay: D,
    settings: Settings,
    state: State,
    negotiation: Negotiation,
    /// Current link rate once initialized, the pending target before that
    baud_rate: u32,
}

impl<T: Transport, P: Preferences, D: Delay> Printer<T, P, D> {
    pub fn new(
        model: PrinterModel,
        port: impl Into<String>,
        transport: T,
        prefs: P,
        delay: D,
        settings: Settings,
    ) -> Self {
        let baud_rate = match prefs.get_int(prefs::KEY_BAUD_RATE) {
            Some(saved) => match u32::try_from(saved) {
                Ok(rate) if baud::is_supported(rate) => {
                    log::debug!("Restoring saved baud rate {}", rate);
                    rate
                }
                _ => {
                    log::warn!("Ignoring unsupported saved baud rate {}", saved);
                    settings.baud_rate
                }
            },
            None => settings.baud_rate,
        };

        Printer {
            model,
            port: port.into(),
            transport,
            prefs,
            delay,
            settings,
            state: State::Uninitialized,
            negotiation: Negotiation::AtPowerOnRate,
            baud_rate,
        }
    }

    /// Hand the transport back, the printer is unusable afterwards.
    pub fn release(self) -> T {
        log::debug!("Releasing printer on {}", self.port);
        self.transport
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn negotiation(&self) -> Negotiation {
        self.negotiation
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Idle | State::SessionOpen)
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn preferences(&self) -> &P {
        &self.prefs
    }

    // --------------------------------------------------

    fn ensure_ready(&self) -> Result<(), Error> {
        match self.state {
            State::Idle => Ok(()),
            _ => Err(Error::InvalidState),
        }
    }

    fn encode(&self, content: &str) -> Result<Vec<u8>, Error> {
        self.settings
            .codec
            .encode(content, self.settings.trap)
            .map_err(|err| {
                log::error!("Cannot encode text for the printer: {}", err);
                Error::InvalidArgument("text cannot be encoded")
            })
    }

    /// Write `buf` as-is. Works with or without an open session.
    pub fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        if !self.is_initialized() {
            return Err(Error::InvalidState);
        }
        log::trace!("write {} byte(s): {:02x?}", buf.len(), &buf[..buf.len().min(8)]);
        let written = self.transport.write(buf).map_err(|e| {
            log::error!("Write to {} failed: {}", self.port, e);
            Error::Io(e)
        })?;
        if written != buf.len() {
            log::error!("Short write to {}, written={}", self.port, written);
            return Err(Error::ShortWrite {
                written,
                expected: buf.len(),
            });
        }
        Ok(())
    }

    /// Run `body` inside a serial session.
    ///
    /// Session close is always attempted once the open went through. A close
    /// failure is only logged, `body`'s result is what gets returned.
    pub fn with_session<R, F>(&mut self, body: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Self) -> Result<R, Error>,
    {
        self.ensure_ready()?;
        self.write(command::session_open())?;
        self.state = State::SessionOpen;
        log::debug!("Session opened");
        self.delay.delay_ms(SESSION_SETTLE_MS);

        let result = body(self);

        if let Err(e) = self.write(command::session_close()) {
            log::warn!("Failed to close printer session: {}", e);
        }
        if self.state == State::SessionOpen {
            self.state = State::Idle;
        }
        log::debug!("Session closed");
        result
    }

    /// Bring the printer up at `target_baud`.
    ///
    /// The printer always starts at [`baud::POWER_ON_BAUD`], so the host
    /// starts there too and negotiates up if needed. A failed bring-up leaves
    /// the printer in [`State::Failed`], from where it may be retried.
    pub fn initialize(&mut self, target_baud: u32) -> Result<(), Error> {
        match self.state {
            State::Uninitialized | State::Failed => {}
            _ => return Err(Error::InvalidState),
        }
        if !baud::is_supported(target_baud) {
            return Err(Error::InvalidArgument("unsupported baud rate"));
        }

        log::debug!("Initializing {:?} on {}", self.model, self.port);
        if let Err(e) = self.transport.set_baud_rate(baud::POWER_ON_BAUD) {
            self.state = State::Failed;
            return Err(e.into());
        }
        self.baud_rate = baud::POWER_ON_BAUD;
        self.negotiation = Negotiation::AtPowerOnRate;
        self.state = State::Idle;

        let result = self.bring_up(target_baud);
        match result {
            Ok(()) => log::info!("Printer on {} ready at {} baud", self.port, self.baud_rate),
            Err(ref e) => {
                log::error!("Printer on {} failed to initialize: {}", self.port, e);
                self.state = State::Failed;
            }
        }
        result
    }

    /// [`initialize`](Self::initialize) at the saved or configured rate.
    pub fn begin(&mut self) -> Result<(), Error> {
        self.initialize(self.baud_rate)
    }

    fn bring_up(&mut self, target_baud: u32) -> Result<(), Error> {
        if target_baud != self.baud_rate {
            self.negotiate(target_baud)?;
        }
        self.write(command::init())?;
        self.delay.delay_ms(INIT_SETTLE_MS);
        Ok(())
    }

    /// Move both ends of the link to `new_baud`.
    ///
    /// The request goes out at the old rate inside a session; the host only
    /// switches after the session is closed and the printer had time to
    /// apply it.
    fn negotiate(&mut self, new_baud: u32) -> Result<(), Error> {
        let index = baud::index_for(new_baud).ok_or(Error::InvalidArgument("unsupported baud rate"))?;
        let old_baud = self.baud_rate;
        let tx_timeout = self.settings.tx_timeout;
        self.negotiation = Negotiation::Negotiating;
        log::debug!("Negotiating {} -> {} baud (index {})", old_baud, new_baud, index);

        let sent = self.with_session(|p| {
            p.write(&command::set_baud(index))?;
            p.transport.wait_tx_done(tx_timeout)?;
            p.delay.delay_ms(BAUD_SETTLE_MS);
            Ok(())
        });
        if let Err(e) = sent {
            self.negotiation = Negotiation::Failed;
            return Err(e);
        }

        if let Err(e) = self.transport.set_baud_rate(new_baud) {
            log::error!(
                "Printer was told to use {} baud but the host is stuck at {}: {}",
                new_baud,
                old_baud,
                e
            );
            self.negotiation = Negotiation::Failed;
            self.state = State::Failed;
            return Err(e.into());
        }

        self.baud_rate = new_baud;
        self.negotiation = Negotiation::AtTargetRate;
        log::info!("Link switched from {} to {} baud", old_baud, new_baud);
        Ok(())
    }

    fn persist_baud(&mut self, rate: u32) {
        if let Err(e) = self.prefs.set_int(prefs::KEY_BAUD_RATE, rate as i64) {
            log::warn!("Failed to save baud rate {}: {}", rate, e);
        }
    }

    /// Change the link rate, optionally remembering it for the next start.
    ///
    /// Before [`initialize`](Self::initialize) this only records the target.
    /// Once the rate is switched the printer is initialized again at the new
    /// rate; if that fails the switch still stands.
    pub fn set_baud_rate(&mut self, new_baud: u32, persist: bool) -> Result<(), Error> {
        if !baud::is_supported(new_baud) {
            return Err(Error::InvalidArgument("unsupported baud rate"));
        }

        match self.state {
            State::Uninitialized | State::Failed => {
                log::debug!("Baud rate {} will be used at initialization", new_baud);
                self.baud_rate = new_baud;
                if persist {
                    self.persist_baud(new_baud);
                }
                return Ok(());
            }
            State::Idle => {}
            State::SessionOpen => return Err(Error::InvalidState),
        }

        if new_baud == self.baud_rate {
            if persist {
                self.persist_baud(new_baud);
            }
            return Ok(());
        }

        self.negotiate(new_baud)?;
        if persist {
            self.persist_baud(new_baud);
        }

        self.delay.delay_ms(INIT_SETTLE_MS);
        if let Err(e) = self.write(command::init()) {
            log::warn!("Re-init at {} baud failed, keeping the new rate: {}", new_baud, e);
        }
        Ok(())
    }

    /// Send the baud change command with a raw printer index. The host rate
    /// is left alone.
    pub fn set_baud_rate_index(&mut self, index: u8) -> Result<(), Error> {
        self.ensure_ready()?;
        self.write(&command::set_baud(index))
    }

    /// DC2 T - Print the self-test page
    ///
    /// ASCII    DC2   T
    /// Hex      12   54
    /// Decimal  18   84
    pub fn self_test(&mut self) -> Result<(), Error> {
        self.with_session(|p| {
            p.delay.delay_ms(SELFTEST_SETTLE_MS);
            p.write(command::init())?;
            p.delay.delay_ms(INIT_SETTLE_MS);
            p.write(command::self_test())
        })
    }

    /// Print `content` in the configured encoding, followed by CR LF when
    /// `append_newline` is set.
    pub fn print_text(&mut self, content: &str, append_newline: bool) -> Result<(), Error> {
        self.ensure_ready()?;
        let mut payload = self.encode(content)?;
        if append_newline {
            payload.extend_from_slice(consts::CTL_CRLF);
        }
        let tx_timeout = self.settings.tx_timeout;

        self.with_session(|p| {
            p.write(command::init())?;
            p.delay.delay_ms(SESSION_SETTLE_MS);
            p.write(&payload)?;
            if let Err(e) = p.transport.wait_tx_done(tx_timeout) {
                log::warn!("Text may not have been fully sent: {}", e);
            }
            Ok(())
        })
    }

    /// Write bytes straight to the printer, outside of any session.
    pub fn send_raw(&mut self, data: &[u8]) -> Result<(), Error> {
        self.ensure_ready()?;
        if data.is_empty() {
            return Err(Error::InvalidArgument("no data"));
        }
        self.write(data)
    }

    /// Feed `lines` blank lines.
    ///
    /// ASCII    US   -   5    EOT  NUL  n  È    NUL
    /// Hex      1f   2d  35   04   00   n  c8   00
    pub fn feed_lines(&mut self, lines: u8) -> Result<(), Error> {
        self.ensure_ready()?;
        self.write(&command::feed_lines(lines))
    }

    /// DLE EOT 1 - Ask whether paper is loaded
    ///
    /// | Reply      | Meaning       |
    /// |------------|---------------|
    /// | `FE 23 12` | Paper present |
    /// | `EF 23 1A` | Paper out     |
    ///
    /// Fewer than 3 bytes within the read timeout is a [`Error::Timeout`],
    /// any other 3 bytes an [`Error::InvalidResponse`].
    pub fn query_paper_status(&mut self) -> Result<PaperStatus, Error> {
        self.ensure_ready()?;
        self.write(command::check_paper())?;

        let mut resp = [0_u8; 3];
        let len = self.transport.read(&mut resp, self.settings.read_timeout)?;
        if len != resp.len() {
            log::warn!("Paper status read timeout/short read, len={}", len);
            return Err(Error::Timeout);
        }

        match resp {
            consts::PAPER_PRESENT => Ok(PaperStatus::Present),
            consts::PAPER_ABSENT => Ok(PaperStatus::Absent),
            other => {
                log::warn!("Unexpected paper status response: {:02x?}", other);
                Err(Error::InvalidResponse(other))
            }
        }
    }

    /// Print `bitmap` as a raster bit image, left aligned.
    pub fn print_image(&mut self, bitmap: &Bitmap) -> Result<(), Error> {
        self.print_image_with(bitmap, ImageOptions::default())
    }

    /// Print `bitmap` scaled down to the head width if it's wider.
    ///
    /// The image is followed by [`img::FEED_AFTER_IMAGE`] blank lines so it
    /// can be torn off.
    pub fn print_image_with(&mut self, bitmap: &Bitmap, options: ImageOptions) -> Result<(), Error> {
        self.ensure_ready()?;
        let gray = Grayscale::from_bitmap(bitmap, self.model.width_dots())?;
        let width = u16::try_from(gray.width()).map_err(|_| Error::InvalidArgument("image too wide"))?;
        let height = u16::try_from(gray.height()).map_err(|_| Error::InvalidArgument("image too tall"))?;
        log::debug!(
            "Printing {}x{} image as {}x{} ({:?})",
            bitmap.width(),
            bitmap.height(),
            width,
            height,
            options.encoding
        );

        self.with_session(|p| {
            if options.center {
                p.write(command::align(Align::Center))?;
            }
            match options.encoding {
                ImageEncoding::Raster => p.raster(&gray, height)?,
                ImageEncoding::Vertical => p.bit_image(&gray.dither(), width)?,
            }
            p.write(&command::feed_lines(img::FEED_AFTER_IMAGE))?;
            if options.center {
                p.write(command::align(Align::Left))?;
            }
            Ok(())
        })
    }

    /// GS v 0 m xL xH yL yH d1...dk
    ///
    /// One header for the whole image, then every row packed 8 dots a byte.
    fn raster(&mut self, gray: &Grayscale, height: u16) -> Result<(), Error> {
        // width is at most the head width, 48 bytes
        let bytes_per_row = gray.bytes_per_row() as u16;
        self.write(&command::raster_header(bytes_per_row, height))?;
        for row in gray.raster_rows() {
            self.write(&row)?;
        }
        Ok(())
    }

    /// ESC * m nL nH d1...dk
    ///
    /// 24 rows per pass. Line spacing is set to the pass height so passes
    /// butt up against each other, and restored at the end.
    fn bit_image(&mut self, mono: &Grayscale, width: u16) -> Result<(), Error> {
        self.write(&command::line_spacing(img::PASS_HEIGHT as u8))?;
        for pass in mono.vertical_passes() {
            self.write(&command::vertical_header(consts::BITMAP_D24, width))?;
            self.write(&pass)?;
            self.write(consts::CTL_LF)?;
        }
        self.write(command::default_line_spacing())
    }
}
