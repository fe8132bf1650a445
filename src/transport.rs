//! Byte channel and timing capabilities the driver runs on.
//!
//! The [`Printer`](crate::printer::Printer) never opens ports or sleeps on its
//! own. It is handed a [`Transport`] that is already wired to the printer and
//! a [`Delay`] for the settle times the firmware needs between commands.

use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

/// Duplex byte channel to the printer.
pub trait Transport {
    /// Queue `buf` for transmission, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Read up to `buf.len()` bytes, giving up once `timeout` has elapsed.
    ///
    /// Running out of time is not an error: the count of bytes received so
    /// far is returned, possibly 0.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Block until everything written so far has left the wire, for at most
    /// `timeout` where the underlying port can bound the wait.
    fn wait_tx_done(&mut self, timeout: Duration) -> io::Result<()>;

    /// Change the host side bit rate.
    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()>;
}

/// Blocking millisecond delay.
pub trait Delay {
    fn delay_ms(&mut self, ms: u64);
}

/// [`Delay`] backed by [`std::thread::sleep`]
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

/// A printer on a serial port (RS-232, TTL UART adapter or USB CDC).
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open `path` at `baud` 8N1 and raise DTR, which the printer reads as
    /// "host ready".
    pub fn open(path: &str, baud: u32) -> io::Result<Self> {
        let mut port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()?;
        port.write_data_terminal_ready(true)?;
        log::debug!("Opened {} at {} baud", path, baud);
        Ok(SerialTransport { port })
    }

    /// Serial ports present on this system.
    pub fn list_ports() -> io::Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            match self.port.write(&buf[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        read_within(&mut self.port, buf, timeout)
    }

    /// Waits for `tcdrain` (or its platform equivalent), which takes no
    /// timeout: `_timeout` is not enforced here.
    fn wait_tx_done(&mut self, _timeout: Duration) -> io::Result<()> {
        self.port.flush()
    }

    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()> {
        self.port.set_baud_rate(baud)?;
        Ok(())
    }
}

/// Port whose single timeout governs both reads and writes.
trait TimedPort: Read {
    fn timeout(&self) -> Duration;
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl TimedPort for Box<dyn serialport::SerialPort> {
    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        Ok((**self).set_timeout(timeout)?)
    }
}

/// Bounded read that puts the port's own timeout back afterwards, so writes
/// keep the timeout they were opened with.
fn read_within<P: TimedPort>(port: &mut P, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
    let configured = port.timeout();
    let deadline = Instant::now() + timeout;
    let mut received = 0;
    let mut result = Ok(());
    while received < buf.len() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        if let Err(e) = port.set_timeout(remaining) {
            result = Err(e);
            break;
        }
        match port.read(&mut buf[received..]) {
            Ok(0) => break,
            Ok(n) => received += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }
    let restored = port.set_timeout(configured);
    result?;
    restored?;
    Ok(received)
}
