#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use posify_serial::command;
use posify_serial::prefs::MemoryPreferences;
use posify_serial::printer::{Printer, PrinterModel, Settings};
use posify_serial::transport::{Delay, Transport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Write(Vec<u8>),
    WaitTx,
    SetBaud(u32),
}

/// Records everything the printer does to it. Writes can be made to fail or
/// come up short by their 1-based attempt number.
#[derive(Default)]
pub struct FakeTransport {
    /// Successful writes, tx waits and rate changes in order
    pub events: Vec<Event>,
    /// Every write attempt, including failed ones
    pub attempts: Vec<Vec<u8>>,
    pub fail_on: Option<usize>,
    pub short_on: Option<usize>,
    pub fail_baud_to: Option<u32>,
    pub replies: VecDeque<u8>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(n: usize) -> Self {
        FakeTransport {
            fail_on: Some(n),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count_attempts(&self, cmd: &[u8]) -> usize {
        self.attempts.iter().filter(|a| a.as_slice() == cmd).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.attempts.clear();
    }
}

impl Transport for FakeTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.attempts.push(buf.to_vec());
        let n = self.attempts.len();
        if self.fail_on == Some(n) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected failure"));
        }
        if self.short_on == Some(n) {
            return Ok(buf.len() / 2);
        }
        self.events.push(Event::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            match self.replies.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn wait_tx_done(&mut self, _timeout: Duration) -> io::Result<()> {
        self.events.push(Event::WaitTx);
        Ok(())
    }

    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()> {
        if self.fail_baud_to == Some(baud) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected baud failure"));
        }
        self.events.push(Event::SetBaud(baud));
        Ok(())
    }
}

/// Returns instantly, keeps a running total of requested milliseconds.
#[derive(Clone, Default)]
pub struct FakeDelay(pub Rc<Cell<u64>>);

impl Delay for FakeDelay {
    fn delay_ms(&mut self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

pub type TestPrinter = Printer<FakeTransport, MemoryPreferences, FakeDelay>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn printer_with(transport: FakeTransport, prefs: MemoryPreferences) -> TestPrinter {
    init_logging();
    Printer::new(
        PrinterModel::Ftp628Mcl101,
        "fake0",
        transport,
        prefs,
        FakeDelay::default(),
        Settings::default(),
    )
}

pub fn printer() -> TestPrinter {
    printer_with(FakeTransport::new(), MemoryPreferences::new())
}

/// Printer initialized at 9600 with the bring-up traffic cleared. Write
/// failures injected into `transport` count from the first write after
/// bring-up.
pub fn ready_printer_with(transport: FakeTransport) -> TestPrinter {
    let fail_on = transport.fail_on;
    let short_on = transport.short_on;
    let mut p = printer_with(
        FakeTransport {
            fail_on: None,
            short_on: None,
            ..transport
        },
        MemoryPreferences::new(),
    );
    p.initialize(9600).unwrap();
    let t = p.transport_mut();
    t.clear();
    t.fail_on = fail_on;
    t.short_on = short_on;
    p
}

pub fn ready_printer() -> TestPrinter {
    ready_printer_with(FakeTransport::new())
}

pub fn open() -> Vec<u8> {
    command::session_open().to_vec()
}

pub fn close() -> Vec<u8> {
    command::session_close().to_vec()
}

pub fn init() -> Vec<u8> {
    command::init().to_vec()
}

/// A session that opened must be closed exactly once, and the close must be
/// the last thing written.
pub fn assert_bracket_balanced(t: &FakeTransport) {
    let opened = t
        .attempts
        .first()
        .map(|first| *first == open() && t.fail_on != Some(1) && t.short_on != Some(1))
        .unwrap_or(false);
    let closes = t.count_attempts(&close());
    if opened {
        assert_eq!(closes, 1, "attempts: {:02x?}", t.attempts);
        assert_eq!(t.attempts.last(), Some(&close()));
    } else {
        assert_eq!(closes, 0, "attempts: {:02x?}", t.attempts);
    }
}
