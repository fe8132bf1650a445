mod common;

use posify_serial::command;
use posify_serial::img::Bitmap;
use posify_serial::printer::{Error, ImageEncoding, ImageOptions, State};

use common::{
    assert_bracket_balanced, close, init, open, printer, ready_printer, ready_printer_with,
    Event, FakeTransport,
};

#[test]
fn initialize_at_power_on_rate() {
    let mut p = printer();
    assert_eq!(p.state(), State::Uninitialized);

    p.initialize(9600).unwrap();

    assert_eq!(p.state(), State::Idle);
    assert_eq!(p.baud_rate(), 9600);
    assert_eq!(
        p.transport().events,
        vec![Event::SetBaud(9600), Event::Write(init())]
    );
}

#[test]
fn initialize_twice_is_rejected() {
    let mut p = ready_printer();
    assert!(matches!(p.initialize(9600), Err(Error::InvalidState)));
    assert!(p.transport().events.is_empty());
}

#[test]
fn initialize_rejects_unknown_rate() {
    let mut p = printer();
    assert!(matches!(p.initialize(14400), Err(Error::InvalidArgument(_))));
    assert_eq!(p.state(), State::Uninitialized);
    assert!(p.transport().events.is_empty());
}

#[test]
fn failed_bring_up_can_be_retried() {
    let mut p = common::printer_with(
        FakeTransport::failing_on(1),
        posify_serial::prefs::MemoryPreferences::new(),
    );
    assert!(p.initialize(9600).is_err());
    assert_eq!(p.state(), State::Failed);
    assert!(matches!(p.print_text("x", false), Err(Error::InvalidState)));

    p.initialize(9600).unwrap();
    assert_eq!(p.state(), State::Idle);
}

#[test]
fn everything_needs_initialization() {
    let mut p = printer();
    let pixels = [0xffff_u16; 4];
    let bitmap = Bitmap::new(&pixels, 2, 2, 2).unwrap();

    assert!(matches!(p.print_text("x", true), Err(Error::InvalidState)));
    assert!(matches!(p.print_image(&bitmap), Err(Error::InvalidState)));
    assert!(matches!(p.self_test(), Err(Error::InvalidState)));
    assert!(matches!(p.send_raw(&[0x0a]), Err(Error::InvalidState)));
    assert!(matches!(p.feed_lines(1), Err(Error::InvalidState)));
    assert!(matches!(p.query_paper_status(), Err(Error::InvalidState)));
    assert!(matches!(p.set_baud_rate_index(3), Err(Error::InvalidState)));
    assert!(matches!(p.write(&[0x0a]), Err(Error::InvalidState)));
    assert!(matches!(p.with_session(|_| Ok(())), Err(Error::InvalidState)));
    assert!(p.transport().attempts.is_empty());
}

#[test]
fn print_text_without_newline() {
    let mut p = ready_printer();
    p.print_text("abc", false).unwrap();
    assert_eq!(
        p.transport().events,
        vec![
            Event::Write(open()),
            Event::Write(init()),
            Event::Write(b"abc".to_vec()),
            Event::WaitTx,
            Event::Write(close()),
        ]
    );
}

#[test]
fn self_test_sequence() {
    let mut p = ready_printer();
    p.self_test().unwrap();
    assert_eq!(
        p.transport().writes(),
        vec![open(), init(), command::self_test().to_vec(), close()]
    );
}

#[test]
fn unbracketed_operations() {
    let mut p = ready_printer();
    p.send_raw(&[0x1b, 0x21, 0x08]).unwrap();
    p.feed_lines(3).unwrap();
    assert_eq!(
        p.transport().writes(),
        vec![vec![0x1b, 0x21, 0x08], command::feed_lines(3).to_vec()]
    );
}

#[test]
fn send_raw_rejects_empty_payload() {
    let mut p = ready_printer();
    assert!(matches!(p.send_raw(&[]), Err(Error::InvalidArgument(_))));
    assert!(p.transport().attempts.is_empty());
}

#[test]
fn close_failure_does_not_mask_success() {
    // open, init, text, close
    let mut p = ready_printer_with(FakeTransport::failing_on(4));
    p.print_text("hi", false).unwrap();
    assert_eq!(p.state(), State::Idle);
    assert_bracket_balanced(p.transport());
}

#[test]
fn body_error_wins_over_close_error() {
    let mut p = ready_printer_with(FakeTransport::failing_on(4));
    let result: Result<(), Error> = p.with_session(|p| {
        p.write(&[0x0a])?;
        p.write(&[0x0a])?;
        Err(Error::Timeout)
    });
    assert!(matches!(result, Err(Error::Timeout)));
    assert_bracket_balanced(p.transport());
}

#[test]
fn session_is_not_reentrant() {
    let mut p = ready_printer();
    let inner = p.with_session(|p| Ok(p.with_session(|_| Ok(()))));
    assert!(matches!(inner, Ok(Err(Error::InvalidState))));
    assert_eq!(p.transport().writes(), vec![open(), close()]);
    assert_eq!(p.state(), State::Idle);
}

#[test]
fn short_write_is_an_io_failure() {
    let mut p = ready_printer_with(FakeTransport {
        short_on: Some(3),
        ..FakeTransport::default()
    });
    let err = p.print_text("hello", true).unwrap_err();
    assert!(matches!(err, Error::ShortWrite { written: 3, expected: 7 }));
    assert!(err.is_io_failure());
    assert_bracket_balanced(p.transport());
    assert_eq!(p.state(), State::Idle);
}

fn check_every_failure_point<F>(total_writes: usize, op: F)
where
    F: Fn(&mut common::TestPrinter) -> Result<(), Error>,
{
    // sanity check of the write count
    let mut p = ready_printer();
    op(&mut p).unwrap();
    assert_eq!(p.transport().attempts.len(), total_writes);

    for n in 1..=total_writes {
        let mut p = ready_printer_with(FakeTransport::failing_on(n));
        let result = op(&mut p);
        if n == total_writes {
            // only the close failed
            assert!(result.is_ok(), "n={}", n);
        } else {
            assert!(result.unwrap_err().is_io_failure(), "n={}", n);
        }
        assert_bracket_balanced(p.transport());
        assert_eq!(p.state(), State::Idle, "n={}", n);
    }
}

#[test]
fn text_closes_session_on_every_failure() {
    check_every_failure_point(4, |p| p.print_text("hello", true));
}

#[test]
fn self_test_closes_session_on_every_failure() {
    check_every_failure_point(4, |p| p.self_test());
}

#[test]
fn raster_image_closes_session_on_every_failure() {
    let pixels = vec![0x0000_u16; 16 * 5];
    // open, header, 5 rows, feed, close
    check_every_failure_point(9, |p| {
        let bitmap = Bitmap::new(&pixels, 16, 5, 16)?;
        p.print_image(&bitmap)
    });
}

#[test]
fn vertical_image_closes_session_on_every_failure() {
    let pixels = vec![0x0000_u16; 8 * 30];
    let options = ImageOptions {
        encoding: ImageEncoding::Vertical,
        center: true,
    };
    // open, center, spacing, 2 x (header, pass, LF), default spacing, feed,
    // left, close
    check_every_failure_point(13, |p| {
        let bitmap = Bitmap::new(&pixels, 8, 30, 8)?;
        p.print_image_with(&bitmap, options)
    });
}
