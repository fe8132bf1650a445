use posify_serial::transport::SerialTransport;

/// Prints the serial ports on this machine, with USB ids where there are
/// any, to help find the one the printer is on.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    for port in SerialTransport::list_ports()? {
        match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => println!(
                "{} ID {:04x}:{:04x} - {} {}",
                port.port_name,
                usb.vid,
                usb.pid,
                usb.manufacturer.unwrap_or_default(),
                usb.product.unwrap_or_default(),
            ),
            serialport::SerialPortType::PciPort => println!("{} (PCI)", port.port_name),
            serialport::SerialPortType::BluetoothPort => println!("{} (Bluetooth)", port.port_name),
            serialport::SerialPortType::Unknown => println!("{}", port.port_name),
        }
    }
    Ok(())
}
