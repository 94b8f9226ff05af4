use log::{debug, info};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};
use std::{
    fmt,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use crate::{command::CommandStream, error::Error};

/// Default character device of a USB printer class driver on Linux.
pub const DEFAULT_DEVICE: &str = "/dev/usb/lp0";

/// USB interface class of printers.
const PRINTER_CLASS: u8 = 0x07;

/// Where jobs go on a USB device: the bulk OUT endpoint and the
/// configuration, interface and alternate setting that expose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BulkOut {
    config: u8,
    interface: u8,
    alt_setting: u8,
    address: u8,
}

/// First printer-class candidate, otherwise the first one at all.
fn pick_bulk_out(candidates: impl IntoIterator<Item = (u8, BulkOut)>) -> Option<BulkOut> {
    let mut fallback = None;
    for (class, out) in candidates {
        if class == PRINTER_CLASS {
            return Some(out);
        }
        fallback = fallback.or(Some(out));
    }
    fallback
}

enum Link {
    /// A device node, opened for every job.
    Device(PathBuf),
    /// A claimed bulk OUT endpoint.
    Usb {
        handle: Box<DeviceHandle<Context>>,
        endpoint: BulkOut,
    },
    /// Any other byte sink.
    Writer(Box<dyn Write + Send>),
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Device(path) => write!(f, "Device({})", path.display()),
            Link::Usb { endpoint, .. } => write!(f, "Usb({:?})", endpoint),
            Link::Writer(_) => write!(f, "Writer"),
        }
    }
}

/// A write-only connection to one printer.
///
/// The link is exclusive: a job holds it from the first to the last byte,
/// so concurrent jobs never interleave. Nothing is read back and failed
/// writes are not retried.
#[derive(Debug)]
pub struct Printer {
    link: Mutex<Link>,
}

impl Printer {
    /// Print through a device node such as [`DEFAULT_DEVICE`].
    pub fn device(path: impl AsRef<Path>) -> Self {
        Printer {
            link: Mutex::new(Link::Device(path.as_ref().to_path_buf())),
        }
    }

    /// Print into an arbitrary writer.
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Printer {
            link: Mutex::new(Link::Writer(Box::new(writer))),
        }
    }

    /// Open a printer on USB by vendor and product id, optionally picking
    /// the unit with the given serial number.
    pub fn usb(vid: u16, pid: u16, serial: Option<&str>) -> Result<Self, Error> {
        let mut context = Context::new()?;
        let (device, device_desc, mut handle) = Self::open_device(&mut context, vid, pid, serial)?;

        let endpoint = pick_bulk_out(Self::bulk_out_candidates(&device, &device_desc))
            .ok_or(Error::MissingEndpoint)?;
        debug!("bulk out endpoint {:?}", endpoint);

        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) | Err(rusb::Error::NotSupported) => {}
            Err(err) => return Err(err.into()),
        }
        handle.set_active_configuration(endpoint.config)?;
        handle.claim_interface(endpoint.interface)?;
        handle.set_alternate_setting(endpoint.interface, endpoint.alt_setting)?;
        info!("opened printer {:04x}:{:04x}", vid, pid);

        Ok(Printer {
            link: Mutex::new(Link::Usb {
                handle: Box::new(handle),
                endpoint,
            }),
        })
    }

    fn open_device(
        context: &mut Context,
        vid: u16,
        pid: u16,
        serial: Option<&str>,
    ) -> Result<(Device<Context>, DeviceDescriptor, DeviceHandle<Context>), Error> {
        let devices = context.devices()?;

        if devices.len() == 0 {
            debug!("Failed to read device list");
            return Err(Error::DeviceListNotReadable);
        }
        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(err) => {
                    debug!("{:?}", err);
                    continue;
                }
            };

            if device_desc.vendor_id() != vid || device_desc.product_id() != pid {
                continue;
            }
            let handle = match device.open() {
                Ok(handle) => handle,
                Err(err) => {
                    debug!("Failed to open device: {:?}", err);
                    continue;
                }
            };
            let wanted = match serial {
                Some(wanted) => wanted,
                None => return Ok((device, device_desc, handle)),
            };

            let timeout = Duration::from_secs(1);
            let languages = handle.read_languages(timeout)?;
            let language = match languages.first() {
                Some(language) => *language,
                None => continue,
            };
            match handle.read_serial_number_string(language, &device_desc, timeout) {
                Ok(s) if s == wanted => return Ok((device, device_desc, handle)),
                Ok(_) => continue,
                Err(err) => {
                    debug!("Failed to read serial number string: {:?}", err);
                    continue;
                }
            }
        }
        debug!("No device matches {:04x}:{:04x} {:?}", vid, pid, serial);
        Err(Error::DeviceOffline)
    }

    /// Every bulk OUT endpoint of the device, tagged with the class of the
    /// interface that carries it.
    fn bulk_out_candidates(
        device: &Device<Context>,
        device_desc: &DeviceDescriptor,
    ) -> Vec<(u8, BulkOut)> {
        let mut found = Vec::new();
        for n in 0..device_desc.num_configurations() {
            let config_desc = match device.config_descriptor(n) {
                Ok(c) => c,
                Err(err) => {
                    debug!("Failed to read configuration {}: {:?}", n, err);
                    continue;
                }
            };
            for interface in config_desc.interfaces() {
                for alt in interface.descriptors() {
                    let address = alt
                        .endpoint_descriptors()
                        .find(|ep| {
                            ep.direction() == Direction::Out
                                && ep.transfer_type() == TransferType::Bulk
                        })
                        .map(|ep| ep.address());
                    if let Some(address) = address {
                        found.push((
                            alt.class_code(),
                            BulkOut {
                                config: config_desc.number(),
                                interface: alt.interface_number(),
                                alt_setting: alt.setting_number(),
                                address,
                            },
                        ));
                    }
                }
            }
        }
        found
    }

    /// Send one complete job.
    pub fn send(&self, job: &CommandStream) -> Result<(), Error> {
        let buf = job.as_bytes();
        // the link stays valid after a failed job, so poisoning is ignored
        let mut link = self.link.lock().unwrap_or_else(|e| e.into_inner());
        debug!("sending {} bytes to {:?}", buf.len(), *link);

        match &mut *link {
            Link::Device(path) => {
                let mut file = OpenOptions::new().write(true).open(path.as_path())?;
                file.write_all(buf)?;
                file.flush()?;
            }
            Link::Usb { handle, endpoint } => {
                let timeout = Duration::from_secs(10);
                let n = handle.write_bulk(endpoint.address, buf, timeout)?;
                if n != buf.len() {
                    debug!(
                        "write error: bytes wrote {} != bytes supplied {}, possibly timeout ?",
                        n,
                        buf.len()
                    );
                    return Err(Error::ShortWrite {
                        written: n,
                        expected: buf.len(),
                    });
                }
            }
            Link::Writer(writer) => {
                writer.write_all(buf)?;
                writer.flush()?;
            }
        }
        info!("sent {} bytes", buf.len());
        Ok(())
    }
}
