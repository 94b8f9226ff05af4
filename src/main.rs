use std::{
    env,
    io::{self, Read, Write},
    process::exit,
};

use log::{debug, info};
use tspl_label::{
    feed_job, home_job, print_image, Axis, Calibration, CommandStream, ConvertOptions, Error,
    GeometryState, GeometryUpdate, Mode, PackingList, PixelGrid, Printer, ShippingLabel, Template,
    TextLabel, DEFAULT_DEVICE,
};

//
// cargo run -- shipping 54321 "Jane Doe" "123 Oak Ave, Detroit" ORDER54321
//
// Geometry comes from LABEL_WIDTH_MM, LABEL_HEIGHT_MM, GAP_MM, X_OFFSET and
// Y_OFFSET, the printer from PRINTER_DEVICE or PRINTER_USB=vid:pid[:serial]
// (hex ids). A .env file in the working directory is read first.
//

fn print_usage() {
    println!("Usage: tspl-label [--dry-run] COMMAND [ARGS]");
    println!("Commands:");
    println!("  image FILE [--threshold] [--invert] [--no-trim] [--shift N] [--fit WxH]");
    println!("  text TITLE LINE...");
    println!("  shipping ORDER CUSTOMER ADDRESS [BARCODE]");
    println!("  packing ORDER CUSTOMER ITEM,ITEM,...");
    println!("  test border|center|direction");
    println!("  feed");
    println!("  home");
    println!("  raw              TSPL read from stdin");
    println!("  nudge x|y MM     print the offsets after moving the origin");
    println!("\n--dry-run writes the job to stdout instead of the printer.");
}

fn usage_error(value: &str) -> Error {
    Error::InvalidField {
        field: "command",
        value: value.to_string(),
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let dry_run = args.iter().any(|a| a == "--dry-run");
    args.retain(|a| a != "--dry-run");

    if let Err(err) = run(&args, dry_run) {
        eprintln!("Error: {}", err);
        exit(1);
    }
}

fn run(args: &[String], dry_run: bool) -> Result<(), Error> {
    let geometry = geometry_from_env()?;
    let command = args.first().map(String::as_str).unwrap_or("");
    let rest = &args[1.min(args.len())..];

    let job = match command {
        "image" => image_command(rest, &geometry)?,
        "text" => match rest.split_first() {
            Some((title, lines)) => TextLabel::new(lines.to_vec())
                .title(title.as_str())
                .render(&geometry.snapshot()),
            None => return Err(usage_error("text")),
        },
        "shipping" => {
            if rest.len() < 3 {
                return Err(usage_error("shipping"));
            }
            let date = chrono::Local::now().format("%Y-%m-%d").to_string();
            let mut label = ShippingLabel::new(&*rest[0], &*rest[1], &*rest[2], date);
            if let Some(barcode) = rest.get(3) {
                label = label.barcode(barcode.as_str());
            }
            label.render(&geometry.snapshot())
        }
        "packing" => {
            if rest.len() < 3 {
                return Err(usage_error("packing"));
            }
            let items = rest[2]
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty());
            PackingList::new(&*rest[0], &*rest[1], items).render(&geometry.snapshot())
        }
        "test" => {
            let pattern: Calibration = rest.first().map(String::as_str).unwrap_or("").parse()?;
            pattern.render(&geometry.snapshot())
        }
        "feed" => feed_job(&geometry.snapshot()),
        "home" => home_job(&geometry.snapshot()),
        "raw" => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            CommandStream::raw(&text)
        }
        "nudge" => {
            let (axis, mm) = match rest {
                [axis, mm] => (axis, mm),
                _ => return Err(usage_error("nudge")),
            };
            let axis: Axis = axis.parse()?;
            let mm: f32 = mm.parse().map_err(|_| Error::InvalidField {
                field: "mm",
                value: mm.to_string(),
            })?;
            let g = geometry.nudge(axis, mm)?;
            println!("X_OFFSET={}", g.x_offset);
            println!("Y_OFFSET={}", g.y_offset);
            return Ok(());
        }
        other => return Err(usage_error(other)),
    };

    if dry_run {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(job.as_bytes())?;
        out.flush()?;
        return Ok(());
    }

    let printer = open_printer()?;
    printer.send(&job)?;
    info!("printed {} ({} bytes)", command, job.len());
    Ok(())
}

fn image_command(args: &[String], geometry: &GeometryState) -> Result<CommandStream, Error> {
    let mut path = None;
    let mut fit = None;
    let mut options = ConvertOptions::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--threshold" => options = options.mode(Mode::Threshold),
            "--invert" => options = options.invert(true),
            "--no-trim" => options = options.trim(false),
            "--shift" => {
                let value = iter.next().map(String::as_str).unwrap_or("");
                let shift = value.parse().map_err(|_| Error::InvalidField {
                    field: "shift",
                    value: value.to_string(),
                })?;
                options = options.shift_px(shift);
            }
            "--fit" => {
                let value = iter.next().map(String::as_str).unwrap_or("");
                fit = Some(parse_size(value)?);
            }
            _ if path.is_none() => path = Some(arg.as_str()),
            other => return Err(usage_error(other)),
        }
    }

    let path = path.ok_or_else(|| usage_error("image"))?;
    let mut img = image::open(path)?;
    if let Some((w, h)) = fit {
        img = img.thumbnail(w, h);
    }
    let grid = PixelGrid::from(img.to_luma8());
    debug!("decoded {} as {}x{}", path, grid.width(), grid.height());

    Ok(print_image(grid, &geometry.snapshot(), &options))
}

fn parse_size(value: &str) -> Result<(u32, u32), Error> {
    let invalid = || Error::InvalidField {
        field: "fit",
        value: value.to_string(),
    };
    let mut parts = value.splitn(2, 'x');
    let w = parts.next().and_then(|w| w.parse().ok()).ok_or_else(invalid)?;
    let h = parts.next().and_then(|h| h.parse().ok()).ok_or_else(invalid)?;
    Ok((w, h))
}

fn geometry_from_env() -> Result<GeometryState, Error> {
    let mut update = GeometryUpdate::new();
    if let Ok(v) = env::var("LABEL_WIDTH_MM") {
        update = update.width_mm(v);
    }
    if let Ok(v) = env::var("LABEL_HEIGHT_MM") {
        update = update.height_mm(v);
    }
    if let Ok(v) = env::var("GAP_MM") {
        update = update.gap_mm(v);
    }
    if let Ok(v) = env::var("X_OFFSET") {
        update = update.x_offset(v);
    }
    if let Ok(v) = env::var("Y_OFFSET") {
        update = update.y_offset(v);
    }

    let state = GeometryState::default();
    if !update.is_empty() {
        state.set(&update)?;
    }
    debug!("geometry {:?}", state.snapshot());
    Ok(state)
}

fn open_printer() -> Result<Printer, Error> {
    if let Ok(usb) = env::var("PRINTER_USB") {
        let invalid = || Error::InvalidField {
            field: "PRINTER_USB",
            value: usb.clone(),
        };
        let mut parts = usb.splitn(3, ':');
        let vid = parts
            .next()
            .and_then(|v| u16::from_str_radix(v, 16).ok())
            .ok_or_else(invalid)?;
        let pid = parts
            .next()
            .and_then(|p| u16::from_str_radix(p, 16).ok())
            .ok_or_else(invalid)?;
        let serial = parts.next();
        return Printer::usb(vid, pid, serial);
    }

    let device = env::var("PRINTER_DEVICE").unwrap_or_else(|_| DEFAULT_DEVICE.to_string());
    Ok(Printer::device(device))
}
