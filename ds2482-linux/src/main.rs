use clap::Parser;
use ds2482::{Channel, Ds2482Builder, Rom};

/// Enumerate 1-Wire devices behind a DS2482 bridge.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long)]
    path: String,
    /// AD1/AD0 address strap pins (0-3)
    #[arg(short, long, default_value_t = 0)]
    address_pins: u8,
    /// 1-Wire IO channel to select (0-7, DS2482-800 only)
    #[arg(short, long)]
    channel: Option<u8>,
    /// Only list devices with this family code (hex, e.g. 28)
    #[arg(short, long)]
    family: Option<String>,
    /// Use the single-device Read ROM shortcut instead of a search
    #[arg(short, long)]
    single: bool,
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Open the I2C bus
    let i2c = linux_embedded_hal::I2cdev::new(&args.path).expect("Failed to open I2C device");
    let delay = linux_embedded_hal::Delay;
    // Create a DS2482 instance; resets the bridge and checks the bus
    let mut bridge = Ds2482Builder::default()
        .with_address_pins(args.address_pins)
        .build(i2c, delay)
        .expect("Failed to create DS2482 instance");
    if let Some(num) = args.channel {
        let channel = Channel::new(num).expect("channel must be 0-7");
        bridge
            .select_channel(channel)
            .expect("Failed to select channel");
        log::info!("Selected channel IO{num}");
    }
    if args.single {
        let rom = bridge.read_rom().expect("Failed to read ROM");
        println!("{rom}");
        return;
    }
    // Enumerate devices on the 1-Wire bus
    let mut found = [Rom::default(); 64];
    let count = match args.family {
        Some(family) => {
            let family =
                u8::from_str_radix(family.trim_start_matches("0x"), 16).expect("family must be a hex byte");
            bridge
                .search_by_family(family, &mut found)
                .expect("Failed to enumerate devices")
        }
        None => bridge
            .search_all(&mut found)
            .expect("Failed to enumerate devices"),
    };
    log::info!("Found {count} devices");
    for rom in &found[..count] {
        println!("{rom}");
    }
}
