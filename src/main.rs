use anyhow::Result;

use marauder_console::{boot, cli};

fn main() -> Result<()> {
    boot::init_common();
    let matches = cli::parse_args();
    log::debug!("Starting marauder console");
    cli::actions::run(&matches)
}
