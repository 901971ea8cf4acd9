use crate::parser::{Registry, Table};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;

/// Display the destination schema
pub fn display_schema(show_details: bool) -> Result<()> {
    println!("addb2db Destination Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    for table in Table::ALL {
        println!("{};", table.create_sql());
    }

    if show_details {
        let registry = Registry::new()?;
        println!();
        println!("Registered record types ({}):", registry.len());
        for kind in registry.kinds() {
            if let Some(registration) = registry.lookup(kind) {
                println!("  {:<24} -> {}", kind, registration.type_id);
            }
        }
    } else {
        println!();
        println!("Use --show to list registered record types");
    }

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("addb2db v{}", env!("CARGO_PKG_VERSION"));
    println!("Destination Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Loads ADDB trace dumps into a SQLite database for offline analysis.");
}
