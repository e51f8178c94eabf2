use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("vitalwatch version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
