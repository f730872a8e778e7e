use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("mdash version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
