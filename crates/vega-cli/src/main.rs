//! `vega` binary entry point

fn main() -> anyhow::Result<()> {
    vega_cli::run()?;
    Ok(())
}
