//! Vendors command - list registered extraction methods.

use console::style;

use invx_core::Registry;

pub fn run() -> anyhow::Result<()> {
    let registry = Registry::builtin();

    println!("{}", style("Available extraction methods:").bold());
    for (tag, label) in registry.entries() {
        println!("  {:<18} {}", style(tag).cyan(), label);
    }

    Ok(())
}
