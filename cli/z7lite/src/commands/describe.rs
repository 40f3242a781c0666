//! `--describe`: human-readable summary of the composed SoC.

use anyhow::Result;
use z7lite_soc::SocDescription;

pub fn print(soc: &SocDescription) -> Result<()> {
    print!("{soc}");
    println!();
    println!("Fingerprint: {}", soc.fingerprint()?);
    Ok(())
}
