//! The `udpos tagset` command.

use clap::Args;
use udpos_core::PosTag;

/// Arguments for the `tagset` command.
#[derive(Args, Debug)]
pub struct TagsetArgs {
    /// Print the JSON schema sent to providers instead of the tag list
    #[arg(long)]
    pub schema: bool,
}

pub fn execute(args: TagsetArgs) -> anyhow::Result<()> {
    if args.schema {
        println!(
            "{}",
            serde_json::to_string_pretty(&udpos_core::response_schema())?
        );
        return Ok(());
    }

    for (i, tag) in PosTag::ALL.iter().enumerate() {
        println!(
            "{:>2}. {:<6} {:<26} e.g. {}",
            i + 1,
            tag.as_str(),
            tag.description(),
            tag.examples()
        );
    }
    Ok(())
}
