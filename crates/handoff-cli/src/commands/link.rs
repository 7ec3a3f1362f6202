//! Link command implementation.

use anyhow::Result;
use handoff_core::token::parse_login_link;

use super::{handle_error, load_config, LinkAction, LinkArgs};

/// Run the link command.
pub async fn run(args: LinkArgs) -> Result<()> {
    let config = load_config();
    let scheme = config.handoff.link_scheme;

    match args.action {
        LinkAction::Decode { link, json } => {
            let value = parse_login_link(&link, &scheme).inspect_err(handle_error)?;
            let hex = to_hex(&value);

            if json {
                let output = serde_json::json!({
                    "scheme": scheme,
                    "length": value.len(),
                    "token": hex,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!();
                println!("Login token ({} bytes)", value.len());
                println!("{}", "─".repeat(50));
                println!("  {}", hex);
                println!();
            }
        }
    }

    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
