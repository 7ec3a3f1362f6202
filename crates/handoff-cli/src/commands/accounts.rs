//! Accounts command implementation.

use anyhow::Result;
use handoff_core::accounts::{AccountStore, StoredAccount};
use handoff_core::session::AccountId;

use super::{handle_error, load_config, AccountsAction, AccountsArgs};

/// Run the accounts command.
pub async fn run(args: AccountsArgs) -> Result<()> {
    let config = load_config();
    let store = AccountStore::load_with_config(&config).inspect_err(handle_error)?;

    match args.action {
        AccountsAction::List { json } => {
            let accounts = store.list();
            let active = store.active().map(|record| record.id);

            if json {
                let output = serde_json::json!({
                    "path": store.path(),
                    "active": active,
                    "accounts": accounts,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if accounts.is_empty() {
                println!("No accounts.");
            } else {
                println!();
                println!("Accounts:");
                println!("{}", "─".repeat(60));
                for account in &accounts {
                    print_account(account, active == Some(account.id));
                }
                println!("{}", "─".repeat(60));
            }
        }

        AccountsAction::Remove { account } => {
            let id = AccountId::parse(&account).inspect_err(handle_error)?;

            if store.remove(id).inspect_err(handle_error)? {
                println!("Removed account: {}", id);
            } else {
                println!("Account not found: {}", id);
            }
        }
    }

    Ok(())
}

fn print_account(account: &StoredAccount, active: bool) {
    let marker = if active { "*" } else { " " };
    let environment = if account.testing_environment {
        " [test]"
    } else {
        ""
    };

    match &account.authorized {
        Some(state) => println!(
            "{} {} - user {} on {}{}",
            marker, account.id, state.user_id, account.datacenter_id, environment
        ),
        None => println!(
            "{} {} - logged out on {}{} (created {})",
            marker,
            account.id,
            account.datacenter_id,
            environment,
            account.created_at.format("%Y-%m-%d %H:%M")
        ),
    }
}
