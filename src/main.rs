use anyhow::{Context, Result};
use std::env;
use std::fmt::Write;
use std::process;

use fin_api::{get_balance, Config, Customer, LedgerStore, SqliteLedgerStore, StatementEntry};

#[derive(Debug, PartialEq)]
enum Command {
    Init,
    Statement(String),
}

/// `None` means the arguments don't form a command; print usage
fn parse_args(args: &[String]) -> Option<Command> {
    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("init"), None) => Some(Command::Init),
        (Some("statement"), Some(cpf)) if args.len() == 3 => Some(Command::Statement(cpf.clone())),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let Some(command) = parse_args(&args) else {
        usage();
    };

    let config = Config::from_env()?;

    match command {
        Command::Init => run_init(&config)?,
        Command::Statement(cpf) => run_statement(&config, &cpf).await?,
    }

    Ok(())
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  fin-api init              create the database schema");
    eprintln!("  fin-api statement <cpf>   print a customer's statement and balance");
    eprintln!();
    eprintln!("The database path comes from FIN_API_DATABASE (default: fin_api.db)");
    process::exit(2);
}

fn run_init(config: &Config) -> Result<()> {
    println!("🔧 Setting up database at {:?}...", config.database);

    let store = SqliteLedgerStore::open(&config.database)?;
    let count = store.customer_count()?;

    println!("✓ Schema ready (WAL mode)");
    println!("✓ Database contains {} customers", count);

    Ok(())
}

async fn run_statement(config: &Config, cpf: &str) -> Result<()> {
    if !config.database.exists() {
        eprintln!("❌ Database not found at {:?}", config.database);
        eprintln!("   Run: fin-api init");
        process::exit(1);
    }

    let store = SqliteLedgerStore::open(&config.database)?;

    let Some(customer) = store.find_customer_by_cpf(cpf).await? else {
        eprintln!("❌ No customer with that CPF");
        process::exit(1);
    };

    let entries = store
        .list_entries(&customer.id)
        .await
        .context("Failed to load statement")?;

    print!("{}", render_statement(&customer, &entries));

    Ok(())
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Statement as printed by `fin-api statement`, newest entry first
fn render_statement(customer: &Customer, entries: &[StatementEntry]) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "📄 Statement for {} (since {})", customer.name, customer.created_at.format("%Y-%m-%d"));
    let _ = writeln!(out, "{}", RULE);

    for entry in entries {
        let _ = writeln!(
            out,
            "{}  {:>6}  {:>12.2}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.kind,
            entry.signed_amount(),
            entry.description.as_deref().unwrap_or("")
        );
    }

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{} entries, balance {:.2}", entries.len(), get_balance(entries));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fin_api::NewEntry;
    use rstest::rstest;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("fin-api").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_args(&args(&["init"])), Some(Command::Init));
        assert_eq!(
            parse_args(&args(&["statement", "111"])),
            Some(Command::Statement("111".to_string()))
        );
    }

    #[rstest]
    #[case(&[])]
    #[case(&["statement"])]
    #[case(&["statement", "111", "extra"])]
    #[case(&["init", "now"])]
    #[case(&["import"])]
    fn test_bad_arguments_fall_through_to_usage(#[case] list: &[&str]) {
        assert_eq!(parse_args(&args(list)), None);
    }

    #[test]
    fn test_render_statement() {
        let mut ana = Customer::new("Ana", "111");
        ana.created_at = "2025-11-20T08:00:00Z".parse().unwrap();
        let entries = vec![
            NewEntry::debit(40.0, None).into_entry(2, &ana.id, "2025-11-23T10:30:00Z".parse().unwrap()),
            NewEntry::credit(100.0, Some("salary".to_string()))
                .into_entry(1, &ana.id, "2025-11-22T09:00:00Z".parse().unwrap()),
        ];

        let out = render_statement(&ana, &entries);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "📄 Statement for Ana (since 2025-11-20)");
        assert_eq!(lines[2], "2025-11-23 10:30:00   debit        -40.00  ");
        assert_eq!(lines[3], "2025-11-22 09:00:00  credit        100.00  salary");
        assert_eq!(lines[5], "2 entries, balance 60.00");
    }

    #[test]
    fn test_render_empty_statement() {
        let out = render_statement(&Customer::new("Bia", "222"), &[]);

        assert!(out.ends_with("0 entries, balance 0.00\n"));
        assert_eq!(out.lines().count(), 4);
    }
}
