//! Headless front-end for working with script files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use grimoire_lib::codec::{self, Format, Loaded};
use grimoire_lib::config;
use grimoire_lib::logging::init_tracing;
use grimoire_lib::rules::{JinxLookup, SqliteRuleStore};
use grimoire_lib::script::Team;
use grimoire_lib::sync;

/// grimoire - script editor tools for Blood on the Clocktower style games
#[derive(Parser, Debug)]
#[command(name = "grimoire-cli")]
#[command(version, about, long_about = None)]
struct Args {
    /// Rule database (defaults to $GRIMOIRE_RULE_DB, the config, then ~/.grimoire/rules.db)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-save a script in another format
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Target format: jishi or botc
        #[arg(long)]
        to: Format,
        /// Synchronize jinxes before writing
        #[arg(long)]
        sync: bool,
    },
    /// Synchronize jinxes against the rule database and save in place
    Sync {
        file: PathBuf,
        /// Output format (defaults to the detected format)
        #[arg(long)]
        format: Option<Format>,
    },
    /// Print metadata and per-team counts
    Inspect { file: PathBuf },
    /// List stored jinxes that apply to the script but are missing from it
    Detect { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Convert {
            ref input,
            ref output,
            to,
            sync: run_sync,
        } => {
            let mut loaded = load(input).await?;
            if run_sync {
                let store = rule_store(args.rules.as_deref())?;
                sync::sync_all(&mut loaded.script, &JinxLookup::new(&store))?;
            }
            codec::save_file(&loaded.script, output, to).await?;
            println!("wrote {} ({to}, {} roles)", output.display(), loaded.script.len());
        }
        Command::Sync { ref file, format } => {
            let mut loaded = load(file).await?;
            let format = format.unwrap_or_else(|| Format::detect(&loaded.script));
            let store = rule_store(args.rules.as_deref())?;
            let report = sync::sync_all(&mut loaded.script, &JinxLookup::new(&store))?;
            if report.is_unchanged() {
                println!("{}: already in sync", file.display());
                return Ok(());
            }
            codec::save_file(&loaded.script, file, format).await?;
            println!(
                "{}: {} roles updated, {} jinxes added, {} removed",
                file.display(),
                report.roles_updated,
                report.added.len(),
                report.removed.len()
            );
        }
        Command::Inspect { ref file } => {
            let loaded = load(file).await?;
            let script = &loaded.script;
            println!("name:   {}", script.meta.name);
            println!("author: {}", script.meta.author);
            println!("format: {}", Format::detect(script));
            let view = script.team_view();
            for team in Team::ALL {
                let roles = view.team(team);
                if roles.is_empty() {
                    continue;
                }
                let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
                println!(
                    "{:>10} ({}): {}",
                    script.meta.team_name(team),
                    roles.len(),
                    names.join(", ")
                );
            }
        }
        Command::Detect { ref file } => {
            let loaded = load(file).await?;
            let store = rule_store(args.rules.as_deref())?;
            let rules = JinxLookup::new(&store).detect_applicable_rules(&loaded.script)?;
            if rules.is_empty() {
                println!("no missing jinxes");
            }
            for rule in rules {
                println!("{}\t{}\t{}", rule.id, rule.name, rule.ability);
            }
        }
    }

    Ok(())
}

async fn load(path: &Path) -> Result<Loaded> {
    let loaded = codec::load_file(path).await?;
    for dropped in &loaded.report.dropped {
        eprintln!(
            "warning: dropped entry #{} ({}): {:?}",
            dropped.index,
            dropped.id.as_deref().unwrap_or("no id"),
            dropped.cause
        );
    }
    Ok(loaded)
}

fn rule_store(explicit: Option<&Path>) -> Result<SqliteRuleStore> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config::load_config()
            .rule_db_path()
            .context("cannot locate the rule database; pass --rules")?,
    };
    Ok(SqliteRuleStore::new(path))
}
