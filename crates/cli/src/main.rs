// Ledgerline CLI - headless reporting operations against a ledger fact store

mod import;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ledgerline_model::AdjustmentStatus;
use ledgerline_ordering::{Anchor, Placement, Positions};
use ledgerline_report::{run as run_report, EngineConfig, ReportParams};
use ledgerline_store::Store;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;

#[derive(Parser)]
#[command(name = "lline")]
#[command(about = "Monthly managerial reporting over a ledger fact store (headless)")]
#[command(version)]
struct Cli {
    /// Database file
    #[arg(long, global = true, default_value = "ledgerline.db", env = "LLINE_DB")]
    db: PathBuf,

    /// Engine configuration (TOML). Stock defaults apply when omitted.
    #[arg(long, global = true, env = "LLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,

    /// Import ledger facts from a CSV file
    #[command(after_help = "\
Expected header:
  origin,account,title,date,document,branch,cost_center,item,debit_cents,credit_cents")]
    Import {
        /// CSV file of ledger entries
        file: PathBuf,
    },

    /// Generate the monthly report
    Report {
        /// Restrict to one origin system
        #[arg(long)]
        origin: Option<String>,

        /// Split lines per cost-center
        #[arg(long)]
        by_cost_center: bool,

        /// Restrict to one cost-center
        #[arg(long)]
        cost_center: Option<String>,

        /// Emit the JSON envelope instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the ordered presentation tree
    Tree {
        /// Emit JSON instead of indented text
        #[arg(long)]
        json: bool,
    },

    /// Inspect and drive the adjustment lifecycle
    Adjust {
        #[command(subcommand)]
        action: AdjustAction,
    },

    /// Manage display ordering
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum AdjustAction {
    /// List adjustments, newest first
    List,
    /// Approve a pending adjustment
    Approve {
        id: i64,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Reject an adjustment (it stops applying to reports)
    Reject {
        id: i64,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Soft-delete: the adjusted ledger row leaves the report entirely
    Invalidate {
        id: i64,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Undo a soft-delete
    Restore {
        id: i64,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Show the audit trail of one adjustment
    Audit { id: i64 },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Seed ordering slots for all known nodes (idempotent)
    Init {
        /// Wipe existing slots first
        #[arg(long)]
        reset: bool,
    },
    /// List one context's entries, ascending by position
    List { context: String },
    /// Slot a node into a context
    Add {
        kind: String,
        node_ref: String,
        context: String,
        /// Explicit position (defaults to the end slot)
        #[arg(long)]
        at: Option<i64>,
        /// Place before the current minimum instead
        #[arg(long, conflicts_with = "at")]
        start: bool,
    },
    /// Relocate an entry, absolutely or relative to an anchor
    Move {
        kind: String,
        node_ref: String,
        from: String,
        to: String,
        #[arg(long)]
        position: Option<i64>,
        /// Anchor as kind:ref; land just before it
        #[arg(long)]
        before: Option<String>,
        /// Anchor as kind:ref; land just after it
        #[arg(long, conflicts_with = "before")]
        after: Option<String>,
        /// Anchor as kind:ref; append inside its child context
        #[arg(long, conflicts_with_all = ["before", "after"])]
        inside: Option<String>,
    },
    /// Renumber a context to the clean gap progression
    Normalize { context: String },
    /// Drop a node's slots (one context, or everywhere)
    Remove {
        kind: String,
        node_ref: String,
        #[arg(long)]
        context: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(&cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(EngineConfig::from_toml(&raw)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn parse_anchor(raw: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    raw.split_once(':')
        .map(|(kind, node_ref)| (kind.to_string(), node_ref.to_string()))
        .ok_or_else(|| format!("anchor must be kind:ref, got '{raw}'").into())
}

fn dispatch(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&cli.db)?;
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Init => {
            // Store::open already ensured the schema.
            println!("initialized {}", cli.db.display());
            Ok(())
        }

        Commands::Import { file } => {
            let entries = import::read_entries(file)?;
            let inserted = store.insert_entries(&entries)?;
            println!("imported {inserted} ledger entries");
            Ok(())
        }

        Commands::Report {
            origin,
            by_cost_center,
            cost_center,
            json,
        } => {
            let params = ReportParams {
                origin: origin.clone(),
                by_cost_center: *by_cost_center,
                cost_center: cost_center.clone(),
            };
            let envelope = run_report(&store, &params, &config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                output::print_report(&envelope);
            }
            Ok(())
        }

        Commands::Tree { json } => {
            let positions = Positions::new(&store, config.ordering_gap);
            let tree = positions.build_tree()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                output::print_tree(&tree, 0);
            }
            Ok(())
        }

        Commands::Adjust { action } => dispatch_adjust(&store, action),

        Commands::Order { action } => dispatch_order(&store, &config, action),
    }
}

fn dispatch_adjust(
    store: &Store,
    action: &AdjustAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AdjustAction::List => {
            output::print_adjustments(&store.list_adjustments()?);
            Ok(())
        }
        AdjustAction::Approve { id, actor } => {
            store.set_adjustment_status(*id, AdjustmentStatus::Approved, actor)?;
            println!("approved adjustment {id}");
            Ok(())
        }
        AdjustAction::Reject { id, actor } => {
            store.set_adjustment_status(*id, AdjustmentStatus::Rejected, actor)?;
            println!("rejected adjustment {id}");
            Ok(())
        }
        AdjustAction::Invalidate { id, actor } => {
            store.set_adjustment_invalid(*id, true, actor)?;
            println!("invalidated adjustment {id}");
            Ok(())
        }
        AdjustAction::Restore { id, actor } => {
            store.set_adjustment_invalid(*id, false, actor)?;
            println!("restored adjustment {id}");
            Ok(())
        }
        AdjustAction::Audit { id } => {
            for entry in store.audit_for(*id)? {
                println!(
                    "{} {} {}: {} -> {}",
                    entry.changed_at,
                    entry.changed_by,
                    entry.field,
                    entry.old_value.as_deref().unwrap_or("-"),
                    entry.new_value.as_deref().unwrap_or("-"),
                );
            }
            Ok(())
        }
    }
}

fn dispatch_order(
    store: &Store,
    config: &EngineConfig,
    action: &OrderAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let positions = Positions::new(store, config.ordering_gap);
    match action {
        OrderAction::Init { reset } => {
            let inserted = positions.initialize(*reset)?;
            println!("seeded {inserted} ordering slots");
            Ok(())
        }
        OrderAction::List { context } => {
            for slot in positions.siblings(context)? {
                println!("{:>6}  {}/{}", slot.position, slot.kind, slot.node_ref);
            }
            Ok(())
        }
        OrderAction::Add {
            kind,
            node_ref,
            context,
            at,
            start,
        } => {
            let placement = match (at, start) {
                (Some(position), _) => Placement::At(*position),
                (None, true) => Placement::Start,
                (None, false) => Placement::End,
            };
            let slot = positions.add_node(kind, node_ref, context, placement)?;
            println!("placed {kind}/{node_ref} at {} in '{context}'", slot.position);
            Ok(())
        }
        OrderAction::Move {
            kind,
            node_ref,
            from,
            to,
            position,
            before,
            after,
            inside,
        } => {
            let anchor = match (before, after, inside) {
                (Some(raw), _, _) => {
                    let (kind, node_ref) = parse_anchor(raw)?;
                    Some(Anchor::Before { kind, node_ref })
                }
                (_, Some(raw), _) => {
                    let (kind, node_ref) = parse_anchor(raw)?;
                    Some(Anchor::After { kind, node_ref })
                }
                (_, _, Some(raw)) => {
                    let (kind, node_ref) = parse_anchor(raw)?;
                    Some(Anchor::Inside { kind, node_ref })
                }
                (None, None, None) => None,
            };
            let slot = positions.move_entry(kind, node_ref, from, to, *position, anchor.as_ref())?;
            println!(
                "moved {kind}/{node_ref} to {} in '{}'",
                slot.position, slot.context
            );
            Ok(())
        }
        OrderAction::Normalize { context } => {
            let renumbered = positions.normalize(context)?;
            println!("renumbered {renumbered} slots in '{context}'");
            Ok(())
        }
        OrderAction::Remove {
            kind,
            node_ref,
            context,
        } => {
            let removed = positions.remove_node(kind, node_ref, context.as_deref())?;
            println!("removed {removed} slot(s)");
            Ok(())
        }
    }
}
