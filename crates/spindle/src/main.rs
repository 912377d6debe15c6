//! `spindle`: inspect key placement on a weighted consistent hash ring.
//!
//! Loads a ring description from TOML (plus any `--member` overrides) and
//! answers placement queries against it.
//!
//! # Usage
//!
//! ```text
//! spindle -c ring.toml get user:42                 # primary member
//! spindle -c ring.toml ordered user:42             # full preference list
//! spindle -c ring.toml owners user:42 -n 3         # primary + 2 replicas
//! spindle -c ring.toml coverage                    # hash-space share per member
//! spindle -c ring.toml diff --remove m2 --add m4:2 # keys moved by a change
//! spindle -m a -m b:2 get user:42                  # no config file
//! ```

mod config;
mod telemetry;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spindle_ring::{MemberSection, Migration, Placement, Ring};
use tracing::{debug, info};

use config::{CliConfig, parse_member};

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "spindle",
    version,
    about = "Inspect key placement on a weighted consistent hash ring"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extra member to place on the ring: `ID[:WEIGHT][=KEY]`.
    ///
    /// Can be specified multiple times. Added after the configured members.
    #[arg(short, long = "member", global = true)]
    members: Vec<String>,

    /// Override the configured weight multiplier.
    #[arg(short = 'x', long, global = true)]
    weight_multiplier: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the member responsible for a key.
    Get {
        /// Key to place.
        key: String,
    },

    /// Print every member ranked by preference for a key.
    Ordered {
        /// Key to place.
        key: String,
    },

    /// Print the first N members of the preference list for a key.
    Owners {
        /// Key to place.
        key: String,

        /// How many members to return.
        #[arg(short, default_value_t = 3)]
        n: usize,
    },

    /// Print the fraction of the hash space each member is primary for.
    Coverage,

    /// Count keys whose owners change under a membership change.
    Diff {
        /// Member to add: `ID[:WEIGHT][=KEY]`. Can be repeated.
        #[arg(long)]
        add: Vec<String>,

        /// Member ID to remove. Can be repeated.
        #[arg(long)]
        remove: Vec<String>,

        /// Number of synthetic keys to sample.
        #[arg(long, default_value_t = 10_000)]
        keys: usize,

        /// How many owners per key to compare.
        #[arg(short, long, default_value_t = 1)]
        replication_factor: usize,
    },
}

// -----------------------------------------------------------------------
// Entry point
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    telemetry::init(&config.log.level);

    for arg in &cli.members {
        config.placement.members.push(parse_member(arg)?);
    }
    if let Some(multiplier) = cli.weight_multiplier {
        config.placement.ring.weight_multiplier = multiplier;
    }

    let ring = config.placement.build().context("building ring")?;
    debug!(
        members = ring.member_count(),
        vnodes = ring.vnode_count(),
        "ring ready"
    );

    match cli.command {
        Commands::Get { key } => match ring.get(key.as_bytes()) {
            Some(member) => println!("{member}"),
            None => anyhow::bail!("ring is empty"),
        },
        Commands::Ordered { key } => {
            for member in ring.ordered(key.as_bytes()) {
                println!("{member}");
            }
        }
        Commands::Owners { key, n } => {
            for member in ring.owners(key.as_bytes(), n) {
                println!("{member}");
            }
        }
        Commands::Coverage => {
            for (member, share) in ring.coverage() {
                println!("{member}\t{:.4}%", share * 100.0);
            }
        }
        Commands::Diff {
            add,
            remove,
            keys,
            replication_factor,
        } => {
            let adds = add
                .iter()
                .map(|arg| parse_member(arg))
                .collect::<Result<Vec<_>>>()?;

            let mut changed = ring.clone();
            apply_changes(&mut changed, &adds, &remove)?;

            let sample: Vec<Vec<u8>> = (0..keys)
                .map(|i| format!("key-{i:08}").into_bytes())
                .collect();
            let migrations = Ring::diff(&ring, &changed, &sample, replication_factor);
            let moved = moved_keys(&migrations);
            info!(
                sampled = keys,
                moved,
                copies = migrations.len(),
                "computed ring diff"
            );

            println!(
                "{moved} of {keys} keys move ({:.2}%)",
                percent(moved, keys)
            );
            for (from, to, count) in summarize(&migrations) {
                println!("  {from} -> {to}\t{count}");
            }
        }
    }

    Ok(())
}

/// Apply removals, then additions, to any placement.
fn apply_changes(
    placement: &mut impl Placement,
    adds: &[MemberSection],
    removes: &[String],
) -> Result<()> {
    for id in removes {
        anyhow::ensure!(placement.remove(id), "member {id:?} is not on the ring");
    }
    for member in adds {
        let added = placement
            .add(&member.id, member.key_bytes(), member.weight)
            .with_context(|| format!("adding member {:?}", member.id))?;
        anyhow::ensure!(added, "member {:?} is already on the ring", member.id);
    }
    Ok(())
}

/// Number of distinct keys among `migrations`.
fn moved_keys(migrations: &[Migration]) -> usize {
    migrations.chunk_by(|a, b| a.key == b.key).count()
}

/// Group migrations by `(from, to)`, sorted. A missing side prints as `-`.
fn summarize(migrations: &[Migration]) -> Vec<(&str, &str, usize)> {
    let mut counts = BTreeMap::<(&str, &str), usize>::new();
    for m in migrations {
        let from = m.from.as_deref().unwrap_or("-");
        let to = m.to.as_deref().unwrap_or("-");
        *counts.entry((from, to)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((from, to), count)| (from, to, count))
        .collect()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
