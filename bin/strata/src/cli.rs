use std::{path::PathBuf, sync::atomic::Ordering, thread, time::Duration};

use clap::{Parser, Subcommand};
use strata_cli::StopSignal;
use strata_config::NodeConfig;
use strata_event_ring::{RingConfig, init_exec_recorder, init_global_recorder};
use strata_executor::{ChainSpec, Revision, StrataChain};
use tracing::{debug, info};

use crate::check::{CheckRange, check_ledger};

const STOP_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Strata block execution node")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub chain_id: Option<u64>,

    /// Directory holding `<height>.rlp` block files.
    #[arg(long, global = true)]
    pub ledger_dir: Option<PathBuf>,

    /// Execution event ring as `<file-name-or-path>[:<descriptors-shift>:<payload-buf-shift>]`.
    #[arg(long, global = true, env = "STRATA_EXEC_EVENT_RING")]
    pub exec_event_ring: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Allocate the execution event ring and hold it until SIGINT or SIGTERM.
    EventRing,
    /// Validate and recover ledger blocks without executing them.
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub(crate) struct CheckArgs {
    /// First block to check.
    #[arg(long, default_value_t = 1)]
    pub from: u64,

    /// Last block to check. Runs until the ledger runs out when omitted.
    #[arg(long)]
    pub until: Option<u64>,
}

impl Cli {
    pub(crate) fn load_config(&self) -> eyre::Result<NodeConfig> {
        let mut config = NodeConfig::load(self.config.as_deref())?;

        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if let Some(ref ledger_dir) = self.ledger_dir {
            config.ledger_dir = Some(ledger_dir.clone());
        }
        if let Some(ref ring) = self.exec_event_ring {
            config.event_ring = Some(ring.clone());
        }

        config.validate()?;
        Ok(config)
    }

    pub(crate) fn run(self) -> eyre::Result<()> {
        let config = self.load_config()?;
        debug!(?config, "Full configuration");

        StopSignal::install()?;

        match &self.command {
            Commands::EventRing => run_event_ring(&config),
            Commands::Check(args) => run_check(&config, args),
        }
    }
}

fn run_event_ring(config: &NodeConfig) -> eyre::Result<()> {
    let spec = config
        .event_ring
        .as_deref()
        .ok_or_else(|| eyre::eyre!("no event ring configured; pass --exec-event-ring"))?;
    let ring: RingConfig = spec.parse()?;

    let recorder = init_global_recorder(init_exec_recorder(&ring)?)?;
    info!(path = %recorder.path().display(), "Holding execution event ring");

    let stop = StopSignal::flag();
    while stop.load(Ordering::Acquire) == 0 {
        thread::sleep(STOP_POLL);
    }

    info!(signal = StopSignal::received(), seqno = recorder.last_seqno(), "Releasing event ring");
    recorder.unlink()?;
    Ok(())
}

fn run_check(config: &NodeConfig, args: &CheckArgs) -> eyre::Result<()> {
    let chain = StrataChain::new(chain_spec(config)?);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.execution.threads)
        .thread_name(|index| format!("strata-recover-{index}"))
        .build()?;

    let range = CheckRange { from: args.from, until: args.until, batch_size: config.execution.batch_size };
    info!(
        chain_id = config.chain_id,
        ledger = %config.ledger_dir().display(),
        from = range.from,
        until = ?range.until,
        "Checking ledger"
    );

    let summary = check_ledger(&chain, &config.ledger_dir(), &pool, range, StopSignal::flag())?;
    info!(
        blocks = summary.blocks,
        txs = summary.transactions,
        gas = summary.gas,
        batches = summary.batches.len(),
        "Ledger check complete"
    );
    Ok(())
}

pub(crate) fn chain_spec(config: &NodeConfig) -> eyre::Result<ChainSpec> {
    let spec = ChainSpec::new(config.chain_id);
    if config.revisions.is_empty() {
        return Ok(spec);
    }
    let schedule = config
        .revisions
        .iter()
        .map(|activation| -> eyre::Result<(u64, Revision)> {
            Ok((activation.timestamp, Revision::try_from(activation.revision)?))
        })
        .collect::<eyre::Result<Vec<_>>>()?;
    Ok(spec.with_schedule(schedule))
}
