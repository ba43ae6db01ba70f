//! Command-line interface for driving a paged area.
//!
//! Every command builds a two-tier area: a swap store tier holding whole
//! units, in front of a resident tier the workload reads and writes.

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand};
use pagers::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const STORE: TierId = TierId::new("store");
const FIELDS: TierId = TierId::new("fields");

#[derive(Parser, Debug)]
#[command(name = "pagers", version, about = "Drive a demand-paged field area")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a random workload against a fresh area and print its final state
    Run {
        #[command(flatten)]
        area: AreaArgs,

        /// Operations per worker
        #[arg(short = 'n', long, default_value_t = 1000)]
        operations: u64,

        /// Number of concurrent workers
        #[arg(short, long, default_value_t = 1)]
        workers: u64,

        /// Seed for the workload generator
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Print the tier chain and the page table of a fresh area
    Layout {
        #[command(flatten)]
        area: AreaArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AreaArgs {
    /// Page size of the swap store tier
    #[arg(long, default_value_t = 16)]
    store_page_size: u64,

    /// Page size of the resident tier
    #[arg(long, default_value_t = 4)]
    field_page_size: u64,

    /// Number of fields in the area
    #[arg(short, long, default_value_t = 64)]
    size: u64,
}

/// Everything needed to build an area and drive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaConfig {
    pub store_page_size: u64,
    pub field_page_size: u64,
    pub area_size: u64,
    pub operations: u64,
    pub workers: u64,
    pub seed: u64,
}

impl AreaConfig {
    fn from_args(area: &AreaArgs, operations: u64, workers: u64, seed: u64) -> Result<Self> {
        let config = Self {
            store_page_size: area.store_page_size,
            field_page_size: area.field_page_size,
            area_size: area.size,
            operations,
            workers,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.area_size > 0, "area size must be at least one field");
        ensure!(self.workers > 0, "at least one worker is required");
        ensure!(
            self.field_page_size > 0 && self.field_page_size <= self.store_page_size,
            "resident page size must be between 1 and the store page size ({})",
            self.store_page_size
        );
        Ok(())
    }
}

/// An assembled area with handles on its store and bookkeeping.
struct Assembly {
    area: Arc<SimplePagedArea>,
    store: Arc<MemorySwapStore>,
    paging: Arc<LruKernelPaging>,
}

fn build(config: &AreaConfig) -> Result<Assembly> {
    let space = Space::default();
    let store = Arc::new(MemorySwapStore::new());
    let paging = Arc::new(LruKernelPaging::new());

    let out: Arc<dyn SwapState> =
        Arc::new(StoreSwapState::new(STORE, space, config.store_page_size));
    let fields: Arc<dyn SwapState> =
        Arc::new(FieldSwapState::new(FIELDS, space, config.field_page_size));
    let swappers: Vec<Arc<dyn Swapper>> = vec![Arc::new(StoreSwapper::new(out.clone(), fields))];
    let system = SwapSystem::new(out, FIELDS, swappers).context("invalid tier layout")?;

    let area = PagedArea::new(
        PagedAreaId::new(1),
        Arc::new(system),
        SwapConfiguration::new().with(STORE, StoreConfig::new(store.clone(), 0)),
        paging.clone(),
        SimplePageTable::new(space),
    )?;

    let region = space
        .region_of(Position::ORIGIN, Size::new(config.area_size))
        .context("area size out of range")?;
    area.resize(&Credentials::owner_with_all("pagers"), region)?;
    log::debug!("built area covering {}", area.region());

    Ok(Assembly {
        area: Arc::new(area),
        store,
        paging,
    })
}

/// Generator for one worker's operations, reproducible from the seed.
fn workload(seed: u64, worker: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(worker))
}

#[derive(Debug, Default, Clone, Copy)]
struct Stats {
    reads: u64,
    writes: u64,
    faults: u64,
    write_backs: u64,
}

impl Stats {
    fn merge(mut self, other: Stats) -> Stats {
        self.reads += other.reads;
        self.writes += other.writes;
        self.faults += other.faults;
        self.write_backs += other.write_backs;
        self
    }
}

fn run_worker(area: &SimplePagedArea, config: &AreaConfig, worker: u64) -> Result<Stats> {
    let cred = Credentials::owner_with_all(format!("worker-{worker}"));
    let mut rng = workload(config.seed, worker);
    let len = area.region().len();
    let mut stats = Stats::default();

    for _ in 0..config.operations {
        let position = Position::new(rng.gen_range(0..len));
        match rng.gen_range(0..100) {
            0..40 => {
                let value: i64 = rng.gen_range(-1_000_000..1_000_000);
                area.write_field(&cred, position, Field::Int(value))
                    .with_context(|| format!("worker {worker}: write at {position}"))?;
                stats.writes += 1;
            }
            40..75 => {
                area.read_field(&cred, position)
                    .with_context(|| format!("worker {worker}: read at {position}"))?;
                stats.reads += 1;
            }
            75..95 => {
                let target = if rng.gen_bool(0.5) { STORE } else { FIELDS };
                let mut fault = PageFault::new(position, target);
                area.page_fault(&cred, &mut fault)
                    .with_context(|| format!("worker {worker}: fault at {position}"))?;
                stats.faults += 1;
            }
            _ => {
                stats.write_backs += area.write_back(&cred)? as u64;
            }
        }
    }
    Ok(stats)
}

fn print_layout(assembly: &Assembly) {
    let system = assembly.area.swap_system();
    println!("Swap unit: {} fields", system.swap_unit().count());
    for state in system.swap_states() {
        let role = if state.id() == system.swapped_out().id() {
            "swapped out"
        } else if state.id() == system.swapped_in_to_fields().id() {
            "fields"
        } else {
            "intermediate"
        };
        println!(
            "  {:<10} page size {:>4}  ({})",
            state.id().to_string(),
            state.page_size().count(),
            role
        );
    }
}

fn print_state(assembly: &Assembly) {
    let area = &assembly.area;
    let descriptors = area.page_table().descriptors();

    println!("Area {} covering {}", area.id(), area.region());
    println!("{:<16} {:<8} {}", "Region", "Tier", "State");
    println!("{}", "-".repeat(34));
    for descriptor in &descriptors {
        let key = descriptor.key(area.id());
        let state = if assembly.paging.is_dirty(&key) {
            "dirty"
        } else {
            "clean"
        };
        println!(
            "{:<16} {:<8} {}",
            descriptor.region().to_string(),
            descriptor.tier().to_string(),
            state
        );
    }

    println!();
    println!("Resident pages: {}", area.resident_pages());
    println!("Dirty pages:    {}", assembly.paging.dirty_count());
    println!("Store slots:    {}", assembly.store.slot_count());

    let coldest: Vec<String> = assembly
        .paging
        .least_recently_used(3)
        .iter()
        .map(|key| key.to_string())
        .collect();
    if !coldest.is_empty() {
        println!("Coldest pages:  {}", coldest.join(", "));
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            area,
            operations,
            workers,
            seed,
        } => {
            let config = AreaConfig::from_args(&area, operations, workers, seed)?;
            let assembly = build(&config)?;
            print_layout(&assembly);
            println!();

            let mut handles = Vec::new();
            for worker in 0..config.workers {
                let area = assembly.area.clone();
                let config = config.clone();
                handles.push(tokio::task::spawn_blocking(move || {
                    run_worker(&area, &config, worker)
                }));
            }

            let mut total = Stats::default();
            for handle in handles {
                total = total.merge(handle.await.context("worker panicked")??);
            }
            log::info!("workload finished: {:?}", total);

            println!(
                "{} reads, {} writes, {} faults, {} pages written back",
                total.reads, total.writes, total.faults, total.write_backs
            );
            println!();
            print_state(&assembly);
            Ok(())
        }
        Commands::Layout { area } => {
            let config = AreaConfig::from_args(&area, 0, 1, 0)?;
            let assembly = build(&config)?;
            print_layout(&assembly);
            println!();
            print_state(&assembly);
            Ok(())
        }
    }
}
