//! Concurrent access to one paged area
//!
//! Blocking workers share an area through an `Arc`, writing their own
//! positions while other workers fault whole units out to the store.

use pagers::prelude::*;

const STORE: TierId = TierId::new("store");
const FIELDS: TierId = TierId::new("fields");
const WORKERS: u64 = 8;
const UNIT: u64 = 8;

fn shared_area() -> (Arc<SimplePagedArea>, Arc<MemorySwapStore>) {
    let space = Space::default();
    let store = Arc::new(MemorySwapStore::new());
    let out: Arc<dyn SwapState> = Arc::new(StoreSwapState::new(STORE, space, UNIT));
    let fields: Arc<dyn SwapState> = Arc::new(FieldSwapState::new(FIELDS, space, 4));
    let swappers: Vec<Arc<dyn Swapper>> = vec![Arc::new(StoreSwapper::new(out.clone(), fields))];
    let system = SwapSystem::new(out, FIELDS, swappers).unwrap();

    let area = PagedArea::new(
        PagedAreaId::new(11),
        Arc::new(system),
        SwapConfiguration::new().with(STORE, StoreConfig::new(store.clone(), 0)),
        Arc::new(LruKernelPaging::new()),
        SimplePageTable::new(space),
    )
    .unwrap();
    let cred = Credentials::owner_with_all("setup");
    area.resize(
        &cred,
        space
            .region_of(Position::ORIGIN, Size::new(WORKERS * UNIT))
            .unwrap(),
    )
    .unwrap();
    (Arc::new(area), store)
}

/// Writes from every worker survive other workers' swap-outs
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_workers_share_area() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (area, _store) = shared_area();

    let mut handles = Vec::new();
    for worker in 0..WORKERS {
        let area = area.clone();
        handles.push(tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let cred = Credentials::owner_with_all(format!("worker-{worker}"));
            for round in 0..20u64 {
                let position = Position::new(worker * UNIT + round % UNIT);
                area.write_field(&cred, position, Field::Int((worker * 100 + round) as i64))?;

                // Push some other worker's unit out to the store.
                let victim = Position::new(((worker + round) % WORKERS) * UNIT);
                let mut fault = PageFault::new(victim, STORE);
                area.page_fault(&cred, &mut fault)?;

                let field = area.read_field(&cred, position)?;
                anyhow::ensure!(
                    field == Field::Int((worker * 100 + round) as i64),
                    "worker {worker} round {round}: read back {field}"
                );
            }
            Ok(())
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cred = Credentials::owner_with_all("check");
    for worker in 0..WORKERS {
        for offset in 0..UNIT {
            let last_round = (0..20u64).rev().find(|round| round % UNIT == offset).unwrap();
            let field = area
                .read_field(&cred, Position::new(worker * UNIT + offset))
                .unwrap();
            assert_eq!(field, Field::Int((worker * 100 + last_round) as i64));
        }
    }
}

/// Faults racing on the same unit leave it in exactly one tier
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_faults_on_one_unit() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (area, store) = shared_area();
    let cred = Credentials::owner_with_all("setup");
    area.write_field(&cred, Position::new(3), Field::from("shared"))
        .unwrap();

    let mut handles = Vec::new();
    for worker in 0..WORKERS {
        let area = area.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let cred = Credentials::owner_with_all("racer");
            let target = if worker % 2 == 0 { STORE } else { FIELDS };
            let mut fault = PageFault::new(Position::new(5), target);
            area.page_fault(&cred, &mut fault).map(|_| fault)
        }));
    }

    for handle in handles {
        let fault = handle.await.unwrap().unwrap();
        assert!(!fault.is_error());
        assert!(fault.page().is_some());
    }

    let tiers: Vec<TierId> = area
        .page_table()
        .pages(&Space::default().region_of(Position::ORIGIN, Size::new(UNIT)).unwrap())
        .unwrap()
        .iter()
        .map(|page| page.tier())
        .collect();
    assert!(tiers.iter().all(|tier| *tier == tiers[0]));
    assert_eq!(area.read_field(&cred, Position::new(3)).unwrap(), Field::from("shared"));
    assert!(store.slot_count() <= 1);
}
