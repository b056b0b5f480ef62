use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::IVec2;
use homestead_common::{EquipSlot, ItemPlacement, ItemRotation};
use homestead_inventory::{EquipmentMap, InventoryConfig, InventoryContainer, PlacementTarget};
use homestead_items::{ItemCatalog, PersistentItemRecord, ResourceLoader, TypeRegistry};
use homestead_kernel::{GridWorld, World};
use homestead_persist::{PlayerSaveData, SaveStore, SavedSlot, SnapshotNode, WorldSnapshot};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Item content bundled with the CLI, used when no `--catalog` is given.
const DEFAULT_CATALOG: &str = include_str!("../content/items.yaml");

const TABLE: &str = "res://items/furniture/table/table.tres";
const TABLE_SCENE: &str = "res://items/furniture/table/table.tscn";
const LAMP: &str = "res://items/furniture/lamp/lamp.tres";
const LAMP_SCENE: &str = "res://items/furniture/lamp/lamp.tscn";
const CHAIR: &str = "res://items/furniture/polka_chair/polka_chair.tres";
const CHAIR_SCENE: &str = "res://items/furniture/polka_chair/polka_chair.tscn";
const SHOVEL: &str = "res://items/tools/shovel/shovel.tres";
const SHOVEL_SCENE: &str = "res://items/tools/shovel/shovel.tscn";
const APPLE: &str = "res://items/food/apple/apple.tres";
const APPLE_SCENE: &str = "res://items/food/apple/apple.tscn";
const CAPSULE: &str = "res://items/misc/time_capsule/time_capsule.tres";
const CAPSULE_SCENE: &str = "res://items/misc/time_capsule/time_capsule.tscn";
const HOLE_SCENE: &str = "res://items/misc/hole/hole.tscn";

#[derive(Parser)]
#[command(name = "homestead-cli", about = "CLI tool for homestead content and saves")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Item catalog YAML (defaults to the bundled demo content)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Load and validate an item catalog
    ValidateCatalog {
        /// Catalog YAML file
        path: PathBuf,
    },
    /// Load a player save leniently and print its contents
    InspectSave {
        /// Save store directory
        #[arg(short, long)]
        store: PathBuf,
        /// Player id
        #[arg(short, long)]
        player: String,
    },
    /// Run a scripted session and check that save/load round-trips it
    Demo {
        /// Save store directory
        #[arg(short, long)]
        store: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let registry = TypeRegistry::with_builtin();

    match cli.command {
        Commands::Info => {
            println!("homestead-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("grid: {}", homestead_grid::crate_info());
            println!("items: {}", homestead_items::crate_info());
            println!("kernel: {}", homestead_kernel::crate_info());
            println!("inventory: {}", homestead_inventory::crate_info());
            println!("persist: {}", homestead_persist::crate_info());
            println!("record variants: {}", registry.tags().join(", "));
        }
        Commands::ValidateCatalog { path } => {
            let catalog = ItemCatalog::load(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            catalog
                .validate(&registry)
                .with_context(|| format!("validating {}", path.display()))?;
            println!(
                "{}: {} items, {} scenes, OK",
                path.display(),
                catalog.len(),
                catalog.scenes().count()
            );
        }
        Commands::InspectSave { store, player } => {
            let catalog = load_catalog(cli.catalog.as_deref())?;
            let store = SaveStore::open(&store)?;
            let Some((save, warnings)) = store.load_player(&player, &registry)? else {
                println!("no save for player '{player}'");
                return Ok(());
            };

            println!("player: {}", save.player_name);
            print_slots(&save.inventory_slots, &catalog);
            for (slot, record) in &save.equipped_items {
                println!("  {slot:?}: {}", describe(record, &catalog));
            }
            for warning in &warnings {
                println!("warning: {warning}");
            }
        }
        Commands::Demo { store } => {
            let catalog = Arc::new(load_catalog(cli.catalog.as_deref())?);
            catalog.validate(&registry)?;
            run_demo(&store, catalog, &registry)?;
        }
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<ItemCatalog> {
    let catalog = match path {
        Some(path) => ItemCatalog::load(path)?,
        None => ItemCatalog::from_yaml_str(DEFAULT_CATALOG)?,
    };
    Ok(catalog)
}

fn describe(record: &PersistentItemRecord, loader: &dyn ResourceLoader) -> String {
    let tooltip = record.tooltip();
    let name = record.display_name(loader);
    if tooltip.is_empty() {
        format!("{name} [{}]", record.variant_tag())
    } else {
        format!("{name} [{}] {tooltip}", record.variant_tag())
    }
}

fn print_slots(slots: &[SavedSlot], loader: &dyn ResourceLoader) {
    for slot in slots {
        if let Some(record) = &slot.item {
            println!("  #{:02}: {}", slot.index, describe(record, loader));
        }
    }
}

fn at(x: i32, y: i32) -> PlacementTarget {
    PlacementTarget::new(IVec2::new(x, y), ItemRotation::North)
}

/// Nodes in a stable order, for comparing worlds whose node ids differ.
fn sorted_nodes(world: &World, registry: &TypeRegistry) -> anyhow::Result<Vec<SnapshotNode>> {
    let mut nodes = WorldSnapshot::capture(world, registry)?.nodes;
    nodes.sort_by_key(|n| {
        (
            n.link.grid_placement,
            n.link.grid_position.x,
            n.link.grid_position.y,
        )
    });
    Ok(nodes)
}

fn run_demo(
    store_path: &Path,
    catalog: Arc<ItemCatalog>,
    registry: &TypeRegistry,
) -> anyhow::Result<()> {
    let config = InventoryConfig::default();
    let mut world = World::new(catalog.clone());
    let mut inventory = InventoryContainer::with_config(config.clone());
    let mut equipment = EquipmentMap::new();

    for record in [
        PersistentItemRecord::base(TABLE, TABLE_SCENE),
        PersistentItemRecord::base(LAMP, LAMP_SCENE),
        PersistentItemRecord::carriable(SHOVEL, SHOVEL_SCENE, 80),
        PersistentItemRecord::base(CAPSULE, CAPSULE_SCENE),
        PersistentItemRecord::base(APPLE, APPLE_SCENE),
        PersistentItemRecord::base(CHAIR, CHAIR_SCENE),
        PersistentItemRecord::carriable(SHOVEL, SHOVEL_SCENE, 35),
    ] {
        inventory.add_item(record)?;
    }

    let hole = PersistentItemRecord::base(config.hole_item.clone(), HOLE_SCENE);
    world.spawn(&hole, IVec2::new(4, 0), ItemRotation::North, ItemPlacement::Floor, false)?;

    inventory.place(0, at(0, 0), &mut world)?;
    inventory.place(1, at(1, 0), &mut world)?;
    inventory.equip(2, EquipSlot::Tool, &mut equipment, &*catalog)?;
    inventory.bury(3, IVec2::new(4, 0), &mut world)?;
    inventory.consume(4, &*catalog)?;

    // Half on the table, half on bare floor.
    match inventory.place(5, at(1, 0), &mut world) {
        Err(err) if err.is_recoverable() => println!("refused: {err}"),
        Err(err) => return Err(err.into()),
        Ok(id) => println!("placed chair as {id}"),
    }
    if inventory.item(5)?.is_some() {
        inventory.drop(5, at(0, 3), &mut world)?;
    }

    println!("inventory: {} items", inventory.item_count());
    println!("world: {} nodes", world.node_count());
    for node in world.nodes() {
        println!("  {}", node.link);
    }

    let mut store = SaveStore::open(store_path)?;
    let save = PlayerSaveData::capture("Demo", &inventory, &equipment, registry)?;
    store.save_player("demo", &save)?;
    store.save_world("farm", &WorldSnapshot::capture(&world, registry)?)?;
    store.verify_integrity()?;

    let store = SaveStore::open(store_path)?;
    let (loaded, warnings) = store
        .load_player("demo", registry)?
        .context("player save missing after write")?;
    let mut inventory2 = InventoryContainer::with_config(config);
    let mut equipment2 = EquipmentMap::new();
    let mut all_warnings = warnings;
    all_warnings.extend(loaded.restore(&mut inventory2, &mut equipment2, &*catalog));
    let (world2, world_warnings) = store.load_world("farm", catalog.clone(), registry)?;
    all_warnings.extend(world_warnings);

    let slots_match = inventory2.get_slots() == inventory.get_slots();
    let tools_match = equipment2
        .get_equipped(EquipSlot::Tool)
        .and_then(|t| t.durability())
        == equipment.get_equipped(EquipSlot::Tool).and_then(|t| t.durability());
    let world_match = sorted_nodes(&world2, registry)? == sorted_nodes(&world, registry)?;

    for warning in &all_warnings {
        println!("warning: {warning}");
    }
    ensure_round_trip(slots_match, tools_match, world_match)?;
    println!("Match: OK");
    Ok(())
}

fn ensure_round_trip(slots: bool, tool: bool, world: bool) -> anyhow::Result<()> {
    if !(slots && tool && world) {
        anyhow::bail!("round trip mismatch: slots {slots}, tool {tool}, world {world}");
    }
    Ok(())
}
