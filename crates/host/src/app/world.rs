use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tickex_engine::config::INVENTORY_SLOT_COUNT;
use tickex_engine::{
    ActionWorld, Direction, EffectResult, GridError, GridSnapshot, ObstacleCluster,
    PassabilityOracle, StepOutcome, TileCoord,
};
use tracing::debug;

pub(crate) const MAX_ENERGY: u32 = 270;
const TOOL_ENERGY_COST: u32 = 2;
const SHOP_LOCATION: &str = "Town";

const DEMO_FARM_ROWS: [&str; 10] = [
    "################",
    "#..............#",
    "#..###.........#",
    "#..#.#....oo...#",
    "#..............#",
    "#..............#",
    "#.....####.....#",
    "#..............#",
    "#..............#",
    "################",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotKind {
    Tool,
    Seed,
    Food { energy: u32 },
    Produce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InventorySlot {
    pub(crate) name: String,
    pub(crate) kind: SlotKind,
    pub(crate) quantity: u32,
}

impl InventorySlot {
    fn tool(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SlotKind::Tool,
            quantity: 1,
        }
    }

    fn stack(name: &str, kind: SlotKind, quantity: u32) -> Self {
        Self {
            name: name.to_string(),
            kind,
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Crop {
    pub(crate) produce: String,
    pub(crate) ready: bool,
    pub(crate) watered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShopEntry {
    price: u32,
    kind: SlotKind,
}

/// Player-facing summary printed by the host after scripts and on `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct FarmStatus {
    pub(crate) location: String,
    pub(crate) player: TileCoord,
    pub(crate) facing: Direction,
    pub(crate) selected_slot: u8,
    pub(crate) held: Option<String>,
    pub(crate) money: u32,
    pub(crate) energy: u32,
    pub(crate) menu_open: bool,
}

/// Small farming world driven by the action executor.
///
/// Planning sees `grid`; live movement additionally collides with
/// `live_obstacles`, which stand in for wandering characters.
#[derive(Debug, Clone)]
pub(crate) struct FarmWorld {
    grid: GridSnapshot,
    live_obstacles: HashSet<TileCoord>,
    player: TileCoord,
    facing: Direction,
    inventory: Vec<Option<InventorySlot>>,
    selected_slot: u8,
    money: u32,
    energy: u32,
    shop: BTreeMap<String, ShopEntry>,
    crops: HashMap<TileCoord, Crop>,
    tilled: HashSet<TileCoord>,
    menu_open: bool,
    location: String,
    locations: BTreeMap<String, TileCoord>,
}

impl FarmWorld {
    pub(crate) fn new(grid: GridSnapshot, spawn: TileCoord) -> Self {
        let mut locations = BTreeMap::new();
        locations.insert("Farm".to_string(), spawn);
        Self {
            grid,
            live_obstacles: HashSet::new(),
            player: spawn,
            facing: Direction::Down,
            inventory: vec![None; usize::from(INVENTORY_SLOT_COUNT)],
            selected_slot: 0,
            money: 0,
            energy: MAX_ENERGY,
            shop: BTreeMap::new(),
            crops: HashMap::new(),
            tilled: HashSet::new(),
            menu_open: false,
            location: "Farm".to_string(),
            locations,
        }
    }

    /// Walled 16x10 farm with a farmhouse, two crops and a starter kit.
    pub(crate) fn demo() -> Result<Self, GridError> {
        let mut grid = GridSnapshot::from_ascii(&DEMO_FARM_ROWS)?;
        grid.add_cluster(ObstacleCluster {
            anchor: TileCoord::new(11, 1),
            width: 3,
            height: 1,
        })?;

        let mut world = Self::new(grid, TileCoord::new(2, 1));
        world.money = 500;
        world.energy = 200;
        world.inventory[0] = Some(InventorySlot::tool("Hoe"));
        world.inventory[1] = Some(InventorySlot::tool("Watering Can"));
        world.inventory[2] = Some(InventorySlot::stack("Parsnip Seeds", SlotKind::Seed, 5));
        world.inventory[3] = Some(InventorySlot::stack(
            "Salad",
            SlotKind::Food { energy: 45 },
            1,
        ));
        world.add_shop_item("Parsnip Seeds", 20, SlotKind::Seed);
        world.add_shop_item("Cauliflower Seeds", 80, SlotKind::Seed);
        world.add_shop_item("Salad", 220, SlotKind::Food { energy: 45 });
        world.add_location("Town", TileCoord::new(8, 8));
        world.add_location("Beach", TileCoord::new(14, 8));
        world.plant(TileCoord::new(2, 4), "Parsnip", true);
        world.plant(TileCoord::new(3, 4), "Cauliflower", false);
        Ok(world)
    }

    pub(crate) fn add_shop_item(&mut self, name: &str, price: u32, kind: SlotKind) {
        self.shop.insert(name.to_string(), ShopEntry { price, kind });
    }

    pub(crate) fn add_location(&mut self, name: &str, spawn: TileCoord) {
        self.locations.insert(name.to_string(), spawn);
    }

    pub(crate) fn plant(&mut self, tile: TileCoord, produce: &str, ready: bool) {
        self.crops.insert(
            tile,
            Crop {
                produce: produce.to_string(),
                ready,
                watered: false,
            },
        );
    }

    /// Blocks `tile` for live movement only; planned paths still cross it.
    pub(crate) fn place_live_obstacle(&mut self, tile: TileCoord) {
        self.live_obstacles.insert(tile);
    }

    #[cfg(test)]
    pub(crate) fn set_slot(&mut self, slot: u8, contents: Option<InventorySlot>) {
        if let Some(entry) = self.inventory.get_mut(usize::from(slot)) {
            *entry = contents;
        }
    }

    pub(crate) fn slot(&self, slot: u8) -> Option<&InventorySlot> {
        self.inventory.get(usize::from(slot)).and_then(Option::as_ref)
    }

    pub(crate) fn selected_slot(&self) -> u8 {
        self.selected_slot
    }

    pub(crate) fn money(&self) -> u32 {
        self.money
    }

    pub(crate) fn energy(&self) -> u32 {
        self.energy
    }

    #[cfg(test)]
    pub(crate) fn set_energy(&mut self, energy: u32) {
        self.energy = energy.min(MAX_ENERGY);
    }

    pub(crate) fn location(&self) -> &str {
        &self.location
    }

    pub(crate) fn menu_open(&self) -> bool {
        self.menu_open
    }

    #[cfg(test)]
    pub(crate) fn is_tilled(&self, tile: TileCoord) -> bool {
        self.tilled.contains(&tile)
    }

    #[cfg(test)]
    pub(crate) fn crop_at(&self, tile: TileCoord) -> Option<&Crop> {
        self.crops.get(&tile)
    }

    pub(crate) fn status(&self) -> FarmStatus {
        FarmStatus {
            location: self.location().to_string(),
            player: self.player,
            facing: self.facing,
            selected_slot: self.selected_slot(),
            held: self.slot(self.selected_slot).map(|slot| slot.name.clone()),
            money: self.money(),
            energy: self.energy(),
            menu_open: self.menu_open(),
        }
    }

    fn count_of(&self, name: &str) -> u32 {
        self.inventory
            .iter()
            .flatten()
            .filter(|slot| slot.name == name)
            .map(|slot| slot.quantity)
            .sum()
    }

    /// Stacks onto an existing non-tool slot, else takes the first empty one.
    fn stow(&mut self, name: &str, kind: SlotKind, quantity: u32) -> Result<u8, String> {
        let slot = self
            .inventory
            .iter()
            .position(|entry| {
                entry
                    .as_ref()
                    .is_some_and(|slot| slot.kind != SlotKind::Tool && slot.name == name)
            })
            .or_else(|| self.inventory.iter().position(Option::is_none))
            .ok_or_else(|| format!("inventory is full; no room for {name}"))?;

        match &mut self.inventory[slot] {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            empty => *empty = Some(InventorySlot::stack(name, kind, quantity)),
        }
        Ok(slot as u8)
    }

    fn has_room_for(&self, name: &str) -> bool {
        self.inventory.iter().any(|entry| match entry {
            Some(slot) => slot.kind != SlotKind::Tool && slot.name == name,
            None => true,
        })
    }

    fn spend_energy(&mut self, tool: &str) -> Result<(), String> {
        if self.energy < TOOL_ENERGY_COST {
            return Err(format!("too exhausted to use the {tool}"));
        }
        self.energy -= TOOL_ENERGY_COST;
        Ok(())
    }

    fn till(&mut self, target: TileCoord) -> EffectResult {
        if !self.grid.in_bounds(target) {
            return Err(format!("tile {target} is off the farm"));
        }
        if !self.grid.is_passable(target) || self.crops.contains_key(&target) {
            return Err(format!("tile {target} cannot be tilled"));
        }
        if self.tilled.contains(&target) {
            return Err(format!("tile {target} is already tilled"));
        }
        self.spend_energy("Hoe")?;
        self.tilled.insert(target);
        Ok(format!("tilled {target}"))
    }

    fn water(&mut self, target: TileCoord) -> EffectResult {
        if !self.crops.contains_key(&target) {
            return Err(format!("nothing to water at {target}"));
        }
        self.spend_energy("Watering Can")?;
        let crop = self
            .crops
            .get_mut(&target)
            .ok_or_else(|| format!("nothing to water at {target}"))?;
        crop.watered = true;
        Ok(format!("watered {} at {target}", crop.produce))
    }
}

impl ActionWorld for FarmWorld {
    fn passability(&self) -> &dyn PassabilityOracle {
        &self.grid
    }

    fn player_tile(&self) -> TileCoord {
        self.player
    }

    fn step_player(&mut self, direction: Direction) -> StepOutcome {
        self.facing = direction;
        let Some(next) = self.player.offset(direction) else {
            return StepOutcome::Blocked;
        };
        if !self.grid.is_passable(next) || self.live_obstacles.contains(&next) {
            return StepOutcome::Blocked;
        }
        debug!(x = next.x, y = next.y, "player_moved");
        self.player = next;
        StepOutcome::Moved
    }

    fn place_player(&mut self, tile: TileCoord) {
        self.player = tile;
    }

    fn facing(&self) -> Direction {
        self.facing
    }

    fn set_facing(&mut self, direction: Direction) {
        self.facing = direction;
    }

    fn equipped_tool(&self) -> Option<String> {
        self.slot(self.selected_slot)
            .filter(|slot| slot.kind == SlotKind::Tool)
            .map(|slot| slot.name.clone())
    }

    fn apply_tool(&mut self, target: TileCoord) -> EffectResult {
        let tool = self
            .equipped_tool()
            .ok_or_else(|| "no tool is equipped".to_string())?;
        match tool.as_str() {
            "Hoe" => self.till(target),
            "Watering Can" => self.water(target),
            other => {
                self.spend_energy(other)?;
                Ok(format!("swung the {other} at {target}"))
            }
        }
    }

    fn interact(&mut self, target: TileCoord) -> EffectResult {
        let Some(crop) = self.crops.get(&target) else {
            return Err(format!("nothing to interact with at {target}"));
        };
        if !crop.ready {
            let note = if crop.watered { "; it has been watered" } else { "" };
            return Err(format!("{} at {target} is not ready{note}", crop.produce));
        }
        let produce = crop.produce.clone();
        let slot = self.stow(&produce, SlotKind::Produce, 1)?;
        self.crops.remove(&target);
        Ok(format!("harvested {produce} into slot {slot}"))
    }

    fn select_slot(&mut self, slot: u8) -> EffectResult {
        if usize::from(slot) >= self.inventory.len() {
            return Err(format!("slot {slot} does not exist"));
        }
        self.selected_slot = slot;
        let holding = self
            .slot(slot)
            .map(|entry| entry.name.as_str())
            .unwrap_or("nothing");
        Ok(format!("selected slot {slot} ({holding})"))
    }

    fn select_item(&mut self, item: &str) -> EffectResult {
        let slot = self
            .inventory
            .iter()
            .position(|entry| {
                entry
                    .as_ref()
                    .is_some_and(|slot| slot.name.eq_ignore_ascii_case(item))
            })
            .ok_or_else(|| format!("no '{item}' in inventory"))?;
        self.selected_slot = slot as u8;
        Ok(format!("selected {item} in slot {slot}"))
    }

    fn dismiss_menu(&mut self) -> EffectResult {
        if !self.menu_open {
            return Err("no menu is open".to_string());
        }
        self.menu_open = false;
        Ok("menu closed".to_string())
    }

    fn toggle_menu(&mut self) -> EffectResult {
        self.menu_open = !self.menu_open;
        Ok(if self.menu_open {
            "menu opened".to_string()
        } else {
            "menu closed".to_string()
        })
    }

    fn purchase(&mut self, item: &str, quantity: u32) -> EffectResult {
        if self.location != SHOP_LOCATION {
            return Err(format!("the shop is in {SHOP_LOCATION}, not {}", self.location));
        }
        let (name, entry) = self
            .shop
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(item))
            .map(|(name, entry)| (name.clone(), *entry))
            .ok_or_else(|| format!("the shop does not sell '{item}'"))?;
        let total = entry
            .price
            .checked_mul(quantity)
            .ok_or_else(|| format!("{quantity} x {name} is too expensive"))?;
        if total > self.money {
            return Err(format!(
                "{quantity} x {name} costs {total}g but only {}g is available",
                self.money
            ));
        }
        if !self.has_room_for(&name) {
            return Err(format!("inventory is full; no room for {name}"));
        }
        self.stow(&name, entry.kind, quantity)?;
        self.money -= total;
        Ok(format!(
            "bought {quantity} x {name} for {total}g; {} held",
            self.count_of(&name)
        ))
    }

    fn eat(&mut self, slot: Option<u8>) -> EffectResult {
        let slot = slot.unwrap_or(self.selected_slot);
        let index = usize::from(slot);
        let (name, restore) = match self.inventory.get(index).and_then(Option::as_ref) {
            Some(InventorySlot {
                name,
                kind: SlotKind::Food { energy },
                ..
            }) => (name.clone(), *energy),
            Some(other) => return Err(format!("{} is not edible", other.name)),
            None => return Err(format!("slot {slot} is empty")),
        };
        if self.energy >= MAX_ENERGY {
            return Err("energy is already full".to_string());
        }

        if let Some(entry) = self.inventory.get_mut(index) {
            let remaining = entry
                .as_ref()
                .map_or(0, |held| held.quantity.saturating_sub(1));
            match entry {
                Some(held) if remaining > 0 => held.quantity = remaining,
                _ => *entry = None,
            }
        }
        let before = self.energy;
        self.energy = (self.energy + restore).min(MAX_ENERGY);
        Ok(format!("ate {name}; energy {before} -> {}", self.energy))
    }

    fn warp(&mut self, destination: &str) -> EffectResult {
        let (name, spawn) = self
            .locations
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(destination))
            .map(|(name, spawn)| (name.clone(), *spawn))
            .ok_or_else(|| format!("unknown location '{destination}'"))?;
        self.location = name.clone();
        self.player = spawn;
        self.menu_open = false;
        Ok(format!("warped to {name} at {spawn}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> FarmWorld {
        FarmWorld::demo().expect("demo farm")
    }

    #[test]
    fn demo_farm_blocks_walls_and_farmhouse() {
        let world = demo();
        let oracle = world.passability();
        assert!(oracle.is_passable(TileCoord::new(2, 1)));
        assert!(!oracle.is_passable(TileCoord::new(0, 0)));
        assert!(!oracle.is_passable(TileCoord::new(12, 1)));
        assert!(!oracle.is_passable(TileCoord::new(10, 3)));
        assert_eq!(world.equipped_tool().as_deref(), Some("Hoe"));
    }

    #[test]
    fn step_player_collides_with_live_obstacles() {
        let mut world = demo();
        world.place_live_obstacle(TileCoord::new(3, 1));

        assert_eq!(world.step_player(Direction::Right), StepOutcome::Blocked);
        assert_eq!(world.player_tile(), TileCoord::new(2, 1));
        assert_eq!(world.facing(), Direction::Right);
        assert!(world.passability().is_passable(TileCoord::new(3, 1)));

        assert_eq!(world.step_player(Direction::Up), StepOutcome::Blocked);
        assert_eq!(world.step_player(Direction::Left), StepOutcome::Moved);
        assert_eq!(world.player_tile(), TileCoord::new(1, 1));
    }

    #[test]
    fn hoe_tills_open_soil_once() {
        let mut world = demo();
        let target = TileCoord::new(2, 2);

        let message = world.apply_tool(target).expect("till");
        assert_eq!(message, "tilled (2, 2)");
        assert!(world.is_tilled(target));
        assert_eq!(world.energy(), 198);

        let again = world.apply_tool(target).expect_err("already tilled");
        assert!(again.contains("already tilled"));
        let wall = world.apply_tool(TileCoord::new(0, 1)).expect_err("wall");
        assert!(wall.contains("cannot be tilled"));
        let outside = world.apply_tool(TileCoord::new(-1, 1)).expect_err("outside");
        assert_eq!(outside, "tile (-1, 1) is off the farm");
        assert_eq!(world.energy(), 198);
    }

    #[test]
    fn watering_can_needs_a_crop() {
        let mut world = demo();
        world.select_slot(1).expect("select");

        world.apply_tool(TileCoord::new(3, 4)).expect("water");
        assert!(world.crop_at(TileCoord::new(3, 4)).expect("crop").watered);
        let error = world.apply_tool(TileCoord::new(5, 5)).expect_err("nothing there");
        assert!(error.contains("nothing to water"));
    }

    #[test]
    fn exhausted_player_cannot_use_tools() {
        let mut world = demo();
        world.set_energy(1);
        let soil = TileCoord::new(2, 2);
        let error = world.apply_tool(soil).expect_err("exhausted");
        assert_eq!(error, "too exhausted to use the Hoe");
        assert!(!world.is_tilled(soil));

        world.select_slot(1).expect("select can");
        let crop = TileCoord::new(3, 4);
        let error = world.apply_tool(crop).expect_err("exhausted");
        assert_eq!(error, "too exhausted to use the Watering Can");
        assert!(!world.crop_at(crop).expect("crop").watered);
        assert_eq!(world.energy(), 1);
    }

    #[test]
    fn tilling_succeeds_after_eating_when_exhausted() {
        let mut world = demo();
        world.set_energy(1);
        let soil = TileCoord::new(2, 2);
        world.apply_tool(soil).expect_err("exhausted");

        world.eat(Some(3)).expect("eat");
        assert_eq!(world.apply_tool(soil).expect("till"), "tilled (2, 2)");
        assert!(world.is_tilled(soil));
        assert_eq!(world.energy(), 44);
    }

    #[test]
    fn harvest_requires_a_ready_crop_and_stacks_produce() {
        let mut world = demo();
        let message = world.interact(TileCoord::new(2, 4)).expect("harvest");
        assert_eq!(message, "harvested Parsnip into slot 4");
        assert!(world.crop_at(TileCoord::new(2, 4)).is_none());
        assert_eq!(world.slot(4).expect("produce").quantity, 1);

        let growing = world.interact(TileCoord::new(3, 4)).expect_err("not ready");
        assert_eq!(growing, "Cauliflower at (3, 4) is not ready");
        let empty = world.interact(TileCoord::new(9, 9)).expect_err("empty");
        assert!(empty.contains("nothing to interact with"));

        world.plant(TileCoord::new(5, 5), "Parsnip", true);
        world.interact(TileCoord::new(5, 5)).expect("second harvest");
        assert_eq!(world.slot(4).expect("produce").quantity, 2);
    }

    #[test]
    fn full_inventory_refuses_new_produce() {
        let mut world = demo();
        for slot in 4..INVENTORY_SLOT_COUNT {
            world.set_slot(slot, Some(InventorySlot::tool("Pickaxe")));
        }
        let error = world.interact(TileCoord::new(2, 4)).expect_err("full");
        assert_eq!(error, "inventory is full; no room for Parsnip");
        assert!(world.crop_at(TileCoord::new(2, 4)).is_some());
    }

    #[test]
    fn select_item_matches_names_case_insensitively() {
        let mut world = demo();
        world.select_item("watering can").expect("select");
        assert_eq!(world.selected_slot(), 1);
        assert_eq!(world.equipped_tool().as_deref(), Some("Watering Can"));

        world.select_item("Salad").expect("select food");
        assert_eq!(world.equipped_tool(), None);
        let error = world.select_item("Axe").expect_err("missing");
        assert_eq!(error, "no 'Axe' in inventory");
    }

    #[test]
    fn purchase_only_in_town_with_enough_money() {
        let mut world = demo();
        let away = world.purchase("Parsnip Seeds", 2).expect_err("not in town");
        assert!(away.contains("the shop is in Town"));

        world.warp("town").expect("warp");
        assert_eq!(world.location(), "Town");
        assert_eq!(world.player_tile(), TileCoord::new(8, 8));

        let message = world.purchase("parsnip seeds", 3).expect("buy");
        assert_eq!(message, "bought 3 x Parsnip Seeds for 60g; 8 held");
        assert_eq!(world.money(), 440);

        let broke = world.purchase("Salad", 3).expect_err("too expensive");
        assert!(broke.contains("costs 660g"));
        let unknown = world.purchase("Diamond", 1).expect_err("unknown");
        assert_eq!(unknown, "the shop does not sell 'Diamond'");
        assert_eq!(world.money(), 440);
    }

    #[test]
    fn eating_restores_energy_and_consumes_the_item() {
        let mut world = demo();
        let message = world.eat(Some(3)).expect("eat");
        assert_eq!(message, "ate Salad; energy 200 -> 245");
        assert!(world.slot(3).is_none());

        let empty = world.eat(Some(3)).expect_err("empty slot");
        assert_eq!(empty, "slot 3 is empty");
        let tool = world.eat(None).expect_err("hoe is selected");
        assert_eq!(tool, "Hoe is not edible");
    }

    #[test]
    fn menus_toggle_and_dismiss() {
        let mut world = demo();
        assert!(world.dismiss_menu().is_err());
        world.toggle_menu().expect("open");
        assert!(world.menu_open());
        world.dismiss_menu().expect("close");
        assert!(!world.menu_open());
    }

    #[test]
    fn warp_rejects_unknown_locations() {
        let mut world = demo();
        let error = world.warp("Mines").expect_err("unknown");
        assert_eq!(error, "unknown location 'Mines'");
        assert_eq!(world.location(), "Farm");
    }
}
