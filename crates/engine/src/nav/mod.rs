mod oracle;
mod pathfinder;
mod tile;

pub use oracle::{GridError, GridSnapshot, ObstacleCluster, PassabilityOracle};
pub use pathfinder::{find_path, Path, Unreachable, UnreachableReason};
pub use tile::{Direction, TileCoord};
