pub const BOARD_WIDTH: i32 = 40;
pub const BOARD_HEIGHT: i32 = 40;
pub const STARTING_LENGTH: usize = 4;
pub const SPAWN_ROW_STRIDE: u64 = 3;
pub const GROWTH_PER_FOOD: u32 = 2;
pub const FRAME_INTERVAL_MS: u64 = 100;
pub const FRAME_INTERVAL_STEP_MS: u64 = 1;
pub const MIN_FRAME_INTERVAL_MS: u64 = 20;
pub const MAX_FOOD_ATTEMPTS: usize = 64;
pub const MAX_PENDING_TURNS: usize = 32;
